//! # List Subcommands
//!
//! Offline operations on encoded status lists:
//!
//! ```bash
//! # An all-valid revocation list of the default size:
//! credreg blank --size 131072
//!
//! # Status at one index, or a summary of every set entry:
//! credreg inspect --size 131072 --index 10 --file list.txt
//! credreg inspect --size 1024 --status-size 2 --json uH4sIAAAAAAA...
//!
//! # Revoke indices 3 and 5 and print the new encoding:
//! credreg set --size 131072 --indices 3,5 --code 1 --file list.txt
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use credreg_codec::{decode, encode, StatusList};
use credreg_core::{ListType, DEFAULT_LIST_SIZE};
use serde::Serialize;

/// Dimensions shared by every list subcommand.
#[derive(Args, Debug, Clone)]
pub struct ListShape {
    /// Number of indices in the list.
    #[arg(long, default_value_t = DEFAULT_LIST_SIZE)]
    pub size: u64,

    /// Bits per index. 1 for single-bit lists.
    #[arg(long, default_value_t = 1)]
    pub status_size: u8,

    /// `SingleBit` or `MultiBit`. Inferred from --status-size when absent.
    #[arg(long)]
    pub list_type: Option<String>,
}

impl ListShape {
    fn list_type(&self) -> Result<ListType> {
        match self.list_type.as_deref() {
            Some(raw) => ListType::from_name(raw)
                .with_context(|| format!("unknown list type \"{raw}\" (expected SingleBit or MultiBit)")),
            None if self.status_size == 1 => Ok(ListType::SingleBit),
            None => Ok(ListType::MultiBit),
        }
    }
}

/// Where encoded content is read from.
#[derive(Args, Debug, Clone)]
pub struct ContentSource {
    /// Encoded list text.
    #[arg(conflicts_with = "file", required_unless_present = "file")]
    pub content: Option<String>,

    /// Read the encoded list from a file.
    #[arg(long)]
    pub file: Option<PathBuf>,
}

impl ContentSource {
    fn read(&self) -> Result<String> {
        match (&self.content, &self.file) {
            (Some(text), _) => Ok(text.trim().to_string()),
            (None, Some(path)) => std::fs::read_to_string(path)
                .map(|text| text.trim().to_string())
                .with_context(|| format!("reading {}", path.display())),
            (None, None) => bail!("either encoded content or --file is required"),
        }
    }
}

/// Arguments for `credreg blank`.
#[derive(Args, Debug)]
pub struct BlankArgs {
    #[command(flatten)]
    pub shape: ListShape,
}

/// Arguments for `credreg inspect`.
#[derive(Args, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub shape: ListShape,

    #[command(flatten)]
    pub source: ContentSource,

    /// Print the code at this index instead of a summary.
    #[arg(long)]
    pub index: Option<u64>,

    /// Maximum number of set entries listed in the summary.
    #[arg(long, default_value_t = 100)]
    pub limit: usize,

    /// Emit JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `credreg set`.
#[derive(Args, Debug)]
pub struct SetArgs {
    #[command(flatten)]
    pub shape: ListShape,

    #[command(flatten)]
    pub source: ContentSource,

    /// Indices to change, comma separated.
    #[arg(long, value_delimiter = ',', required = true)]
    pub indices: Vec<u64>,

    /// Code to store at every index.
    #[arg(long)]
    pub code: u32,
}

/// Summary of a decoded list.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ListSummary {
    pub size: u64,
    pub status_size: u8,
    pub set_count: u64,
    /// First `limit` set entries as `(index, code)`.
    pub entries: Vec<(u64, u32)>,
    pub truncated: bool,
}

/// Encoded all-zero list.
pub fn blank(args: &BlankArgs) -> Result<String> {
    let list_type = args.shape.list_type()?;
    credreg_codec::blank(args.shape.size, list_type, args.shape.status_size)
        .context("encoding blank list")
}

fn load(shape: &ListShape, source: &ContentSource) -> Result<(StatusList, ListType)> {
    let list_type = shape.list_type()?;
    let content = source.read()?;
    let list = decode(&content, list_type, shape.size, shape.status_size)
        .context("decoding status list")?;
    Ok((list, list_type))
}

/// Summarize the set entries of a decoded list.
pub fn summarize(list: &StatusList, limit: usize) -> ListSummary {
    let mut entries = Vec::new();
    let mut set_count = 0u64;
    for entry in list.set_entries() {
        set_count += 1;
        if entries.len() < limit {
            entries.push(entry);
        }
    }
    ListSummary {
        size: list.size(),
        status_size: list.status_size(),
        set_count,
        truncated: set_count > entries.len() as u64,
        entries,
    }
}

/// Render the `inspect` output.
pub fn inspect(args: &InspectArgs) -> Result<String> {
    let (list, _) = load(&args.shape, &args.source)?;

    if let Some(index) = args.index {
        let code = list.code_at(index)?;
        return Ok(if args.json {
            serde_json::json!({ "index": index, "code": code }).to_string()
        } else {
            format!("index {index}: {code}")
        });
    }

    let summary = summarize(&list, args.limit);
    if args.json {
        return serde_json::to_string_pretty(&summary).context("serializing summary");
    }
    let mut out = format!(
        "size {}, status size {}, {} set",
        summary.size, summary.status_size, summary.set_count
    );
    for (index, code) in &summary.entries {
        out.push_str(&format!("\n{index}\t{code}"));
    }
    if summary.truncated {
        out.push_str(&format!("\n... {} more", summary.set_count - summary.entries.len() as u64));
    }
    Ok(out)
}

/// Apply `code` at every index and return the new encoding.
///
/// Every index is checked before any is written.
pub fn set(args: &SetArgs) -> Result<String> {
    let (mut list, list_type) = load(&args.shape, &args.source)?;
    if let Some(bad) = args.indices.iter().find(|&&i| i >= list.size()) {
        bail!("index {bad} is out of range for a list of size {}", list.size());
    }
    for &index in &args.indices {
        let previous = list.set_code(index, args.code)?;
        tracing::debug!(index, previous, code = args.code, "entry set");
    }
    encode(&list, list_type).context("encoding status list")
}

pub fn run_blank(args: &BlankArgs) -> Result<u8> {
    println!("{}", blank(args)?);
    Ok(0)
}

pub fn run_inspect(args: &InspectArgs) -> Result<u8> {
    println!("{}", inspect(args)?);
    Ok(0)
}

pub fn run_set(args: &SetArgs) -> Result<u8> {
    println!("{}", set(args)?);
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(size: u64, status_size: u8) -> ListShape {
        ListShape {
            size,
            status_size,
            list_type: None,
        }
    }

    fn inline(content: String) -> ContentSource {
        ContentSource {
            content: Some(content),
            file: None,
        }
    }

    #[test]
    fn list_type_inferred_from_status_size() {
        assert_eq!(shape(8, 1).list_type().unwrap(), ListType::SingleBit);
        assert_eq!(shape(8, 2).list_type().unwrap(), ListType::MultiBit);
        let explicit = ListShape {
            list_type: Some("Triple".into()),
            ..shape(8, 1)
        };
        assert!(explicit.list_type().is_err());
    }

    #[test]
    fn set_then_inspect_index() {
        let content = blank(&BlankArgs { shape: shape(64, 1) }).unwrap();
        let updated = set(&SetArgs {
            shape: shape(64, 1),
            source: inline(content),
            indices: vec![3, 5],
            code: 1,
        })
        .unwrap();

        let report = inspect(&InspectArgs {
            shape: shape(64, 1),
            source: inline(updated.clone()),
            index: Some(5),
            limit: 100,
            json: false,
        })
        .unwrap();
        assert_eq!(report, "index 5: 1");

        let summary = inspect(&InspectArgs {
            shape: shape(64, 1),
            source: inline(updated),
            index: None,
            limit: 100,
            json: false,
        })
        .unwrap();
        assert!(summary.starts_with("size 64, status size 1, 2 set"));
        assert!(summary.contains("\n3\t1"));
    }

    #[test]
    fn set_out_of_range_changes_nothing() {
        let content = blank(&BlankArgs { shape: shape(16, 1) }).unwrap();
        let err = set(&SetArgs {
            shape: shape(16, 1),
            source: inline(content),
            indices: vec![2, 16],
            code: 1,
        })
        .unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn multi_bit_code_too_wide_is_rejected() {
        let content = blank(&BlankArgs { shape: shape(16, 2) }).unwrap();
        assert!(set(&SetArgs {
            shape: shape(16, 2),
            source: inline(content),
            indices: vec![1],
            code: 4,
        })
        .is_err());
    }

    #[test]
    fn summary_truncates_at_limit() {
        let mut list = StatusList::new(32, 2).unwrap();
        for index in [1, 4, 9, 30] {
            list.set_code(index, 3).unwrap();
        }
        let summary = summarize(&list, 2);
        assert_eq!(summary.set_count, 4);
        assert_eq!(summary.entries, vec![(1, 3), (4, 3)]);
        assert!(summary.truncated);
    }

    #[test]
    fn mismatched_size_fails_to_decode() {
        let content = blank(&BlankArgs { shape: shape(64, 1) }).unwrap();
        assert!(inspect(&InspectArgs {
            shape: shape(128, 1),
            source: inline(content),
            index: Some(0),
            limit: 10,
            json: true,
        })
        .is_err());
    }
}

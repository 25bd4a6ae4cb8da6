//! # Payment Conditions
//!
//! Fee conditions attached to encrypted registries, and the evidence a
//! caller presents to satisfy one. Matching here is the local half of the
//! check; the external payment verifier confirms the evidence on-chain.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A fee that unlocks decryption of an encrypted registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCondition {
    /// Address the fee must be paid to.
    pub address: String,
    /// Minimum amount, in the smallest unit of `denom`.
    pub amount: u64,
    /// Denomination of `amount`, e.g. `"ncheq"`.
    pub denom: String,
    /// How long, in seconds, a payment remains valid for access.
    pub window_secs: u64,
}

impl PaymentCondition {
    /// Check the condition is well-formed.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.address.trim().is_empty() {
            return Err(ValidationError::InvalidPaymentCondition(
                "address must not be empty".into(),
            ));
        }
        if self.amount == 0 {
            return Err(ValidationError::InvalidPaymentCondition(
                "amount must be greater than zero".into(),
            ));
        }
        if self.denom.trim().is_empty() {
            return Err(ValidationError::InvalidPaymentCondition(
                "denom must not be empty".into(),
            ));
        }
        if self.window_secs == 0 || self.window_secs > i64::MAX as u64 / 1000 {
            return Err(ValidationError::InvalidPaymentCondition(
                "window must be a positive number of seconds".into(),
            ));
        }
        Ok(())
    }

    /// Whether `evidence` satisfies this condition at time `now`.
    ///
    /// The payment must go to the same address, in the same denomination,
    /// for at least the required amount, and must have been made within
    /// `[now - window, now]`. A window reaching past the earliest
    /// representable instant has no lower bound.
    pub fn is_met_by(&self, evidence: &PaymentEvidence, now: DateTime<Utc>) -> bool {
        let earliest = i64::try_from(self.window_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|window| now.checked_sub_signed(window));
        evidence.address == self.address
            && evidence.denom == self.denom
            && evidence.amount >= self.amount
            && evidence.paid_at <= now
            && earliest.map_or(true, |earliest| evidence.paid_at >= earliest)
    }
}

/// Proof of an off-band payment presented by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentEvidence {
    /// Ledger transaction hash of the payment.
    pub tx_hash: String,
    /// Address the payment went to.
    pub address: String,
    /// Amount paid, in the smallest unit of `denom`.
    pub amount: u64,
    /// Denomination of `amount`.
    pub denom: String,
    /// When the payment was made.
    pub paid_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn condition() -> PaymentCondition {
        PaymentCondition {
            address: "cheqd1feeaddr".into(),
            amount: 1_000,
            denom: "ncheq".into(),
            window_secs: 600,
        }
    }

    fn evidence(now: DateTime<Utc>) -> PaymentEvidence {
        PaymentEvidence {
            tx_hash: "ABCDEF".into(),
            address: "cheqd1feeaddr".into(),
            amount: 1_000,
            denom: "ncheq".into(),
            paid_at: now - Duration::seconds(30),
        }
    }

    #[test]
    fn well_formed_condition_validates() {
        assert!(condition().validate().is_ok());
    }

    #[test]
    fn malformed_conditions_rejected() {
        let mut c = condition();
        c.address = " ".into();
        assert!(c.validate().is_err());

        let mut c = condition();
        c.amount = 0;
        assert!(c.validate().is_err());

        let mut c = condition();
        c.window_secs = 0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn matching_evidence_meets_condition() {
        let now = Utc::now();
        assert!(condition().is_met_by(&evidence(now), now));
    }

    #[test]
    fn overpayment_meets_condition() {
        let now = Utc::now();
        let mut ev = evidence(now);
        ev.amount = 5_000;
        assert!(condition().is_met_by(&ev, now));
    }

    #[test]
    fn wrong_address_amount_or_denom_fails() {
        let now = Utc::now();
        let mut ev = evidence(now);
        ev.address = "cheqd1other".into();
        assert!(!condition().is_met_by(&ev, now));

        let mut ev = evidence(now);
        ev.amount = 999;
        assert!(!condition().is_met_by(&ev, now));

        let mut ev = evidence(now);
        ev.denom = "cheq".into();
        assert!(!condition().is_met_by(&ev, now));
    }

    #[test]
    fn payment_outside_window_fails() {
        let now = Utc::now();
        let mut ev = evidence(now);
        ev.paid_at = now - Duration::seconds(601);
        assert!(!condition().is_met_by(&ev, now));

        let mut ev = evidence(now);
        ev.paid_at = now + Duration::seconds(5);
        assert!(!condition().is_met_by(&ev, now));
    }

    #[test]
    fn window_wider_than_calendar_has_no_lower_bound() {
        let now = Utc::now();
        let mut c = condition();
        c.window_secs = 10_000_000_000_000;
        assert!(c.validate().is_ok());
        assert!(c.is_met_by(&evidence(now), now));

        let mut ev = evidence(now);
        ev.paid_at = DateTime::<Utc>::MIN_UTC;
        assert!(c.is_met_by(&ev, now));

        c.window_secs = u64::MAX;
        assert!(c.is_met_by(&evidence(now), now));
    }

    #[test]
    fn evidence_uses_camel_case() {
        let now = Utc::now();
        let json = serde_json::to_value(evidence(now)).unwrap();
        assert!(json.get("txHash").is_some());
        assert!(json.get("paidAt").is_some());
    }
}

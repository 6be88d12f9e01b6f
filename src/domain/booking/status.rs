//! Booking payment status derived from the ledger rollup.

use serde::{Deserialize, Serialize};

/// Payment status of a booking, derived from `paid_amount`.
///
/// - `Pending` - nothing has been paid yet
/// - `Partial` - some but not all of the total has been paid
/// - `Paid` - the full amount (or more) has been paid
/// - `Refunded` - everything that was paid has been refunded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingPaymentStatus {
    Pending,
    Partial,
    Paid,
    Refunded,
}

impl BookingPaymentStatus {
    /// Stable string form, matching the values stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingPaymentStatus::Pending => "PENDING",
            BookingPaymentStatus::Partial => "PARTIAL",
            BookingPaymentStatus::Paid => "PAID",
            BookingPaymentStatus::Refunded => "REFUNDED",
        }
    }

    /// Parses the database string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(BookingPaymentStatus::Pending),
            "PARTIAL" => Some(BookingPaymentStatus::Partial),
            "PAID" => Some(BookingPaymentStatus::Paid),
            "REFUNDED" => Some(BookingPaymentStatus::Refunded),
            _ => None,
        }
    }
}

impl std::fmt::Display for BookingPaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_form_round_trips() {
        for status in [
            BookingPaymentStatus::Pending,
            BookingPaymentStatus::Partial,
            BookingPaymentStatus::Paid,
            BookingPaymentStatus::Refunded,
        ] {
            assert_eq!(BookingPaymentStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn unknown_string_is_rejected() {
        assert_eq!(BookingPaymentStatus::parse("CANCELLED"), None);
    }

    #[test]
    fn serializes_screaming_snake_case() {
        let json = serde_json::to_string(&BookingPaymentStatus::Partial).unwrap();
        assert_eq!(json, "\"PARTIAL\"");
    }
}

//! Feature flags configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Feature flags for enabling/disabling functionality
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureFlags {
    /// Allow paying a booking in several installments
    #[serde(default = "default_allow_partial_payments")]
    pub allow_partial_payments: bool,

    /// Minimum first payment as a percentage of the booking total,
    /// applied only when partial payments are enabled
    #[serde(default = "default_minimum_deposit_percentage")]
    pub minimum_deposit_percentage: u8,

    /// Send booking confirmation emails on successful payment
    #[serde(default = "default_send_payment_emails")]
    pub send_payment_emails: bool,
}

impl FeatureFlags {
    /// Validate feature flag values
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.minimum_deposit_percentage == 0 || self.minimum_deposit_percentage > 100 {
            return Err(ValidationError::InvalidDepositPercentage);
        }
        Ok(())
    }
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            allow_partial_payments: default_allow_partial_payments(),
            minimum_deposit_percentage: default_minimum_deposit_percentage(),
            send_payment_emails: default_send_payment_emails(),
        }
    }
}

fn default_allow_partial_payments() -> bool {
    true
}

fn default_minimum_deposit_percentage() -> u8 {
    20
}

fn default_send_payment_emails() -> bool {
    true
}

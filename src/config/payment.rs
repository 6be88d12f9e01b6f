//! Payment configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Which gateway the factory builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    /// Simulated gateway, no external calls. Default for development.
    #[default]
    Mock,
    /// Live Razorpay integration.
    Razorpay,
}

/// Payment configuration (Razorpay)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Gateway selection (mock or razorpay)
    #[serde(default)]
    pub mode: PaymentMode,

    /// Razorpay public key id (rzp_test_... or rzp_live_...)
    pub razorpay_key_id: Option<String>,

    /// Razorpay API key secret, also the signature HMAC key
    pub razorpay_key_secret: Option<String>,

    /// ISO 4217 currency code for all orders
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl PaymentConfig {
    /// Check if using Razorpay test mode
    pub fn is_test_mode(&self) -> bool {
        self.razorpay_key_id
            .as_deref()
            .is_some_and(|k| k.starts_with("rzp_test_"))
    }

    /// Check if using Razorpay live mode
    pub fn is_live_mode(&self) -> bool {
        self.razorpay_key_id
            .as_deref()
            .is_some_and(|k| k.starts_with("rzp_live_"))
    }

    /// Whether a complete Razorpay credential pair is present.
    pub fn has_razorpay_credentials(&self) -> bool {
        self.razorpay_key_id.as_deref().is_some_and(|k| !k.is_empty())
            && self
                .razorpay_key_secret
                .as_deref()
                .is_some_and(|s| !s.is_empty())
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ValidationError::InvalidCurrency);
        }

        if self.mode == PaymentMode::Razorpay {
            let key_id = self
                .razorpay_key_id
                .as_deref()
                .filter(|k| !k.is_empty())
                .ok_or(ValidationError::MissingRequired("RAZORPAY_KEY_ID"))?;
            if !key_id.starts_with("rzp_") {
                return Err(ValidationError::InvalidRazorpayKeyId);
            }
            if self
                .razorpay_key_secret
                .as_deref()
                .map_or(true, |s| s.is_empty())
            {
                return Err(ValidationError::MissingRequired("RAZORPAY_KEY_SECRET"));
            }
        }

        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            mode: PaymentMode::default(),
            razorpay_key_id: None,
            razorpay_key_secret: None,
            currency: default_currency(),
        }
    }
}

fn default_currency() -> String {
    "INR".to_string()
}

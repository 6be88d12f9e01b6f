//! Email configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Email configuration (Resend)
///
/// Leaving `resend_api_key` empty disables outbound email; payment
/// notifications then go to the log only.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// Resend API key
    #[serde(default)]
    pub resend_api_key: String,

    /// From email address
    #[serde(default = "default_from_email")]
    pub from_email: String,

    /// From name
    #[serde(default = "default_from_name")]
    pub from_name: String,

    /// Operations inbox for payment and refund notices
    #[serde(default = "default_ops_email")]
    pub ops_email: String,
}

impl EmailConfig {
    /// Whether outbound email is configured at all.
    pub fn is_enabled(&self) -> bool {
        !self.resend_api_key.is_empty()
    }

    /// Get formatted "From" header value
    pub fn from_header(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_email)
    }

    /// Validate email configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.is_enabled() {
            return Ok(());
        }
        if !self.resend_api_key.starts_with("re_") {
            return Err(ValidationError::InvalidResendKey);
        }
        if !self.from_email.contains('@') || !self.ops_email.contains('@') {
            return Err(ValidationError::InvalidFromEmail);
        }
        Ok(())
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            resend_api_key: String::new(),
            from_email: default_from_email(),
            from_name: default_from_name(),
            ops_email: default_ops_email(),
        }
    }
}

fn default_from_email() -> String {
    "payments@ninjapark.example".to_string()
}

fn default_from_name() -> String {
    "Ninja Park Payments".to_string()
}

fn default_ops_email() -> String {
    "ops@ninjapark.example".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_disabled_by_default() {
        let config = EmailConfig::default();
        assert!(!config.is_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_header() {
        let config = EmailConfig {
            from_email: "support@example.com".to_string(),
            from_name: "Support Team".to_string(),
            ..Default::default()
        };
        assert_eq!(config.from_header(), "Support Team <support@example.com>");
    }

    #[test]
    fn test_validation_invalid_api_key_prefix() {
        let config = EmailConfig {
            resend_api_key: "sk_xxx".to_string(), // Wrong prefix
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_from_email() {
        let config = EmailConfig {
            resend_api_key: "re_xxx".to_string(),
            from_email: "invalid-email".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_valid_config() {
        let config = EmailConfig {
            resend_api_key: "re_abcd1234".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}

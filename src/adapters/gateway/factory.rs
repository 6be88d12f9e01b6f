//! Gateway factory.
//!
//! Builds the configured gateway exactly once and hands out the cached
//! instance afterwards. A razorpay mode with unusable credentials falls
//! back to the mock gateway instead of refusing to start; the fallback is
//! logged loudly so it cannot slip into production unnoticed.

use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::config::{PaymentConfig, PaymentMode};
use crate::ports::{PaymentGateway, PaymentStore};

use super::mock::MockGateway;
use super::razorpay::{RazorpayConfig, RazorpayGateway};

/// Factory holding the lazily built gateway singleton.
pub struct GatewayFactory {
    config: PaymentConfig,
    store: Arc<dyn PaymentStore>,
    cached: OnceCell<Arc<dyn PaymentGateway>>,
}

impl GatewayFactory {
    pub fn new(config: PaymentConfig, store: Arc<dyn PaymentStore>) -> Self {
        Self {
            config,
            store,
            cached: OnceCell::new(),
        }
    }

    /// The configured gateway. First call builds it, later calls return
    /// the same instance.
    pub fn gateway(&self) -> Arc<dyn PaymentGateway> {
        self.cached.get_or_init(|| self.build()).clone()
    }

    fn build(&self) -> Arc<dyn PaymentGateway> {
        match self.config.mode {
            PaymentMode::Mock => {
                tracing::info!("Payment gateway: mock");
                self.mock()
            }
            PaymentMode::Razorpay => match self.razorpay() {
                Ok(gateway) => {
                    tracing::info!(
                        test_mode = self.config.is_test_mode(),
                        "Payment gateway: razorpay"
                    );
                    gateway
                }
                Err(reason) => {
                    tracing::error!(
                        %reason,
                        "Razorpay gateway unavailable, falling back to mock"
                    );
                    self.mock()
                }
            },
        }
    }

    fn mock(&self) -> Arc<dyn PaymentGateway> {
        Arc::new(MockGateway::new(
            self.store.clone(),
            self.config.currency.clone(),
        ))
    }

    fn razorpay(&self) -> Result<Arc<dyn PaymentGateway>, String> {
        if !self.config.has_razorpay_credentials() {
            return Err("razorpay credentials are not configured".to_string());
        }
        let key_id = self.config.razorpay_key_id.as_deref().unwrap_or_default();
        if !key_id.starts_with("rzp_") {
            return Err(format!("razorpay key id has unexpected prefix: {}", key_id));
        }
        let key_secret = self
            .config
            .razorpay_key_secret
            .as_deref()
            .unwrap_or_default();

        let config = RazorpayConfig::new(key_id, key_secret)
            .with_currency(self.config.currency.clone());
        Ok(Arc::new(RazorpayGateway::new(config, self.store.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::payment::PaymentProvider;

    fn factory(config: PaymentConfig) -> GatewayFactory {
        GatewayFactory::new(config, Arc::new(InMemoryStore::new()))
    }

    fn razorpay_config() -> PaymentConfig {
        PaymentConfig {
            mode: PaymentMode::Razorpay,
            razorpay_key_id: Some("rzp_test_abc123".to_string()),
            razorpay_key_secret: Some("secret_xyz".to_string()),
            currency: "INR".to_string(),
        }
    }

    #[test]
    fn mock_mode_builds_mock_gateway() {
        let factory = factory(PaymentConfig {
            currency: "INR".to_string(),
            ..Default::default()
        });
        assert_eq!(factory.gateway().provider(), PaymentProvider::Mock);
    }

    #[test]
    fn razorpay_mode_builds_razorpay_gateway() {
        let factory = factory(razorpay_config());
        assert_eq!(factory.gateway().provider(), PaymentProvider::Razorpay);
    }

    #[test]
    fn missing_credentials_fall_back_to_mock() {
        let factory = factory(PaymentConfig {
            razorpay_key_secret: None,
            ..razorpay_config()
        });
        assert_eq!(factory.gateway().provider(), PaymentProvider::Mock);
    }

    #[test]
    fn bad_key_prefix_falls_back_to_mock() {
        let factory = factory(PaymentConfig {
            razorpay_key_id: Some("sk_test_wrong".to_string()),
            ..razorpay_config()
        });
        assert_eq!(factory.gateway().provider(), PaymentProvider::Mock);
    }

    #[test]
    fn gateway_is_cached_across_calls() {
        let factory = factory(razorpay_config());
        let first = factory.gateway();
        let second = factory.gateway();
        assert!(Arc::ptr_eq(&first, &second));
    }
}

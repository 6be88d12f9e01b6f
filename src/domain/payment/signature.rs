//! Razorpay payment signature verification.
//!
//! After checkout, Razorpay hands the client a signature computed as
//! HMAC-SHA256 over `"{order_id}|{payment_id}"` with the API key secret.
//! The server recomputes it and compares in constant time; client-supplied
//! success is never trusted.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Errors from signature verification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("signature is not valid hex")]
    MalformedSignature,

    #[error("signature mismatch")]
    Mismatch,
}

/// Verifier for Razorpay checkout signatures.
pub struct PaymentSignatureVerifier {
    secret: String,
}

impl PaymentSignatureVerifier {
    /// Creates a new verifier with the given key secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Verifies a hex-encoded signature over the provider-defined
    /// `"{order_id}|{payment_id}"` tuple.
    ///
    /// # Errors
    ///
    /// - `MalformedSignature` - the signature is not valid hex
    /// - `Mismatch` - the recomputed HMAC does not match
    pub fn verify(
        &self,
        order_id: &str,
        payment_id: &str,
        signature_hex: &str,
    ) -> Result<(), SignatureError> {
        let provided =
            hex::decode(signature_hex).map_err(|_| SignatureError::MalformedSignature)?;
        let expected = self.compute(order_id, payment_id);

        if !constant_time_compare(&expected, &provided) {
            return Err(SignatureError::Mismatch);
        }
        Ok(())
    }

    /// Computes the expected HMAC-SHA256 signature bytes.
    fn compute(&self, order_id: &str, payment_id: &str) -> Vec<u8> {
        let signed_payload = format!("{}|{}", order_id, payment_id);
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts any key size");
        mac.update(signed_payload.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

/// Performs constant-time comparison of two byte slices.
///
/// Prevents timing attacks that could leak the expected signature.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Computes the hex signature a provider would attach, for test fixtures.
#[cfg(test)]
pub fn sign_for_test(secret: &str, order_id: &str, payment_id: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key size");
    mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "rzp_test_secret_12345";

    #[test]
    fn valid_signature_verifies() {
        let verifier = PaymentSignatureVerifier::new(TEST_SECRET);
        let signature = sign_for_test(TEST_SECRET, "order_abc", "pay_def");

        assert!(verifier.verify("order_abc", "pay_def", &signature).is_ok());
    }

    #[test]
    fn wrong_secret_fails() {
        let verifier = PaymentSignatureVerifier::new("wrong_secret");
        let signature = sign_for_test(TEST_SECRET, "order_abc", "pay_def");

        assert_eq!(
            verifier.verify("order_abc", "pay_def", &signature),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn tampered_order_id_fails() {
        let verifier = PaymentSignatureVerifier::new(TEST_SECRET);
        let signature = sign_for_test(TEST_SECRET, "order_abc", "pay_def");

        assert_eq!(
            verifier.verify("order_xyz", "pay_def", &signature),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn tampered_payment_id_fails() {
        let verifier = PaymentSignatureVerifier::new(TEST_SECRET);
        let signature = sign_for_test(TEST_SECRET, "order_abc", "pay_def");

        assert_eq!(
            verifier.verify("order_abc", "pay_other", &signature),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn non_hex_signature_is_malformed() {
        let verifier = PaymentSignatureVerifier::new(TEST_SECRET);
        assert_eq!(
            verifier.verify("order_abc", "pay_def", "not hex!"),
            Err(SignatureError::MalformedSignature)
        );
    }

    #[test]
    fn truncated_signature_fails() {
        let verifier = PaymentSignatureVerifier::new(TEST_SECRET);
        let signature = sign_for_test(TEST_SECRET, "order_abc", "pay_def");
        let truncated = &signature[..signature.len() - 2];

        assert_eq!(
            verifier.verify("order_abc", "pay_def", truncated),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn constant_time_compare_handles_lengths() {
        assert!(constant_time_compare(&[1, 2, 3], &[1, 2, 3]));
        assert!(!constant_time_compare(&[1, 2, 3], &[1, 2, 4]));
        assert!(!constant_time_compare(&[1, 2], &[1, 2, 3]));
        assert!(constant_time_compare(&[], &[]));
    }
}

//! Webhook signature verification for the payment gateway.
//!
//! The gateway signs `{timestamp}.{raw_body}` with HMAC-SHA256 using the
//! shared API secret and sends the hex digest plus the timestamp as headers.
//! Verification fails closed: any missing or malformed input rejects.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::domain::foundation::Timestamp;

type HmacSha256 = Hmac<Sha256>;

/// Maximum accepted age of a webhook, in seconds. Older deliveries are
/// treated as replays.
const MAX_WEBHOOK_AGE_SECS: i64 = 300;

/// Tolerated clock skew for timestamps slightly in the future, in seconds.
const MAX_CLOCK_SKEW_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("missing signature header")]
    MissingSignature,
    #[error("missing timestamp header")]
    MissingTimestamp,
    #[error("timestamp is not a valid unix epoch value")]
    InvalidTimestamp,
    #[error("webhook timestamp outside the accepted window")]
    TimestampOutOfWindow,
    #[error("signature is not valid hex")]
    InvalidSignatureFormat,
    #[error("signature does not match payload")]
    Mismatch,
}

/// Verifies inbound webhook signatures against the gateway API secret.
///
/// `allow_unverified` is a constructor-time capability, intended only for
/// local sandboxes. Configuration validation refuses to enable it in
/// production; when set, every bypassed verification is logged loudly.
pub struct WebhookVerifier {
    secret: SecretString,
    allow_unverified: bool,
}

impl WebhookVerifier {
    pub fn new(secret: SecretString, allow_unverified: bool) -> Self {
        Self {
            secret,
            allow_unverified,
        }
    }

    /// Verifies the signature over `{timestamp}.{raw_body}`.
    ///
    /// Returns `Ok(())` when the signature is authentic, or when verification
    /// failed but the bypass flag is set (logged as a warning).
    pub fn verify(
        &self,
        signature: Option<&str>,
        timestamp: Option<&str>,
        raw_body: &[u8],
    ) -> Result<(), SignatureError> {
        match self.verify_strict(signature, timestamp, raw_body) {
            Ok(()) => Ok(()),
            Err(err) if self.allow_unverified => {
                tracing::warn!(
                    error = %err,
                    "SIGNATURE VERIFICATION BYPASSED: accepting unverified webhook \
                     because allow_unverified_webhooks is enabled"
                );
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn verify_strict(
        &self,
        signature: Option<&str>,
        timestamp: Option<&str>,
        raw_body: &[u8],
    ) -> Result<(), SignatureError> {
        let signature = signature
            .filter(|s| !s.is_empty())
            .ok_or(SignatureError::MissingSignature)?;
        let timestamp = timestamp
            .filter(|t| !t.is_empty())
            .ok_or(SignatureError::MissingTimestamp)?;

        let ts_secs: i64 = timestamp
            .parse()
            .map_err(|_| SignatureError::InvalidTimestamp)?;
        let age = Timestamp::now().as_unix_secs() - ts_secs;
        if age > MAX_WEBHOOK_AGE_SECS || age < -MAX_CLOCK_SKEW_SECS {
            return Err(SignatureError::TimestampOutOfWindow);
        }

        let provided =
            hex::decode(signature).map_err(|_| SignatureError::InvalidSignatureFormat)?;

        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| SignatureError::Mismatch)?;
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(raw_body);
        let expected = mac.finalize().into_bytes();

        if expected.ct_eq(provided.as_slice()).into() {
            Ok(())
        } else {
            Err(SignatureError::Mismatch)
        }
    }
}

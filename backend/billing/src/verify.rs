use crate::error::{BillingError, BillingResult};

/// Verifies the provider's signature over the raw request body. Webhooks
/// are re-POSTed verbatim on provider retry, so this must run against the
/// exact bytes received, never a re-serialized form.
pub fn verify_signature(secret: &[u8], raw_body: &[u8], signature_header: &str) -> BillingResult<()> {
    if flx_crypto::verify_hmac_hex(secret, raw_body, signature_header) {
        Ok(())
    } else {
        Err(BillingError::BadSignature)
    }
}

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use thiserror::Error;

type HmacSha1 = Hmac<Sha1>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureRejection {
    #[error("signature header is not valid base64")]
    Malformed,
    #[error("signature does not match the request")]
    Mismatch,
}

/// Verify an `X-Twilio-Signature` header against the webhook request.
///
/// Twilio signs the full public URL followed by every POST parameter, sorted
/// by key, as `key` then `value` concatenated, HMAC-SHA1 with the account
/// auth token, base64-encoded.
pub fn verify_signature(
    auth_token: &str,
    url: &str,
    params: &[(String, String)],
    signature: &str,
) -> Result<(), SignatureRejection> {
    let expected = BASE64.decode(signature).map_err(|error| {
        tracing::warn!(event_name = "whatsapp.signature_malformed", %error, "signature header did not decode");
        SignatureRejection::Malformed
    })?;

    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let mut mac = HmacSha1::new_from_slice(auth_token.as_bytes())
        .map_err(|_| SignatureRejection::Malformed)?;
    mac.update(url.as_bytes());
    for (key, value) in sorted {
        mac.update(key.as_bytes());
        mac.update(value.as_bytes());
    }

    mac.verify_slice(&expected).map_err(|_| SignatureRejection::Mismatch)
}

//! ChatGLM request signing and parameter limits
//!
//! The BigModel API does not take the raw key as a bearer token. The key has
//! the form `id.secret`; each request carries a short-lived HS256 JWT whose
//! payload names the id and which is signed with the secret.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};

use super::error::ApiError;

type HmacSha256 = Hmac<Sha256>;

/// Lowest temperature GLM accepts (the range is open at both ends)
const MIN_TEMPERATURE: f32 = 0.01;
const MAX_TEMPERATURE: f32 = 0.99;

/// Sign a bearer token for the given `id.secret` API key
pub fn generate_token(api_key: &str, ttl_ms: u64) -> Result<String, ApiError> {
    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default();
    sign_token(api_key, now_ms, ttl_ms)
}

fn sign_token(api_key: &str, now_ms: u64, ttl_ms: u64) -> Result<String, ApiError> {
    let (id, secret) = api_key
        .trim()
        .split_once('.')
        .filter(|(id, secret)| !id.is_empty() && !secret.is_empty())
        .ok_or_else(|| ApiError::auth("invalid ChatGLM API key, expected `id.secret`"))?;

    let header = json!({"alg": "HS256", "sign_type": "SIGN"});
    let payload = json!({
        "api_key": id,
        "exp": now_ms + ttl_ms,
        "timestamp": now_ms,
    });

    let signing_input = format!("{}.{}", encode_part(&header), encode_part(&payload));
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ApiError::auth(format!("cannot sign ChatGLM token: {}", e)))?;
    mac.update(signing_input.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{}.{}", signing_input, signature))
}

fn encode_part(value: &Value) -> String {
    URL_SAFE_NO_PAD.encode(value.to_string())
}

/// Clamp a temperature into the range GLM accepts
pub fn clamp_temperature(temperature: f32) -> f32 {
    temperature.clamp(MIN_TEMPERATURE, MAX_TEMPERATURE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::error::ErrorKind;

    fn decode(part: &str) -> Value {
        let bytes = URL_SAFE_NO_PAD.decode(part).unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_token_structure() {
        let token = sign_token("abc123.s3cr3t", 1_700_000_000_000, 3_600_000).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3);

        let header = decode(parts[0]);
        assert_eq!(header["alg"], "HS256");
        assert_eq!(header["sign_type"], "SIGN");

        let payload = decode(parts[1]);
        assert_eq!(payload["api_key"], "abc123");
        assert_eq!(payload["timestamp"], 1_700_000_000_000u64);
        assert_eq!(payload["exp"], 1_700_003_600_000u64);
    }

    #[test]
    fn test_signature_verifies() {
        let token = sign_token("abc123.s3cr3t", 42, 1000).unwrap();
        let (signing_input, signature) = token.rsplit_once('.').unwrap();

        let mut mac = HmacSha256::new_from_slice(b"s3cr3t").unwrap();
        mac.update(signing_input.as_bytes());
        let expected = URL_SAFE_NO_PAD.decode(signature).unwrap();
        assert!(mac.verify_slice(&expected).is_ok());
    }

    #[test]
    fn test_malformed_key_is_auth_error() {
        for key in ["", "nodot", ".secret", "id."] {
            let err = sign_token(key, 0, 1000).unwrap_err();
            assert_eq!(err.kind, ErrorKind::AuthError, "{:?}", key);
        }
    }

    #[test]
    fn test_clamp_temperature() {
        assert_eq!(clamp_temperature(0.0), MIN_TEMPERATURE);
        assert_eq!(clamp_temperature(1.0), MAX_TEMPERATURE);
        assert_eq!(clamp_temperature(0.5), 0.5);
    }
}

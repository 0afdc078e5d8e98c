use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use serde::Deserialize;
use serde::Serialize;

use super::errors::JwtError;

/// JWT token handler for a single signing secret.
///
/// Generic over the claims type. Uses HS256 (HMAC with SHA-256), requires an
/// `exp` claim and applies no clock leeway.
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
}

impl JwtHandler {
    /// Create a new JWT handler with a secret key.
    ///
    /// # Arguments
    /// * `secret` - Secret key for signing tokens (at least 32 bytes for HS256)
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
        }
    }

    /// Encode claims into a JWT token.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn encode<T: Serialize>(&self, claims: &T) -> Result<String, JwtError> {
        let header = Header::new(self.algorithm);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Decode and validate a JWT token.
    ///
    /// The signature is checked before the expiry, so a token signed with a
    /// different secret is reported as invalid even when it is also expired.
    ///
    /// # Errors
    /// * `TokenExpired` - `exp` is in the past
    /// * `TokenInvalid` - Signature mismatch, malformed token or claims
    pub fn decode<T: for<'de> Deserialize<'de>>(&self, token: &str) -> Result<T, JwtError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<T>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                _ => JwtError::TokenInvalid(e.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestClaims {
        sub: String,
        exp: i64,
    }

    fn claims_expiring_in(seconds: i64) -> TestClaims {
        TestClaims {
            sub: "user123".to_string(),
            exp: Utc::now().timestamp() + seconds,
        }
    }

    #[test]
    fn test_encode_and_decode() {
        let handler = JwtHandler::new(b"my_secret_key_at_least_32_bytes_long!");
        let claims = claims_expiring_in(60);

        let token = handler.encode(&claims).expect("Failed to encode token");
        assert_eq!(token.split('.').count(), 3);

        let decoded: TestClaims = handler.decode(&token).expect("Failed to decode token");
        assert_eq!(decoded, claims);
    }

    #[test]
    fn test_decode_invalid_token() {
        let handler = JwtHandler::new(b"my_secret_key_at_least_32_bytes_long!");

        let result = handler.decode::<TestClaims>("invalid.token.here");
        assert!(matches!(result, Err(JwtError::TokenInvalid(_))));
    }

    #[test]
    fn test_decode_with_wrong_secret() {
        let handler1 = JwtHandler::new(b"secret1_at_least_32_bytes_long_key!");
        let handler2 = JwtHandler::new(b"secret2_at_least_32_bytes_long_key!");

        let token = handler1.encode(&claims_expiring_in(60)).unwrap();

        let result = handler2.decode::<TestClaims>(&token);
        assert!(matches!(result, Err(JwtError::TokenInvalid(_))));
    }

    #[test]
    fn test_decode_expired() {
        let handler = JwtHandler::new(b"my_secret_key_at_least_32_bytes_long!");
        let token = handler.encode(&claims_expiring_in(-5)).unwrap();

        let result = handler.decode::<TestClaims>(&token);
        assert_eq!(result.unwrap_err(), JwtError::TokenExpired);
    }

    #[test]
    fn test_decode_tampered_payload() {
        let handler = JwtHandler::new(b"my_secret_key_at_least_32_bytes_long!");
        let token = handler.encode(&claims_expiring_in(60)).unwrap();
        let other = handler
            .encode(&TestClaims {
                sub: "someone_else".to_string(),
                exp: Utc::now().timestamp() + 60,
            })
            .unwrap();

        // Splice the payload of one token onto the signature of another.
        let parts: Vec<&str> = token.split('.').collect();
        let other_parts: Vec<&str> = other.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);

        let result = handler.decode::<TestClaims>(&forged);
        assert!(matches!(result, Err(JwtError::TokenInvalid(_))));
    }
}

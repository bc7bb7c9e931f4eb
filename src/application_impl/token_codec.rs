use crate::application_port::{AuthError, TokenClaims, TokenCodec};
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
    // fresh per token, so back-to-back issues for one subject differ
    jti: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

/// HS256 codec over a symmetric key fixed at construction.
pub struct JwtHs256Codec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtHs256Codec {
    pub fn new(secret: &[u8]) -> Self {
        JwtHs256Codec {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    // Zero leeway: the blacklist TTL arithmetic assumes the codec and the
    // expiry claim agree on the exact second a token dies.
    fn validation(validate_exp: bool) -> Validation {
        let mut v = Validation::new(Algorithm::HS256);
        v.leeway = 0;
        v.validate_exp = validate_exp;
        v
    }

    fn timestamp(secs: i64) -> Result<DateTime<Utc>, AuthError> {
        Utc.timestamp_opt(secs, 0)
            .single()
            .ok_or_else(|| AuthError::Internal(format!("claim timestamp out of range: {}", secs)))
    }
}

impl TokenCodec for JwtHs256Codec {
    fn issue(
        &self,
        subject: &str,
        token_type: Option<&str>,
        lifetime: Duration,
    ) -> Result<(String, DateTime<Utc>), AuthError> {
        let iat_dt = Utc::now();
        let exp_dt = iat_dt + lifetime;
        let claims = Claims {
            sub: subject.to_string(),
            iat: iat_dt.timestamp(),
            exp: exp_dt.timestamp(),
            jti: Uuid::new_v4().to_string(),
            typ: token_type.map(str::to_string),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        Ok((token, exp_dt))
    }

    fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &Self::validation(true)).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidSignature,
            },
        )?;
        Ok(TokenClaims {
            subject: data.claims.sub,
            issued_at: Self::timestamp(data.claims.iat)?,
            expires_at: Self::timestamp(data.claims.exp)?,
            token_type: data.claims.typ,
            jti: data.claims.jti,
        })
    }

    fn decode_expiry(&self, token: &str) -> Result<DateTime<Utc>, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &Self::validation(false))
            .map_err(|_| AuthError::InvalidSignature)?;
        Self::timestamp(data.claims.exp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"unit-test-signing-key";

    fn codec() -> JwtHs256Codec {
        JwtHs256Codec::new(SECRET)
    }

    fn encode_raw(claims: &Claims) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap()
    }

    #[test]
    fn roundtrip_preserves_claims() {
        let codec = codec();
        let (token, exp) = codec
            .issue("subject-1", Some("access"), Duration::from_secs(3600))
            .unwrap();

        let claims = codec.verify(&token).unwrap();
        assert_eq!(claims.subject, "subject-1");
        assert_eq!(claims.token_type.as_deref(), Some("access"));
        assert_eq!(claims.expires_at.timestamp(), exp.timestamp());
        assert!(claims.issued_at <= claims.expires_at);
    }

    #[test]
    fn issued_tokens_are_distinct() {
        let codec = codec();
        let (a, _) = codec.issue("s", None, Duration::from_secs(60)).unwrap();
        let (b, _) = codec.issue("s", None, Duration::from_secs(60)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let codec = codec();
        let (token, _) = codec
            .issue("subject-1", None, Duration::from_secs(3600))
            .unwrap();

        let mut tampered = token.clone();
        tampered.pop();
        tampered.push('A');
        assert!(matches!(
            codec.verify(&tampered),
            Err(AuthError::InvalidSignature)
        ));

        let foreign = JwtHs256Codec::new(b"a-different-key");
        assert!(matches!(
            foreign.verify(&token),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn expired_token_is_rejected_as_expired() {
        let now = Utc::now().timestamp();
        let token = encode_raw(&Claims {
            sub: "subject-1".to_string(),
            iat: now - 600,
            exp: now - 300,
            jti: "jti-1".to_string(),
            typ: None,
        });
        assert!(matches!(codec().verify(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn decode_expiry_works_on_expired_tokens() {
        let now = Utc::now().timestamp();
        let token = encode_raw(&Claims {
            sub: "subject-1".to_string(),
            iat: now - 600,
            exp: now - 300,
            jti: "jti-1".to_string(),
            typ: None,
        });

        let exp = codec().decode_expiry(&token).unwrap();
        assert_eq!(exp.timestamp(), now - 300);

        // but a forged token never reaches the expiry claim
        assert!(matches!(
            codec().decode_expiry("not-a-token"),
            Err(AuthError::InvalidSignature)
        ));
    }
}

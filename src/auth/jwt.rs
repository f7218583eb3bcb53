use anyhow::Context;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::{
    auth::{
        claims::{SignedToken, TokenClaims},
        errors::TokenError,
    },
    config::JwtConfig,
};

/// Signs and verifies access tokens with a shared secret.
///
/// Both operations take `now` explicitly so callers decide which clock
/// drives expiry.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    ttl: Duration,
}

impl TryFrom<&JwtConfig> for TokenService {
    type Error = anyhow::Error;

    fn try_from(cfg: &JwtConfig) -> anyhow::Result<Self> {
        let ttl_secs = cfg
            .ttl_minutes
            .checked_mul(60)
            .filter(|secs| *secs > 0)
            .with_context(|| format!("token lifetime of {} minutes is unusable", cfg.ttl_minutes))?;
        Ok(Self::new(
            cfg.secret.as_bytes(),
            cfg.algorithm,
            Duration::seconds(ttl_secs),
        ))
    }
}

impl TokenService {
    pub fn new(secret: &[u8], algorithm: Algorithm, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            algorithm,
            ttl,
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, subject: &str, now: OffsetDateTime) -> anyhow::Result<SignedToken> {
        let exp = now
            .checked_add(self.ttl)
            .context("token expiry falls outside the representable date range")?;
        let claims = TokenClaims {
            sub: subject.to_owned(),
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
        };
        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding)?;
        debug!(sub = %subject, exp = claims.exp, "jwt signed");
        Ok(SignedToken::new(token))
    }

    /// Signature first, then expiry.
    pub fn validate(&self, token: &str, now: OffsetDateTime) -> Result<TokenClaims, TokenError> {
        let data = decode::<TokenClaims>(token, &self.decoding, &self.validation()).map_err(|e| {
            let kind = classify(e.kind());
            debug!(error = %e, reason = %kind, "jwt rejected");
            kind
        })?;

        let claims = data.claims;
        if claims.is_expired_at(now) {
            debug!(sub = %claims.sub, exp = claims.exp, "jwt expired");
            return Err(TokenError::Expired);
        }
        debug!(sub = %claims.sub, "jwt verified");
        Ok(claims)
    }

    // Expiry is checked against the caller's clock, not the library's.
    fn validation(&self) -> Validation {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation
    }
}

fn classify(kind: &ErrorKind) -> TokenError {
    match kind {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm | ErrorKind::MissingAlgorithm => {
            TokenError::InvalidSignature
        }
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const T0: OffsetDateTime = datetime!(2024-01-01 12:00 UTC);

    fn service() -> TokenService {
        TokenService::new(b"test-secret", Algorithm::HS256, Duration::minutes(1))
    }

    fn flip_first_signature_char(token: &str) -> String {
        let (signed, signature) = token.rsplit_once('.').expect("three segments");
        let mut sig: Vec<char> = signature.chars().collect();
        sig[0] = if sig[0] == 'A' { 'B' } else { 'A' };
        format!("{signed}.{}", sig.into_iter().collect::<String>())
    }

    #[test]
    fn issue_and_validate_roundtrip() {
        let tokens = service();
        let token = tokens.issue("alice", T0).expect("sign");
        assert_eq!(token.as_str().split('.').count(), 3);

        let claims = tokens.validate(token.as_str(), T0).expect("verify");
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.iat, T0.unix_timestamp());
        assert_eq!(claims.exp, (T0 + Duration::minutes(1)).unix_timestamp());
    }

    #[test]
    fn token_is_valid_until_the_last_second_of_its_ttl() {
        let tokens = service();
        let token = tokens.issue("alice", T0).unwrap();
        assert!(tokens
            .validate(token.as_str(), T0 + Duration::seconds(59))
            .is_ok());
        assert_eq!(
            tokens.validate(token.as_str(), T0 + Duration::seconds(60)),
            Err(TokenError::Expired)
        );
        assert_eq!(
            tokens.validate(token.as_str(), T0 + Duration::hours(3)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn altered_signature_is_rejected() {
        let tokens = service();
        let token = tokens.issue("alice", T0).unwrap();
        let tampered = flip_first_signature_char(token.as_str());
        assert_ne!(tampered, token.as_str());
        assert_eq!(
            tokens.validate(&tampered, T0),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn signature_is_checked_before_expiry() {
        let tokens = service();
        let token = tokens.issue("alice", T0).unwrap();
        let tampered = flip_first_signature_char(token.as_str());
        assert_eq!(
            tokens.validate(&tampered, T0 + Duration::days(1)),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn swapped_claims_segment_is_rejected() {
        let tokens = service();
        let alice = tokens.issue("alice", T0).unwrap();
        let mallory = tokens.issue("mallory", T0).unwrap();

        let alice_parts: Vec<&str> = alice.as_str().split('.').collect();
        let mallory_parts: Vec<&str> = mallory.as_str().split('.').collect();
        let forged = format!("{}.{}.{}", alice_parts[0], mallory_parts[1], alice_parts[2]);

        assert_eq!(tokens.validate(&forged, T0), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn token_from_another_secret_is_rejected() {
        let ours = service();
        let theirs = TokenService::new(b"other-secret", Algorithm::HS256, Duration::minutes(1));
        let token = theirs.issue("alice", T0).unwrap();
        assert_eq!(
            ours.validate(token.as_str(), T0),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn token_with_other_algorithm_is_rejected() {
        let ours = service();
        let theirs = TokenService::new(b"test-secret", Algorithm::HS512, Duration::minutes(1));
        let token = theirs.issue("alice", T0).unwrap();
        assert_eq!(
            ours.validate(token.as_str(), T0),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn unparseable_tokens_are_malformed() {
        let tokens = service();
        for garbage in ["", "not-a-token", "a.b", "a.b.c", "%%%.%%%.%%%"] {
            assert_eq!(
                tokens.validate(garbage, T0),
                Err(TokenError::Malformed),
                "input {garbage:?}"
            );
        }
    }

    #[test]
    fn signed_tokens_missing_sub_or_exp_are_malformed() {
        let key = EncodingKey::from_secret(b"test-secret");
        let header = Header::new(Algorithm::HS256);
        let exp = (T0 + Duration::minutes(1)).unix_timestamp();
        let no_exp = encode(
            &header,
            &serde_json::json!({"sub": "alice", "iat": T0.unix_timestamp()}),
            &key,
        )
        .unwrap();
        let no_sub = encode(
            &header,
            &serde_json::json!({"iat": T0.unix_timestamp(), "exp": exp}),
            &key,
        )
        .unwrap();

        let tokens = service();
        assert_eq!(tokens.validate(&no_exp, T0), Err(TokenError::Malformed));
        assert_eq!(tokens.validate(&no_sub, T0), Err(TokenError::Malformed));
    }

    #[test]
    fn oversized_lifetime_is_rejected_at_construction() {
        for ttl_minutes in [i64::MAX, i64::MIN, 0, -1] {
            let cfg = JwtConfig {
                secret: "cfg-secret".into(),
                algorithm: Algorithm::HS256,
                ttl_minutes,
            };
            assert!(TokenService::try_from(&cfg).is_err(), "ttl {ttl_minutes}");
        }
    }

    #[test]
    fn issue_errors_instead_of_overflowing_the_calendar() {
        let cfg = JwtConfig {
            secret: "cfg-secret".into(),
            algorithm: Algorithm::HS256,
            ttl_minutes: 10_000_000_000,
        };
        let tokens = TokenService::try_from(&cfg).expect("fits in a Duration");
        let err = tokens.issue("alice", T0).unwrap_err();
        assert!(err.to_string().contains("date range"));

        let forever = TokenService::new(b"test-secret", Algorithm::HS256, Duration::MAX);
        assert!(forever.issue("alice", T0).is_err());
    }

    #[test]
    fn configured_algorithm_and_ttl_are_used() {
        let cfg = JwtConfig {
            secret: "cfg-secret".into(),
            algorithm: Algorithm::HS384,
            ttl_minutes: 5,
        };
        let tokens = TokenService::try_from(&cfg).unwrap();
        assert_eq!(tokens.algorithm(), Algorithm::HS384);
        assert_eq!(tokens.ttl(), Duration::minutes(5));

        let token = tokens.issue("alice", T0).unwrap();
        let header = jsonwebtoken::decode_header(token.as_str()).unwrap();
        assert_eq!(header.alg, Algorithm::HS384);
        assert!(tokens
            .validate(token.as_str(), T0 + Duration::minutes(4))
            .is_ok());
    }
}

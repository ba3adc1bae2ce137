use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::Claims;
use crate::{
    config::{JwtConfig, MAX_TTL_MINUTES},
    error::AppError,
    state::AppState,
};

/// Signing and verification keys, built once from config at startup.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs(cfg.ttl_minutes.clamp(0, MAX_TTL_MINUTES) as u64 * 60),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.issue_at(user_id, OffsetDateTime::now_utc())
    }

    pub(crate) fn issue_at(&self, user_id: Uuid, now: OffsetDateTime) -> anyhow::Result<String> {
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp().max(0) as usize,
            exp: exp.unix_timestamp().max(0) as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "jwt signed");
        Ok(token)
    }

    /// Resolves a token to its subject. Every failure collapses to `InvalidToken`.
    pub fn validate(&self, token: &str) -> Result<Uuid, AppError> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            debug!(error = %e, "jwt rejected");
            AppError::InvalidToken
        })?;
        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(secret: &str, issuer: &str, audience: &str) -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_minutes: 5,
        })
    }

    #[test]
    fn issue_then_validate_returns_subject() {
        let keys = keys("dev-secret", "iss", "aud");
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id).expect("sign");
        assert_eq!(keys.validate(&token).expect("validate"), user_id);
    }

    #[test]
    fn oversized_ttl_is_clamped() {
        let keys = JwtKeys::new(&JwtConfig {
            secret: "dev-secret".into(),
            issuer: "iss".into(),
            audience: "aud".into(),
            ttl_minutes: i64::MAX,
        });
        assert_eq!(keys.ttl().as_secs(), MAX_TTL_MINUTES as u64 * 60);
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id).expect("sign");
        assert_eq!(keys.validate(&token).expect("validate"), user_id);
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = keys("dev-secret", "iss", "aud");
        let two_hours_ago = OffsetDateTime::now_utc() - TimeDuration::hours(2);
        let token = keys.issue_at(Uuid::new_v4(), two_hours_ago).expect("sign");
        assert!(matches!(keys.validate(&token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let ours = keys("secret-a", "iss", "aud");
        let theirs = keys("secret-b", "iss", "aud");
        let token = theirs.issue(Uuid::new_v4()).expect("sign");
        assert!(matches!(ours.validate(&token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn wrong_issuer_or_audience_is_rejected() {
        let good = keys("same-secret", "good-iss", "good-aud");
        let bad = keys("same-secret", "bad-iss", "bad-aud");
        let token = good.issue(Uuid::new_v4()).expect("sign");
        assert!(matches!(bad.validate(&token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn garbage_is_rejected() {
        let keys = keys("dev-secret", "iss", "aud");
        assert!(matches!(keys.validate("not.a.jwt"), Err(AppError::InvalidToken)));
        assert!(matches!(keys.validate(""), Err(AppError::InvalidToken)));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let keys = keys("dev-secret", "iss", "aud");
        let token = keys.issue(Uuid::new_v4()).expect("sign");
        let other = keys.issue(Uuid::new_v4()).expect("sign");
        let mut parts: Vec<&str> = token.split('.').collect();
        let other_payload = other.split('.').nth(1).unwrap();
        parts[1] = other_payload;
        let spliced = parts.join(".");
        assert!(matches!(keys.validate(&spliced), Err(AppError::InvalidToken)));
    }
}

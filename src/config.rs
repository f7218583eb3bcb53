use std::str::FromStr;

use anyhow::{bail, ensure, Context};
use jsonwebtoken::Algorithm;
use serde::Deserialize;
use tracing::warn;

/// Longest accepted token lifetime: one day.
pub const MAX_TTL_MINUTES: i64 = 24 * 60;

/// Fallback signing secret. Only fit for local runs and tests.
pub const DEV_SECRET: &str = "tokenauth-dev-secret";

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub ttl_minutes: i64,
}

/// User registered at startup when `ADMIN_PASSWORD` is set.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub seed_admin: Option<SeedUser>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let secret = match std::env::var("JWT_SECRET") {
            Ok(s) if !s.trim().is_empty() => s,
            _ => {
                warn!("JWT_SECRET not set, signing with the built-in development secret");
                DEV_SECRET.into()
            }
        };
        let algorithm = match std::env::var("JWT_ALGORITHM") {
            Ok(raw) => parse_algorithm(&raw)?,
            Err(_) => Algorithm::HS256,
        };
        let ttl_minutes = match std::env::var("JWT_TTL_MINUTES") {
            Ok(raw) => parse_ttl_minutes(&raw)?,
            Err(_) => 1,
        };

        let port = match std::env::var("APP_PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("APP_PORT `{raw}` is not a port number"))?,
            Err(_) => 8000,
        };

        let seed_admin = std::env::var("ADMIN_PASSWORD")
            .ok()
            .filter(|p| !p.is_empty())
            .map(|password| SeedUser {
                username: std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".into()),
                email: std::env::var("ADMIN_EMAIL")
                    .unwrap_or_else(|_| "admin@example.com".into()),
                password,
            });

        Ok(Self {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port,
            jwt: JwtConfig {
                secret,
                algorithm,
                ttl_minutes,
            },
            seed_admin,
        })
    }
}

pub fn parse_ttl_minutes(raw: &str) -> anyhow::Result<i64> {
    let minutes = raw
        .trim()
        .parse::<i64>()
        .with_context(|| format!("JWT_TTL_MINUTES `{raw}` is not a whole number"))?;
    ensure!(
        (1..=MAX_TTL_MINUTES).contains(&minutes),
        "JWT_TTL_MINUTES must be between 1 and {MAX_TTL_MINUTES}, got {minutes}"
    );
    Ok(minutes)
}

/// Accept only the HMAC family; tokens are signed with a shared secret.
pub fn parse_algorithm(raw: &str) -> anyhow::Result<Algorithm> {
    let alg = Algorithm::from_str(raw.trim())
        .with_context(|| format!("unknown JWT algorithm `{raw}`"))?;
    match alg {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(alg),
        other => bail!("JWT algorithm {other:?} needs a key pair, not a shared secret"),
    }
}

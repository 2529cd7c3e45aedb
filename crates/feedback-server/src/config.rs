use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

/// Ten years. Keeps token expiry well inside chrono's range.
const MAX_SESSION_TTL_HOURS: u64 = 24 * 365 * 10;
/// One week.
const MAX_CLEANUP_INTERVAL_SECS: u64 = 7 * 24 * 3600;

pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub session_ttl_hours: u64,
    pub cleanup_interval_secs: u64,
    /// Argon2 cost as (memory KiB, iterations, parallelism). `None` keeps the
    /// library defaults.
    pub argon2_cost: Option<(u32, u32, u32)>,
}

impl Config {
    /// Read from the environment. Call after `dotenvy::dotenv()`.
    pub fn from_env() -> Result<Self> {
        let jwt_secret = env::var("FEEDBACK_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("FEEDBACK_JWT_SECRET is unset or still a placeholder");
        }

        let argon2_cost = match (
            parse_var::<u32>("FEEDBACK_ARGON2_MEMORY_KIB")?,
            parse_var::<u32>("FEEDBACK_ARGON2_ITERATIONS")?,
            parse_var::<u32>("FEEDBACK_ARGON2_PARALLELISM")?,
        ) {
            (None, None, None) => None,
            (Some(m), Some(t), Some(p)) => Some((m, t, p)),
            _ => bail!("FEEDBACK_ARGON2_* must be set together or not at all"),
        };

        Ok(Self {
            host: env::var("FEEDBACK_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_var("FEEDBACK_PORT")?.unwrap_or(3000),
            db_path: env::var("FEEDBACK_DB_PATH")
                .unwrap_or_else(|_| "feedback.db".into())
                .into(),
            jwt_secret,
            session_ttl_hours: bounded(
                "FEEDBACK_SESSION_TTL_HOURS",
                parse_var("FEEDBACK_SESSION_TTL_HOURS")?.unwrap_or(720), // 30 days
                MAX_SESSION_TTL_HOURS,
            )?,
            cleanup_interval_secs: bounded(
                "FEEDBACK_SESSION_CLEANUP_SECS",
                parse_var("FEEDBACK_SESSION_CLEANUP_SECS")?.unwrap_or(3600),
                MAX_CLEANUP_INTERVAL_SECS,
            )?,
            argon2_cost,
        })
    }
}

fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .with_context(|| format!("invalid value for {name}: {raw:?}")),
        Err(_) => Ok(None),
    }
}

/// Accept `1..=max`. Zero would expire sessions instantly and stall the cleanup timer.
fn bounded(name: &str, value: u64, max: u64) -> Result<u64> {
    if value == 0 || value > max {
        bail!("{name} must be between 1 and {max}, got {value}");
    }
    Ok(value)
}

use serde::Deserialize;

/// Upper bound for `THROTTLE_COOLDOWN_SECS` (one day).
pub const MAX_THROTTLE_COOLDOWN_SECS: u64 = 86_400;

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// PostgreSQL connection string
    pub database_url: String,

    /// Maximum number of PostgreSQL connections in the pool (default: 20)
    pub db_max_connections: u32,

    /// Redis connection string. When set, the notifier shares its send
    /// cooldown across instances through Redis instead of process memory.
    pub redis_url: Option<String>,

    /// HTTP port for the API server (default: 8080)
    pub api_port: u16,

    /// PEM-encoded VAPID private key (P-256) used to sign Web Push requests
    pub vapid_private_key_pem: Option<String>,

    /// VAPID `sub` claim, a mailto: or https: contact URI
    pub vapid_subject: String,

    /// Push service TTL in seconds (default: 30)
    pub push_ttl_seconds: u32,

    /// Minimum interval between two sends to one endpoint (default: 300 = 5 min)
    pub throttle_cooldown_secs: u64,

    /// When set, the notifier repeats a dispatch run on this interval
    /// instead of running once and exiting.
    pub notifier_interval_secs: Option<u64>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?,
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DB_MAX_CONNECTIONS must be a valid u32"))?,
            redis_url: non_empty_var("REDIS_URL"),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("API_PORT must be a valid u16"))?,
            vapid_private_key_pem: non_empty_var("VAPID_PRIVATE_KEY_PEM"),
            vapid_subject: std::env::var("VAPID_SUBJECT")
                .unwrap_or_else(|_| "mailto:example@example.com".to_string()),
            push_ttl_seconds: std::env::var("PUSH_TTL_SECONDS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PUSH_TTL_SECONDS must be a valid u32"))?,
            throttle_cooldown_secs: parse_cooldown_secs(
                &std::env::var("THROTTLE_COOLDOWN_SECS").unwrap_or_else(|_| "300".to_string()),
            )?,
            notifier_interval_secs: non_empty_var("NOTIFIER_INTERVAL_SECS")
                .map(|v| v.parse())
                .transpose()
                .map_err(|_| anyhow::anyhow!("NOTIFIER_INTERVAL_SECS must be a valid u64"))?,
        })
    }
}

/// Parse the send cooldown, rejecting zero and anything above one day.
fn parse_cooldown_secs(raw: &str) -> anyhow::Result<u64> {
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("THROTTLE_COOLDOWN_SECS must be a valid u64"))?;
    if secs == 0 || secs > MAX_THROTTLE_COOLDOWN_SECS {
        anyhow::bail!(
            "THROTTLE_COOLDOWN_SECS must be between 1 and {}",
            MAX_THROTTLE_COOLDOWN_SECS
        );
    }
    Ok(secs)
}

/// Read an environment variable, treating an empty value as unset.
fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cooldown_accepts_sane_values() {
        assert_eq!(parse_cooldown_secs("300").unwrap(), 300);
        assert_eq!(parse_cooldown_secs(" 1 ").unwrap(), 1);
        assert_eq!(
            parse_cooldown_secs("86400").unwrap(),
            MAX_THROTTLE_COOLDOWN_SECS
        );
    }

    #[test]
    fn test_cooldown_rejects_out_of_range() {
        assert!(parse_cooldown_secs("0").is_err());
        assert!(parse_cooldown_secs("86401").is_err());
        assert!(parse_cooldown_secs("18446744073709551615").is_err());
        assert!(parse_cooldown_secs("-1").is_err());
        assert!(parse_cooldown_secs("five").is_err());
    }
}

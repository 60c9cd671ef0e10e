use std::fmt::Display;
use std::net::IpAddr;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::time::Duration;

/// One week.
const MAX_WINDOW_MIN: i64 = 7 * 24 * 60;
/// One week.
const MAX_COOLDOWN_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: IpAddr,
    pub port: u16,
    pub api_token: Option<String>,
    pub log_level: String,
    pub provider: ProviderConfig,
    pub ingestion: IngestionConfig,
    pub detection: DetectionConfig,
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub project_id: Option<String>,
    pub organization_id: Option<String>,
    pub api_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct IngestionConfig {
    pub poll_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct DetectionConfig {
    pub failed_login_window_min: i64,
    pub failed_login_threshold: usize,
    /// Zero keeps the re-fire-on-every-event behaviour.
    pub failed_login_cooldown_secs: i64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            project_id: None,
            organization_id: None,
            api_url: "https://api.scaleway.com".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(300),
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            failed_login_window_min: 15,
            failed_login_threshold: 5,
            failed_login_cooldown_secs: 0,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let env = Env { lookup };

        let database_url = env.required("DATABASE_URL")?;

        let host: IpAddr = env
            .or("AUDITWARDEN_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid AUDITWARDEN_HOST: {e}"))?;

        let port: u16 = env.parsed("AUDITWARDEN_PORT", "8081")?;

        let api_token = env.optional("AUDITWARDEN_API_TOKEN");
        let log_level = env.or("AUDITWARDEN_LOG_LEVEL", "info");

        let provider = ProviderConfig {
            api_key: env.optional("PROVIDER_API_KEY"),
            project_id: env.optional("PROVIDER_PROJECT_ID"),
            organization_id: env.optional("PROVIDER_ORGANIZATION_ID"),
            api_url: env.or("PROVIDER_API_URL", "https://api.scaleway.com"),
            timeout: Duration::from_secs(env.parsed("PROVIDER_TIMEOUT_SECS", "30")?),
        };

        let poll_secs: u64 = env.parsed("POLL_INTERVAL_SECONDS", "300")?;
        if poll_secs == 0 {
            return Err("POLL_INTERVAL_SECONDS must be greater than zero".to_string());
        }

        let detection = DetectionConfig {
            failed_login_window_min: env.bounded(
                "FAILED_LOGIN_WINDOW_MIN",
                "15",
                1..=MAX_WINDOW_MIN,
            )?,
            failed_login_threshold: env.bounded(
                "FAILED_LOGIN_THRESHOLD",
                "5",
                1..=usize::MAX,
            )?,
            failed_login_cooldown_secs: env.bounded(
                "FAILED_LOGIN_COOLDOWN_SECS",
                "0",
                0..=MAX_COOLDOWN_SECS,
            )?,
        };

        Ok(Config {
            database_url,
            host,
            port,
            api_token,
            log_level,
            provider,
            ingestion: IngestionConfig {
                poll_interval: Duration::from_secs(poll_secs),
            },
            detection,
        })
    }
}

struct Env<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn required(&self, key: &str) -> Result<String, String> {
        self.optional(key)
            .ok_or_else(|| format!("Missing required environment variable: {key}"))
    }

    /// Unset and blank are treated the same.
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.trim().is_empty())
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T>(&self, key: &str, default: &str) -> Result<T, String>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.or(key, default)
            .trim()
            .parse()
            .map_err(|e| format!("Invalid {key}: {e}"))
    }

    fn bounded<T>(&self, key: &str, default: &str, range: RangeInclusive<T>) -> Result<T, String>
    where
        T: FromStr + PartialOrd + Display,
        T::Err: Display,
    {
        let value: T = self.parsed(key, default)?;
        if !range.contains(&value) {
            return Err(format!(
                "Invalid {key}: {value} is outside {}..={}",
                range.start(),
                range.end()
            ));
        }
        Ok(value)
    }
}

use anyhow::{anyhow, Result};

/// Every option this binary reads from the environment. No ambient defaults
/// beyond what's listed here -- each field's `default` is what ships when
/// the variable is absent, not a silent fallback for production use.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub auth: AuthConfig,
    pub rate_limiting: RateLimitingConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMode {
    Test,
    Live,
}

impl std::str::FromStr for PaymentMode {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "test" => Ok(PaymentMode::Test),
            "live" => Ok(PaymentMode::Live),
            other => Err(anyhow!("PAYMENT_MODE must be test or live, got {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub preview_hmac_secret: String,
    pub payment_webhook_secret: String,
    pub payment_mode: PaymentMode,
    pub founders_cap: i64,
    pub restriction_months: u32,
    pub claim_window_days: u32,
}

/// HTTP-level throttling for the rate-limited auth endpoints. Not in the
/// external configuration table -- an internal knob, not an env-tunable
/// option.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitingConfig {
    pub requests_per_second: u32,
    pub burst_size: u32,
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self { requests_per_second: 2, burst_size: 10 }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MetricsConfig {
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw.parse().map_err(|_| anyhow!("{key} is set but not parseable")),
        Err(_) => Ok(default),
    }
}

impl AppConfig {
    /// Loads every option from the process environment (via `dotenv`'s
    /// side-loaded `.env` if present). Mirrors the configuration table: no
    /// option is read from anywhere else.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let config = Self {
            server: ServerConfig { host: env_or("SERVER_HOST", "0.0.0.0"), port: env_parse("SERVER_PORT", 8080)? },
            store: StoreConfig { path: env_or("STORE_PATH", "flexion.db") },
            auth: AuthConfig {
                jwt_secret: env_or("JWT_SECRET", ""),
                preview_hmac_secret: env_or("PREVIEW_HMAC_SECRET", ""),
                payment_webhook_secret: env_or("PAYMENT_WEBHOOK_SECRET", ""),
                payment_mode: env_or("PAYMENT_MODE", "test").parse()?,
                founders_cap: env_parse("FOUNDERS_CAP", flx_wallet::founders::FOUNDERS_CAP_DEFAULT)?,
                restriction_months: env_parse("RESTRICTION_MONTHS", 6)?,
                claim_window_days: env_parse("CLAIM_WINDOW_DAYS", 180)?,
            },
            rate_limiting: RateLimitingConfig::default(),
            metrics: MetricsConfig::default(),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.is_empty() {
            return Err(anyhow!("JWT_SECRET must not be empty"));
        }
        if self.auth.preview_hmac_secret.is_empty() {
            return Err(anyhow!("PREVIEW_HMAC_SECRET must not be empty"));
        }
        if self.auth.payment_webhook_secret.is_empty() {
            return Err(anyhow!("PAYMENT_WEBHOOK_SECRET must not be empty"));
        }
        if self.server.port == 0 {
            return Err(anyhow!("SERVER_PORT cannot be 0"));
        }
        if self.store.path.is_empty() {
            return Err(anyhow!("STORE_PATH must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_jwt_secret() {
        let config = AppConfig {
            server: ServerConfig { host: "0.0.0.0".into(), port: 8080 },
            store: StoreConfig { path: "x.db".into() },
            auth: AuthConfig {
                jwt_secret: String::new(),
                preview_hmac_secret: "s".into(),
                payment_webhook_secret: "s".into(),
                payment_mode: PaymentMode::Test,
                founders_cap: flx_wallet::founders::FOUNDERS_CAP_DEFAULT,
                restriction_months: 6,
                claim_window_days: 180,
            },
            rate_limiting: RateLimitingConfig::default(),
            metrics: MetricsConfig::default(),
        };
        assert!(config.validate().is_err());
    }
}

use std::net::IpAddr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: IpAddr,
    pub port: u16,
    pub max_body_size: usize,
    pub log_level: String,
    /// Minutes an OTP stays usable after it is issued.
    pub otp_ttl_minutes: i64,
    pub min_password_length: usize,
    /// Email domains accepted at sign-up, lowercased.
    pub allowed_domains: Vec<String>,
    /// Hours a dead reset row is kept after expiry before the sweeper deletes it.
    pub reset_retention_hours: i64,
    pub sweep_interval_secs: u64,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;

        let host: IpAddr = env_or("MAINTENIX_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid MAINTENIX_HOST: {e}"))?;

        let port: u16 = env_or("MAINTENIX_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid MAINTENIX_PORT: {e}"))?;

        let max_body_size: usize = env_or("MAINTENIX_MAX_BODY_SIZE", "65536")
            .parse()
            .map_err(|e| format!("Invalid MAINTENIX_MAX_BODY_SIZE: {e}"))?;

        let log_level = env_or("MAINTENIX_LOG_LEVEL", "info");

        let otp_ttl_minutes: i64 = env_or("MAINTENIX_OTP_TTL_MINUTES", "10")
            .parse()
            .map_err(|e| format!("Invalid MAINTENIX_OTP_TTL_MINUTES: {e}"))?;
        if otp_ttl_minutes <= 0 {
            return Err("MAINTENIX_OTP_TTL_MINUTES must be positive".to_string());
        }

        let min_password_length: usize = env_or("MAINTENIX_MIN_PASSWORD_LENGTH", "6")
            .parse()
            .map_err(|e| format!("Invalid MAINTENIX_MIN_PASSWORD_LENGTH: {e}"))?;

        let allowed_domains = parse_list(&env_or(
            "MAINTENIX_ALLOWED_DOMAINS",
            "maintenix.com,company.com",
        ));

        let reset_retention_hours: i64 = env_or("MAINTENIX_RESET_RETENTION_HOURS", "24")
            .parse()
            .map_err(|e| format!("Invalid MAINTENIX_RESET_RETENTION_HOURS: {e}"))?;

        let sweep_interval_secs: u64 = env_or("MAINTENIX_SWEEP_INTERVAL_SECS", "300")
            .parse()
            .map_err(|e| format!("Invalid MAINTENIX_SWEEP_INTERVAL_SECS: {e}"))?;

        let smtp = match (
            std::env::var("MAINTENIX_SMTP_HOST").ok(),
            std::env::var("MAINTENIX_SMTP_PORT").ok(),
            std::env::var("MAINTENIX_SMTP_USER").ok(),
            std::env::var("MAINTENIX_SMTP_PASS").ok(),
            std::env::var("MAINTENIX_SMTP_FROM").ok(),
        ) {
            (Some(host), Some(port), Some(user), Some(pass), Some(from)) => Some(SmtpConfig {
                host,
                port: port
                    .parse()
                    .map_err(|e| format!("Invalid MAINTENIX_SMTP_PORT: {e}"))?,
                user,
                pass,
                from,
            }),
            _ => None,
        };

        Ok(Config {
            database_url,
            host,
            port,
            max_body_size,
            log_level,
            otp_ttl_minutes,
            min_password_length,
            allowed_domains,
            reset_retention_hours,
            sweep_interval_secs,
            smtp,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Split a comma-separated list, dropping blanks and lowercasing entries.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

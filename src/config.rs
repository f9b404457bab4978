use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub driver: String,
    pub api_url: String,
    pub api_key: String,
    pub sender_email: String,
    pub sender_name: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetConfig {
    pub otp_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
    pub reset: ResetConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "keyward".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "keyward-users".into()),
            ttl_days: std::env::var("JWT_TTL_DAYS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(7),
        };
        let driver = std::env::var("MAIL_DRIVER").unwrap_or_else(|_| "brevo".into());
        let api_key = if driver == "log" {
            std::env::var("BREVO_API_KEY").unwrap_or_default()
        } else {
            std::env::var("BREVO_API_KEY")?
        };
        let mail = MailConfig {
            driver,
            api_url: std::env::var("MAIL_API_URL")
                .unwrap_or_else(|_| "https://api.brevo.com/v3/smtp/email".into()),
            api_key,
            sender_email: std::env::var("SENDER_EMAIL")?,
            sender_name: std::env::var("SENDER_NAME").unwrap_or_else(|_| "Password Reset".into()),
            timeout_secs: std::env::var("MAIL_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(15),
        };
        let reset = ResetConfig {
            otp_ttl_minutes: std::env::var("RESET_OTP_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(15),
        };
        Ok(Self {
            database_url,
            jwt,
            mail,
            reset,
        })
    }
}

// config.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub app_url: String,
    pub jwt_secret: String,
    /// Minutes.
    pub jwt_maxage: i64,
    pub port: u16,
    pub redis_url: Option<String>,
    pub resend_api_key: Option<String>,
    pub mail_from: String,
    pub allowed_origins: Vec<String>,
    pub appointment_min_lead_days: u64,
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn optional(name: &'static str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T: std::str::FromStr>(name: &'static str, raw: String) -> Result<T, ConfigError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| ConfigError::Invalid { name, value: raw })
}

pub fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().trim_end_matches('/').to_string())
        .filter(|origin| !origin.is_empty())
        .collect()
}

impl Config {
    pub fn init() -> Result<Config, ConfigError> {
        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET_KEY")?;
        let jwt_maxage = parsed::<i64>("JWT_MAXAGE", required("JWT_MAXAGE")?)?;
        let app_url = required("APP_URL")?;

        let port = match optional("PORT") {
            Some(raw) => parsed::<u16>("PORT", raw)?,
            None => 8000,
        };
        let appointment_min_lead_days = match optional("APPOINTMENT_MIN_LEAD_DAYS") {
            Some(raw) => parsed::<u64>("APPOINTMENT_MIN_LEAD_DAYS", raw)?,
            None => 1,
        };

        let allowed_origins = optional("ALLOWED_ORIGINS")
            .map(|raw| split_origins(&raw))
            .unwrap_or_else(|| vec!["http://localhost:5173".to_string()]);

        Ok(Config {
            database_url,
            app_url,
            jwt_secret,
            jwt_maxage,
            port,
            redis_url: optional("REDIS_URL"),
            resend_api_key: optional("RESEND_API_KEY"),
            mail_from: optional("MAIL_FROM")
                .unwrap_or_else(|| "FixNest <noreply@fixnest.app>".to_string()),
            allowed_origins,
            appointment_min_lead_days,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_origins() {
        assert_eq!(
            split_origins("http://localhost:5173/, https://fixnest.app ,,"),
            vec!["http://localhost:5173".to_string(), "https://fixnest.app".to_string()]
        );
    }

    #[test]
    fn test_parsed_reports_name() {
        let err = parsed::<u16>("PORT", "eighty".to_string()).unwrap_err();
        assert_eq!(err.to_string(), "PORT has an invalid value: eighty");
        assert_eq!(parsed::<i64>("JWT_MAXAGE", " 60 ".to_string()).unwrap(), 60);
    }
}

use super::sendmail::send_email;
use crate::config::Config;

const VERIFICATION_TEMPLATE: &str = include_str!("templates/Verification-email.html");
const WELCOME_TEMPLATE: &str = include_str!("templates/Welcome-email.html");

pub async fn send_verification_email(
    config: &Config,
    to_email: &str,
    name: &str,
    token: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let verification_link = create_verification_link(&config.app_url, token);
    let placeholders = vec![
        ("{{name}}".to_string(), name.to_string()),
        ("{{verification_link}}".to_string(), verification_link),
    ];

    send_email(config, to_email, "Verify your email", VERIFICATION_TEMPLATE, &placeholders).await
}

pub async fn send_welcome_email(
    config: &Config,
    to_email: &str,
    name: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let placeholders = vec![
        ("{{name}}".to_string(), name.to_string()),
        ("{{app_url}}".to_string(), config.app_url.clone()),
    ];

    send_email(config, to_email, "Welcome to FixNest", WELCOME_TEMPLATE, &placeholders).await
}

fn create_verification_link(app_url: &str, token: &str) -> String {
    format!("{}/api/auth/verify?token={}", app_url.trim_end_matches('/'), token)
}

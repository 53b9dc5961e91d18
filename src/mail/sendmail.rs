use serde_json::json;

use crate::config::Config;

pub async fn send_email(
    config: &Config,
    to_email: &str,
    subject: &str,
    template: &str,
    placeholders: &[(String, String)],
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if to_email.is_empty() {
        return Err("Email recipient cannot be empty".into());
    }

    let html_body = fill_template(template, placeholders);

    let api_key = match &config.resend_api_key {
        Some(key) => key,
        None => {
            tracing::info!(
                "RESEND_API_KEY not set; email to {} not sent (subject: {})",
                to_email,
                subject
            );
            tracing::debug!("{}", html_body);
            return Ok(());
        }
    };

    let email_id = send_via_resend(api_key, &config.mail_from, to_email, subject, &html_body).await?;
    tracing::info!("Email sent to {} (id: {})", to_email, email_id);
    Ok(())
}

pub fn fill_template(template: &str, placeholders: &[(String, String)]) -> String {
    let mut html = template.to_string();
    for (key, value) in placeholders {
        html = html.replace(key, value);
    }
    html
}

async fn send_via_resend(
    api_key: &str,
    from_email: &str,
    to_email: &str,
    subject: &str,
    html_body: &str,
) -> Result<String, String> {
    let client = reqwest::Client::new();
    let request_body = json!({
        "from": from_email,
        "to": to_email,
        "subject": subject,
        "html": html_body,
    });

    let response = client
        .post("https://api.resend.com/emails")
        .header("Authorization", format!("Bearer {}", api_key))
        .json(&request_body)
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;

    let status = response.status();
    let response_text = response
        .text()
        .await
        .unwrap_or_else(|_| "No response body".to_string());

    if !status.is_success() {
        return Err(format!(
            "Resend API error ({}): {}",
            status.as_u16(),
            response_text
        ));
    }

    let id = serde_json::from_str::<serde_json::Value>(&response_text)
        .ok()
        .and_then(|body| body.get("id").and_then(|v| v.as_str()).map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string());
    Ok(id)
}

//! Email transports.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::Settings;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Preview length for dry-run logging, in characters.
const PREVIEW_CHARS: usize = 300;

/// A fully composed alert email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub reply_to: String,
    pub subject: String,
    pub html_body: String,
}

/// Email delivery. Returns the provider's message id.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &EmailMessage) -> Result<String>;
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    reply_to: &'a str,
    subject: &'a str,
    html: &'a str,
}

#[derive(Deserialize)]
struct SendEmailResponse {
    id: String,
}

/// Mailer for the Resend HTTP email API.
#[derive(Debug, Clone)]
pub struct ResendMailer {
    client: Client,
    api_base: String,
    api_key: String,
}

impl ResendMailer {
    pub fn new(client: Client, api_base: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn from_settings(client: Client, settings: &Settings) -> Self {
        Self::new(
            client,
            &settings.config.mail.api_base,
            &settings.credentials.api_key,
        )
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &EmailMessage) -> Result<String> {
        let body = SendEmailRequest {
            from: &email.from,
            to: [email.to.as_str()],
            reply_to: &email.reply_to,
            subject: &email.subject,
            html: &email.html_body,
        };

        let response = self
            .client
            .post(format!("{}/emails", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(AppError::dispatch)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::dispatch(format!(
                "mail API returned {status}: {detail}"
            )));
        }

        let sent: SendEmailResponse = response.json().await.map_err(AppError::dispatch)?;
        log::info!("Email '{}' sent to {} (id {})", email.subject, email.to, sent.id);
        Ok(sent.id)
    }
}

/// Dry-run mailer that logs the alert instead of sending it.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

impl LogMailer {
    /// Plain-text preview of an HTML body.
    pub fn preview(html: &str) -> String {
        let text = TAG_RE.replace_all(html, " ");
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.chars().count() > PREVIEW_CHARS {
            let cut: String = text.chars().take(PREVIEW_CHARS).collect();
            format!("{cut}...")
        } else {
            text
        }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &EmailMessage) -> Result<String> {
        log::info!("EMAIL SENDING DISABLED - would send to {}", email.to);
        log::info!("Subject: {}", email.subject);
        log::info!("Preview: {}", Self::preview(&email.html_body));
        Ok(format!("dry-run-{}", chrono::Utc::now().timestamp_millis()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn email() -> EmailMessage {
        EmailMessage {
            from: "Notice Watch <alerts@example.edu>".to_string(),
            to: "student@example.com".to_string(),
            reply_to: "student@example.com".to_string(),
            subject: "1 New Notice".to_string(),
            html_body: "<p>Exam form</p>".to_string(),
        }
    }

    #[tokio::test]
    async fn test_resend_send_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/emails"))
            .and(header("authorization", "Bearer re_test"))
            .and(body_json(json!({
                "from": "Notice Watch <alerts@example.edu>",
                "to": ["student@example.com"],
                "reply_to": "student@example.com",
                "subject": "1 New Notice",
                "html": "<p>Exam form</p>",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "msg_123" })))
            .expect(1)
            .mount(&server)
            .await;

        let mailer = ResendMailer::new(Client::new(), format!("{}/", server.uri()), "re_test");
        let id = mailer.send(&email()).await.unwrap();
        assert_eq!(id, "msg_123");
    }

    #[tokio::test]
    async fn test_resend_error_status_is_dispatch_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_string("invalid from"))
            .mount(&server)
            .await;

        let mailer = ResendMailer::new(Client::new(), server.uri(), "re_test");
        let err = mailer.send(&email()).await.unwrap_err();
        assert!(matches!(err, AppError::Dispatch(_)));
        assert!(err.to_string().contains("invalid from"));
    }

    #[tokio::test]
    async fn test_log_mailer_returns_synthetic_id() {
        let id = LogMailer.send(&email()).await.unwrap();
        assert!(id.starts_with("dry-run-"));
    }

    #[test]
    fn test_preview_strips_tags_and_truncates() {
        assert_eq!(
            LogMailer::preview("<h2>2 New</h2>\n<li>Exam</li>"),
            "2 New Exam"
        );
        let long = format!("<p>{}</p>", "પ".repeat(400));
        let preview = LogMailer::preview(&long);
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), PREVIEW_CHARS + 3);
    }
}

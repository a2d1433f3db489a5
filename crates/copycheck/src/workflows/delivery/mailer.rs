use crate::config::{DeliveryConfig, HttpConfig};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

pub const REPORT_SUBJECT: &str = "Your Copycheck Analysis Report";

/// Outbound message carrying the rendered report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportEmail {
    pub to: String,
    pub average_score: f64,
    pub attachment_name: String,
    pub attachment: Vec<u8>,
}

impl ReportEmail {
    pub fn html_body(&self) -> String {
        format!(
            "<h2>Your Copycheck Results</h2>\
             <p>Thank you for using Copycheck!</p>\
             <p>Your overall score is: {:.1}/10</p>\
             <p>A detailed analysis report is attached to this email.</p>\
             <p>Feel free to reach out if you have any questions.</p>\
             <br><p>Best regards,<br>Copycheck Team</p>",
            self.average_score
        )
    }
}

/// Transactional e-mail provider.
#[async_trait]
pub trait ReportMailer: Send + Sync {
    /// Adds the address to the mailing list. Callers treat failures as non-fatal.
    async fn enroll(&self, address: &str) -> Result<(), MailError>;

    async fn send_report(&self, email: &ReportEmail) -> Result<(), MailError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail provider rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("mail transport error: {0}")]
    Transport(String),
    #[error("mailing list is not configured")]
    NoAudience,
}

impl From<reqwest::Error> for MailError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: String,
    attachments: [Attachment<'a>; 1],
}

#[derive(Serialize)]
struct Attachment<'a> {
    filename: &'a str,
    content: String,
}

/// Resend HTTP API client.
pub struct ResendMailer {
    http: reqwest::Client,
    api_key: String,
    sender: String,
    audience_id: Option<String>,
    base_url: String,
}

impl ResendMailer {
    pub fn new(
        api_key: String,
        sender: String,
        config: &DeliveryConfig,
        http: &HttpConfig,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: http.client()?,
            api_key,
            sender,
            audience_id: config.audience_id.clone(),
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post(&self, path: &str, body: &impl Serialize) -> Result<(), MailError> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), %body, "mail provider error response");
        Err(MailError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl ReportMailer for ResendMailer {
    async fn enroll(&self, address: &str) -> Result<(), MailError> {
        let audience_id = self.audience_id.as_deref().ok_or(MailError::NoAudience)?;
        let payload = json!({
            "email": address,
            "first_name": "",
            "last_name": "",
            "data": {
                "source": "copycheck_app",
                "signup_date": Utc::now().to_rfc3339(),
            }
        });
        self.post(&format!("/audiences/{audience_id}/contacts"), &payload)
            .await?;
        info!(audience_id, "contact added to audience");
        Ok(())
    }

    async fn send_report(&self, email: &ReportEmail) -> Result<(), MailError> {
        let request = SendEmailRequest {
            from: &self.sender,
            to: [&email.to],
            subject: REPORT_SUBJECT,
            html: email.html_body(),
            attachments: [Attachment {
                filename: &email.attachment_name,
                content: STANDARD.encode(&email.attachment),
            }],
        };
        self.post("/emails", &request).await?;
        info!("report email sent");
        Ok(())
    }
}

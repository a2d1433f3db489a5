use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;
use url::Url;

use crate::workflows::analysis::{
    analysis_router, AnalysisApiState, AnalysisService, AnalysisSettings, ContentExtractor,
    ModelClient, ModelError,
};
use crate::workflows::delivery::{
    DeliveryService, MailError, PdfReportRenderer, ReportEmail, ReportMailer,
};

pub(super) const STRUCTURED_REPLY: &str = r#"{"scores":{"Clarity":7,"Action":3},"suggestions":{"Clarity":"tighten the opening","Action":"add a CTA"}}"#;

pub(super) const FREE_TEXT_REPLY: &str = "\
1. Empathy (audience understanding)
Score: 8/10
Reasoning: Speaks to the reader.
Improvement: Mention their daily routine.

2. Clarity (clear message)
Score: 6/10
Improvement: Shorten the second paragraph.
";

pub(super) enum Reply {
    Text(String),
    Fail,
}

/// Model stub that records every user text it receives.
pub(super) struct StubModel {
    reply: Reply,
    pub(super) calls: Mutex<Vec<(String, String)>>,
}

impl StubModel {
    pub(super) fn replying(text: &str) -> Self {
        Self {
            reply: Reply::Text(text.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn failing() -> Self {
        Self {
            reply: Reply::Fail,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn user_texts(&self) -> Vec<String> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .iter()
            .map(|(_, user)| user.clone())
            .collect()
    }
}

#[async_trait]
impl ModelClient for StubModel {
    async fn generate(&self, system_prompt: &str, user_text: &str) -> Result<String, ModelError> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push((system_prompt.to_string(), user_text.to_string()));
        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Fail => Err(ModelError::Unavailable { status: 503 }),
        }
    }
}

pub(super) struct StubContent(pub(super) Option<String>);

#[async_trait]
impl ContentExtractor for StubContent {
    async fn extract(&self, _url: &Url) -> Option<String> {
        self.0.clone()
    }
}

#[derive(Default)]
pub(super) struct RecordingMailer {
    pub(super) sent: Mutex<Vec<ReportEmail>>,
    pub(super) reject: bool,
}

#[async_trait]
impl ReportMailer for RecordingMailer {
    async fn enroll(&self, _address: &str) -> Result<(), MailError> {
        Ok(())
    }

    async fn send_report(&self, email: &ReportEmail) -> Result<(), MailError> {
        if self.reject {
            return Err(MailError::Transport("connection reset".to_string()));
        }
        self.sent.lock().expect("mail mutex poisoned").push(email.clone());
        Ok(())
    }
}

pub(super) fn service_with(
    model: Arc<StubModel>,
    content: Option<&str>,
    settings: AnalysisSettings,
) -> AnalysisService {
    AnalysisService::new(
        model,
        Arc::new(StubContent(content.map(str::to_string))),
        settings,
    )
}

pub(super) fn service(model: Arc<StubModel>) -> AnalysisService {
    service_with(model, None, AnalysisSettings::default())
}

pub(super) fn api_state(
    model: Arc<StubModel>,
    mailer: Option<Arc<RecordingMailer>>,
) -> AnalysisApiState {
    let renderer = Arc::new(PdfReportRenderer);
    AnalysisApiState {
        analysis: Arc::new(service(model)),
        renderer: renderer.clone(),
        delivery: mailer.map(|mailer| Arc::new(DeliveryService::new(renderer, mailer, None))),
    }
}

pub(super) fn router(model: Arc<StubModel>, mailer: Option<Arc<RecordingMailer>>) -> axum::Router {
    analysis_router(api_state(model, mailer))
}

pub(super) fn json_request(uri: &str, body: Value) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::post(uri)
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(
            serde_json::to_vec(&body).expect("request serializes"),
        ))
        .expect("request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

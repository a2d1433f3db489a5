use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::extractor::ResponseShape;
use super::report::AnalysisReportView;
use super::service::AnalysisService;
use crate::error::AppError;
use crate::workflows::delivery::{DeliveryService, DocumentRenderer};

/// Shared handles for the analysis endpoints. Delivery is absent when e-mail is not configured.
#[derive(Clone)]
pub struct AnalysisApiState {
    pub analysis: Arc<AnalysisService>,
    pub renderer: Arc<dyn DocumentRenderer>,
    pub delivery: Option<Arc<DeliveryService>>,
}

/// Router builder exposing the analysis endpoints.
pub fn analysis_router(state: AnalysisApiState) -> Router {
    Router::new()
        .route("/api/v1/analyses", post(analyze_handler))
        .route("/api/v1/analyses/pdf", post(pdf_handler))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct AnalysisRequest {
    pub input: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DocumentRequest {
    pub input: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryState {
    Sent,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeliveryStatusView {
    pub status: DeliveryState,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub report: AnalysisReportView,
    pub shape: ResponseShape,
    pub truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery: Option<DeliveryStatusView>,
}

pub(crate) async fn analyze_handler(
    State(state): State<AnalysisApiState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let outcome = state.analysis.analyze(&request.input).await?;

    let address = request
        .email
        .as_deref()
        .map(str::trim)
        .filter(|address| !address.is_empty());
    let delivery = match (address, &state.delivery) {
        (None, _) => None,
        (Some(_), None) => Some(DeliveryStatusView {
            status: DeliveryState::Failed,
            message: "Email delivery is not available right now.".to_string(),
        }),
        (Some(address), Some(delivery)) => {
            Some(match delivery.deliver(&outcome.report, address).await {
                Ok(receipt) => DeliveryStatusView {
                    status: DeliveryState::Sent,
                    message: format!("Report sent to {}.", receipt.address),
                },
                Err(err) => DeliveryStatusView {
                    status: DeliveryState::Failed,
                    message: err.user_message().to_string(),
                },
            })
        }
    };

    Ok(Json(AnalysisResponse {
        report: outcome.report.view(),
        shape: outcome.shape,
        truncated: outcome.truncated,
        delivery,
    }))
}

pub(crate) async fn pdf_handler(
    State(state): State<AnalysisApiState>,
    Json(request): Json<DocumentRequest>,
) -> Result<Response, AppError> {
    let outcome = state.analysis.analyze(&request.input).await?;
    let bytes = state.renderer.render(&outcome.report);
    info!(bytes = bytes.len(), "report document rendered");

    let disposition = format!("attachment; filename=\"{}\"", state.renderer.file_name());
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, state.renderer.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

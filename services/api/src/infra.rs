use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use copycheck::config::{AppConfig, ConfigError};
use copycheck::workflows::analysis::{
    AnalysisApiState, AnalysisService, GroqChatClient, HttpContentExtractor,
};
use copycheck::workflows::delivery::{
    CsvSubscriberLog, DeliveryService, DocumentRenderer, PdfReportRenderer, ResendMailer,
    SubscriberLog,
};
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Analysis pipeline backed by the chat completions API. Requires the model key.
pub(crate) fn build_analysis_service(config: &AppConfig) -> Result<AnalysisService, ConfigError> {
    let api_key = config.model.require_api_key()?;
    let model = GroqChatClient::new(api_key, config.model.clone(), &config.http)
        .map_err(|source| ConfigError::HttpClient { source })?;
    let content = HttpContentExtractor::new(&config.http)
        .map_err(|source| ConfigError::HttpClient { source })?;
    Ok(AnalysisService::new(
        Arc::new(model),
        Arc::new(content),
        config.analysis_settings(),
    ))
}

/// E-mail delivery through Resend. Requires the mail key and sender address.
pub(crate) fn build_delivery_service(
    config: &AppConfig,
    renderer: Arc<dyn DocumentRenderer>,
) -> Result<DeliveryService, ConfigError> {
    let delivery = &config.delivery;
    let mailer = ResendMailer::new(
        delivery.require_api_key()?,
        delivery.require_sender()?,
        delivery,
        &config.http,
    )
    .map_err(|source| ConfigError::HttpClient { source })?;
    if delivery.audience_id.is_none() {
        info!("no mailing list configured; readers will not be enrolled");
    }

    let subscribers = delivery.subscriber_log.as_ref().map(|path| {
        info!(path = %path.display(), "recording subscribers");
        Arc::new(CsvSubscriberLog::new(path)) as Arc<dyn SubscriberLog>
    });

    Ok(DeliveryService::new(renderer, Arc::new(mailer), subscribers))
}

pub(crate) fn build_api_state(config: &AppConfig) -> Result<AnalysisApiState, ConfigError> {
    let renderer: Arc<dyn DocumentRenderer> = Arc::new(PdfReportRenderer);
    let analysis = Arc::new(build_analysis_service(config)?);

    let delivery = match build_delivery_service(config, renderer.clone()) {
        Ok(service) => Some(Arc::new(service)),
        Err(err) => {
            warn!(error = %err, "e-mail delivery disabled");
            None
        }
    };

    Ok(AnalysisApiState {
        analysis,
        renderer,
        delivery,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use copycheck::config::{
        AnalysisConfig, AppEnvironment, DeliveryConfig, HttpConfig, ModelConfig, ServerConfig,
        TelemetryConfig,
    };

    fn config() -> AppConfig {
        AppConfig {
            environment: AppEnvironment::Test,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            telemetry: TelemetryConfig {
                log_level: "info".to_string(),
            },
            http: HttpConfig::default(),
            model: ModelConfig::default(),
            analysis: AnalysisConfig::default(),
            delivery: DeliveryConfig::default(),
        }
    }

    #[test]
    fn analysis_requires_the_model_key() {
        let err = build_api_state(&config()).err().expect("missing key");
        assert!(matches!(err, ConfigError::MissingSecret("GROQ_API_KEY")));
    }

    #[test]
    fn delivery_is_optional() {
        let mut config = config();
        config.model.api_key = Some("gsk_test".to_string());

        let state = build_api_state(&config).expect("state builds");
        assert!(state.delivery.is_none());

        config.delivery.api_key = Some("re_test".to_string());
        config.delivery.sender = Some("Copycheck <hello@example.com>".to_string());
        let state = build_api_state(&config).expect("state builds");
        assert!(state.delivery.is_some());
    }
}

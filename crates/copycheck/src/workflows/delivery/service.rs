use std::sync::Arc;

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{error, info, warn};

use super::document::DocumentRenderer;
use super::mailer::{MailError, ReportEmail, ReportMailer};
use super::subscribers::{SubscriberLog, SubscriberRecord};
use crate::workflows::analysis::AnalysisReport;

static EMAIL_ADDRESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").expect("valid email regex")
});

pub fn is_valid_address(address: &str) -> bool {
    EMAIL_ADDRESS.is_match(address)
}

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("'{0}' is not a valid e-mail address")]
    InvalidAddress(String),
    #[error(transparent)]
    Mail(#[from] MailError),
}

impl DeliveryError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidAddress(_) => "Please enter a valid email address.",
            Self::Mail(_) => {
                "Your analysis is ready, but the report email could not be sent. Please try again later."
            }
        }
    }
}

/// What happened during a successful delivery. Enrollment and logging are best effort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryReceipt {
    pub address: String,
    pub enrolled: bool,
    pub logged: bool,
}

/// Render the report, enroll the reader, e-mail the document and record the subscriber.
pub struct DeliveryService {
    renderer: Arc<dyn DocumentRenderer>,
    mailer: Arc<dyn ReportMailer>,
    subscribers: Option<Arc<dyn SubscriberLog>>,
}

impl DeliveryService {
    pub fn new(
        renderer: Arc<dyn DocumentRenderer>,
        mailer: Arc<dyn ReportMailer>,
        subscribers: Option<Arc<dyn SubscriberLog>>,
    ) -> Self {
        Self {
            renderer,
            mailer,
            subscribers,
        }
    }

    pub async fn deliver(
        &self,
        report: &AnalysisReport,
        address: &str,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let address = address.trim();
        if !is_valid_address(address) {
            return Err(DeliveryError::InvalidAddress(address.to_string()));
        }

        let attachment = self.renderer.render(report);

        let enrolled = match self.mailer.enroll(address).await {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "could not add reader to mailing list");
                false
            }
        };

        let email = ReportEmail {
            to: address.to_string(),
            average_score: report.summary.average_score,
            attachment_name: self.renderer.file_name().to_string(),
            attachment,
        };
        if let Err(err) = self.mailer.send_report(&email).await {
            error!(error = %err, "report email failed");
            return Err(err.into());
        }

        let logged = match &self.subscribers {
            Some(log) => {
                let log = Arc::clone(log);
                let record = SubscriberRecord::from_report(address, report, Utc::now());
                match tokio::task::spawn_blocking(move || log.append(&record)).await {
                    Ok(Ok(())) => true,
                    Ok(Err(err)) => {
                        warn!(error = %err, "subscriber log append failed");
                        false
                    }
                    Err(err) => {
                        warn!(error = %err, "subscriber log task did not complete");
                        false
                    }
                }
            }
            None => false,
        };

        info!(enrolled, logged, "report delivered");
        Ok(DeliveryReceipt {
            address: address.to_string(),
            enrolled,
            logged,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::analysis::{assemble, summarize, Criterion, ScoreEntry, Scorecard};
    use crate::workflows::delivery::document::PdfReportRenderer;
    use crate::workflows::delivery::subscribers::SubscriberLogError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingMailer {
        enrolled: Mutex<Vec<String>>,
        sent: Mutex<Vec<ReportEmail>>,
        reject_enroll: bool,
        reject_send: bool,
    }

    #[async_trait]
    impl ReportMailer for RecordingMailer {
        async fn enroll(&self, address: &str) -> Result<(), MailError> {
            if self.reject_enroll {
                return Err(MailError::NoAudience);
            }
            self.enrolled.lock().unwrap().push(address.to_string());
            Ok(())
        }

        async fn send_report(&self, email: &ReportEmail) -> Result<(), MailError> {
            if self.reject_send {
                return Err(MailError::Rejected {
                    status: 422,
                    body: "invalid sender".to_string(),
                });
            }
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemoryLog {
        rows: Mutex<Vec<SubscriberRecord>>,
    }

    impl SubscriberLog for MemoryLog {
        fn append(&self, record: &SubscriberRecord) -> Result<(), SubscriberLogError> {
            self.rows.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct ThreadLog {
        threads: Mutex<Vec<std::thread::ThreadId>>,
    }

    impl SubscriberLog for ThreadLog {
        fn append(&self, _record: &SubscriberRecord) -> Result<(), SubscriberLogError> {
            self.threads.lock().unwrap().push(std::thread::current().id());
            Ok(())
        }
    }

    struct BrokenLog;

    impl SubscriberLog for BrokenLog {
        fn append(&self, _record: &SubscriberRecord) -> Result<(), SubscriberLogError> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
        }
    }

    fn report() -> AnalysisReport {
        let scorecard: Scorecard = [
            ScoreEntry {
                criterion: Criterion::Clarity,
                score: 7.0,
                suggestion: "tighten the opening".to_string(),
            },
            ScoreEntry {
                criterion: Criterion::Action,
                score: 3.0,
                suggestion: "add a CTA".to_string(),
            },
        ]
        .into_iter()
        .collect();
        let summary = summarize(&scorecard).expect("summary");
        assemble("Buy our shoes.", scorecard, summary).expect("report")
    }

    fn service(mailer: Arc<RecordingMailer>, log: Option<Arc<dyn SubscriberLog>>) -> DeliveryService {
        DeliveryService::new(Arc::new(PdfReportRenderer), mailer, log)
    }

    #[test]
    fn address_validation() {
        assert!(is_valid_address("reader@example.com"));
        assert!(is_valid_address("first.last+tag@mail.example.co.uk"));
        assert!(!is_valid_address("reader@example"));
        assert!(!is_valid_address("not an email"));
        assert!(!is_valid_address("@example.com"));
    }

    #[tokio::test]
    async fn delivers_pdf_and_records_subscriber() {
        let mailer = Arc::new(RecordingMailer::default());
        let log = Arc::new(MemoryLog::default());
        let receipt = service(mailer.clone(), Some(log.clone()))
            .deliver(&report(), " reader@example.com ")
            .await
            .expect("delivered");

        assert_eq!(
            receipt,
            DeliveryReceipt {
                address: "reader@example.com".to_string(),
                enrolled: true,
                logged: true,
            }
        );
        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].attachment_name, "copycheck_analysis.pdf");
        assert!(sent[0].attachment.starts_with(b"%PDF-1.4"));
        assert_eq!(sent[0].average_score, 5.0);

        let rows = log.rows.lock().unwrap();
        assert_eq!(rows[0].lowest_criterion, Some(Criterion::Action));
    }

    #[tokio::test]
    async fn subscriber_log_runs_off_the_async_thread() {
        let log = Arc::new(ThreadLog::default());
        let receipt = service(Arc::new(RecordingMailer::default()), Some(log.clone()))
            .deliver(&report(), "reader@example.com")
            .await
            .expect("delivered");

        assert!(receipt.logged);
        let threads = log.threads.lock().unwrap();
        assert_eq!(threads.len(), 1);
        assert_ne!(threads[0], std::thread::current().id());
    }

    #[tokio::test]
    async fn invalid_address_sends_nothing() {
        let mailer = Arc::new(RecordingMailer::default());
        let err = service(mailer.clone(), None)
            .deliver(&report(), "nobody")
            .await
            .expect_err("rejected");

        assert!(matches!(err, DeliveryError::InvalidAddress(_)));
        assert!(mailer.enrolled.lock().unwrap().is_empty());
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn enrollment_and_log_failures_are_not_fatal() {
        let mailer = Arc::new(RecordingMailer {
            reject_enroll: true,
            ..RecordingMailer::default()
        });
        let receipt = service(mailer.clone(), Some(Arc::new(BrokenLog)))
            .deliver(&report(), "reader@example.com")
            .await
            .expect("delivered");

        assert!(!receipt.enrolled);
        assert!(!receipt.logged);
        assert_eq!(mailer.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn send_failure_is_reported_and_not_logged() {
        let mailer = Arc::new(RecordingMailer {
            reject_send: true,
            ..RecordingMailer::default()
        });
        let log = Arc::new(MemoryLog::default());
        let err = service(mailer, Some(log.clone()))
            .deliver(&report(), "reader@example.com")
            .await
            .expect_err("send fails");

        assert!(matches!(err, DeliveryError::Mail(MailError::Rejected { status: 422, .. })));
        assert_ne!(
            err.user_message(),
            DeliveryError::InvalidAddress(String::new()).user_message()
        );
        assert!(log.rows.lock().unwrap().is_empty());
    }
}

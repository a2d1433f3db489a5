//! Report delivery: PDF rendering, e-mail through the mail provider and the subscriber log.

pub mod document;
pub mod mailer;
pub mod service;
pub mod subscribers;

pub use document::{DocumentRenderer, PdfReportRenderer};
pub use mailer::{MailError, ReportEmail, ReportMailer, ResendMailer, REPORT_SUBJECT};
pub use service::{is_valid_address, DeliveryError, DeliveryReceipt, DeliveryService};
pub use subscribers::{CsvSubscriberLog, SubscriberLog, SubscriberLogError, SubscriberRecord};

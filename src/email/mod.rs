//! Verification email core.
//!
//! Template rendering, the SMTP transport, single-shot dispatch and the
//! validating service the HTTP layer calls.

pub mod dispatcher;
pub mod rest;
pub mod service;
pub mod template;
pub mod transport;
pub mod types;

pub use service::VerificationService;
pub use transport::{Mailer, SmtpMailer};
pub use types::{EmailError, OutboundMessage, SendResult};

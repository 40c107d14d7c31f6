//! SMTP mail service and the report email composition.
//!
//! The [`Mailer`] is a general capability: optional CC/BCC, an HTML body
//! mode with a derived plain-text fallback, and arbitrary attachments. The
//! report flow only ever sends plain text with one CSV attached.

use crate::config::{self, MailConfig};
use crate::error::Error;
use crate::models::{AnalysisResult, OverallStats};
use crate::report::CsvReport;
use chrono::{DateTime, Utc};
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info};

/// An outgoing email, ready to be composed and sent.
#[derive(Debug, Clone, Default)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub cc: Option<String>,
    pub bcc: Option<String>,

    /// Send the body as HTML with a plain-text fallback derived from it.
    pub is_html: bool,

    /// Attachment bytes and the filename to attach them under.
    pub attachment: Option<(String, Vec<u8>)>,
}

/// Mail service speaking STARTTLS-secured SMTP.
#[derive(Debug)]
pub struct Mailer {
    server: String,
    port: u16,
    password: String,
    from: String,
}

impl Mailer {
    /// Build a mailer from configuration.
    ///
    /// Fails with [`Error::Configuration`] before any connection attempt
    /// when a required setting is absent. The sender address doubles as the
    /// SMTP username.
    pub fn from_config(cfg: &MailConfig) -> Result<Self, Error> {
        let server = config::required(&cfg.server, "SMTP_SERVER")?;
        let password = config::required(&cfg.password, "SMTP_PASSWORD")?;
        let from = config::required(&cfg.from_email, "DEFAULT_FROM_EMAIL")?;

        Ok(Self {
            server: server.to_string(),
            port: cfg.port,
            password: password.to_string(),
            from: from.to_string(),
        })
    }

    /// Compose and send one email over a STARTTLS connection.
    ///
    /// Transport failures come back as [`Error::Delivery`] values; the
    /// caller decides how to report them.
    pub async fn send(&self, email: OutgoingEmail) -> Result<(), Error> {
        let message = compose(&self.from, &email)?;
        debug!("Sending email to {} via {}", email.to, self.server);

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.server)
            .map_err(|e| Error::Delivery(e.to_string()))?
            .port(self.port)
            .credentials(Credentials::new(self.from.clone(), self.password.clone()))
            .build();

        transport
            .send(message)
            .await
            .map_err(|e| Error::Delivery(e.to_string()))?;

        info!("Email sent to {}", email.to);
        Ok(())
    }
}

/// Build the MIME message for an outgoing email.
fn compose(from: &str, email: &OutgoingEmail) -> Result<Message, Error> {
    let mut builder = Message::builder()
        .from(parse_mailbox(from)?)
        .to(parse_mailbox(&email.to)?)
        .subject(email.subject.clone());

    if let Some(ref cc) = email.cc {
        builder = builder.cc(parse_mailbox(cc)?);
    }
    if let Some(ref bcc) = email.bcc {
        builder = builder.bcc(parse_mailbox(bcc)?);
    }

    let built = match &email.attachment {
        None if !email.is_html => builder.singlepart(SinglePart::plain(email.body.clone())),
        None => builder.multipart(alternative_body(&email.body)),
        Some((filename, bytes)) => {
            let attachment = Attachment::new(filename.clone())
                .body(bytes.clone(), attachment_content_type()?);

            let content = if email.is_html {
                MultiPart::mixed().multipart(alternative_body(&email.body))
            } else {
                MultiPart::mixed().singlepart(SinglePart::plain(email.body.clone()))
            };

            builder.multipart(content.singlepart(attachment))
        }
    };

    built.map_err(|e| Error::Delivery(format!("failed to build message: {}", e)))
}

/// HTML body with its derived plain-text sibling.
fn alternative_body(html: &str) -> MultiPart {
    MultiPart::alternative_plain_html(html_to_plain(html), html.to_string())
}

/// Crude tag unwrapping for the plain-text fallback of an HTML body.
fn html_to_plain(html: &str) -> String {
    html.replace("<br>", "\n")
        .replace("<p>", "")
        .replace("</p>", "\n")
}

fn parse_mailbox(address: &str) -> Result<Mailbox, Error> {
    address
        .parse()
        .map_err(|_| Error::Configuration(format!("invalid email address: {}", address)))
}

fn attachment_content_type() -> Result<ContentType, Error> {
    ContentType::parse("application/octet-stream")
        .map_err(|e| Error::Delivery(format!("invalid attachment content type: {}", e)))
}

/// Compose and send the daily report email with the CSV attached.
pub async fn send_report(
    cfg: &MailConfig,
    analysis: &AnalysisResult,
    report: &CsvReport,
    now: DateTime<Utc>,
) -> Result<(), Error> {
    let email = compose_report_email(cfg, analysis, report, now)?;
    let mailer = Mailer::from_config(cfg)?;
    mailer.send(email).await
}

/// Build the report email, validating the recipient before anything else.
pub fn compose_report_email(
    cfg: &MailConfig,
    analysis: &AnalysisResult,
    report: &CsvReport,
    now: DateTime<Utc>,
) -> Result<OutgoingEmail, Error> {
    let recipient = config::required(&cfg.recipient, "RECIPIENT_EMAIL")?;

    Ok(OutgoingEmail {
        to: recipient.to_string(),
        subject: report_subject(now),
        body: report_body(&analysis.overall),
        attachment: Some((report.filename.clone(), report.bytes.clone())),
        ..OutgoingEmail::default()
    })
}

/// Subject line carrying the generation date and time.
fn report_subject(now: DateTime<Utc>) -> String {
    format!("API Performance Report - {}", now.format("%Y-%m-%d %H:%M"))
}

/// Plain-text body embedding the overall summary counts.
fn report_body(overall: &OverallStats) -> String {
    format!(
        "Hello,\n\n\
         Please find attached the 24-hour API Performance Report.\n\n\
         SUMMARY:\n\
         - Total API Calls: {}\n\
         - Successful: {} | Failed: {}\n\
         - Apollo Calls: {} | Lusha Calls: {}\n\
         - Phone Numbers Found: {} (Apollo: {}, Lusha: {})\n\n\
         Detailed report is attached as CSV file.\n\n\
         Best regards,\n\
         API Performance Monitor\n",
        overall.total_calls,
        overall.successful_calls,
        overall.failed_calls,
        overall.apollo_calls,
        overall.lusha_calls,
        overall.phone_found_total,
        overall.apollo_phone_found_total,
        overall.lusha_phone_found_total,
    )
}

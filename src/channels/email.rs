//! Email sender — HTML body over SMTP (STARTTLS) via lettre.

use std::path::Path;
use std::sync::LazyLock;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, Message, SmtpTransport, Transport};
use regex::Regex;
use secrecy::ExposeSecret;

use crate::channels::Sender;
use crate::config::EmailConfig;
use crate::error::ChannelError;

/// `[text](url)` link syntax.
static LINK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^\)]+)\)").expect("valid link regex"));

const BODY_STYLE: &str = "font-family: Arial, sans-serif; line-height: 1.6; color: #333;";

/// Email sender — one SMTP session per message, no retry.
pub struct EmailSender {
    config: EmailConfig,
}

impl EmailSender {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn from_mailbox(&self) -> Result<Mailbox, ChannelError> {
        let address: Address = self.config.from_address.parse().map_err(|e| {
            ChannelError::SendFailed {
                name: "email".into(),
                reason: format!("Invalid from address: {e}"),
            }
        })?;
        Ok(Mailbox::new(self.config.from_name.clone(), address))
    }

    /// Build the MIME message, attaching the configured file when it exists.
    pub fn build_message(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<Message, ChannelError> {
        let to: Mailbox = to.parse().map_err(|e| ChannelError::SendFailed {
            name: "email".into(),
            reason: format!("Invalid to address: {e}"),
        })?;

        let builder = Message::builder()
            .from(self.from_mailbox()?)
            .to(to)
            .subject(subject);
        let html = text_to_html(body);

        let attachment = match self.config.attachment.as_deref() {
            Some(path) if path.is_file() => Some(load_attachment(path)?),
            Some(path) => {
                tracing::warn!("Attachment not found: {}", path.display());
                None
            }
            None => None,
        };

        let built = match attachment {
            Some(part) => builder.multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::html(html))
                    .singlepart(part),
            ),
            None => builder.header(ContentType::TEXT_HTML).body(html),
        };

        built.map_err(|e| ChannelError::SendFailed {
            name: "email".into(),
            reason: format!("Failed to build email: {e}"),
        })
    }

    /// Send an email via SMTP.
    fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), ChannelError> {
        let email = self.build_message(to, subject, body)?;

        let creds = Credentials::new(
            self.config.from_address.clone(),
            self.config.password.expose_secret().to_string(),
        );

        let transport = SmtpTransport::starttls_relay(&self.config.smtp_host)
            .map_err(|e| ChannelError::SendFailed {
                name: "email".into(),
                reason: format!("SMTP relay error: {e}"),
            })?
            .port(self.config.smtp_port)
            .credentials(creds)
            .build();

        transport.send(&email).map_err(|e| ChannelError::SendFailed {
            name: "email".into(),
            reason: format!("SMTP send failed: {e}"),
        })?;

        Ok(())
    }
}

#[async_trait]
impl Sender for EmailSender {
    fn name(&self) -> &str {
        "email"
    }

    async fn send(&self, handle: &str, subject: &str, body: &str) -> bool {
        if subject.is_empty() || body.is_empty() {
            tracing::warn!(
                "{}",
                ChannelError::InvalidMessage(format!("empty subject or body for {handle}"))
            );
            return false;
        }

        match self.send_email(handle, subject, body) {
            Ok(()) => {
                tracing::info!("Sent by email to {handle}");
                true
            }
            Err(e) => {
                tracing::error!("Failed to send email: {e}");
                false
            }
        }
    }
}

fn load_attachment(path: &Path) -> Result<SinglePart, ChannelError> {
    let bytes = std::fs::read(path).map_err(|e| ChannelError::SendFailed {
        name: "email".into(),
        reason: format!("Failed to read attachment {}: {e}", path.display()),
    })?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("attachment")
        .to_string();

    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    let mime = if is_pdf {
        "application/pdf"
    } else {
        "application/octet-stream"
    };
    let content_type = ContentType::parse(mime).map_err(|e| ChannelError::SendFailed {
        name: "email".into(),
        reason: format!("Invalid attachment content type: {e}"),
    })?;

    tracing::info!("Attached {filename}");
    Ok(Attachment::new(filename).body(bytes, content_type))
}

/// Convert plain text to a minimal HTML document.
///
/// `[text](url)` becomes an anchor and every newline becomes `<br>`.
pub fn text_to_html(text: &str) -> String {
    let linked = LINK_PATTERN.replace_all(text, r#"<a href="$2">$1</a>"#);
    let html = linked.replace('\n', "<br>\n");
    format!(r#"<html><body style="{BODY_STYLE}">{html}</body></html>"#)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn config(attachment: Option<PathBuf>) -> EmailConfig {
        EmailConfig {
            smtp_host: "smtp.test.com".into(),
            smtp_port: 587,
            from_address: "me@test.com".into(),
            from_name: Some("Test Sender".into()),
            password: secrecy::SecretString::from("pass"),
            attachment,
        }
    }

    fn formatted(msg: &Message) -> String {
        String::from_utf8_lossy(&msg.formatted()).to_string()
    }

    // ── HTML conversion ─────────────────────────────────────────────

    #[test]
    fn html_converts_links_and_newlines() {
        let html = text_to_html("See [here](http://x.com)\nThanks");
        assert!(html.contains(r#"<a href="http://x.com">here</a>"#));
        assert!(html.contains(r#"<a href="http://x.com">here</a><br>"#));
        assert!(html.contains("<br>\nThanks"));
    }

    #[test]
    fn html_wraps_in_styled_body() {
        let html = text_to_html("Hello");
        assert!(html.starts_with("<html><body style=\"font-family: Arial"));
        assert!(html.ends_with(">Hello</body></html>"));
    }

    #[test]
    fn html_handles_multiple_links() {
        let html = text_to_html("[a](http://a.io) and [b](https://b.io/path?q=1)");
        assert!(html.contains(r#"<a href="http://a.io">a</a> and "#));
        assert!(html.contains(r#"<a href="https://b.io/path?q=1">b</a>"#));
    }

    #[test]
    fn html_leaves_unbalanced_brackets() {
        let html = text_to_html("[not a link] (nope)");
        assert!(html.contains("[not a link] (nope)"));
    }

    // ── Message building ────────────────────────────────────────────

    #[test]
    fn build_message_without_attachment_is_html() {
        let sender = EmailSender::new(config(None));
        let msg = sender.build_message("jo@example.com", "Hi Jo", "Body").unwrap();
        let raw = formatted(&msg);
        assert!(raw.contains("Subject: Hi Jo"));
        assert!(raw.contains("text/html"));
        assert!(raw.contains("Test Sender"));
        assert!(!raw.contains("multipart/mixed"));
    }

    #[test]
    fn build_message_attaches_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("presskit.pdf");
        std::fs::write(&path, b"%PDF-1.4 test").unwrap();

        let sender = EmailSender::new(config(Some(path)));
        let msg = sender.build_message("jo@example.com", "Hi", "Body").unwrap();
        let raw = formatted(&msg);
        assert!(raw.contains("multipart/mixed"));
        assert!(raw.contains("presskit.pdf"));
        assert!(raw.contains("application/pdf"));
    }

    #[test]
    fn build_message_skips_missing_attachment() {
        let sender = EmailSender::new(config(Some(PathBuf::from("/nonexistent/kit.pdf"))));
        let msg = sender.build_message("jo@example.com", "Hi", "Body").unwrap();
        assert!(!formatted(&msg).contains("multipart/mixed"));
    }

    #[test]
    fn build_message_rejects_bad_recipient() {
        let sender = EmailSender::new(config(None));
        let err = sender.build_message("not-an-address", "Hi", "Body").unwrap_err();
        assert!(err.to_string().contains("Invalid to address"));
    }

    // ── Sending ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn empty_subject_or_body_is_not_sent() {
        let sender = EmailSender::new(config(None));
        assert!(!sender.send("jo@example.com", "", "Body").await);
        assert!(!sender.send("jo@example.com", "Hi", "").await);
    }

    #[test]
    fn sender_name() {
        assert_eq!(EmailSender::new(config(None)).name(), "email");
    }
}

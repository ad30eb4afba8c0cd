//! Report delivery by mail
//!
//! Messages are composed as MIME text (a plain body, optionally followed by
//! attachments) and handed to a [`MailTransport`]. The default transport
//! pipes the message into `sendmail -oi -t`, which reads the recipients from
//! the headers.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Default location of the sendmail program
pub const SENDMAIL: &str = "/usr/sbin/sendmail";

const LINE_LENGTH: usize = 76;

/// Bytes of text per RFC 2047 encoded word
const ENCODED_WORD_CHUNK: usize = 45;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("Mailer has no sender or no recipients")]
    NotServiceable,

    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Delivery {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    #[default]
    Normal,
    High,
}

impl Priority {
    fn header(self) -> &'static str {
        match self {
            Priority::Normal => "3 (Normal)",
            Priority::High => "1 (Highest)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn html(name: impl Into<String>, document: String) -> Self {
        Self {
            name: name.into(),
            mime_type: "text/html".to_string(),
            data: document.into_bytes(),
        }
    }
}

/// Subject, text body and attachments of one mail
#[derive(Debug, Clone, Default)]
pub struct Message {
    pub subject: String,
    pub body: String,
    pub attachments: Vec<Attachment>,
    pub priority: Priority,
}

/// Delivers a composed message
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(&self, message: &[u8]) -> Result<(), MailError>;
}

/// Transport piping messages into `sendmail -oi -t`
#[derive(Debug, Clone)]
pub struct Sendmail {
    program: PathBuf,
}

impl Sendmail {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for Sendmail {
    fn default() -> Self {
        Self::new(SENDMAIL)
    }
}

#[async_trait]
impl MailTransport for Sendmail {
    async fn deliver(&self, message: &[u8]) -> Result<(), MailError> {
        let program = self.program.display().to_string();
        debug!("Piping {} bytes into {} -oi -t", message.len(), program);

        let mut child = Command::new(&self.program)
            .args(["-oi", "-t"])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| MailError::Spawn {
                program: program.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(message).await?;
            stdin.shutdown().await?;
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(MailError::Delivery {
                program,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Sender and recipients of the run report
#[derive(Clone)]
pub struct Mailer {
    sender: Option<String>,
    recipients: Vec<String>,
    transport: Arc<dyn MailTransport>,
}

impl Mailer {
    /// Mailer delivering through sendmail
    pub fn new() -> Self {
        Self::with_transport(Arc::new(Sendmail::default()))
    }

    pub fn with_transport(transport: Arc<dyn MailTransport>) -> Self {
        Self {
            sender: None,
            recipients: Vec::new(),
            transport,
        }
    }

    pub fn set_sender(&mut self, sender: impl Into<String>) {
        self.sender = Some(sender.into());
    }

    /// Adds a recipient; empty, repeated and multi-line addresses are ignored
    pub fn add_recipient(&mut self, recipient: impl Into<String>) {
        let recipient = recipient.into();
        let recipient = recipient.trim();
        if recipient.contains(['\r', '\n']) {
            warn!("Ignoring recipient with line break: {:?}", recipient);
            return;
        }
        if !recipient.is_empty() && !self.recipients.iter().any(|r| r == recipient) {
            self.recipients.push(recipient.to_string());
        }
    }

    pub fn sender(&self) -> Option<&str> {
        self.sender.as_deref()
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    /// True with a sender and at least one recipient
    pub fn is_serviceable(&self) -> bool {
        self.sender.is_some() && !self.recipients.is_empty()
    }

    /// Compose and deliver `message`
    pub async fn send(&self, message: &Message) -> Result<(), MailError> {
        let sender = match &self.sender {
            Some(sender) if !self.recipients.is_empty() => sender,
            _ => return Err(MailError::NotServiceable),
        };

        let date = chrono::Local::now().to_rfc2822();
        let text = compose(message, sender, &self.recipients, &date);
        self.transport.deliver(text.as_bytes()).await?;

        info!("Sent report to {}", self.recipients.join(", "));
        Ok(())
    }
}

impl Default for Mailer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Mailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.recipients.is_empty() {
            f.write_str("None")
        } else {
            f.write_str(&self.recipients.join(", "))
        }
    }
}

impl fmt::Debug for Mailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mailer")
            .field("sender", &self.sender)
            .field("recipients", &self.recipients)
            .finish_non_exhaustive()
    }
}

/// Render `message` as MIME text
pub fn compose(message: &Message, sender: &str, recipients: &[String], date: &str) -> String {
    let mut out = String::new();
    push_header(&mut out, "From", sender);
    push_header(&mut out, "To", &recipients.join(", "));
    push_header(&mut out, "Subject", &encode_header(&message.subject));
    push_header(&mut out, "Date", date);
    push_header(&mut out, "X-Priority", message.priority.header());
    push_header(&mut out, "MIME-Version", "1.0");

    if message.attachments.is_empty() {
        push_text_part(&mut out, "text/plain", message.body.as_bytes());
        return out;
    }

    let boundary = boundary(message);
    push_header(
        &mut out,
        "Content-Type",
        &format!("multipart/mixed; boundary=\"{boundary}\""),
    );
    out.push('\n');

    out.push_str(&format!("--{boundary}\n"));
    push_text_part(&mut out, "text/plain", message.body.as_bytes());

    for attachment in &message.attachments {
        out.push_str(&format!("--{boundary}\n"));
        if attachment.mime_type.starts_with("text/") {
            push_header(
                &mut out,
                "Content-Type",
                &format!("{}; charset=\"utf-8\"", attachment.mime_type),
            );
        } else {
            push_header(
                &mut out,
                "Content-Type",
                &format!("{}; name=\"{}\"", attachment.mime_type, attachment.name),
            );
        }
        push_header(&mut out, "Content-Transfer-Encoding", "base64");
        push_header(
            &mut out,
            "Content-Disposition",
            &format!("attachment; filename=\"{}\"", attachment.name),
        );
        out.push('\n');
        push_base64(&mut out, &attachment.data);
    }

    out.push_str(&format!("--{boundary}--\n"));
    out
}

/// RFC 2047 encoding for header values that are not plain ASCII
pub fn encode_header(value: &str) -> String {
    if value.is_ascii() {
        return value.to_string();
    }

    let mut words = Vec::new();
    let mut chunk = String::new();
    for c in value.chars() {
        if chunk.len() + c.len_utf8() > ENCODED_WORD_CHUNK {
            words.push(std::mem::take(&mut chunk));
        }
        chunk.push(c);
    }
    if !chunk.is_empty() {
        words.push(chunk);
    }

    words
        .iter()
        .map(|word| format!("=?utf-8?b?{}?=", STANDARD.encode(word)))
        .collect::<Vec<_>>()
        .join("\n ")
}

/// Writes one header line; line breaks other than folding become spaces
fn push_header(out: &mut String, name: &str, value: &str) {
    out.push_str(name);
    out.push_str(": ");
    let mut chars = value.chars().filter(|&c| c != '\r').peekable();
    while let Some(c) = chars.next() {
        if c == '\n' && !matches!(chars.peek(), Some(' ' | '\t')) {
            out.push(' ');
        } else {
            out.push(c);
        }
    }
    out.push('\n');
}

fn push_text_part(out: &mut String, mime_type: &str, data: &[u8]) {
    push_header(out, "Content-Type", &format!("{mime_type}; charset=\"utf-8\""));
    push_header(out, "Content-Transfer-Encoding", "base64");
    out.push('\n');
    push_base64(out, data);
}

fn push_base64(out: &mut String, data: &[u8]) {
    let encoded = STANDARD.encode(data);
    // base64 output is ASCII
    for line in encoded.as_bytes().chunks(LINE_LENGTH) {
        out.push_str(&String::from_utf8_lossy(line));
        out.push('\n');
    }
}

fn boundary(message: &Message) -> String {
    let mut hasher = Sha256::new();
    hasher.update(message.subject.as_bytes());
    hasher.update(message.body.as_bytes());
    for attachment in &message.attachments {
        hasher.update(attachment.name.as_bytes());
        hasher.update(&attachment.data);
    }
    let digest = hasher.finalize();
    let hex: String = digest.iter().take(12).map(|b| format!("{b:02x}")).collect();
    format!("=_sitebackup_{hex}")
}

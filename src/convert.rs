//! Boundary to a hosted document conversion service (e.g. PDF to Word).
//!
//! Vendor SDKs change shape between releases; implementations of
//! [`ConversionService`] absorb that, and callers only ever go through
//! [`convert`]. An implementation is built from a [`RemoteConfig`], so its
//! credentials are never read from process-wide state. The driver itself
//! only needs [`PollSettings`].

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

pub const ENV_ENDPOINT: &str = "PDFDESK_REMOTE_ENDPOINT";
pub const ENV_CLIENT_ID: &str = "PDFDESK_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "PDFDESK_CLIENT_SECRET";

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("remote conversion is not configured: missing {}", .0.join(", "))]
    MissingConfig(Vec<&'static str>),

    #[error("input rejected: {0}")]
    Rejected(String),

    #[error("conversion job {job} failed: {reason}")]
    Failed { job: JobId, reason: String },

    #[error("conversion job {job} did not finish within {timeout:?}")]
    TimedOut { job: JobId, timeout: Duration },

    #[error("conversion service unavailable: {0}")]
    Transport(String),
}

/// What a [`ConversionService`] implementation is constructed from: where the
/// service lives and the credentials to present to it.
#[derive(Clone)]
pub struct RemoteConfig {
    pub endpoint: String,
    pub client_id: String,
    pub client_secret: String,
}

impl RemoteConfig {
    pub fn new(
        endpoint: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        RemoteConfig {
            endpoint: endpoint.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Read settings from the environment. Every missing variable is reported
    /// at once rather than one per attempt.
    pub fn from_env() -> Result<Self, ConversionError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConversionError> {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let endpoint = read(ENV_ENDPOINT);
        let client_id = read(ENV_CLIENT_ID);
        let client_secret = read(ENV_CLIENT_SECRET);

        match (endpoint, client_id, client_secret) {
            (Some(endpoint), Some(client_id), Some(client_secret)) => {
                Ok(RemoteConfig::new(endpoint, client_id, client_secret))
            }
            (endpoint, client_id, client_secret) => {
                let missing = [
                    (endpoint.is_none(), ENV_ENDPOINT),
                    (client_id.is_none(), ENV_CLIENT_ID),
                    (client_secret.is_none(), ENV_CLIENT_SECRET),
                ]
                .into_iter()
                .filter_map(|(missing, key)| missing.then_some(key))
                .collect();
                Err(ConversionError::MissingConfig(missing))
            }
        }
    }
}

impl fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("endpoint", &self.endpoint)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// How [`convert`] waits for a submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        PollSettings {
            poll_interval: Duration::from_secs(2),
            timeout: Duration::from_secs(120),
        }
    }
}

/// Output formats a conversion service can be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFormat {
    Docx,
    Doc,
    Rtf,
    Pptx,
    Xlsx,
}

impl TargetFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            TargetFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            TargetFormat::Doc => "application/msword",
            TargetFormat::Rtf => "application/rtf",
            TargetFormat::Pptx => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
            TargetFormat::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            TargetFormat::Docx => "docx",
            TargetFormat::Doc => "doc",
            TargetFormat::Rtf => "rtf",
            TargetFormat::Pptx => "pptx",
            TargetFormat::Xlsx => "xlsx",
        }
    }
}

/// Handle to a submitted job, as issued by the service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(pub String);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Done,
    Failed(String),
}

/// A hosted conversion API: submit bytes, poll the job, fetch the result.
#[allow(async_fn_in_trait)]
pub trait ConversionService {
    async fn submit(&self, input: &[u8], target: TargetFormat) -> Result<JobId, ConversionError>;

    async fn poll(&self, job: &JobId) -> Result<JobStatus, ConversionError>;

    async fn fetch(&self, job: &JobId) -> Result<Vec<u8>, ConversionError>;
}

/// Run one conversion to completion, polling until the job settles or the
/// configured timeout expires.
pub async fn convert<S: ConversionService>(
    service: &S,
    settings: &PollSettings,
    input: &[u8],
    target: TargetFormat,
) -> Result<Vec<u8>, ConversionError> {
    if input.is_empty() {
        return Err(ConversionError::Rejected("input is empty".to_string()));
    }

    let job = service.submit(input, target).await?;
    info!(%job, mime = target.mime_type(), bytes = input.len(), "conversion submitted");

    match tokio::time::timeout(settings.timeout, wait_for(service, settings, &job)).await {
        Ok(settled) => settled?,
        Err(_) => {
            warn!(%job, timeout = ?settings.timeout, "conversion timed out");
            return Err(ConversionError::TimedOut {
                job,
                timeout: settings.timeout,
            });
        }
    }

    let output = service.fetch(&job).await?;
    info!(%job, bytes = output.len(), "conversion finished");
    Ok(output)
}

async fn wait_for<S: ConversionService>(
    service: &S,
    settings: &PollSettings,
    job: &JobId,
) -> Result<(), ConversionError> {
    loop {
        match service.poll(job).await? {
            JobStatus::Done => return Ok(()),
            JobStatus::Failed(reason) => {
                return Err(ConversionError::Failed {
                    job: job.clone(),
                    reason,
                })
            }
            JobStatus::Pending => {
                debug!(%job, "conversion pending");
                tokio::time::sleep(settings.poll_interval).await;
            }
        }
    }
}

/// Convert a PDF to a Word document.
pub async fn convert_pdf_to_docx<S: ConversionService>(
    service: &S,
    settings: &PollSettings,
    pdf: &[u8],
) -> Result<Vec<u8>, ConversionError> {
    if !pdf.starts_with(b"%PDF-") {
        return Err(ConversionError::Rejected("input is not a PDF".to_string()));
    }
    convert(service, settings, pdf, TargetFormat::Docx).await
}

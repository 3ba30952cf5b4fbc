//! Value types shared by every stage of a delivery.

use crate::{Error, ErrorContext, Result};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Text submitted to the remote service for conversion to audio.
#[derive(Clone)]
pub struct SynthesisRequest {
    text: String,
    model: String,
    credential: String,
}

impl SynthesisRequest {
    /// Validates and builds a request. Text must contain something other than whitespace
    /// and the credential must be non-empty.
    pub fn new(
        text: impl Into<String>,
        model: impl Into<String>,
        credential: impl Into<String>,
    ) -> Result<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(Error::configuration_with_context(
                "No text to synthesize",
                ErrorContext::new().with_field_path("request.text"),
            ));
        }
        let model = model.into();
        if model.trim().is_empty() {
            return Err(Error::configuration_with_context(
                "Model must be specified",
                ErrorContext::new().with_field_path("request.model"),
            ));
        }
        let credential = credential.into();
        if credential.is_empty() {
            return Err(Error::configuration_with_context(
                "API key required",
                ErrorContext::new().with_field_path("request.credential"),
            ));
        }
        Ok(Self {
            text,
            model,
            credential,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub(crate) fn credential(&self) -> &str {
        &self.credential
    }
}

// Keeps the credential out of logs.
impl fmt::Debug for SynthesisRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SynthesisRequest")
            .field("text", &self.text)
            .field("model", &self.model)
            .field("credential", &"<redacted>")
            .finish()
    }
}

/// How synthesized audio reaches the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Write the whole body to disk, then play the file.
    Download,
    /// Pipe bytes into the player as they arrive.
    Stream,
}

impl DeliveryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Download => "download",
            Self::Stream => "stream",
        }
    }
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable delivery settings, fixed before any operation begins.
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    mode: DeliveryMode,
    target: Option<PathBuf>,
    retain: bool,
    verbose: bool,
}

impl DeliveryConfig {
    pub fn builder(mode: DeliveryMode) -> DeliveryConfigBuilder {
        DeliveryConfigBuilder::new(mode)
    }

    pub fn mode(&self) -> DeliveryMode {
        self.mode
    }

    /// Output file, present iff the audio is persisted to disk.
    pub fn target(&self) -> Option<&Path> {
        self.target.as_deref()
    }

    pub fn retain(&self) -> bool {
        self.retain
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

pub struct DeliveryConfigBuilder {
    mode: DeliveryMode,
    target: Option<PathBuf>,
    save: bool,
    retain: bool,
    verbose: bool,
}

impl DeliveryConfigBuilder {
    pub fn new(mode: DeliveryMode) -> Self {
        Self {
            mode,
            target: None,
            save: true,
            retain: false,
            verbose: false,
        }
    }

    pub fn target(mut self, path: impl Into<PathBuf>) -> Self {
        self.target = Some(path.into());
        self
    }

    /// Disable the file sink. Only honored in stream mode; download mode always needs a file.
    pub fn save(mut self, save: bool) -> Self {
        self.save = save;
        self
    }

    pub fn retain(mut self, retain: bool) -> Self {
        self.retain = retain;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn build(self) -> DeliveryConfig {
        let persist = self.mode == DeliveryMode::Download || self.save;
        let target = if persist {
            Some(self.target.unwrap_or_else(default_target))
        } else {
            None
        };
        DeliveryConfig {
            mode: self.mode,
            target,
            retain: self.retain,
            verbose: self.verbose,
        }
    }
}

/// Fresh uuid-named file in the OS temp directory.
pub fn default_target() -> PathBuf {
    std::env::temp_dir().join(format!("speakstream-{}.mp3", uuid::Uuid::new_v4()))
}

/// Summary of a successful delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    pub mode: DeliveryMode,
    /// Bytes received from the synthesis endpoint.
    pub bytes: u64,
    /// Program of the player that ran to completion.
    pub player: String,
    /// Output file left on disk, if any.
    pub retained_file: Option<PathBuf>,
}

/// Result of one synthesis + delivery cycle.
pub type TransferOutcome = Result<DeliveryReport>;

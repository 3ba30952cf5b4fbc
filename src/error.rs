use std::path::PathBuf;
use thiserror::Error;

/// Structured error context for better error reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Configuration key or request field that caused the error (e.g., "request.text", "credential")
    pub field_path: Option<String>,
    /// Additional context about the error
    pub details: Option<String>,
    /// Component that raised the error (e.g., "transport", "locator")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Failure of the external player process.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("player '{program}' could not be started: {source}")]
    Unavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("player '{program}' exited with {}", format_exit(.code))]
    ExitCode { program: String, code: Option<i32> },
}

fn format_exit(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {}", c),
        None => "no status (terminated by signal)".to_string(),
    }
}

/// Unified error type for a synthesis and delivery cycle.
///
/// Every variant aborts the rest of the invocation; nothing is retried.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Network error: {message}{}", format_context(.context))]
    Network {
        message: String,
        context: ErrorContext,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("Remote error: HTTP {status}")]
    Http { status: u16 },

    #[error("No audio player available for {platform} in {mode} mode{}", format_details(.details))]
    NoPlayer {
        platform: String,
        mode: String,
        details: Option<String>,
    },

    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    #[error("File system error at {}: {source}", .path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

fn format_details(details: &Option<String>) -> String {
    match details {
        Some(d) => format!(": {}", d),
        None => String::new(),
    }
}

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration {
            message: msg.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Create a new network error wrapping the underlying HTTP failure
    pub fn network_with_context(
        msg: impl Into<String>,
        source: reqwest::Error,
        context: ErrorContext,
    ) -> Self {
        Error::Network {
            message: msg.into(),
            context,
            source: Some(source),
        }
    }

    pub fn file_system(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::FileSystem {
            path: path.into(),
            source,
        }
    }

    /// Stable classification used when reporting a failed invocation.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Configuration { .. } => "config_error",
            Error::Network { .. } => "network_error",
            Error::Http { .. } => "http_error",
            Error::NoPlayer { .. } => "no_player",
            Error::Playback(_) => "playback_error",
            Error::FileSystem { .. } => "file_system_error",
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } | Error::Network { context, .. } => Some(context),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(Error::configuration("missing text").kind(), "config_error");
        assert_eq!(Error::Http { status: 401 }.kind(), "http_error");
        let err = Error::NoPlayer {
            platform: "plan9".into(),
            mode: "stream".into(),
            details: None,
        };
        assert_eq!(err.kind(), "no_player");
        let err: Error = PlaybackError::ExitCode {
            program: "mpv".into(),
            code: Some(2),
        }
        .into();
        assert_eq!(err.kind(), "playback_error");
    }

    #[test]
    fn test_display_includes_context() {
        let err = Error::configuration_with_context(
            "API key required",
            ErrorContext::new()
                .with_field_path("credential")
                .with_source("cli"),
        );
        assert_eq!(
            err.to_string(),
            "Configuration error: API key required (field: credential, source: cli)"
        );
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("credential")
        );
    }

    #[test]
    fn test_exit_code_display() {
        let err = PlaybackError::ExitCode {
            program: "ffplay".into(),
            code: Some(1),
        };
        assert_eq!(err.to_string(), "player 'ffplay' exited with status 1");
        let err = PlaybackError::ExitCode {
            program: "ffplay".into(),
            code: None,
        };
        assert!(err.to_string().contains("signal"));
    }

    #[test]
    fn test_file_system_display() {
        let err = Error::file_system(
            "/tmp/out.mp3",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.kind(), "file_system_error");
        assert!(err.to_string().starts_with("File system error at /tmp/out.mp3"));
    }
}

//! speakstream: 把文本交给远程语音合成服务并播放结果
//!
//! Usage:
//!   speakstream [OPTIONS] <TEXT>...
//!   echo "Hello" | speakstream --stream --no-save

use clap::Parser;
use speakstream::transport::DEFAULT_BASE_URL;
use speakstream::{
    CustomPlayer, Delivery, DeliveryConfig, DeliveryMode, Error, ErrorContext, Player,
    PlayerLocator, SpeechTransport, SynthesisRequest,
};
use std::io::{IsTerminal, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "speakstream",
    version,
    about = "Speak text through a remote text-to-speech API",
    after_help = "Text is read from stdin when no TEXT argument is given."
)]
struct Cli {
    /// Text to synthesize
    text: Vec<String>,

    /// Voice model identifier
    #[arg(short, long, env = "SPEAKSTREAM_MODEL", default_value = "aura-asteria-en")]
    model: String,

    /// API credential
    #[arg(short = 'k', long, env = "DEEPGRAM_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Start playback while audio is still downloading
    #[arg(short, long)]
    stream: bool,

    /// Output file (kept after playback)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Do not write a file while streaming
    #[arg(long)]
    no_save: bool,

    /// Keep the output file after playback
    #[arg(long)]
    keep: bool,

    /// Player command line; `{input}` is replaced by the file path or `-`
    #[arg(long, env = "SPEAKSTREAM_PLAYER", value_name = "COMMAND")]
    player: Option<String>,

    /// Synthesis API base URL
    #[arg(long, env = "SPEAKSTREAM_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Print the delivery report as JSON
    #[arg(long)]
    json: bool,

    /// Debug logging and player diagnostics
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error[{}]: {}", e.kind(), e);
            match e {
                Error::Configuration { .. } => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "speakstream=debug"
    } else {
        "speakstream=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run(cli: Cli) -> speakstream::Result<()> {
    let text = resolve_text(&cli.text)?;
    let credential = cli.api_key.clone().ok_or_else(|| {
        Error::configuration_with_context(
            "API key required: pass --api-key or set DEEPGRAM_API_KEY",
            ErrorContext::new()
                .with_field_path("credential")
                .with_source("cli"),
        )
    })?;
    let request = SynthesisRequest::new(text, cli.model.as_str(), credential)?;
    let config = delivery_config(&cli);

    let transport = SpeechTransport::builder()
        .base_url(cli.base_url.as_str())
        .build()?;
    let mut locator = PlayerLocator::current();
    if let Some(command) = cli.player.as_deref() {
        let custom = CustomPlayer::parse(command).ok_or_else(|| {
            Error::configuration_with_context(
                "Player command is empty",
                ErrorContext::new().with_field_path("player").with_source("cli"),
            )
        })?;
        locator = locator.with_candidates(vec![Player::Custom(custom)]);
    }

    let report = Delivery::new(transport, locator)
        .deliver(&request, &config)
        .await?;

    if cli.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => tracing::warn!(error = %e, "failed to serialize delivery report"),
        }
    } else if let Some(path) = &report.retained_file {
        println!("Saved audio to {}", path.display());
    }
    Ok(())
}

fn delivery_config(cli: &Cli) -> DeliveryConfig {
    let mode = if cli.stream {
        DeliveryMode::Stream
    } else {
        DeliveryMode::Download
    };
    let mut builder = DeliveryConfig::builder(mode)
        .save(!cli.no_save)
        .retain(cli.keep || cli.output.is_some())
        .verbose(cli.verbose);
    if let Some(output) = &cli.output {
        builder = builder.target(output.clone());
    }
    builder.build()
}

/// Joins positional words, falling back to piped stdin.
fn resolve_text(words: &[String]) -> speakstream::Result<String> {
    if !words.is_empty() {
        return Ok(words.join(" "));
    }
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Err(Error::configuration_with_context(
            "No text given",
            ErrorContext::new().with_field_path("text").with_source("cli"),
        ));
    }
    let mut text = String::new();
    stdin.lock().read_to_string(&mut text).map_err(|e| {
        Error::configuration_with_context(
            "Failed to read text from stdin",
            ErrorContext::new()
                .with_field_path("text")
                .with_details(e.to_string())
                .with_source("cli"),
        )
    })?;
    Ok(text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_download_with_cleanup() {
        let cli = Cli::parse_from(["speakstream", "-k", "key", "Hello", "world"]);
        assert_eq!(resolve_text(&cli.text).unwrap(), "Hello world");
        let config = delivery_config(&cli);
        assert_eq!(config.mode(), DeliveryMode::Download);
        assert!(config.target().is_some());
        assert!(!config.retain());
    }

    #[test]
    fn test_stream_no_save_has_no_file() {
        let cli = Cli::parse_from(["speakstream", "--stream", "--no-save", "Hi"]);
        let config = delivery_config(&cli);
        assert_eq!(config.mode(), DeliveryMode::Stream);
        assert!(config.target().is_none());
    }

    #[test]
    fn test_explicit_output_is_retained() {
        let cli = Cli::parse_from(["speakstream", "-o", "/tmp/hello.mp3", "Hi"]);
        let config = delivery_config(&cli);
        assert_eq!(config.target(), Some(std::path::Path::new("/tmp/hello.mp3")));
        assert!(config.retain());
    }
}

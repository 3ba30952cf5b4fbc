//! # speakstream
//!
//! 命令行语音合成客户端：把文本提交给远程 TTS 服务，并在下载完成后或边下载边播放音频。
//!
//! Text-to-speech delivery pipeline: submit text to a remote synthesis endpoint and
//! play the returned audio through an already-installed platform player.
//!
//! ## Delivery Modes
//!
//! - **Download**: the response body is written to a file, synced, then played.
//! - **Stream**: a player is spawned first and every received chunk is piped into its
//!   stdin (and, optionally, copied into a file) in arrival order.
//!
//! Audio is never decoded in-process; playback is delegated to an external executable
//! (`afplay`, `mpv`, `ffplay`, `aplay`, or a user-supplied command).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use speakstream::{
//!     DeliveryConfig, DeliveryMode, Delivery, PlayerLocator, SpeechTransport, SynthesisRequest,
//! };
//!
//! #[tokio::main]
//! async fn main() -> speakstream::Result<()> {
//!     let transport = SpeechTransport::builder().build()?;
//!     let delivery = Delivery::new(transport, PlayerLocator::current());
//!
//!     let request = SynthesisRequest::new("Hello world", "aura-asteria-en", "your-api-key")?;
//!     let config = DeliveryConfig::builder(DeliveryMode::Stream).save(false).build();
//!
//!     let report = delivery.deliver(&request, &config).await?;
//!     println!("played {} bytes with {}", report.bytes, report.player);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`types`] | Request, delivery configuration and outcome types |
//! | [`transport`] | HTTP client for the synthesis endpoint |
//! | [`player`] | Player selection and external process lifecycle |
//! | [`delivery`] | Download/stream orchestration |
//! | [`cleanup`] | Best-effort output file removal |

pub mod cleanup;
pub mod delivery;
pub mod player;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use delivery::{Delivery, DeliveryState};
pub use player::{CustomPlayer, Platform, Player, PlayerLocator};
pub use transport::{SpeechTransport, SpeechTransportBuilder};
pub use types::{
    DeliveryConfig, DeliveryConfigBuilder, DeliveryMode, DeliveryReport, SynthesisRequest,
    TransferOutcome,
};

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A pinned, boxed stream of fallible items
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = Result<T>> + Send + 'a>>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext, PlaybackError};

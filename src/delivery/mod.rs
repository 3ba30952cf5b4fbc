//! 交付模块：协调网络下载与外部播放进程。
//!
//! Transfer orchestration.
//!
//! [`Delivery`] runs one synthesis request through either delivery mode:
//!
//! | Mode | Order of work |
//! |------|---------------|
//! | Download | locate players → request → write file → sync → play file → cleanup |
//! | Stream | locate + spawn player → request → forward chunks to player (+ file) → half-close → wait → cleanup |
//!
//! Each stage is logged as a [`DeliveryState`] transition.

mod sink;

pub use sink::{forward, AudioSink, FileSink};

use crate::cleanup::cleanup;
use crate::player::{play_file, AudioInput, Player, PlaybackSession, PlayerLocator};
use crate::transport::SpeechTransport;
use crate::types::{DeliveryConfig, DeliveryMode, DeliveryReport, SynthesisRequest, TransferOutcome};
use crate::{BoxStream, Error, Result};
use bytes::Bytes;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// Stages of a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    Idle,
    Requesting,
    Downloading,
    Streaming,
    PlayingBack,
    CleaningUp,
    Done,
    Failed,
}

impl fmt::Display for DeliveryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Requesting => "requesting",
            Self::Downloading => "downloading",
            Self::Streaming => "streaming",
            Self::PlayingBack => "playing_back",
            Self::CleaningUp => "cleaning_up",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

fn enter(state: DeliveryState) {
    debug!(state = %state, "delivery state");
}

/// Synthesis + playback orchestrator for a single invocation.
pub struct Delivery {
    transport: SpeechTransport,
    locator: PlayerLocator,
}

impl Delivery {
    pub fn new(transport: SpeechTransport, locator: PlayerLocator) -> Self {
        Self { transport, locator }
    }

    pub fn locator(&self) -> &PlayerLocator {
        &self.locator
    }

    /// Run one request to completion. Every failure aborts the rest of the cycle.
    pub async fn deliver(
        &self,
        request: &SynthesisRequest,
        config: &DeliveryConfig,
    ) -> TransferOutcome {
        enter(DeliveryState::Idle);
        info!(
            mode = %config.mode(),
            model = request.model(),
            platform = %self.locator.platform(),
            "starting delivery"
        );
        let outcome = match config.mode() {
            DeliveryMode::Download => self.download(request, config).await,
            DeliveryMode::Stream => self.stream(request, config).await,
        };
        match &outcome {
            Ok(report) => {
                enter(DeliveryState::Done);
                info!(bytes = report.bytes, player = report.player.as_str(), "delivery complete");
            }
            Err(e) => {
                enter(DeliveryState::Failed);
                debug!(kind = e.kind(), error = %e, "delivery failed");
            }
        }
        outcome
    }

    async fn download(
        &self,
        request: &SynthesisRequest,
        config: &DeliveryConfig,
    ) -> TransferOutcome {
        let target = config
            .target()
            .ok_or_else(|| Error::configuration("Download mode requires an output file"))?;
        let candidates = self.locator.candidates(DeliveryMode::Download)?;

        enter(DeliveryState::Requesting);
        let body = self.transport.synthesize(request).await?;

        enter(DeliveryState::Downloading);
        let file = FileSink::create(target).await?;
        let result = download_and_play(body, file, &candidates, config.verbose()).await;

        enter(DeliveryState::CleaningUp);
        cleanup(target, !config.retain()).await;

        let (bytes, player) = result?;
        Ok(report(config, bytes, player))
    }

    async fn stream(&self, request: &SynthesisRequest, config: &DeliveryConfig) -> TransferOutcome {
        let player = self.locator.locate(DeliveryMode::Stream)?;
        let mut session = PlaybackSession::spawn(&player, AudioInput::Stdin, config.verbose())
            .map_err(|e| Error::NoPlayer {
                platform: self.locator.platform().to_string(),
                mode: DeliveryMode::Stream.to_string(),
                details: Some(e.to_string()),
            })?;

        enter(DeliveryState::Requesting);
        let body = match self.transport.synthesize(request).await {
            Ok(body) => body,
            Err(e) => {
                session.abandon();
                return Err(e);
            }
        };

        enter(DeliveryState::Streaming);
        let mut file = match config.target() {
            Some(path) => match FileSink::create(path).await {
                Ok(file) => Some(file),
                Err(e) => {
                    session.abandon();
                    return Err(e);
                }
            },
            None => None,
        };

        let forwarded = {
            let mut sinks: Vec<&mut dyn AudioSink> = Vec::with_capacity(2);
            sinks.push(&mut session);
            if let Some(file) = file.as_mut() {
                sinks.push(file);
            }
            forward(body, &mut sinks).await
        };
        session.close_input().await;
        let closed = match file {
            Some(file) => file.close().await,
            None => Ok(()),
        };

        enter(DeliveryState::PlayingBack);
        let program = session.program().to_string();
        let played = session.wait().await;

        if let Some(path) = config.target() {
            enter(DeliveryState::CleaningUp);
            cleanup(path, !config.retain()).await;
        }

        let bytes = forwarded?;
        closed?;
        played?;
        Ok(report(config, bytes, program))
    }
}

/// Write the whole body to `file`, sync it, then play it.
async fn download_and_play(
    body: BoxStream<'static, Bytes>,
    mut file: FileSink,
    candidates: &[Player],
    verbose: bool,
) -> Result<(u64, String)> {
    let bytes = forward(body, &mut [&mut file]).await?;
    let path = file.path().to_path_buf();
    file.close().await?;
    debug!(bytes, path = %path.display(), "download complete");

    enter(DeliveryState::PlayingBack);
    let player = play_file(candidates, &path, verbose).await?;
    Ok((bytes, player))
}

fn report(config: &DeliveryConfig, bytes: u64, player: String) -> DeliveryReport {
    DeliveryReport {
        mode: config.mode(),
        bytes,
        player,
        retained_file: config
            .target()
            .filter(|_| config.retain())
            .map(Path::to_path_buf),
    }
}

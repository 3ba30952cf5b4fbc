//! Lifecycle of the external player process.

use super::locator::{AudioInput, Player};
use crate::error::PlaybackError;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin};
use tracing::{debug, info, warn};

/// One running player process.
///
/// In stream mode the session owns the write end of the player's stdin pipe.
pub struct PlaybackSession {
    program: String,
    child: Child,
    input: Option<ChildStdin>,
}

impl PlaybackSession {
    /// Spawn `player` reading from `input`. The player's stdout is always discarded;
    /// stderr is inherited only when `verbose` is set.
    pub fn spawn(
        player: &Player,
        input: AudioInput<'_>,
        verbose: bool,
    ) -> Result<Self, PlaybackError> {
        let program = player.program().to_string();
        let mut cmd = player.command(input);
        cmd.stdout(Stdio::null()).stderr(if verbose {
            Stdio::inherit()
        } else {
            Stdio::null()
        });
        cmd.stdin(match input {
            AudioInput::Stdin => Stdio::piped(),
            AudioInput::File(_) => Stdio::null(),
        });

        let mut child = cmd.spawn().map_err(|source| PlaybackError::Unavailable {
            program: program.clone(),
            source,
        })?;
        let input = child.stdin.take();
        debug!(program = program.as_str(), pid = child.id(), "spawned player");
        Ok(Self {
            program,
            child,
            input,
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn is_input_open(&self) -> bool {
        self.input.is_some()
    }

    /// Forward a chunk to the player's stdin. Once the pipe is closed (or the player
    /// stopped reading) further chunks are dropped.
    pub async fn feed(&mut self, chunk: &[u8]) {
        let Some(input) = self.input.as_mut() else {
            return;
        };
        if let Err(e) = input.write_all(chunk).await {
            debug!(
                program = self.program.as_str(),
                error = %e,
                "player input closed, dropping remaining audio"
            );
            self.input = None;
        }
    }

    /// Half-close stdin so the player sees end of audio and can drain what it buffered.
    pub async fn close_input(&mut self) {
        if let Some(mut input) = self.input.take() {
            if let Err(e) = input.shutdown().await {
                debug!(program = self.program.as_str(), error = %e, "player input shutdown failed");
            }
        }
    }

    /// Wait for the player to exit. Closes stdin first if it is still open.
    pub async fn wait(mut self) -> Result<(), PlaybackError> {
        self.close_input().await;
        let status = self
            .child
            .wait()
            .await
            .map_err(|source| PlaybackError::Unavailable {
                program: self.program.clone(),
                source,
            })?;
        if status.success() {
            info!(program = self.program.as_str(), "playback finished");
            Ok(())
        } else {
            Err(PlaybackError::ExitCode {
                program: self.program,
                code: status.code(),
            })
        }
    }

    /// Stop feeding the player and leave it to exit on its own.
    pub fn abandon(mut self) {
        self.input = None;
        debug!(program = self.program.as_str(), "abandoned player session");
    }
}

/// Play a finished file with the first candidate that spawns.
///
/// Only spawn failures advance to the next candidate; once a player is running its
/// exit status is the result. Returns the program that played the file.
pub async fn play_file(
    candidates: &[Player],
    path: &Path,
    verbose: bool,
) -> Result<String, PlaybackError> {
    let mut last_error = None;
    for player in candidates {
        match PlaybackSession::spawn(player, AudioInput::File(path), verbose) {
            Ok(session) => {
                let program = session.program().to_string();
                info!(program = program.as_str(), path = %path.display(), "playing file");
                session.wait().await?;
                return Ok(program);
            }
            Err(e) => {
                warn!(program = player.program(), error = %e, "player candidate failed to start");
                last_error = Some(e);
            }
        }
    }
    Err(last_error.unwrap_or_else(|| PlaybackError::Unavailable {
        program: String::new(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "no player candidates"),
    }))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::player::CustomPlayer;

    fn custom(program: &str, args: &[&str]) -> Player {
        Player::Custom(CustomPlayer::new(program, args.iter().copied()))
    }

    #[tokio::test]
    async fn test_spawn_missing_program_is_unavailable() {
        let player = custom("speakstream-no-such-player", &[]);
        let err = PlaybackSession::spawn(&player, AudioInput::Stdin, false)
            .err()
            .unwrap();
        assert!(matches!(err, PlaybackError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_reported() {
        let session = PlaybackSession::spawn(&custom("false", &[]), AudioInput::Stdin, false)
            .unwrap();
        match session.wait().await {
            Err(PlaybackError::ExitCode { program, code }) => {
                assert_eq!(program, "false");
                assert_eq!(code, Some(1));
            }
            other => panic!("expected exit code error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_feed_after_close_is_dropped() {
        let mut session =
            PlaybackSession::spawn(&custom("cat", &[]), AudioInput::Stdin, false).unwrap();
        session.feed(b"abc").await;
        session.close_input().await;
        assert!(!session.is_input_open());
        session.feed(b"def").await;
        session.wait().await.unwrap();
    }

    #[tokio::test]
    async fn test_play_file_falls_back_past_missing_programs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("speech.mp3");
        std::fs::write(&path, b"audio").unwrap();
        let candidates = vec![
            custom("speakstream-no-such-player", &[]),
            custom("true", &[]),
            custom("false", &[]),
        ];
        let program = play_file(&candidates, &path, false).await.unwrap();
        assert_eq!(program, "true");
    }

    #[tokio::test]
    async fn test_play_file_does_not_fall_back_after_exit_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("speech.mp3");
        std::fs::write(&path, b"audio").unwrap();
        let candidates = vec![custom("false", &[]), custom("true", &[])];
        let err = play_file(&candidates, &path, false).await.unwrap_err();
        assert!(matches!(err, PlaybackError::ExitCode { .. }));
    }

    #[tokio::test]
    async fn test_play_file_without_any_spawnable_player() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("speech.mp3");
        let candidates = vec![custom("speakstream-no-such-player", &[])];
        let err = play_file(&candidates, &path, false).await.unwrap_err();
        assert!(matches!(err, PlaybackError::Unavailable { .. }));
    }
}

//! Platform-ordered player candidates.
//!
//! Locating never touches the filesystem: a candidate is only a prediction based on the
//! platform. Missing executables surface later, when the session tries to spawn them.

use crate::types::DeliveryMode;
use crate::{Error, Result};
use std::ffi::OsString;
use std::fmt;
use std::path::Path;

/// Host platform, as far as player selection is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Linux,
    Windows,
    Other(String),
}

impl Platform {
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Maps an `std::env::consts::OS` style identifier.
    pub fn from_os(os: &str) -> Self {
        match os {
            "macos" => Self::MacOs,
            "linux" => Self::Linux,
            "windows" => Self::Windows,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::MacOs => "macos",
            Self::Linux => "linux",
            Self::Windows => "windows",
            Self::Other(os) => os,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the player reads audio from.
#[derive(Debug, Clone, Copy)]
pub enum AudioInput<'a> {
    File(&'a Path),
    Stdin,
}

/// Linux candidates, in preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinuxPlayer {
    /// mpv with video disabled
    Mpv,
    /// ffplay without a window, exiting at end of input
    Ffplay,
    /// ALSA raw player, file input only
    Aplay,
}

/// User-supplied player command line.
///
/// `{input}` in an argument is replaced by the file path, or by `-` when reading stdin.
/// Without a placeholder the file path is appended as the last argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomPlayer {
    program: String,
    args: Vec<String>,
}

const INPUT_PLACEHOLDER: &str = "{input}";

impl CustomPlayer {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Splits a whitespace-separated command line. Returns `None` for a blank line.
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace();
        let program = parts.next()?;
        Some(Self::new(program, parts))
    }

    fn args(&self, input: AudioInput<'_>) -> Vec<OsString> {
        let has_placeholder = self.args.iter().any(|a| a.contains(INPUT_PLACEHOLDER));
        let mut out: Vec<OsString> = self
            .args
            .iter()
            .map(|arg| match input {
                _ if !arg.contains(INPUT_PLACEHOLDER) => OsString::from(arg),
                // A lone placeholder keeps non-UTF-8 paths intact.
                AudioInput::File(path) if arg == INPUT_PLACEHOLDER => path.as_os_str().to_owned(),
                AudioInput::File(path) => {
                    OsString::from(arg.replace(INPUT_PLACEHOLDER, &path.to_string_lossy()))
                }
                AudioInput::Stdin => OsString::from(arg.replace(INPUT_PLACEHOLDER, "-")),
            })
            .collect();
        if let (false, AudioInput::File(path)) = (has_placeholder, input) {
            out.push(path.as_os_str().to_owned());
        }
        out
    }
}

/// One concrete playback executable plus the way it is invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Player {
    /// afplay, built into macOS
    Mac,
    Linux(LinuxPlayer),
    /// ffplay resolved from PATH
    Windows,
    Custom(CustomPlayer),
}

impl Player {
    pub fn program(&self) -> &str {
        match self {
            Self::Mac => "afplay",
            Self::Linux(LinuxPlayer::Mpv) => "mpv",
            Self::Linux(LinuxPlayer::Ffplay) | Self::Windows => "ffplay",
            Self::Linux(LinuxPlayer::Aplay) => "aplay",
            Self::Custom(custom) => &custom.program,
        }
    }

    /// Whether the player can consume a live byte stream on stdin.
    pub fn accepts_stdin(&self) -> bool {
        !matches!(self, Self::Linux(LinuxPlayer::Aplay))
    }

    pub fn args(&self, input: AudioInput<'_>) -> Vec<OsString> {
        let source = match input {
            AudioInput::File(path) => path.as_os_str().to_owned(),
            AudioInput::Stdin => match self {
                Self::Mac => OsString::from("/dev/stdin"),
                Self::Linux(LinuxPlayer::Ffplay) | Self::Windows => OsString::from("pipe:0"),
                _ => OsString::from("-"),
            },
        };
        let mut args: Vec<OsString> = match self {
            Self::Mac | Self::Linux(LinuxPlayer::Aplay) => Vec::new(),
            Self::Linux(LinuxPlayer::Mpv) => vec!["--no-video".into(), "--really-quiet".into()],
            Self::Linux(LinuxPlayer::Ffplay) | Self::Windows => vec![
                "-nodisp".into(),
                "-autoexit".into(),
                "-loglevel".into(),
                "quiet".into(),
            ],
            Self::Custom(custom) => return custom.args(input),
        };
        args.push(source);
        args
    }

    pub(crate) fn command(&self, input: AudioInput<'_>) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(self.program());
        cmd.args(self.args(input));
        cmd
    }
}

/// Selects player candidates for a platform.
#[derive(Debug, Clone)]
pub struct PlayerLocator {
    platform: Platform,
    overrides: Option<Vec<Player>>,
}

impl PlayerLocator {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            overrides: None,
        }
    }

    pub fn current() -> Self {
        Self::new(Platform::current())
    }

    /// Replace the platform table with an explicit candidate list.
    pub fn with_candidates(mut self, candidates: Vec<Player>) -> Self {
        self.overrides = Some(candidates);
        self
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Candidates in preference order. Stream mode keeps only stdin-capable players.
    pub fn candidates(&self, mode: DeliveryMode) -> Result<Vec<Player>> {
        let table = match &self.overrides {
            Some(list) => list.clone(),
            None => platform_table(&self.platform),
        };
        let candidates: Vec<Player> = table
            .into_iter()
            .filter(|p| mode == DeliveryMode::Download || p.accepts_stdin())
            .collect();
        if candidates.is_empty() {
            return Err(Error::NoPlayer {
                platform: self.platform.to_string(),
                mode: mode.to_string(),
                details: None,
            });
        }
        Ok(candidates)
    }

    /// First candidate for `mode`.
    pub fn locate(&self, mode: DeliveryMode) -> Result<Player> {
        let mut candidates = self.candidates(mode)?;
        Ok(candidates.remove(0))
    }
}

fn platform_table(platform: &Platform) -> Vec<Player> {
    match platform {
        Platform::MacOs => vec![Player::Mac],
        Platform::Linux => vec![
            Player::Linux(LinuxPlayer::Mpv),
            Player::Linux(LinuxPlayer::Ffplay),
            Player::Linux(LinuxPlayer::Aplay),
        ],
        Platform::Windows => vec![Player::Windows],
        Platform::Other(_) => Vec::new(),
    }
}

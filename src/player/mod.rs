//! 播放模块：选择平台播放器并管理外部播放进程。
//!
//! Player selection and external process lifecycle.
//!
//! [`PlayerLocator`] predicts which executable to run on this platform;
//! [`PlaybackSession`] spawns it, feeds it audio and turns its exit status into a result.

mod locator;
mod session;

pub use locator::{AudioInput, CustomPlayer, LinuxPlayer, Platform, Player, PlayerLocator};
pub use session::{play_file, PlaybackSession};

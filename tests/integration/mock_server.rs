//! Mock synthesis endpoint and stand-in players for integration tests

#![allow(dead_code)]

use mockito::{Matcher, Mock, Server, ServerGuard};
use speakstream::{
    CustomPlayer, Delivery, Player, PlayerLocator, SpeechTransport, SynthesisRequest,
};
use std::path::Path;

pub const TEXT: &str = "Hello world";
pub const MODEL: &str = "aura-asteria-en";
pub const API_KEY: &str = "test-key";

/// Test fixture that owns a mock synthesis server
pub struct MockServerFixture {
    pub server: ServerGuard,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self { server, base_url }
    }

    /// Delivery pointed at the mock server, using only the given player candidates
    pub fn delivery(&self, candidates: Vec<Player>) -> Delivery {
        let transport = SpeechTransport::builder()
            .base_url(self.base_url.as_str())
            .build()
            .expect("transport");
        Delivery::new(transport, PlayerLocator::current().with_candidates(candidates))
    }

    /// Mock the speak endpoint, expecting exactly `hits` well-formed requests
    pub async fn mock_speech(&mut self, status: usize, body: &[u8], hits: usize) -> Mock {
        self.server
            .mock("POST", Matcher::Regex(r"^/v1/speak".to_string()))
            .match_query(Matcher::UrlEncoded("model".into(), MODEL.into()))
            .match_header("authorization", format!("Token {}", API_KEY).as_str())
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(serde_json::json!({ "text": TEXT })))
            .with_status(status)
            .with_header("content-type", "audio/mpeg")
            .with_body(body)
            .expect(hits)
            .create_async()
            .await
    }
}

pub fn request() -> SynthesisRequest {
    SynthesisRequest::new(TEXT, MODEL, API_KEY).expect("valid request")
}

/// Deterministic non-text payload of `len` bytes
pub fn audio_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * 31 + 7) % 251) as u8).collect()
}

/// `sh -c <script> sh <args...>`
pub fn shell_player(script: &str, args: &[&Path]) -> Player {
    let mut argv = vec!["-c".to_string(), script.to_string(), "sh".to_string()];
    argv.extend(args.iter().map(|p| p.to_string_lossy().into_owned()));
    Player::Custom(CustomPlayer::new("sh", argv))
}

/// Copies the played file to `dest`; the file path arrives as `$2`.
pub fn copying_player(dest: &Path) -> Player {
    shell_player(r#"cp "$2" "$1""#, &[dest])
}

/// Drains stdin into `dest`.
pub fn recording_player(dest: &Path) -> Player {
    shell_player(r#"cat > "$1""#, &[dest])
}

pub fn missing_player() -> Player {
    Player::Custom(CustomPlayer::new(
        "speakstream-no-such-player",
        Vec::<String>::new(),
    ))
}

pub fn exiting_player(program: &str) -> Player {
    Player::Custom(CustomPlayer::new(program, Vec::<String>::new()))
}

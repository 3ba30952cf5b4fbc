//! 传输模块：向语音合成端点发起请求并以字节流返回音频。
//!
//! HTTP transport for the speech-synthesis endpoint.

mod http;

pub use http::{SpeechTransport, SpeechTransportBuilder, DEFAULT_BASE_URL, DEFAULT_ENDPOINT_PATH};

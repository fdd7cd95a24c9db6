//! Text-to-speech provider client
//!
//! Fetches synthesized speech from a `translate_tts` style endpoint that takes
//! `ie`, `tl`, `q` and `client` query parameters and answers with an audio
//! byte stream.

pub mod client;
pub mod error;

pub use client::{SpeechAudio, TtsClient, BROWSER_USER_AGENT, DEFAULT_BASE_URL};
pub use error::{Result, TtsError};

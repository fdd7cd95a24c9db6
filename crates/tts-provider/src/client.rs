//! Speech fetching

use crate::error::{Result, TtsError};
use futures_util::Stream;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://translate.google.com/translate_tts";

/// Providers of this kind reject requests that do not look like a browser
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

const INPUT_ENCODING: &str = "UTF-8";
const CLIENT_ID: &str = "tw-ob";

/// HTTP client for a text-to-speech provider
#[derive(Debug, Clone)]
pub struct TtsClient {
    client: reqwest::Client,
    base_url: Url,
}

impl TtsClient {
    /// Create a client for the provider at `base_url`
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(BROWSER_USER_AGENT)
            .build()?;

        Ok(Self { client, base_url })
    }

    /// Build the request URL for `text` spoken in `lang`
    pub fn speech_url(&self, text: &str, lang: &str) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("ie", INPUT_ENCODING)
            .append_pair("tl", lang)
            .append_pair("q", text)
            .append_pair("client", CLIENT_ID);
        url
    }

    /// Request speech for `text`. Only the status is checked here; the body
    /// is left for the caller to stream.
    pub async fn fetch(&self, text: &str, lang: &str) -> Result<SpeechAudio> {
        let url = self.speech_url(text, lang);
        debug!(url = %url, "Fetching speech from provider");

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, lang, "TTS provider rejected request");
            return Err(TtsError::Status(status.as_u16()));
        }

        Ok(SpeechAudio { response })
    }
}

/// A successful provider response whose audio body has not been read yet
#[derive(Debug)]
pub struct SpeechAudio {
    response: reqwest::Response,
}

impl SpeechAudio {
    pub fn content_type(&self) -> Option<&str> {
        self.response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Audio body as a chunk stream
    pub fn into_stream(self) -> impl Stream<Item = reqwest::Result<impl AsRef<[u8]>>> {
        self.response.bytes_stream()
    }
}

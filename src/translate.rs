//! Machine translation of recognized text, using Naver Papago NMT.

use std::{env, time::Duration};

use clap::Args;
use reqwest::StatusCode;
use thiserror::Error;

use crate::prelude::*;

/// The Papago NMT endpoint.
pub const PAPAGO_TRANSLATION_URL: &str =
    "https://naveropenapi.apigw.ntruss.com/nmt/v1/translation";

/// Environment variable holding the Papago API key ID.
pub const PAPAGO_API_KEY_ID_VAR: &str = "PAPAGO_API_KEY_ID";

/// Environment variable holding the Papago API key.
pub const PAPAGO_API_KEY_VAR: &str = "PAPAGO_API_KEY";

/// Translation options.
#[derive(Args, Clone, Debug)]
pub struct TranslateOpts {
    /// Language of the recognized text.
    #[clap(long, default_value = "ko")]
    pub source_lang: String,

    /// Language to translate into.
    #[clap(long, default_value = "en")]
    pub target_lang: String,

    /// Timeout, in seconds, for a single translation request.
    #[clap(long, default_value = "10")]
    pub translate_timeout: u64,

    /// The Papago NMT endpoint.
    #[clap(long, default_value = PAPAGO_TRANSLATION_URL, hide = true)]
    pub papago_url: String,
}

impl Default for TranslateOpts {
    fn default() -> Self {
        Self {
            source_lang: "ko".to_owned(),
            target_lang: "en".to_owned(),
            translate_timeout: 10,
            papago_url: PAPAGO_TRANSLATION_URL.to_owned(),
        }
    }
}

/// Errors returned by a [`Translator`].
#[derive(Debug, Error)]
pub enum TranslateError {
    /// The translation service answered with a non-success status.
    #[error("Translation failed")]
    Status(StatusCode),

    /// We couldn't talk to the translation service, or understand its answer.
    #[error("{0}")]
    Request(#[from] reqwest::Error),
}

/// Interface to a translation service.
#[async_trait]
pub trait Translator: Send + Sync + 'static {
    /// Translate `text`.
    async fn translate(&self, text: &str) -> Result<String, TranslateError>;
}

/// A [`Translator`] backed by Papago NMT.
pub struct PapagoTranslator {
    client: reqwest::Client,
    url: String,
    api_key_id: String,
    api_key: String,
    source_lang: String,
    target_lang: String,
}

impl PapagoTranslator {
    /// Create a new translator with explicit credentials.
    pub fn new(
        api_key_id: String,
        api_key: String,
        opts: &TranslateOpts,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(opts.translate_timeout))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            url: opts.papago_url.clone(),
            api_key_id,
            api_key,
            source_lang: opts.source_lang.clone(),
            target_lang: opts.target_lang.clone(),
        })
    }

    /// Create a new translator using credentials from the environment.
    pub fn from_env(opts: &TranslateOpts) -> Result<Self> {
        let api_key_id = env::var(PAPAGO_API_KEY_ID_VAR)
            .with_context(|| format!("{PAPAGO_API_KEY_ID_VAR} is not set"))?;
        let api_key = env::var(PAPAGO_API_KEY_VAR)
            .with_context(|| format!("{PAPAGO_API_KEY_VAR} is not set"))?;
        Self::new(api_key_id, api_key, opts)
    }
}

/// The parts of a Papago response we use.
#[derive(Debug, Deserialize)]
struct PapagoResponse {
    message: PapagoMessage,
}

#[derive(Debug, Deserialize)]
struct PapagoMessage {
    result: PapagoResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PapagoResult {
    translated_text: String,
}

#[async_trait]
impl Translator for PapagoTranslator {
    #[instrument(level = "debug", skip_all, fields(len = text.len()))]
    async fn translate(&self, text: &str) -> Result<String, TranslateError> {
        let form = [
            ("source", self.source_lang.as_str()),
            ("target", self.target_lang.as_str()),
            ("text", text),
        ];
        let response = self
            .client
            .post(&self.url)
            .header("X-NCP-APIGW-API-KEY-ID", &self.api_key_id)
            .header("X-NCP-APIGW-API-KEY", &self.api_key)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, %body, "Papago translation failed");
            return Err(TranslateError::Status(status));
        }

        let response = response.json::<PapagoResponse>().await?;
        Ok(response.message.result.translated_text)
    }
}

use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::app_config::TranslationConfig;
use crate::errors::ProviderError;
use crate::language_utils;

use super::TranslationBackend;

const FREE_ENDPOINT: &str = "https://api-free.deepl.com";
const PRO_ENDPOINT: &str = "https://api.deepl.com";

/// DeepL client for the `/v2/translate` REST endpoint
#[derive(Debug)]
pub struct DeepL {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// Fully resolved translate URL
    translate_url: Url,
    /// Glossary applied to every request
    glossary_id: Option<String>,
}

/// DeepL translate request
#[derive(Debug, Serialize)]
pub struct DeepLRequest<'a> {
    /// Texts to translate
    text: &'a [String],

    /// Upper-case ISO 639-1 source code
    source_lang: String,

    /// Upper-case ISO 639-1 target code
    target_lang: String,

    /// Optional glossary
    #[serde(skip_serializing_if = "Option::is_none")]
    glossary_id: Option<&'a str>,
}

/// DeepL translate response
#[derive(Debug, Deserialize)]
pub struct DeepLResponse {
    pub translations: Vec<DeepLTranslation>,
}

/// One translated text
#[derive(Debug, Deserialize)]
pub struct DeepLTranslation {
    #[serde(default)]
    pub detected_source_language: Option<String>,
    pub text: String,
}

impl DeepL {
    /// Create a new DeepL client
    ///
    /// An empty endpoint selects the free or pro host from the key: free-tier
    /// keys end in `:fx`.
    pub fn new(
        api_key: impl Into<String>,
        endpoint: &str,
        glossary_id: Option<String>,
        timeout: std::time::Duration,
    ) -> Result<Self, ProviderError> {
        let api_key = api_key.into();
        let base = if !endpoint.trim().is_empty() {
            endpoint.trim().to_string()
        } else if api_key.ends_with(":fx") {
            FREE_ENDPOINT.to_string()
        } else {
            PRO_ENDPOINT.to_string()
        };

        let translate_url = Url::parse(&format!("{}/", base.trim_end_matches('/')))
            .and_then(|url| url.join("v2/translate"))
            .map_err(|e| ProviderError::RequestFailed(format!("Invalid DeepL endpoint {}: {}", base, e)))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            translate_url,
            glossary_id: glossary_id.filter(|id| !id.trim().is_empty()),
        })
    }

    /// Create a client from the translation settings
    pub fn from_config(config: &TranslationConfig) -> Result<Self, ProviderError> {
        Self::new(
            config.api_key.clone(),
            &config.endpoint,
            config.glossary_id.clone(),
            config.timeout(),
        )
    }

    /// The URL requests are sent to
    pub fn translate_url(&self) -> &Url {
        &self.translate_url
    }

    /// DeepL expects upper-case two-letter codes
    fn service_language_code(code: &str) -> Result<String, ProviderError> {
        language_utils::normalize_to_part1_or_part2t(code)
            .map(|c| c.to_uppercase())
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))
    }

    /// Map a non-success HTTP status onto the error taxonomy
    pub fn error_for_status(status_code: u16, message: String) -> ProviderError {
        match status_code {
            429 => ProviderError::RateLimitExceeded(message),
            503 | 529 => ProviderError::Overloaded(message),
            401 | 403 => ProviderError::AuthenticationError(message),
            _ => ProviderError::ApiError { status_code, message },
        }
    }
}

#[async_trait]
impl TranslationBackend for DeepL {
    async fn translate(
        &self,
        texts: &[String],
        source_language: &str,
        target_language: &str,
    ) -> Result<Vec<String>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = DeepLRequest {
            text: texts,
            source_lang: Self::service_language_code(source_language)?,
            target_lang: Self::service_language_code(target_language)?,
            glossary_id: self.glossary_id.as_deref(),
        };

        debug!("Sending {} texts to DeepL", texts.len());

        let response = self.client.post(self.translate_url.clone())
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    ProviderError::ConnectionError(e.to_string())
                } else {
                    ProviderError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("DeepL API error ({}): {}", status, error_text);
            return Err(Self::error_for_status(status.as_u16(), error_text));
        }

        let deepl_response = response.json::<DeepLResponse>().await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        Ok(deepl_response.translations.into_iter().map(|t| t.text).collect())
    }

    fn name(&self) -> &str {
        "DeepL"
    }
}

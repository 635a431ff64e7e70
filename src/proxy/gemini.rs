use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use url::Url;

use crate::config::GenerationConfig;
use crate::error::{AppError, GenerationError};

/// Sampling limits sent with every generation call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParams {
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_output_tokens: 4096,
            temperature: 0.9,
            top_p: 0.95,
            top_k: 40,
        }
    }
}

/// One candidate backend: a model served behind the `generateContent` API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCandidate {
    pub model: String,
    endpoint: Url,
}

impl ModelCandidate {
    pub fn new(base_url: &Url, model: &str) -> Result<Self, url::ParseError> {
        let endpoint = base_url.join(&format!("v1/models/{}:generateContent", model))?;
        Ok(Self {
            model: model.to_string(),
            endpoint,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationParams,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    fn into_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
            .filter(|text| !text.trim().is_empty())
    }
}

/// Calls an ordered list of models and returns the first usable text.
///
/// Candidates are tried strictly in configured order, one at a time, each at
/// most once per call. Nothing is remembered between calls.
pub struct GenerationClient {
    client: Client,
    api_key: Option<String>,
    candidates: Vec<ModelCandidate>,
    params: GenerationParams,
}

impl GenerationClient {
    pub fn new(
        client: Client,
        api_key: Option<String>,
        candidates: Vec<ModelCandidate>,
        params: GenerationParams,
    ) -> Self {
        Self {
            client,
            api_key,
            candidates,
            params,
        }
    }

    pub fn from_config(config: &GenerationConfig) -> Result<Self, AppError> {
        let base_url = Url::parse(&config.base_url)?;
        let candidates = config.models
            .iter()
            .map(|model| ModelCandidate::new(&base_url, model))
            .collect::<Result<Vec<_>, _>>()?;

        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| AppError::ConfigError(format!("failed to build http client: {}", e)))?;

        let params = GenerationParams {
            max_output_tokens: config.max_output_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
            top_k: config.top_k,
        };

        // Empty keys count as unset
        let api_key = config.api_key.clone().filter(|key| !key.trim().is_empty());

        Ok(Self::new(client, api_key, candidates, params))
    }

    pub fn candidates(&self) -> &[ModelCandidate] {
        &self.candidates
    }

    #[instrument(skip(self, prompt), fields(candidates = self.candidates.len()))]
    pub async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let api_key = self.api_key.as_deref().ok_or(GenerationError::NotConfigured)?;

        let mut last_error = None;
        for candidate in &self.candidates {
            match self.call(candidate, api_key, prompt).await {
                Ok(text) => {
                    info!("Generated itinerary with model {}", candidate.model);
                    return Ok(text);
                }
                Err(e) => {
                    warn!("Model {} failed: {}", candidate.model, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(last) => Err(GenerationError::Unavailable {
                attempts: self.candidates.len(),
                last: Box::new(last),
            }),
            None => Err(GenerationError::NoCandidates),
        }
    }

    async fn call(
        &self,
        candidate: &ModelCandidate,
        api_key: &str,
        prompt: &str,
    ) -> Result<String, GenerationError> {
        let payload = GenerateContentRequest {
            contents: [Content { parts: [Part { text: prompt }] }],
            generation_config: self.params,
        };

        let transport = |source| GenerationError::Transport {
            model: candidate.model.clone(),
            source,
        };

        let response = self.client
            .post(candidate.endpoint.clone())
            .query(&[("key", api_key)])
            .json(&payload)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::HttpStatus {
                model: candidate.model.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let body: GenerateContentResponse = response.json().await.map_err(transport)?;
        body.into_text().ok_or_else(|| GenerationError::EmptyResponse {
            model: candidate.model.clone(),
        })
    }
}

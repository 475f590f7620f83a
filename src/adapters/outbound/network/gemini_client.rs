use crate::ports::outbound::{CpeGenerator, GenerationMode, PlanProbe, ProbeError};
use crate::shared::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const PACKAGE_PROMPT: &str = "\
Convert each of the following software package names into a CPE 2.3 identifier.
Output exactly one CPE per line, in the same order as the input, with no other text.
Format: cpe:2.3:a:VENDOR:PRODUCT:VERSION:*:*:*:*:*:*:*
Extract the version from the package name (package-1.2.3 has version 1.2.3);
use * only when the name carries no version.

PACKAGES:
";

const HARDWARE_PROMPT: &str = "\
Convert each of the following hardware model descriptors into a CPE 2.3 identifier.
Output exactly one CPE per line, in the same order as the input, with no other text.
Format: cpe:2.3:h:VENDOR:PRODUCT:VERSION:*:*:*:*:*:*:*

HARDWARE:
";

/// Google Generative Language API client for CPE generation.
///
/// One batch call maps hundreds of component names at once; temperature
/// is pinned to zero so the same name maps to the same CPE across runs.
/// Also serves as the plan-tier probe: a metadata request against a
/// paid-only model succeeds exactly when the key is on a paid plan.
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    const API_BASE: &'static str = "https://generativelanguage.googleapis.com/v1beta";
    const TIMEOUT_SECONDS: u64 = 60;
    /// Model available only on paid plans; probed for tier detection.
    const PREMIUM_PROBE_MODEL: &'static str = "gemini-2.5-pro";

    pub fn new(api_key: String, model: String) -> Result<Self> {
        let version = env!("CARGO_PKG_VERSION");
        let client = Client::builder()
            .timeout(Duration::from_secs(Self::TIMEOUT_SECONDS))
            .user_agent(format!("cpescan/{}", version))
            .build()?;

        Ok(Self {
            client,
            base_url: Self::API_BASE.to_string(),
            api_key,
            model,
        })
    }
}

#[async_trait]
impl CpeGenerator for GeminiClient {
    async fn generate(&self, components: &[String], mode: GenerationMode) -> Result<String> {
        let preamble = match mode {
            GenerationMode::Package => PACKAGE_PROMPT,
            GenerationMode::Hardware => HARDWARE_PROMPT,
        };
        let text = format!("{}{}", preamble, components.join("\n"));

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.0,
                top_p: 1.0,
            },
        };

        debug!(components = components.len(), model = %self.model, "requesting CPE generation");
        let response = self.client.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            anyhow::bail!("mapping service returned status {}", response.status());
        }

        let parsed: GenerateResponse = response.json().await?;
        let output = parsed
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if output.is_empty() {
            anyhow::bail!("mapping service returned an empty response");
        }
        Ok(output)
    }
}

#[async_trait]
impl PlanProbe for GeminiClient {
    async fn probe_premium(&self) -> std::result::Result<(), ProbeError> {
        let url = format!(
            "{}/models/{}?key={}",
            self.base_url,
            Self::PREMIUM_PROBE_MODEL,
            self.api_key
        );
        let response =
            self.client
                .get(&url)
                .send()
                .await
                .map_err(|e| ProbeError::Other {
                    details: e.to_string(),
                })?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::FORBIDDEN | StatusCode::NOT_FOUND | StatusCode::TOO_MANY_REQUESTS => {
                Err(ProbeError::PermissionDenied {
                    details: format!("probe returned {}", response.status()),
                })
            }
            status => Err(ProbeError::Other {
                details: format!("unexpected probe status {status}"),
            }),
        }
    }
}

// Generative Language API request/response structures

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "topP")]
    top_p: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

mod stream;

pub use stream::{collect_text, GenerationStream};

use std::fmt;
use std::sync::Arc;

use futures_util::StreamExt;
use serde::{Deserialize, Serialize};

use crate::error::ArchitectError;
use crate::observability::token_counter::estimate_prompt_tokens;
use crate::prompt::{build_prompt_pair, WorkflowStep};
use crate::protocol::canonical::{PromptPair, ProviderKind};
use crate::protocol::{gemini, openai_chat};
use crate::transport::HttpTransport;

/// Provider endpoint and credential supplied by the caller.
///
/// Never persisted by the generation path.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(rename = "api_key", alias = "apiKey")]
    pub credential: String,
    #[serde(rename = "base_url", alias = "baseUrl")]
    pub endpoint_base: String,
    pub model: String,
}

impl ProviderConfig {
    #[must_use]
    pub fn provider_kind(&self) -> ProviderKind {
        ProviderKind::classify(&self.endpoint_base)
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("credential", &"<redacted>")
            .field("endpoint_base", &self.endpoint_base)
            .field("model", &self.model)
            .finish()
    }
}

/// Everything one generation call needs. Built fresh per call.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub step: WorkflowStep,
    pub user_input: String,
    pub prior_blueprint: Option<String>,
    pub prior_composition: Option<String>,
    pub reference_text: Option<String>,
    pub provider: ProviderConfig,
}

impl GenerationRequest {
    #[must_use]
    pub fn new(
        step: WorkflowStep,
        user_input: impl Into<String>,
        provider: ProviderConfig,
    ) -> Self {
        Self {
            step,
            user_input: user_input.into(),
            prior_blueprint: None,
            prior_composition: None,
            reference_text: None,
            provider,
        }
    }

    #[must_use]
    pub fn with_blueprint(mut self, blueprint: impl Into<String>) -> Self {
        self.prior_blueprint = Some(blueprint.into());
        self
    }

    #[must_use]
    pub fn with_composition(mut self, composition: impl Into<String>) -> Self {
        self.prior_composition = Some(composition.into());
        self
    }

    #[must_use]
    pub fn with_reference_text(mut self, reference_text: impl Into<String>) -> Self {
        self.reference_text = Some(reference_text.into());
        self
    }

    /// System and user prompt for this request's step.
    #[must_use]
    pub fn prompt_pair(&self) -> PromptPair {
        build_prompt_pair(
            self.step,
            &self.user_input,
            self.prior_blueprint.as_deref(),
            self.prior_composition.as_deref(),
            self.reference_text.as_deref(),
        )
    }
}

/// Prepared provider call: where to send what.
struct ProviderCall {
    url: Arc<url::Url>,
    headers: http::HeaderMap,
    body: bytes::Bytes,
}

/// Facade that turns a [`GenerationRequest`] into a [`GenerationStream`].
///
/// The provider family is chosen once per call from the endpoint base; the
/// returned stream passes fragments through unbuffered.
pub struct Generator {
    transport: HttpTransport,
    max_output_tokens: u32,
}

impl Generator {
    #[must_use]
    pub fn new(transport: HttpTransport, max_output_tokens: u32) -> Self {
        Self {
            transport,
            max_output_tokens,
        }
    }

    /// Start a generation and return its fragment stream.
    ///
    /// # Errors
    ///
    /// Returns [`ArchitectError::InvalidRequest`] for unusable provider
    /// settings, [`ArchitectError::Transport`] when the provider cannot be
    /// reached, or [`ArchitectError::ProviderHttp`] when it answers with a
    /// non-2xx status. In every case no fragment has been produced.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationStream, ArchitectError> {
        let provider = request.provider.provider_kind();
        let prompt = request.prompt_pair();
        let call = self.prepare_call(provider, &prompt, &request.provider)?;

        tracing::info!(
            step = %request.step,
            provider = %provider,
            model = %request.provider.model,
            "starting generation"
        );

        let response = self
            .transport
            .open_stream(&call.url, &call.headers, call.body)
            .await?;

        Ok(GenerationStream::from_byte_stream(
            provider,
            request.step,
            estimate_prompt_tokens(&prompt),
            response
                .bytes_stream()
                .map(|chunk| chunk.map_err(reqwest::Error::without_url)),
        ))
    }

    fn prepare_call(
        &self,
        provider: ProviderKind,
        prompt: &PromptPair,
        config: &ProviderConfig,
    ) -> Result<ProviderCall, ArchitectError> {
        match provider {
            ProviderKind::OpenAiChat => {
                let endpoint = openai_chat::encoder::chat_completions_url(&config.endpoint_base);
                let url = self.transport.parsed_url(&endpoint)?;
                let headers = openai_chat::encoder::build_chat_headers(&config.credential)?;
                let wire = openai_chat::encoder::encode_chat_request(
                    prompt,
                    &config.model,
                    self.max_output_tokens,
                );
                Ok(ProviderCall {
                    url,
                    headers,
                    body: encode_body(&wire)?,
                })
            }
            ProviderKind::Gemini => {
                // Not cached: the URL embeds the credential.
                let url = gemini::encoder::stream_generate_url(
                    &config.endpoint_base,
                    &config.model,
                    &config.credential,
                )?;
                let wire = gemini::encoder::encode_stream_request(prompt, self.max_output_tokens);
                Ok(ProviderCall {
                    url: Arc::new(url),
                    headers: gemini::encoder::build_stream_headers(),
                    body: encode_body(&wire)?,
                })
            }
        }
    }
}

fn encode_body<T: Serialize>(wire: &T) -> Result<bytes::Bytes, ArchitectError> {
    serde_json::to_vec(wire)
        .map(bytes::Bytes::from)
        .map_err(|e| ArchitectError::Internal(format!("Failed to encode provider request: {e}")))
}

//! The flavor client: render a prompt, ask the backend, parse the answer.
//!
//! Every call is bounded by a deadline. Failures are returned to the
//! caller, who decides whether to show [`DESCRIPTION_FAILED`] or keep the
//! previous text; nothing here touches simulation state.

use std::time::Duration;

use metacity_types::{
    BuildingDescription, BuildingDescriptionRequest, NewsHeadline, NewsHeadlineRequest,
    TutorialHint, TutorialHintRequest,
};
use tokio::time::timeout;
use tracing::debug;

use crate::error::FlavorError;
use crate::llm::LlmBackend;
use crate::news::real_world_headlines;
use crate::parse::{parse_description, parse_headline, parse_hint};
use crate::prompt::{PromptEngine, RenderedPrompt};

/// Player-facing message when a building description cannot be produced.
pub const DESCRIPTION_FAILED: &str = "Failed to generate description. Please try again.";

/// Generates flavor text through an optional LLM backend.
#[derive(Debug)]
pub struct FlavorClient {
    backend: Option<LlmBackend>,
    prompts: PromptEngine,
    deadline: Duration,
}

impl FlavorClient {
    /// A client that sends prompts to `backend`, giving up after
    /// `deadline`.
    pub const fn new(backend: LlmBackend, prompts: PromptEngine, deadline: Duration) -> Self {
        Self {
            backend: Some(backend),
            prompts,
            deadline,
        }
    }

    /// A client with no backend; every call returns
    /// [`FlavorError::Disabled`].
    pub const fn disabled(prompts: PromptEngine) -> Self {
        Self {
            backend: None,
            prompts,
            deadline: Duration::ZERO,
        }
    }

    /// Whether a backend is configured.
    pub const fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// One or two sentences about a building.
    pub async fn describe_building(
        &self,
        request: &BuildingDescriptionRequest,
    ) -> Result<BuildingDescription, FlavorError> {
        let prompt = self.prompts.describe_building(request)?;
        parse_description(&self.ask(&prompt).await?)
    }

    /// A newspaper headline reflecting the city's resources.
    pub async fn news_headline(
        &self,
        request: &NewsHeadlineRequest,
    ) -> Result<NewsHeadline, FlavorError> {
        let prompt = self
            .prompts
            .news_headline(request, &real_world_headlines())?;
        parse_headline(&self.ask(&prompt).await?)
    }

    /// A personalised next step for the player.
    pub async fn tutorial_hint(
        &self,
        request: &TutorialHintRequest,
    ) -> Result<TutorialHint, FlavorError> {
        let prompt = self.prompts.tutorial_hint(request)?;
        parse_hint(&self.ask(&prompt).await?)
    }

    async fn ask(&self, prompt: &RenderedPrompt) -> Result<String, FlavorError> {
        let backend = self.backend.as_ref().ok_or(FlavorError::Disabled)?;
        let deadline_ms = u64::try_from(self.deadline.as_millis()).unwrap_or(u64::MAX);
        let raw = timeout(self.deadline, backend.complete(prompt))
            .await
            .map_err(|_elapsed| FlavorError::Timeout(deadline_ms))??;
        debug!(
            backend = backend.name(),
            response_len = raw.len(),
            "flavor response received"
        );
        Ok(raw)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use metacity_types::{BuildingType, Objective};
    use rust_decimal_macros::dec;

    use super::*;

    fn client(answer: &str) -> FlavorClient {
        FlavorClient::new(
            LlmBackend::Fixed(answer.to_owned()),
            PromptEngine::builtin().unwrap(),
            Duration::from_secs(5),
        )
    }

    const HEADLINE_REQUEST: NewsHeadlineRequest = NewsHeadlineRequest {
        currency: dec!(1000),
        population: dec!(10),
        morale: dec!(50),
    };

    #[tokio::test]
    async fn headline_from_code_block() {
        let client = client("```json\n{\"headline\": \"Solar farms power record trade\"}\n```");
        let headline = client.news_headline(&HEADLINE_REQUEST).await.unwrap();
        assert_eq!(headline.headline, "Solar farms power record trade");
    }

    #[tokio::test]
    async fn description_and_hint() {
        let client = client(
            r#"{"description": "A bustling shop.", "step": "Build a road", "reasoning": "Roads boost output"}"#,
        );
        let request = BuildingDescriptionRequest {
            building_type: BuildingType::Commercial,
            level: 1,
            production_rate: dec!(10),
            adjacency_bonus: None,
            base_description: None,
        };
        let description = client.describe_building(&request).await.unwrap();
        assert_eq!(description.text, "A bustling shop.");

        let hint = client
            .tutorial_hint(&TutorialHintRequest {
                currency: dec!(900),
                population: dec!(10),
                morale: dec!(50),
                buildings_built: 1,
                completed_objectives: vec![Objective::ConnectWallet],
            })
            .await
            .unwrap();
        assert_eq!(hint.step_text, "Build a road");
        assert_eq!(hint.rationale, "Roads boost output");
    }

    #[tokio::test]
    async fn disabled_client_reports_disabled() {
        let client = FlavorClient::disabled(PromptEngine::builtin().unwrap());
        assert!(!client.is_enabled());
        assert!(matches!(
            client.news_headline(&HEADLINE_REQUEST).await,
            Err(FlavorError::Disabled)
        ));
    }

    #[tokio::test]
    async fn unparseable_answer_is_a_parse_error() {
        let client = client("I cannot help with that.");
        assert!(matches!(
            client.news_headline(&HEADLINE_REQUEST).await,
            Err(FlavorError::Parse(_))
        ));
    }
}

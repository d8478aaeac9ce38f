//! Prompt template loading and rendering via `minijinja`.
//!
//! The four templates (`system.j2`, `description.j2`, `headline.j2`,
//! `tutorial.j2`) ship inside the binary. Operators can point
//! [`PromptEngine::from_dir`] at a directory holding edited copies to tune
//! the tone without recompiling.

use std::path::Path;

use metacity_types::{BuildingDescriptionRequest, NewsHeadlineRequest, TutorialHintRequest};
use minijinja::{Environment, context};
use rust_decimal::Decimal;

use crate::error::FlavorError;
use crate::news::NewsItem;

const SYSTEM: &str = "system.j2";
const DESCRIPTION: &str = "description.j2";
const HEADLINE: &str = "headline.j2";
const TUTORIAL: &str = "tutorial.j2";

/// The complete rendered prompt ready to send to an LLM backend.
#[derive(Debug, Clone)]
pub struct RenderedPrompt {
    /// System message setting the game's voice.
    pub system: String,
    /// User message carrying the request and the expected JSON shape.
    pub user: String,
}

/// Renders flavor requests into prompts.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl std::fmt::Debug for PromptEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptEngine").finish_non_exhaustive()
    }
}

impl PromptEngine {
    /// Engine using the templates compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns [`FlavorError::Template`] if a built-in template fails to
    /// compile.
    pub fn builtin() -> Result<Self, FlavorError> {
        let mut env = Environment::new();
        for (name, source) in [
            (SYSTEM, include_str!("../templates/system.j2")),
            (DESCRIPTION, include_str!("../templates/description.j2")),
            (HEADLINE, include_str!("../templates/headline.j2")),
            (TUTORIAL, include_str!("../templates/tutorial.j2")),
        ] {
            env.add_template(name, source)
                .map_err(|e| FlavorError::Template(format!("failed to add {name}: {e}")))?;
        }
        Ok(Self { env })
    }

    /// Engine loading templates from `dir`.
    ///
    /// Every template is resolved up front so a missing or broken file is
    /// reported at startup rather than on the first request.
    ///
    /// # Errors
    ///
    /// Returns [`FlavorError::Template`] if any of the four templates is
    /// missing or fails to compile.
    pub fn from_dir(dir: &Path) -> Result<Self, FlavorError> {
        let mut env = Environment::new();
        env.set_loader(minijinja::path_loader(dir));
        for name in [SYSTEM, DESCRIPTION, HEADLINE, TUTORIAL] {
            env.get_template(name).map_err(|e| {
                FlavorError::Template(format!("failed to load {}/{name}: {e}", dir.display()))
            })?;
        }
        Ok(Self { env })
    }

    /// Prompt for a short building description.
    ///
    /// # Errors
    ///
    /// Returns [`FlavorError::Template`] if rendering fails.
    pub fn describe_building(
        &self,
        request: &BuildingDescriptionRequest,
    ) -> Result<RenderedPrompt, FlavorError> {
        let adjacency_bonus = request.adjacency_bonus.and_then(as_percent);
        let user = self.render(
            DESCRIPTION,
            context! {
                building_type => request.building_type,
                level => request.level,
                production_rate => request.production_rate.normalize().to_string(),
                adjacency_bonus,
                base_description => request.base_description,
            },
        )?;
        self.with_system(user)
    }

    /// Prompt for a city news headline inspired by `news`.
    ///
    /// # Errors
    ///
    /// Returns [`FlavorError::Template`] if rendering fails.
    pub fn news_headline(
        &self,
        request: &NewsHeadlineRequest,
        news: &[NewsItem],
    ) -> Result<RenderedPrompt, FlavorError> {
        let user = self.render(
            HEADLINE,
            context! {
                news,
                currency => request.currency.normalize().to_string(),
                population => request.population.normalize().to_string(),
                morale => request.morale.normalize().to_string(),
            },
        )?;
        self.with_system(user)
    }

    /// Prompt for a personalised tutorial hint.
    ///
    /// # Errors
    ///
    /// Returns [`FlavorError::Template`] if rendering fails.
    pub fn tutorial_hint(
        &self,
        request: &TutorialHintRequest,
    ) -> Result<RenderedPrompt, FlavorError> {
        let user = self.render(
            TUTORIAL,
            context! {
                currency => request.currency.normalize().to_string(),
                population => request.population.normalize().to_string(),
                morale => request.morale.normalize().to_string(),
                buildings_built => request.buildings_built,
                completed_objectives => request.completed_objectives,
            },
        )?;
        self.with_system(user)
    }

    fn with_system(&self, user: String) -> Result<RenderedPrompt, FlavorError> {
        let system = self.render(SYSTEM, context! {})?;
        Ok(RenderedPrompt { system, user })
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String, FlavorError> {
        self.env
            .get_template(name)
            .map_err(|e| FlavorError::Template(format!("missing {name}: {e}")))?
            .render(ctx)
            .map_err(|e| FlavorError::Template(format!("{name} render failed: {e}")))
    }
}

/// `0.2` becomes `"20"`.
fn as_percent(fraction: Decimal) -> Option<String> {
    fraction
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|p| p.normalize().to_string())
}

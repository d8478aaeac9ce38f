//! The latest flavor text shown to the player.
//!
//! Refreshes run concurrently with the simulation and may finish out of
//! order. Each refresh takes a generation number from
//! [`FlavorBoard::begin_refresh`]; results carrying an older generation
//! than the newest refresh are discarded.

use metacity_types::{NewsHeadline, TutorialHint};
use serde::Serialize;
use tracing::debug;

/// Headline shown before the first generated one arrives.
pub const DEFAULT_HEADLINE: &str = "City council approves new park construction.";

/// Most recent headline and tutorial hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlavorBoard {
    headline: String,
    hint: Option<TutorialHint>,
    #[serde(skip)]
    generation: u64,
}

impl Default for FlavorBoard {
    fn default() -> Self {
        Self {
            headline: DEFAULT_HEADLINE.to_owned(),
            hint: None,
            generation: 0,
        }
    }
}

impl FlavorBoard {
    /// Current headline.
    pub fn headline(&self) -> &str {
        &self.headline
    }

    /// Current tutorial hint, if one has been generated.
    pub const fn hint(&self) -> Option<&TutorialHint> {
        self.hint.as_ref()
    }

    /// Start a refresh, superseding any still in flight.
    pub const fn begin_refresh(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    /// Publish a headline from refresh `generation`. Returns whether it
    /// was accepted.
    pub fn publish_headline(&mut self, generation: u64, headline: NewsHeadline) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.headline = headline.headline;
        true
    }

    /// Publish a tutorial hint from refresh `generation`. Returns whether
    /// it was accepted.
    pub fn publish_hint(&mut self, generation: u64, hint: TutorialHint) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.hint = Some(hint);
        true
    }

    fn is_current(&self, generation: u64) -> bool {
        let current = generation == self.generation;
        if !current {
            debug!(
                stale = generation,
                latest = self.generation,
                "discarding superseded flavor result"
            );
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headline(text: &str) -> NewsHeadline {
        NewsHeadline {
            headline: text.to_owned(),
        }
    }

    #[test]
    fn starts_with_default_headline() {
        let board = FlavorBoard::default();
        assert_eq!(board.headline(), DEFAULT_HEADLINE);
        assert!(board.hint().is_none());
    }

    #[test]
    fn superseded_results_are_discarded() {
        let mut board = FlavorBoard::default();
        let first = board.begin_refresh();
        let second = board.begin_refresh();

        assert!(board.publish_headline(second, headline("Fresh news")));
        assert!(!board.publish_headline(first, headline("Old news")));
        assert_eq!(board.headline(), "Fresh news");

        let hint = TutorialHint {
            step_text: "Build a park".to_owned(),
            rationale: "Morale is low".to_owned(),
        };
        assert!(!board.publish_hint(first, hint.clone()));
        assert!(board.publish_hint(second, hint.clone()));
        assert_eq!(board.hint(), Some(&hint));
    }

    #[test]
    fn serializes_without_generation() {
        let mut board = FlavorBoard::default();
        board.begin_refresh();
        let json = serde_json::to_value(&board).unwrap_or_default();
        assert_eq!(
            json.get("headline").and_then(serde_json::Value::as_str),
            Some(DEFAULT_HEADLINE)
        );
        assert!(json.get("generation").is_none());
    }
}

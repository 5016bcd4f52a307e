use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::{FinderError, Result};
use super::preferences::{NormalizedPreferences, Preferences};

/// Points awarded for finishing any suggested activity.
pub const SUGGESTION_POINTS: u32 = 25;

pub const ACTIVITY_CATEGORIES: &str = "LEGO challenges, Christmas activities, Thanksgiving activities, Spring activities, \
Fall activities, or Outdoor games";

/// Anything that turns a prompt into free-form text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;

    /// Short label for logs and status screens.
    fn describe(&self) -> String {
        "text generator".to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivitySuggestion {
    pub suggestion: String,
    pub points: u32,
}

impl ActivitySuggestion {
    pub fn new(suggestion: impl Into<String>) -> Self {
        ActivitySuggestion {
            suggestion: suggestion.into(),
            points: SUGGESTION_POINTS,
        }
    }
}

pub fn build_prompt(player: &str, prefs: &NormalizedPreferences) -> String {
    let mut preferences = vec![
        format!("- Location: {}", prefs.location),
        format!("- Duration: {}", prefs.duration),
        format!("- Interests: {}", prefs.interests_phrase),
    ];
    if let Some(age) = prefs.age {
        preferences.push(format!("- Age: {}", age));
    }

    format!(
        "You are a fun and helpful guide for kids' activities.\n\
         \n\
         The child's name is {player}, and they are looking for something to do.\n\
         They said: \"{statement}\"\n\
         \n\
         Preferences:\n\
         {preferences}\n\
         \n\
         Based on this, suggest ONE specific activity from the following categories:\n\
         {categories}.\n\
         \n\
         Provide:\n\
         1. Activity name\n\
         2. Brief description (1-2 sentences)\n\
         3. Why it's perfect for them right now\n\
         \n\
         Be enthusiastic and encouraging! Keep it short and exciting.",
        player = player,
        statement = prefs.statement,
        preferences = preferences.join("\n"),
        categories = ACTIVITY_CATEGORIES,
    )
}

pub struct SuggestionRequester {
    generator: std::result::Result<Box<dyn TextGenerator>, String>,
}

impl SuggestionRequester {
    pub fn new(generator: impl TextGenerator + 'static) -> Self {
        Self::from_boxed(Box::new(generator))
    }

    pub fn from_boxed(generator: Box<dyn TextGenerator>) -> Self {
        SuggestionRequester {
            generator: Ok(generator),
        }
    }

    /// A requester that refuses every search with `NotConfigured`.
    pub fn not_configured(reason: impl Into<String>) -> Self {
        SuggestionRequester {
            generator: Err(reason.into()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.generator.is_ok()
    }

    pub fn configuration_notice(&self) -> Option<&str> {
        self.generator.as_ref().err().map(String::as_str)
    }

    pub fn describe(&self) -> String {
        match &self.generator {
            Ok(generator) => generator.describe(),
            Err(reason) => format!("not configured ({})", reason),
        }
    }

    pub async fn request(&self, player: &str, prefs: &Preferences) -> Result<ActivitySuggestion> {
        let generator = self
            .generator
            .as_ref()
            .map_err(|reason| FinderError::NotConfigured(reason.clone()))?;

        let prompt = build_prompt(player, &prefs.normalize());
        tracing::debug!(player, prompt_len = prompt.len(), "requesting suggestion");

        let text = generator.generate(&prompt).await.map_err(|e| {
            tracing::warn!(player, error = %e, "suggestion request failed");
            FinderError::Request(e.to_string())
        })?;

        let text = text.trim();
        if text.is_empty() {
            tracing::warn!(player, "generator returned an empty suggestion");
            return Err(FinderError::Request("the suggestion came back empty".to_string()));
        }

        Ok(ActivitySuggestion::new(text))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::preferences::{Age, DurationBucket, Interest, Location, DEFAULT_STATEMENT};

    /// Replies with fixed text, or fails with a fixed message.
    pub(crate) struct StubGenerator {
        reply: std::result::Result<String, String>,
    }

    impl StubGenerator {
        pub(crate) fn replying(text: &str) -> Self {
            StubGenerator {
                reply: Ok(text.to_string()),
            }
        }

        pub(crate) fn failing(message: &str) -> Self {
            StubGenerator {
                reply: Err(message.to_string()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for StubGenerator {
        async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
            assert!(prompt.contains("suggest ONE specific activity"));
            self.reply.clone().map_err(|e| anyhow::anyhow!(e))
        }
    }

    #[test]
    fn test_prompt_with_defaults() {
        let prompt = build_prompt("Gabriel", &Preferences::default().normalize());
        assert!(prompt.contains("The child's name is Gabriel"));
        assert!(prompt.contains("- Interests: anything fun"));
        assert!(prompt.contains(DEFAULT_STATEMENT));
        assert!(prompt.contains("suggest ONE specific activity"));
        assert!(!prompt.contains("- Age:"));
    }

    #[test]
    fn test_prompt_with_all_preferences() {
        let prefs = Preferences::new(Location::Outdoor, DurationBucket::Long)
            .with_interests([Interest::Sports, Interest::Nature])
            .with_statement("I want to run around")
            .with_age(Age::new(9).unwrap());
        let prompt = build_prompt("Olivia", &prefs.normalize());

        assert!(prompt.contains("They said: \"I want to run around\""));
        assert!(prompt.contains("- Location: Outdoor"));
        assert!(prompt.contains("- Duration: Long (30-60 min)"));
        assert!(prompt.contains("- Interests: sports, nature"));
        assert!(prompt.contains("- Age: 9"));
    }

    #[tokio::test]
    async fn test_request_success() {
        let requester = SuggestionRequester::new(StubGenerator::replying("  Backyard Treasure Hunt!  "));
        let suggestion = requester.request("Eliot", &Preferences::default()).await.unwrap();

        assert_eq!(suggestion.suggestion, "Backyard Treasure Hunt!");
        assert_eq!(suggestion.points, SUGGESTION_POINTS);
    }

    #[tokio::test]
    async fn test_request_failure_carries_description() {
        let requester = SuggestionRequester::new(StubGenerator::failing("quota exceeded"));
        let err = requester.request("Eliot", &Preferences::default()).await.unwrap_err();

        match err {
            FinderError::Request(message) => assert!(message.contains("quota exceeded")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_blank_reply_is_request_error() {
        let requester = SuggestionRequester::new(StubGenerator::replying(" \n "));
        let err = requester.request("Levi", &Preferences::default()).await.unwrap_err();
        assert!(matches!(err, FinderError::Request(_)));
    }

    #[tokio::test]
    async fn test_not_configured_fails_fast() {
        let requester = SuggestionRequester::not_configured("GEMINI_API_KEY is not set");
        assert!(!requester.is_configured());
        assert_eq!(requester.configuration_notice(), Some("GEMINI_API_KEY is not set"));

        let err = requester.request("Levi", &Preferences::default()).await.unwrap_err();
        assert!(err.is_not_configured());
    }
}

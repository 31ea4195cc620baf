//! Classifier contract and the default chat category set.
//!
//! A classifier maps free-form input text to one value of a closed, finite
//! category set. "Could not decide" is a normal value — the dedicated
//! unknown member — not an error; `Err` is reserved for genuine backend
//! failures (a model call failing, a rules engine panicking), which triage
//! converts into a `TriageFailed` outcome.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// A closed, finite category set the triage machinery is generic over.
pub trait TriageCategory: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// The dedicated "could not decide" member of the set.
    fn unknown() -> Self;

    /// Stable label, recorded into the request context.
    fn label(&self) -> &str;
}

/// Maps input text to one category.
///
/// Backed by any decision procedure — rules, a model call, a lookup table.
/// Must be pure with respect to the pipeline: no mutation of shared state.
#[async_trait]
pub trait Classifier<C: TriageCategory>: Send + Sync {
    /// Classify `input`. Returns [`TriageCategory::unknown`] when unable to
    /// decide; `Err` only for genuine failures.
    async fn classify(&self, input: &str, cancel: &CancellationToken) -> anyhow::Result<C>;
}

/// Default closed category set for chat triage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChatCategory {
    /// The user wants assistance with a task or problem.
    HelpRequest,
    /// The user is asking for data or a report.
    DataQuery,
    /// The user wants an action performed on their behalf.
    ActionRequest,
    /// The user is giving feedback about the product or experience.
    Feedback,
    /// None of the above, or the classifier could not decide.
    Unknown,
}

impl ChatCategory {
    /// Parse a label produced by [`TriageCategory::label`].
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "HelpRequest" => Some(Self::HelpRequest),
            "DataQuery" => Some(Self::DataQuery),
            "ActionRequest" => Some(Self::ActionRequest),
            "Feedback" => Some(Self::Feedback),
            "Unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

impl TriageCategory for ChatCategory {
    fn unknown() -> Self {
        Self::Unknown
    }

    fn label(&self) -> &str {
        match self {
            Self::HelpRequest => "HelpRequest",
            Self::DataQuery => "DataQuery",
            Self::ActionRequest => "ActionRequest",
            Self::Feedback => "Feedback",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ChatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Rule-based classifier: first rule whose keyword list matches wins, in
/// registration order; no match yields the unknown category.
///
/// Useful as a deterministic stand-in where a model-backed classifier is
/// not warranted. Matching is case-insensitive substring containment.
pub struct KeywordClassifier<C> {
    rules: Vec<(Vec<String>, C)>,
}

impl<C: TriageCategory> KeywordClassifier<C> {
    /// Create a classifier with no rules (everything is unknown).
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule: any of `keywords` appearing in the input selects
    /// `category`.
    pub fn with_rule<I, S>(mut self, category: C, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keywords = keywords.into_iter().map(|k| k.into().to_lowercase()).collect();
        self.rules.push((keywords, category));
        self
    }
}

impl<C: TriageCategory> Default for KeywordClassifier<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordClassifier<ChatCategory> {
    /// A starter rule set over the default chat categories.
    pub fn chat_defaults() -> Self {
        Self::new()
            .with_rule(
                ChatCategory::HelpRequest,
                ["help", "how do i", "support", "reset", "can't", "cannot"],
            )
            .with_rule(
                ChatCategory::DataQuery,
                ["show me", "data", "report", "sales", "how many", "metrics"],
            )
            .with_rule(
                ChatCategory::ActionRequest,
                ["create", "delete", "schedule", "send", "update", "cancel"],
            )
            .with_rule(
                ChatCategory::Feedback,
                ["feedback", "love", "hate", "great job", "terrible", "suggestion"],
            )
    }
}

#[async_trait]
impl<C: TriageCategory> Classifier<C> for KeywordClassifier<C> {
    async fn classify(&self, input: &str, _cancel: &CancellationToken) -> anyhow::Result<C> {
        let haystack = input.to_lowercase();
        for (keywords, category) in &self.rules {
            if keywords.iter().any(|k| haystack.contains(k.as_str())) {
                return Ok(category.clone());
            }
        }
        Ok(C::unknown())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_round_trip() {
        for category in [
            ChatCategory::HelpRequest,
            ChatCategory::DataQuery,
            ChatCategory::ActionRequest,
            ChatCategory::Feedback,
            ChatCategory::Unknown,
        ] {
            assert_eq!(ChatCategory::from_label(category.label()), Some(category));
        }
        assert_eq!(ChatCategory::from_label("NotACategory"), None);
    }

    #[test]
    fn test_unknown_member() {
        assert_eq!(ChatCategory::unknown(), ChatCategory::Unknown);
    }

    #[tokio::test]
    async fn test_keyword_classifier_matches_in_rule_order() {
        let classifier = KeywordClassifier::chat_defaults();
        let cancel = CancellationToken::new();

        let help = classifier
            .classify("I need help resetting my password", &cancel)
            .await
            .unwrap();
        assert_eq!(help, ChatCategory::HelpRequest);

        let data = classifier
            .classify("Show me the sales data for Q4", &cancel)
            .await
            .unwrap();
        assert_eq!(data, ChatCategory::DataQuery);
    }

    #[tokio::test]
    async fn test_keyword_classifier_defaults_to_unknown() {
        let classifier = KeywordClassifier::chat_defaults();
        let cancel = CancellationToken::new();
        let category = classifier.classify("xyzzy", &cancel).await.unwrap();
        assert_eq!(category, ChatCategory::Unknown);
    }

    #[tokio::test]
    async fn test_empty_classifier_is_all_unknown() {
        let classifier: KeywordClassifier<ChatCategory> = KeywordClassifier::new();
        let cancel = CancellationToken::new();
        let category = classifier.classify("please help me", &cancel).await.unwrap();
        assert_eq!(category, ChatCategory::Unknown);
    }
}

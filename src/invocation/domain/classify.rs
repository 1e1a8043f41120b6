//! Failure classification for invocation outcomes.

use super::InvocationOutcome;
use serde::{Deserialize, Serialize};

/// Actionable classification of an invocation outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// The invocation succeeded.
    Succeeded,
    /// The account or quota backing the model is depleted. Raises a credit
    /// alert rather than failing the task.
    CreditExhausted,
    /// The executor gave up waiting.
    TimedOut,
    /// The provider throttled the request; retrying later may work.
    RateLimited,
    /// Any other failure, usually a tool or model error.
    Failed,
}

impl FailureClass {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::CreditExhausted => "credit_exhausted",
            Self::TimedOut => "timed_out",
            Self::RateLimited => "rate_limited",
            Self::Failed => "failed",
        }
    }
}

/// Provider families with their own exhaustion wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderFamily {
    /// Anthropic models, including the `claude` CLI.
    Anthropic,
    /// `OpenAI` models, including the `codex` CLI.
    OpenAi,
    /// Google models, including the `gemini` CLI.
    Google,
    /// Anything else; only the generic signatures apply.
    Other,
}

impl ProviderFamily {
    /// Detects the family from a provider name.
    #[must_use]
    pub fn detect(provider: &str) -> Self {
        let lower = provider.to_lowercase();
        if lower.contains("claude") || lower.contains("anthropic") {
            Self::Anthropic
        } else if lower.contains("codex") || lower.contains("openai") {
            Self::OpenAi
        } else if lower.contains("gemini") || lower.contains("google") {
            Self::Google
        } else {
            Self::Other
        }
    }

    const fn exhaustion_signatures(self) -> &'static [&'static str] {
        match self {
            Self::Anthropic => &[
                "credit balance is too low",
                "usage limit reached",
                "your credit balance",
                "purchase credits",
            ],
            Self::OpenAi => &[
                "insufficient_quota",
                "exceeded your current quota",
                "billing_hard_limit_reached",
                "you've hit your usage limit",
            ],
            Self::Google => &[
                "quota exceeded for quota metric",
                "billing account",
                "free tier limit",
            ],
            Self::Other => &[],
        }
    }
}

const GENERIC_EXHAUSTION_SIGNATURES: &[&str] = &[
    "insufficient balance",
    "insufficient credits",
    "insufficient quota",
    "out of credits",
    "quota exceeded",
    "payment required",
    "credits exhausted",
];

const RATE_LIMIT_SIGNATURES: &[&str] = &["rate limit", "too many requests", "overloaded"];

/// Classifies an invocation outcome.
///
/// Credit exhaustion wins over every other failure so that an exhausted
/// account pauses work instead of burning retries. Matching is a
/// case-insensitive substring search over the error text in which `_` and
/// `-` count as spaces, so `insufficient_quota` and `insufficient quota`
/// are the same signature.
///
/// # Examples
///
/// ```
/// use gantry::invocation::domain::{FailureClass, InvocationOutcome, classify};
///
/// let outcome = InvocationOutcome::failed(Some(1), 900, "Credit balance is too low");
/// assert_eq!(classify("claude", &outcome), FailureClass::CreditExhausted);
/// ```
#[must_use]
pub fn classify(provider: &str, outcome: &InvocationOutcome) -> FailureClass {
    if outcome.success {
        return FailureClass::Succeeded;
    }
    let message = normalise(outcome.error.as_deref().unwrap_or_default());
    let family = ProviderFamily::detect(provider);
    let exhausted = GENERIC_EXHAUSTION_SIGNATURES
        .iter()
        .chain(family.exhaustion_signatures())
        .any(|signature| message.contains(&normalise(signature)));
    if exhausted || outcome.exit_code == Some(402) {
        return FailureClass::CreditExhausted;
    }
    if outcome.timed_out {
        return FailureClass::TimedOut;
    }
    if outcome.exit_code == Some(429)
        || RATE_LIMIT_SIGNATURES
            .iter()
            .any(|signature| message.contains(&normalise(signature)))
    {
        return FailureClass::RateLimited;
    }
    FailureClass::Failed
}

fn normalise(text: &str) -> String {
    text.to_lowercase().replace(['_', '-'], " ")
}

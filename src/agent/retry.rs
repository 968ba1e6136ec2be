//! Bounded retry with a deterministic fallback.
//!
//! Planning and synthesis share one policy: try the model up to N times
//! with no backoff, and if every attempt fails, run a model-free strategy
//! that cannot fail. Each attempt leaves a line in the run's debug trail.

use std::future::Future;

use tracing::{debug, warn};

use super::provider::LlmProvider;
use crate::error::AgentError;

/// Model access for one stage: the provider plus how many tries it gets.
#[derive(Clone, Copy)]
pub struct ModelBackend<'a> {
    /// Provider to call.
    pub provider: &'a dyn LlmProvider,
    /// Attempts before falling back. Zero skips the model.
    pub attempts: u32,
}

impl std::fmt::Debug for ModelBackend<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelBackend")
            .field("provider", &self.provider.name())
            .field("attempts", &self.attempts)
            .finish()
    }
}

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// The model succeeded on this (1-based) attempt.
    Model {
        /// Attempt number.
        attempt: u32,
    },
    /// The deterministic strategy produced the value.
    Fallback,
}

/// Outcome of [`retry_then_fallback`].
#[derive(Debug)]
pub struct Resolved<T> {
    /// The produced value.
    pub value: T,
    /// Which strategy produced it.
    pub source: Source,
    /// Debug-trail lines describing each attempt.
    pub notes: Vec<String>,
}

/// Runs `attempt` up to `attempts` times, returning the first success;
/// if none succeeds, returns `fallback()`.
///
/// `attempt` receives the 1-based attempt number. Failures are never
/// propagated.
pub async fn retry_then_fallback<T, F, Fut, G>(
    stage: &'static str,
    attempts: u32,
    mut attempt: F,
    fallback: G,
) -> Resolved<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, AgentError>>,
    G: FnOnce() -> T,
{
    let mut notes = Vec::new();

    for n in 1..=attempts {
        match attempt(n).await {
            Ok(value) => {
                debug!(stage, attempt = n, "LLM attempt succeeded");
                notes.push(format!("LLM {stage} attempt {n} succeeded"));
                return Resolved {
                    value,
                    source: Source::Model { attempt: n },
                    notes,
                };
            }
            Err(e) => {
                warn!(stage, attempt = n, max = attempts, error = %e, "LLM attempt failed");
                notes.push(format!("LLM {stage} attempt {n}/{attempts} failed: {e}"));
            }
        }
    }

    if attempts > 0 {
        warn!(stage, "All LLM attempts failed, using fallback");
        notes.push(format!("All LLM {stage} attempts failed, using fallback {stage}"));
    }

    Resolved {
        value: fallback(),
        source: Source::Fallback,
        notes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn parse_failure() -> AgentError {
        AgentError::ResponseParse {
            message: "bad json".to_string(),
            content: "{".to_string(),
        }
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let calls = AtomicU32::new(0);
        let resolved = retry_then_fallback(
            "planning",
            2,
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, AgentError>("model") }
            },
            || "fallback",
        )
        .await;
        assert_eq!(resolved.value, "model");
        assert_eq!(resolved.source, Source::Model { attempt: 1 });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(resolved.notes, vec!["LLM planning attempt 1 succeeded"]);
    }

    #[tokio::test]
    async fn test_retries_then_succeeds() {
        let resolved = retry_then_fallback(
            "synthesis",
            3,
            |n| async move {
                if n < 3 {
                    Err(parse_failure())
                } else {
                    Ok("third")
                }
            },
            || "fallback",
        )
        .await;
        assert_eq!(resolved.value, "third");
        assert_eq!(resolved.source, Source::Model { attempt: 3 });
        assert_eq!(resolved.notes.len(), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_falls_back() {
        let calls = AtomicU32::new(0);
        let resolved = retry_then_fallback(
            "planning",
            2,
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<&str, _>(parse_failure()) }
            },
            || "fallback",
        )
        .await;
        assert_eq!(resolved.value, "fallback");
        assert_eq!(resolved.source, Source::Fallback);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(resolved.notes.len(), 3);
        assert!(resolved.notes[0].starts_with("LLM planning attempt 1/2 failed"));
    }

    #[tokio::test]
    async fn test_zero_attempts_skips_model() {
        let calls = AtomicU32::new(0);
        let resolved = retry_then_fallback(
            "planning",
            0,
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, AgentError>("model") }
            },
            || "fallback",
        )
        .await;
        assert_eq!(resolved.value, "fallback");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(resolved.notes.is_empty());
    }
}

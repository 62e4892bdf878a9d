use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

use medverify_core::{Confidence, ImageReference, Verdict, VerdictOutcome};

use crate::engine::VerdictEngine;
use crate::error::EngineError;
use crate::policy::explanation;

/// Placeholder engine that draws a random verdict without looking at pixels.
///
/// Confidence is a whole number in `70..=99`.
#[derive(Debug, Clone, Default)]
pub struct StochasticEngine {
    latency: Duration,
}

impl StochasticEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep for `latency` before answering, to mimic a real model.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn draw() -> VerdictOutcome {
        let mut rng = rand::thread_rng();
        let verdict = *Verdict::ALL.choose(&mut rng).unwrap_or(&Verdict::Uncertain);
        let score: u8 = rng.gen_range(70..=99);
        VerdictOutcome::new(
            verdict,
            Confidence::clamped(f64::from(score)),
            explanation(verdict, &score.to_string()),
        )
    }
}

#[async_trait]
impl VerdictEngine for StochasticEngine {
    async fn analyze(&self, image: &ImageReference) -> Result<VerdictOutcome, EngineError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let outcome = Self::draw();
        debug!(image = %image.name, verdict = %outcome.verdict, "stochastic verdict drawn");
        Ok(outcome)
    }

    fn name(&self) -> &'static str {
        "stochastic"
    }
}

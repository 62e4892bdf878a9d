//! The classification policy shared by every engine.
//!
//! Scores are percentages. A class wins only when it clears
//! [`DECISION_THRESHOLD`] strictly; authentic is checked first.

use medverify_core::{Confidence, Verdict, VerdictOutcome};

/// A class must score strictly above this to be chosen.
pub const DECISION_THRESHOLD: f64 = 80.0;

/// Per-class scores on the 0-100 scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassScores {
    pub authentic: f64,
    pub fake: f64,
}

impl ClassScores {
    /// Build from raw model outputs in `[0, 1]`, scaling by 100 and clamping.
    pub fn from_probabilities(authentic: f32, fake: f32) -> Self {
        Self {
            authentic: Confidence::clamped(f64::from(authentic) * 100.0).value(),
            fake: Confidence::clamped(f64::from(fake) * 100.0).value(),
        }
    }

    /// Apply the decision policy.
    pub fn classify(self) -> (Verdict, Confidence) {
        if self.authentic > DECISION_THRESHOLD {
            (Verdict::Authentic, Confidence::clamped(self.authentic))
        } else if self.fake > DECISION_THRESHOLD {
            (Verdict::Fake, Confidence::clamped(self.fake))
        } else {
            (
                Verdict::Uncertain,
                Confidence::clamped(self.authentic.max(self.fake)),
            )
        }
    }

    /// Classify and attach the explanation, with one decimal of confidence.
    pub fn outcome(self) -> VerdictOutcome {
        let (verdict, confidence) = self.classify();
        let shown = format!("{:.1}", confidence.value());
        VerdictOutcome::new(verdict, confidence, explanation(verdict, &shown))
    }
}

/// Render the explanation for `verdict` with a preformatted confidence.
pub fn explanation(verdict: Verdict, confidence: &str) -> String {
    match verdict {
        Verdict::Authentic => format!(
            "Analysis indicates this is an authentic pharmaceutical product with {confidence}% \
             confidence. Authentication markers are consistent with genuine packaging: \
             security features, print quality, batch code patterns and packaging materials. \
             No signs of counterfeiting or tampering were detected."
        ),
        Verdict::Fake => format!(
            "WARNING: this product was flagged as a potential counterfeit with {confidence}% \
             confidence. Suspicious indicators include irregular packaging quality, \
             inconsistent text formatting, missing or altered security features and \
             anomalous manufacturing patterns. This product may pose serious health risks."
        ),
        Verdict::Uncertain => format!(
            "Analysis results are inconclusive with {confidence}% confidence. This may be due \
             to image quality, lighting conditions or partial visibility of key authentication \
             features. Capture additional images with better lighting, showing all sides of \
             the packaging, for a more definitive analysis."
        ),
    }
}

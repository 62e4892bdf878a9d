use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Classification outcome for a submitted packaging photograph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// The packaging looks genuine.
    Authentic,
    /// The packaging looks counterfeit.
    Fake,
    /// Neither class is confident enough to call.
    Uncertain,
}

impl Verdict {
    /// Every verdict, in declaration order.
    pub const ALL: [Self; 3] = [Self::Authentic, Self::Fake, Self::Uncertain];

    /// The lowercase wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Authentic => "authentic",
            Self::Fake => "fake",
            Self::Uncertain => "uncertain",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verdict {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "authentic" => Ok(Self::Authentic),
            "fake" => Ok(Self::Fake),
            "uncertain" => Ok(Self::Uncertain),
            _ => Err(CoreError::UnknownVerdict(s.to_owned())),
        }
    }
}

/// A confidence score in `[0, 100]`, inclusive.
///
/// The only ways to build one are [`Confidence::new`], which rejects values
/// outside the range, and [`Confidence::clamped`], which saturates.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "openapi", schema(value_type = f64))]
#[serde(transparent)]
pub struct Confidence(f64);

impl Confidence {
    /// Lowest representable score.
    pub const MIN: f64 = 0.0;
    /// Highest representable score.
    pub const MAX: f64 = 100.0;

    /// Build a confidence, rejecting NaN and anything outside `[0, 100]`.
    pub fn new(value: f64) -> Result<Self, CoreError> {
        if value.is_nan() || !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(CoreError::ConfidenceOutOfRange(value));
        }
        Ok(Self(value))
    }

    /// Build a confidence, saturating into `[0, 100]`. NaN maps to 0.
    pub fn clamped(value: f64) -> Self {
        if value.is_nan() {
            return Self(Self::MIN);
        }
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    /// The raw score.
    pub fn value(self) -> f64 {
        self.0
    }
}

impl<'de> Deserialize<'de> for Confidence {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = f64::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The tuple produced by a single verdict engine call.
///
/// Verdict and confidence travel together so that a record can never pair
/// one call's verdict with another call's score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct VerdictOutcome {
    /// Classification result.
    pub verdict: Verdict,
    /// Certainty attached to `verdict`.
    #[serde(rename = "confidenceScore")]
    pub confidence: Confidence,
    /// Human-readable explanation generated alongside the verdict.
    pub explanation: String,
}

impl VerdictOutcome {
    pub fn new(verdict: Verdict, confidence: Confidence, explanation: impl Into<String>) -> Self {
        Self {
            verdict,
            confidence,
            explanation: explanation.into(),
        }
    }
}

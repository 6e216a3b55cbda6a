//! Window metrics, rule-based scoring, and the detection loop.

pub mod engine;
pub mod metrics;
pub mod score;

/// Alert urgency. Threshold-triggered alerts are `High`; cycle-failure
/// alerts are `Medium`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::High => write!(f, "high"),
            Severity::Medium => write!(f, "medium"),
        }
    }
}

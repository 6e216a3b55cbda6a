use super::metrics::MetricsSnapshot;

/// Default rule cutoffs, in events per minute (throughput floor is an
/// absolute value). Exposed so operators can tune them through config.
pub const HIGH_LOG_RATE_PER_MIN: f64 = 20.0;
pub const HIGH_SECURITY_RATE_PER_MIN: f64 = 5.0;
pub const HIGH_ERROR_RATE_PER_MIN: f64 = 2.0;
pub const LOW_THROUGHPUT_FLOOR: f64 = 0.25;

/// Default rule weights. The per-rule contributions are additive and the
/// sum is clamped to 1.0.
pub const WEIGHT_HIGH_LOG_RATE: f64 = 0.35;
pub const WEIGHT_HIGH_SECURITY_RATE: f64 = 0.35;
pub const WEIGHT_HIGH_ERROR_RATE: f64 = 0.20;
pub const WEIGHT_LOW_THROUGHPUT: f64 = 0.30;

/// Cutoffs and weights for the scoring rules. Every field has a named
/// default constant; config may override any of them.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub log_rate_per_min: f64,
    pub security_rate_per_min: f64,
    pub error_rate_per_min: f64,
    pub throughput_floor: f64,
    pub log_rate_weight: f64,
    pub security_rate_weight: f64,
    pub error_rate_weight: f64,
    pub throughput_weight: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            log_rate_per_min: HIGH_LOG_RATE_PER_MIN,
            security_rate_per_min: HIGH_SECURITY_RATE_PER_MIN,
            error_rate_per_min: HIGH_ERROR_RATE_PER_MIN,
            throughput_floor: LOW_THROUGHPUT_FLOOR,
            log_rate_weight: WEIGHT_HIGH_LOG_RATE,
            security_rate_weight: WEIGHT_HIGH_SECURITY_RATE,
            error_rate_weight: WEIGHT_HIGH_ERROR_RATE,
            throughput_weight: WEIGHT_LOW_THROUGHPUT,
        }
    }
}

/// Anomaly score in `[0, 1]` plus the tags of the rules that fired, in
/// rule-evaluation order.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ScoreResult {
    pub score: f64,
    pub reasons: Vec<&'static str>,
}

struct Rule {
    tag: &'static str,
    weight: f64,
    predicate: fn(&MetricsSnapshot, &Thresholds) -> bool,
}

/// The rule table, in fixed evaluation order so `reasons` is
/// deterministic. Rules are independent and additive.
fn rules(t: &Thresholds) -> [Rule; 4] {
    [
        Rule {
            tag: "high_log_rate",
            weight: t.log_rate_weight,
            predicate: |m, t| m.log_rate >= t.log_rate_per_min,
        },
        Rule {
            tag: "high_security_rate",
            weight: t.security_rate_weight,
            predicate: |m, t| m.security_rate >= t.security_rate_per_min,
        },
        Rule {
            tag: "high_error_rate",
            weight: t.error_rate_weight,
            predicate: |m, t| m.error_rate >= t.error_rate_per_min,
        },
        Rule {
            tag: "low_throughput",
            weight: t.throughput_weight,
            predicate: |m, t| matches!(m.throughput_avg, Some(avg) if avg < t.throughput_floor),
        },
    ]
}

/// Score a metrics snapshot against the rule table. Deterministic; the
/// result is clamped to `[0, 1]` and `reasons` is non-empty exactly when
/// the score is non-zero.
pub fn score(metrics: &MetricsSnapshot, thresholds: &Thresholds) -> ScoreResult {
    let mut total = 0.0;
    let mut reasons = Vec::new();

    for rule in rules(thresholds) {
        if (rule.predicate)(metrics, thresholds) {
            total += rule.weight;
            reasons.push(rule.tag);
        }
    }

    ScoreResult {
        score: total.min(1.0),
        reasons,
    }
}

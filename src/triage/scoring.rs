use crate::models::enums::RiskLevel;
use crate::models::ProfileContext;

use super::types::{ConversationState, FiredRule, RiskAssessment};

pub const RULE_SEVERITY_HIGH: &str = "severity_high";
pub const RULE_SEVERITY_MODERATE: &str = "severity_moderate";
pub const RULE_DURATION: &str = "duration_extended";
pub const RULE_RED_FLAGS: &str = "red_flags";
pub const RULE_AGE: &str = "age_senior";
pub const RULE_CONDITIONS: &str = "chronic_conditions";

/// Score the collected answers against the profile.
///
/// Deterministic: no clock, no randomness. Calling it twice on the same
/// inputs yields the same assessment.
pub fn score_risk(state: &ConversationState, profile: &ProfileContext) -> RiskAssessment {
    let mut reasoning = Vec::new();

    if let Some(severity) = state.severity {
        if severity >= 7 {
            reasoning.push(FiredRule::new(
                RULE_SEVERITY_HIGH,
                2,
                format!("You rated the severity {severity}/10, which is high."),
            ));
        } else if severity >= 4 {
            reasoning.push(FiredRule::new(
                RULE_SEVERITY_MODERATE,
                1,
                format!("You rated the severity {severity}/10, which is moderate."),
            ));
        }
    }

    if let Some(duration) = state.duration.as_deref() {
        let lower = duration.to_lowercase();
        if lower.contains("week") || lower.contains("days") {
            reasoning.push(FiredRule::new(
                RULE_DURATION,
                1,
                format!("Symptoms lasting \"{}\" call for a closer look.", duration.trim()),
            ));
        }
    }

    if state.has_red_flags() {
        let flags: Vec<&str> = state.red_flags.iter().map(String::as_str).collect();
        reasoning.push(FiredRule::new(
            RULE_RED_FLAGS,
            2,
            format!("Warning signs were reported ({}).", flags.join(", ")),
        ));
    }

    if let Some(age) = profile.age.filter(|_| profile.is_senior()) {
        reasoning.push(FiredRule::new(
            RULE_AGE,
            1,
            format!("At age {age}, symptoms can progress faster."),
        ));
    }

    if profile.has_conditions() {
        reasoning.push(FiredRule::new(
            RULE_CONDITIONS,
            1,
            format!(
                "Existing conditions ({}) raise the overall risk.",
                profile.conditions_list()
            ),
        ));
    }

    let score: u32 = reasoning.iter().map(|r| r.weight).sum();
    let level = RiskLevel::from_score(score);

    tracing::debug!(score, level = level.as_str(), rules = reasoning.len(), "Risk scored");

    RiskAssessment {
        level,
        score,
        reasoning,
    }
}

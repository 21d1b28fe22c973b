//! Shareable session summary, produced for the `save_share` action.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::enums::{Relationship, RiskLevel, TriageLevel};
use crate::models::ProfileContext;

use super::types::{ConversationPhase, ConversationState, TriageError, TurnOutcome};

/// Recommendation fields carried into a summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRecommendation {
    pub care_type: String,
    pub urgency: String,
    pub risk_level: RiskLevel,
    pub score: u32,
    pub reasons: Vec<String>,
    pub follow_up: Option<String>,
    pub suggested_relief: Option<String>,
}

/// Point-in-time snapshot of a session for saving or sharing with a
/// clinician. Contains intake answers and the outcome, not the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub generated_at: NaiveDateTime,
    pub subject_name: String,
    pub relationship: Relationship,
    pub age: Option<u32>,
    pub conditions: Vec<String>,
    pub medications: Vec<String>,
    pub symptoms: Vec<String>,
    pub duration: Option<String>,
    pub severity: Option<u8>,
    pub red_flags: Vec<String>,
    pub phase: ConversationPhase,
    pub triage_level: Option<TriageLevel>,
    pub recommendation: Option<SummaryRecommendation>,
    /// Emergency rule that ended the conversation, if any.
    pub emergency_rule: Option<String>,
}

impl SessionSummary {
    pub fn build(
        profile: &ProfileContext,
        state: &ConversationState,
        outcome: &TurnOutcome,
        generated_at: NaiveDateTime,
    ) -> Self {
        let (triage_level, recommendation, emergency_rule) = match outcome {
            TurnOutcome::AwaitingAnswer { .. } => (None, None, None),
            TurnOutcome::Assessed(a) => {
                let rec = &a.recommendation;
                let reasons = a
                    .risk
                    .reasoning
                    .iter()
                    .chain(&rec.reasoning)
                    .map(|r| r.explanation.clone())
                    .collect();
                (
                    Some(a.triage_level),
                    Some(SummaryRecommendation {
                        care_type: rec.care_type.label().to_string(),
                        urgency: rec.urgency.clone(),
                        risk_level: a.risk.level,
                        score: a.risk.score,
                        reasons,
                        follow_up: rec.follow_up.clone(),
                        suggested_relief: rec
                            .suggested_relief
                            .as_ref()
                            .map(|r| r.treatment.clone()),
                    }),
                    None,
                )
            }
            TurnOutcome::Emergency(e) => (Some(e.triage_level), None, Some(e.rule_id.clone())),
        };

        Self {
            session_id: state.session_id,
            generated_at,
            subject_name: profile.name.clone(),
            relationship: profile.relationship,
            age: profile.age,
            conditions: profile.conditions.iter().cloned().collect(),
            medications: profile.medications.clone(),
            symptoms: state.symptoms.clone(),
            duration: state.duration.clone(),
            severity: state.severity,
            red_flags: state.red_flags.iter().cloned().collect(),
            phase: state.phase(),
            triage_level,
            recommendation,
            emergency_rule,
        }
    }

    pub fn to_json(&self) -> Result<String, TriageError> {
        serde_json::to_string_pretty(self).map_err(|e| TriageError::Serialization(e.to_string()))
    }

    /// Plain-text rendering for pasting into a message or note.
    pub fn to_text(&self) -> String {
        let mut lines = Vec::new();
        let who = match self.age {
            Some(age) => format!("{} ({}, {age})", self.subject_name, self.relationship),
            None => format!("{} ({})", self.subject_name, self.relationship),
        };
        lines.push(format!(
            "CareBow summary for {who}, {}",
            self.generated_at.format("%Y-%m-%d %H:%M")
        ));

        if !self.conditions.is_empty() {
            lines.push(format!("Conditions: {}", self.conditions.join(", ")));
        }
        if !self.medications.is_empty() {
            lines.push(format!("Medications: {}", self.medications.join(", ")));
        }
        if !self.symptoms.is_empty() {
            lines.push(format!("Symptoms: {}", self.symptoms.join(", ")));
        }
        if let Some(duration) = &self.duration {
            lines.push(format!("Duration: {duration}"));
        }
        if let Some(severity) = self.severity {
            lines.push(format!("Severity: {severity}/10"));
        }
        if !self.red_flags.is_empty() {
            lines.push(format!("Warning signs: {}", self.red_flags.join(", ")));
        }

        if self.emergency_rule.is_some() {
            lines.push("Outcome: emergency, advised to call emergency services".to_string());
        } else if let Some(rec) = &self.recommendation {
            lines.push(format!(
                "Outcome: {} ({}), {} risk",
                rec.care_type, rec.urgency, rec.risk_level
            ));
            for reason in &rec.reasons {
                lines.push(format!("- {reason}"));
            }
        } else {
            lines.push("Outcome: intake not finished".to_string());
        }

        lines.join("\n")
    }
}

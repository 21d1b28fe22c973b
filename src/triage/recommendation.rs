//! Decision table from risk level and profile to a care recommendation.

use crate::models::enums::RiskLevel;
use crate::models::ProfileContext;

use super::medication_safety::check_medication_safety;
use super::reference::KnowledgeBase;
use super::types::{
    CareType, ConversationState, FiredRule, Recommendation, ReliefSuggestion, RiskAssessment,
};

/// Produce the recommendation for a completed intake.
pub fn generate_recommendation(
    assessment: &RiskAssessment,
    profile: &ProfileContext,
    state: &ConversationState,
    kb: &KnowledgeBase,
) -> Recommendation {
    let subject = profile.subject_phrase();
    let age_clause = profile
        .age
        .map(|a| format!(" at age {a}"))
        .unwrap_or_default();

    let (care_type, urgency, rule) = match (assessment.level, profile.is_senior()) {
        (RiskLevel::High, true) => (
            CareType::HomeVisit,
            "within 6 hours",
            FiredRule::new(
                "rec_high_senior",
                0,
                format!(
                    "Because the risk is high and {subject} {} {}, a doctor visiting at home \
                     within 6 hours avoids a tiring trip.",
                    profile.subject_be(),
                    age_text(profile)
                ),
            ),
        ),
        (RiskLevel::High, false) => (
            CareType::VideoOrInPerson,
            "within 12 hours",
            FiredRule::new(
                "rec_high",
                0,
                format!(
                    "The risk is high, so a doctor should see {subject}{age_clause} within \
                     12 hours, by video or in person."
                ),
            ),
        ),
        (RiskLevel::Medium, true) => (
            CareType::HomeVisit,
            "within 24 hours",
            FiredRule::new(
                "rec_medium_senior",
                0,
                format!(
                    "The risk is moderate, and since {subject} {} {}, a home visit within \
                     24 hours is the most comfortable option.",
                    profile.subject_be(),
                    age_text(profile)
                ),
            ),
        ),
        (RiskLevel::Medium, false) if profile.has_conditions() => (
            CareType::VideoConsultation,
            "within 24 hours",
            FiredRule::new(
                "rec_medium_conditions",
                0,
                format!(
                    "The risk is moderate. With {} {}, a video consultation within 24 hours \
                     lets a doctor check how this fits in.",
                    profile.subject_possessive(),
                    profile.conditions_list()
                ),
            ),
        ),
        (RiskLevel::Medium, false) => (
            CareType::VideoConsultation,
            "within 24-48 hours",
            FiredRule::new(
                "rec_medium",
                0,
                format!(
                    "The risk is moderate and no existing conditions are on file for \
                     {subject}{age_clause}, so a video consultation within 24-48 hours is \
                     appropriate."
                ),
            ),
        ),
        (RiskLevel::Low, _) => (
            CareType::SelfCare,
            "monitor 48 hours",
            FiredRule::new(
                "rec_low",
                0,
                format!(
                    "The risk looks low for {subject}{age_clause}. Self-care with monitoring \
                     over the next 48 hours should be enough; reach out if anything changes."
                ),
            ),
        ),
    };

    let mut reasoning = vec![rule];

    let suggested_relief = if care_type == CareType::SelfCare {
        suggest_relief(profile, state, kb, &mut reasoning)
    } else {
        None
    };

    let follow_up = match assessment.level {
        RiskLevel::Medium | RiskLevel::High => Some(format!(
            "I'll check in tomorrow to see how {subject} {} doing.",
            profile.subject_be()
        )),
        RiskLevel::Low => None,
    };

    tracing::info!(
        risk = assessment.level.as_str(),
        care_type = care_type.label(),
        urgency,
        "Recommendation generated"
    );

    Recommendation {
        care_type,
        urgency: urgency.to_string(),
        reasoning,
        follow_up,
        suggested_relief,
    }
}

/// Pick a relief option for the presenting complaint and clear it against
/// the profile's allergies and medications.
fn suggest_relief(
    profile: &ProfileContext,
    state: &ConversationState,
    kb: &KnowledgeBase,
    reasoning: &mut Vec<FiredRule>,
) -> Option<ReliefSuggestion> {
    let complaint = state.presenting_complaint()?;
    let entry = kb.relief_for(complaint)?;
    let safety = check_medication_safety(profile, &entry.treatment, kb);

    if safety.safe {
        return Some(ReliefSuggestion {
            treatment: entry.treatment.clone(),
            replaced: None,
        });
    }

    let conflict = safety
        .conflicts
        .first()
        .map(|c| c.message.clone())
        .unwrap_or_default();

    match safety.alternatives.first() {
        Some(alt) => {
            reasoning.push(FiredRule::new(
                "relief_substituted",
                0,
                format!("{conflict} {alt} is suggested instead."),
            ));
            Some(ReliefSuggestion {
                treatment: alt.clone(),
                replaced: Some(entry.treatment.clone()),
            })
        }
        None => {
            reasoning.push(FiredRule::new(
                "relief_withheld",
                0,
                format!("{conflict} Please ask a pharmacist for a safe option."),
            ));
            None
        }
    }
}

fn age_text(profile: &ProfileContext) -> String {
    profile
        .age
        .map(|a| a.to_string())
        .unwrap_or_else(|| "older".to_string())
}

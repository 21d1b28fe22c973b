//! Profile-driven behavioral modifiers.
//!
//! Pure functions of [`ProfileContext`]: the same profile always yields the
//! same modifiers and the same insight sentences.

use crate::models::enums::{CareMethod, RiskTolerance, Tone};
use crate::models::ProfileContext;

use super::types::PersonalizationModifiers;

const SENIOR_FACTOR: f64 = 1.3;
const MINOR_FACTOR: f64 = 1.2;
const CHRONIC_FACTOR: f64 = 1.2;

/// Derive the behavioral modifiers for a care subject.
pub fn personalize(profile: &ProfileContext) -> PersonalizationModifiers {
    let chronic = profile.has_conditions();
    let senior = profile.is_senior();
    let minor = profile.is_minor();

    let risk_tolerance = if chronic || minor || senior {
        RiskTolerance::Low
    } else {
        RiskTolerance::Medium
    };

    let preferred_care_method = if senior {
        CareMethod::HomeVisit
    } else {
        CareMethod::Video
    };

    let mut urgency_multiplier = 1.0;
    if senior {
        urgency_multiplier *= SENIOR_FACTOR;
    }
    if minor {
        urgency_multiplier *= MINOR_FACTOR;
    }
    if chronic {
        urgency_multiplier *= CHRONIC_FACTOR;
    }

    let tone = if chronic || senior {
        Tone::Cautious
    } else {
        Tone::Reassuring
    };

    PersonalizationModifiers {
        risk_tolerance,
        preferred_care_method,
        urgency_multiplier,
        tone,
        should_check_medications: !profile.medications.is_empty(),
        should_refer_past: !profile.past_sessions.is_empty(),
    }
}

/// Transparency sentences naming the profile facts that shape the
/// conversation. Conditions, medications and age are cited verbatim.
pub fn profile_insights(
    profile: &ProfileContext,
    modifiers: &PersonalizationModifiers,
) -> Vec<String> {
    let mut insights = Vec::new();
    let possessive = profile.subject_possessive();

    if let Some(age) = profile.age {
        if profile.is_senior() {
            insights.push(format!(
                "At age {age}, I'm being more careful and will lean towards care at home."
            ));
        } else if profile.is_minor() {
            insights.push(format!(
                "At age {age}, children can get worse faster, so I'm keeping a closer watch."
            ));
        }
    }

    if profile.has_conditions() {
        insights.push(format!(
            "I'm taking {} {} into account.",
            possessive,
            profile.conditions_list()
        ));
    }

    if modifiers.should_check_medications {
        insights.push(format!(
            "I'll check any suggestion against {} medications: {}.",
            possessive,
            profile.medications_list()
        ));
    }

    if modifiers.should_refer_past {
        if let Some(last) = profile.last_session() {
            insights.push(format!(
                "Last time ({}), {} reported {} and the outcome was: {}.",
                last.date.format("%b %-d, %Y"),
                profile.subject_phrase(),
                last.symptoms.join(", "),
                last.outcome
            ));
        }
    }

    insights
}

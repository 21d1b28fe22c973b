use crate::models::enums::{Relationship, Tone};
use crate::models::profile::join_list;
use crate::models::{MissingField, ProfileContext};

use super::emergency::EmergencyMatch;
use super::medication_safety::MedicationSafety;
use super::types::{ConversationPhase, PersonalizationModifiers, Recommendation};

/// A question plus the "why I'm asking" explanation shown beside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub text: String,
    pub why_asking: String,
}

/// Message template builder for the intake conversation.
/// Profile facts are cited verbatim so the user can see what shaped a question.
pub struct MessageTemplates;

impl MessageTemplates {
    /// Opening message, tone-adjusted.
    pub fn greeting(profile: &ProfileContext, modifiers: &PersonalizationModifiers) -> String {
        let subject = profile.subject_phrase();
        let opener = match profile.relationship {
            Relationship::Me => {
                "Hi, I'm CareBow. Let's work out how you're feeling.".to_string()
            }
            _ => format!(
                "Hi, I'm CareBow. Let's work out how {subject} {} feeling.",
                profile.subject_be()
            ),
        };

        let tone_line = match modifiers.tone {
            Tone::Cautious => " I'll take a little extra care given the health background on file.",
            Tone::Reassuring => " I'll ask a few quick questions, it only takes a minute.",
            Tone::Urgent => "",
        };

        let past_line = if modifiers.should_refer_past {
            profile
                .last_session()
                .map(|s| {
                    format!(
                        " Last time we spoke about {}; let me know if this is related.",
                        s.symptoms.join(", ")
                    )
                })
                .unwrap_or_default()
        } else {
            String::new()
        };

        format!("{opener}{tone_line}{past_line}")
    }

    /// The question asked for a phase, with a personalized explanation.
    pub fn question(
        phase: ConversationPhase,
        profile: &ProfileContext,
        red_flag_checklist: &[String],
    ) -> Question {
        let subject = profile.subject_phrase();
        let possessive = profile.subject_possessive();
        let be = profile.subject_be();

        match phase {
            ConversationPhase::Symptom => Question {
                text: format!("What's the main symptom {subject} {be} dealing with?"),
                why_asking: "Starting with the main symptom lets me ask the right follow-ups."
                    .into(),
            },
            ConversationPhase::Duration => {
                let mut why = "How long symptoms last helps separate a passing issue from one \
                               that needs a doctor."
                    .to_string();
                if let Some(age) = profile
                    .age
                    .filter(|_| profile.is_senior() || profile.is_minor())
                {
                    why.push_str(&format!(
                        " At age {age}, symptoms can change faster, so timing matters more."
                    ));
                }
                Question {
                    text: "How long has this been going on?".into(),
                    why_asking: why,
                }
            }
            ConversationPhase::Severity => {
                let mut why = "Severity is the biggest factor in how soon care is needed."
                    .to_string();
                if profile.has_conditions() {
                    why.push_str(&format!(
                        " With {possessive} {}, even moderate symptoms deserve attention.",
                        profile.conditions_list()
                    ));
                }
                Question {
                    text: "On a scale of 1 to 10, how severe is it? You can also answer 1-3, \
                           4-6 or 7-10."
                        .into(),
                    why_asking: why,
                }
            }
            ConversationPhase::RedFlags => {
                let mut why =
                    format!("These warning signs mean a doctor should see {subject} sooner.");
                if !profile.medications.is_empty() {
                    why.push_str(&format!(
                        " Some of them can also be side effects of {}.",
                        profile.medications_list()
                    ));
                }
                Question {
                    text: format!(
                        "Is there any {}? Please answer yes or no.",
                        join_or(red_flag_checklist)
                    ),
                    why_asking: why,
                }
            }
            ConversationPhase::Assess | ConversationPhase::EmergencyExit => Question {
                text: String::new(),
                why_asking: String::new(),
            },
        }
    }

    /// Advisory shown when optional profile data is absent.
    pub fn missing_data_advisory(profile: &ProfileContext, missing: &[MissingField]) -> String {
        format!(
            "I don't have {} on file for {}. I can only check against what's recorded, \
             so please mention any medicines or allergies to the doctor.",
            join_list(missing.iter().map(|m| m.label())),
            profile.subject_phrase()
        )
    }

    /// Fixed emergency instruction. Ends the conversation.
    pub fn emergency(emergency_number: &str) -> String {
        format!(
            "This could be a medical emergency. Please call emergency services \
             ({emergency_number}) now or go to the nearest emergency room. Do not wait to see \
             if it gets better."
        )
    }

    pub fn emergency_reasoning(hit: &EmergencyMatch) -> String {
        format!(
            "You mentioned \"{}\", which can be a sign of a serious {} problem.",
            hit.keyword,
            hit.category.replace('_', " ")
        )
    }

    /// Final recommendation message body.
    pub fn recommendation(rec: &Recommendation) -> String {
        let mut text = format!(
            "My recommendation: {} ({}).",
            rec.care_type.label(),
            rec.urgency
        );
        if let Some(relief) = &rec.suggested_relief {
            text.push_str(&format!(
                " For relief in the meantime, {} may help.",
                relief.treatment
            ));
        }
        if let Some(follow_up) = &rec.follow_up {
            text.push(' ');
            text.push_str(follow_up);
        }
        text
    }

    /// Result of an on-demand treatment check.
    pub fn treatment_check(result: &MedicationSafety) -> String {
        if result.safe {
            return format!(
                "I found no listed conflict for {} with the allergies and medications on file. \
                 This is not a full interaction check; confirm with a pharmacist.",
                result.candidate
            );
        }
        let reasons: Vec<&str> = result.conflicts.iter().map(|c| c.message.as_str()).collect();
        let mut text = reasons.join(" ");
        if result.alternatives.is_empty() {
            text.push_str(" Please ask a pharmacist for a safe option.");
        } else {
            text.push_str(&format!(" Consider {} instead.", join_or(&result.alternatives)));
        }
        text
    }
}

fn join_or(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [one] => one.clone(),
        [init @ .., last] => format!("{} or {}", init.join(", "), last),
    }
}

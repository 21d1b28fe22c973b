//! Allergy and drug-interaction check for a proposed treatment.
//!
//! Only called when a concrete treatment is about to be suggested. The table
//! is small and open-world: anything it does not list is reported as safe,
//! which is a limitation rather than a clinical clearance.

use serde::{Deserialize, Serialize};

use crate::models::ProfileContext;

use super::reference::{InteractionRule, InteractionTrigger, KnowledgeBase};

/// One interaction rule that blocked the candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionHit {
    pub rule_id: String,
    /// The profile entry (allergy or medication) that activated the rule.
    pub profile_entry: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationSafety {
    pub candidate: String,
    pub safe: bool,
    pub conflicts: Vec<InteractionHit>,
    /// Union of the alternatives offered by every blocking rule.
    pub alternatives: Vec<String>,
}

/// Check a candidate treatment against the profile's allergies and
/// current medications.
pub fn check_medication_safety(
    profile: &ProfileContext,
    candidate: &str,
    kb: &KnowledgeBase,
) -> MedicationSafety {
    let candidate_lower = candidate.to_lowercase();
    let mut conflicts = Vec::new();
    let mut alternatives: Vec<String> = Vec::new();

    for rule in &kb.interaction_rules {
        let blocked = rule
            .blocked_terms
            .iter()
            .any(|t| candidate_lower.contains(&t.to_lowercase()));
        if !blocked {
            continue;
        }

        let Some(entry) = triggering_entry(profile, rule) else {
            continue;
        };

        conflicts.push(InteractionHit {
            rule_id: rule.id.clone(),
            message: format!(
                "{} is not suitable: it {} (listed: {}).",
                candidate, rule.reason, entry
            ),
            profile_entry: entry.to_string(),
        });

        for alt in &rule.alternatives {
            // An alternative blocked by another rule is not offered.
            if !alternatives.contains(alt) && !is_blocked_elsewhere(profile, alt, kb) {
                alternatives.push(alt.clone());
            }
        }
    }

    let safe = conflicts.is_empty();
    if !safe {
        tracing::info!(
            conflicts = conflicts.len(),
            alternatives = alternatives.len(),
            "Proposed treatment blocked by interaction table"
        );
    }

    MedicationSafety {
        candidate: candidate.to_string(),
        safe,
        conflicts,
        alternatives,
    }
}

/// The profile allergy or medication matching the rule's trigger, if any.
fn triggering_entry<'a>(profile: &'a ProfileContext, rule: &InteractionRule) -> Option<&'a str> {
    match &rule.trigger {
        InteractionTrigger::Allergy { allergen } => {
            let needle = allergen.to_lowercase();
            profile
                .allergies
                .iter()
                .find(|a| a.to_lowercase().contains(&needle))
                .map(String::as_str)
        }
        InteractionTrigger::Medication { medication } => {
            let needle = medication.to_lowercase();
            profile
                .medications
                .iter()
                .find(|m| m.to_lowercase().contains(&needle))
                .map(String::as_str)
        }
    }
}

fn is_blocked_elsewhere(profile: &ProfileContext, candidate: &str, kb: &KnowledgeBase) -> bool {
    let lower = candidate.to_lowercase();
    kb.interaction_rules.iter().any(|rule| {
        rule.blocked_terms
            .iter()
            .any(|t| lower.contains(&t.to_lowercase()))
            && triggering_entry(profile, rule).is_some()
    })
}

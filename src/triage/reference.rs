use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::types::TriageError;

/// Emergency keyword group. Any keyword hit is a positive screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyRule {
    pub id: String,
    pub category: String,
    pub keywords: Vec<String>,
}

/// What in the profile activates an interaction rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InteractionTrigger {
    Allergy { allergen: String },
    Medication { medication: String },
}

/// A blocked combination of profile fact and proposed treatment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRule {
    pub id: String,
    pub trigger: InteractionTrigger,
    /// Proposals containing any of these terms are blocked.
    pub blocked_terms: Vec<String>,
    pub alternatives: Vec<String>,
    pub reason: String,
}

/// Presenting-complaint term to first-line relief option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReliefEntry {
    pub symptom_terms: Vec<String>,
    pub treatment: String,
}

/// The rule tables the engine consults.
///
/// Kept as data so rules can be added without touching control flow.
/// [`KnowledgeBase::builtin`] carries the shipped tables;
/// [`KnowledgeBase::load`] reads replacements from a resources directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    pub emergency_rules: Vec<EmergencyRule>,
    pub interaction_rules: Vec<InteractionRule>,
    pub relief_table: Vec<ReliefEntry>,
    pub red_flag_checklist: Vec<String>,
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::builtin()
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn emergency(id: &str, category: &str, keywords: &[&str]) -> EmergencyRule {
    EmergencyRule {
        id: id.into(),
        category: category.into(),
        keywords: strings(keywords),
    }
}

impl KnowledgeBase {
    pub const EMERGENCY_FILE: &'static str = "emergency_rules.json";
    pub const INTERACTION_FILE: &'static str = "interaction_rules.json";
    pub const RELIEF_FILE: &'static str = "relief_table.json";
    pub const RED_FLAG_FILE: &'static str = "red_flags.json";

    /// Shipped rule tables. Best-effort heuristics, not a clinical reference.
    pub fn builtin() -> Self {
        Self {
            emergency_rules: vec![
                emergency("EMG-CARDIAC", "cardiac", &["chest pain", "heart attack"]),
                emergency(
                    "EMG-RESPIRATORY",
                    "respiratory",
                    &["can't breathe", "difficulty breathing"],
                ),
                emergency("EMG-BLEEDING", "bleeding", &["severe bleeding"]),
                emergency(
                    "EMG-NEURO",
                    "neurological",
                    &[
                        "unconscious",
                        "stroke",
                        "confused",
                        "can't move",
                        "vision loss",
                        "slurred speech",
                    ],
                ),
                emergency("EMG-MENTAL-HEALTH", "mental_health", &["suicide", "overdose"]),
                emergency("EMG-PAIN", "pain", &["severe pain"]),
            ],
            interaction_rules: vec![
                InteractionRule {
                    id: "INT-PENICILLIN".into(),
                    trigger: InteractionTrigger::Allergy {
                        allergen: "penicillin".into(),
                    },
                    blocked_terms: strings(&[
                        "penicillin",
                        "amoxicillin",
                        "ampicillin",
                        "augmentin",
                        "piperacillin",
                        "dicloxacillin",
                    ]),
                    alternatives: strings(&["Azithromycin", "Cephalexin"]),
                    reason: "belongs to the penicillin family".into(),
                },
                InteractionRule {
                    id: "INT-SHELLFISH".into(),
                    trigger: InteractionTrigger::Allergy {
                        allergen: "shellfish".into(),
                    },
                    blocked_terms: strings(&["iodine", "povidone", "contrast"]),
                    alternatives: Vec::new(),
                    reason: "contains iodine".into(),
                },
                InteractionRule {
                    id: "INT-WARFARIN".into(),
                    trigger: InteractionTrigger::Medication {
                        medication: "warfarin".into(),
                    },
                    blocked_terms: strings(&["aspirin"]),
                    alternatives: strings(&["Acetaminophen"]),
                    reason: "raises bleeding risk together with Warfarin".into(),
                },
                InteractionRule {
                    id: "INT-METFORMIN".into(),
                    trigger: InteractionTrigger::Medication {
                        medication: "metformin".into(),
                    },
                    blocked_terms: strings(&["alcohol", "hot toddy", "wine"]),
                    alternatives: Vec::new(),
                    reason: "involves alcohol, which should be avoided with Metformin".into(),
                },
            ],
            relief_table: vec![
                ReliefEntry {
                    symptom_terms: strings(&["headache", "migraine", "pain", "ache"]),
                    treatment: "Ibuprofen".into(),
                },
                ReliefEntry {
                    symptom_terms: strings(&["fever", "temperature", "chills"]),
                    treatment: "Acetaminophen".into(),
                },
                ReliefEntry {
                    symptom_terms: strings(&["cough", "sore throat", "cold"]),
                    treatment: "Honey and warm fluids".into(),
                },
                ReliefEntry {
                    symptom_terms: strings(&["nausea", "stomach", "diarrhea"]),
                    treatment: "Oral rehydration salts".into(),
                },
            ],
            red_flag_checklist: strings(&[
                "high fever",
                "breathing difficulty",
                "persistent vomiting",
                "fainting",
                "blood in stool",
                "stiff neck",
            ]),
        }
    }

    /// Load rule tables from a resources directory. Files that are absent
    /// keep their built-in table; files that are present must parse.
    pub fn load(resources_dir: &Path) -> Result<Self, TriageError> {
        let builtin = Self::builtin();

        let kb = Self {
            emergency_rules: load_table(resources_dir, Self::EMERGENCY_FILE)?
                .unwrap_or(builtin.emergency_rules),
            interaction_rules: load_table(resources_dir, Self::INTERACTION_FILE)?
                .unwrap_or(builtin.interaction_rules),
            relief_table: load_table(resources_dir, Self::RELIEF_FILE)?
                .unwrap_or(builtin.relief_table),
            red_flag_checklist: load_table(resources_dir, Self::RED_FLAG_FILE)?
                .unwrap_or(builtin.red_flag_checklist),
        };

        tracing::info!(
            emergency_rules = kb.emergency_rules.len(),
            interaction_rules = kb.interaction_rules.len(),
            relief_entries = kb.relief_table.len(),
            "Knowledge base loaded"
        );

        Ok(kb)
    }

    pub fn emergency_rule(&self, id: &str) -> Option<&EmergencyRule> {
        self.emergency_rules.iter().find(|r| r.id == id)
    }

    pub fn interaction_rule(&self, id: &str) -> Option<&InteractionRule> {
        self.interaction_rules.iter().find(|r| r.id == id)
    }

    /// First relief option whose symptom term appears in the complaint.
    pub fn relief_for(&self, complaint: &str) -> Option<&ReliefEntry> {
        let lower = complaint.to_lowercase();
        self.relief_table
            .iter()
            .find(|e| e.symptom_terms.iter().any(|t| lower.contains(&t.to_lowercase())))
    }
}

fn load_table<T: DeserializeOwned>(dir: &Path, file: &str) -> Result<Option<T>, TriageError> {
    let path = dir.join(file);
    if !path.exists() {
        tracing::debug!(file, "Reference table not found, using built-in");
        return Ok(None);
    }

    let json = std::fs::read_to_string(&path).map_err(|e| {
        TriageError::ReferenceDataLoad(path.display().to_string(), e.to_string())
    })?;
    let table = serde_json::from_str(&json)
        .map_err(|e| TriageError::ReferenceDataParse(file.to_string(), e.to_string()))?;

    Ok(Some(table))
}

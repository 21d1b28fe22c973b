use std::collections::BTreeSet;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::Relationship;
use crate::triage::TriageError;

/// Age from which a care subject is treated as a senior.
pub const SENIOR_AGE: u32 = 60;
/// Age below which a care subject is treated as a minor.
pub const MINOR_AGE: u32 = 18;

/// A previous triage conversation for the same care subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PastSession {
    pub date: NaiveDate,
    pub symptoms: Vec<String>,
    pub outcome: String,
    pub resolution: Option<String>,
}

/// Identity and medical background of the care subject.
///
/// Supplied by the profile-management collaborator and treated as immutable
/// for the lifetime of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileContext {
    pub id: Uuid,
    pub name: String,
    pub relationship: Relationship,
    pub age: Option<u32>,
    #[serde(default)]
    pub conditions: BTreeSet<String>,
    #[serde(default)]
    pub medications: Vec<String>,
    #[serde(default)]
    pub allergies: BTreeSet<String>,
    #[serde(default)]
    pub blood_group: Option<String>,
    #[serde(default)]
    pub past_sessions: Vec<PastSession>,
}

/// Optional profile data that is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingField {
    Medications,
    Allergies,
    BloodGroup,
}

impl MissingField {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Medications => "current medications",
            Self::Allergies => "allergies",
            Self::BloodGroup => "blood group",
        }
    }
}

impl ProfileContext {
    pub fn new(name: &str, relationship: Relationship, age: Option<u32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            relationship,
            age,
            conditions: BTreeSet::new(),
            medications: Vec::new(),
            allergies: BTreeSet::new(),
            blood_group: None,
            past_sessions: Vec::new(),
        }
    }

    /// Read a profile from a JSON file.
    pub fn load(path: &Path) -> Result<Self, TriageError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| TriageError::ProfileLoad(path.display().to_string(), e.to_string()))?;
        serde_json::from_str(&json)
            .map_err(|e| TriageError::ProfileLoad(path.display().to_string(), e.to_string()))
    }

    pub fn has_conditions(&self) -> bool {
        !self.conditions.is_empty()
    }

    pub fn is_senior(&self) -> bool {
        self.age.is_some_and(|a| a >= SENIOR_AGE)
    }

    pub fn is_minor(&self) -> bool {
        self.age.is_some_and(|a| a < MINOR_AGE)
    }

    /// How engine messages refer to the care subject.
    pub fn subject_phrase(&self) -> String {
        match self.relationship {
            Relationship::Me => "you".to_string(),
            Relationship::Other => self.name.clone(),
            rel => format!("your {}", rel.as_str()),
        }
    }

    /// "are" for the user, "is" for anyone else.
    pub fn subject_be(&self) -> &'static str {
        match self.relationship {
            Relationship::Me => "are",
            _ => "is",
        }
    }

    /// Possessive form of [`subject_phrase`](Self::subject_phrase).
    pub fn subject_possessive(&self) -> String {
        match self.relationship {
            Relationship::Me => "your".to_string(),
            Relationship::Other => format!("{}'s", self.name),
            rel => format!("your {}'s", rel.as_str()),
        }
    }

    /// Conditions joined for prose, in stable order.
    pub fn conditions_list(&self) -> String {
        join_list(self.conditions.iter().map(String::as_str))
    }

    pub fn medications_list(&self) -> String {
        join_list(self.medications.iter().map(String::as_str))
    }

    pub fn last_session(&self) -> Option<&PastSession> {
        self.past_sessions.last()
    }

    /// Optional fields with no data. Used for the advisory message only,
    /// never as a risk input.
    pub fn missing_fields(&self) -> Vec<MissingField> {
        let mut missing = Vec::new();
        if self.medications.is_empty() {
            missing.push(MissingField::Medications);
        }
        if self.allergies.is_empty() {
            missing.push(MissingField::Allergies);
        }
        if self.blood_group.as_deref().map_or(true, |b| b.trim().is_empty()) {
            missing.push(MissingField::BloodGroup);
        }
        missing
    }
}

/// "a", "a and b", "a, b and c".
pub fn join_list<'a>(items: impl Iterator<Item = &'a str>) -> String {
    let items: Vec<&str> = items.collect();
    match items.as_slice() {
        [] => String::new(),
        [one] => one.to_string(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

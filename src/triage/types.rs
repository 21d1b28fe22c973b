use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::enums::{
    ActionId, CareMethod, RecommendationKind, RiskLevel, RiskTolerance, Tone, TriageLevel,
};
use crate::models::Message;

// ---------------------------------------------------------------------------
// Conversation phases
// ---------------------------------------------------------------------------

/// Step index at which the intake is complete and assessment runs.
pub const ASSESS_STEP: u8 = 4;

/// Where a conversation currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationPhase {
    Symptom,
    Duration,
    Severity,
    RedFlags,
    /// Terminal success.
    Assess,
    /// Terminal, reachable from any step.
    EmergencyExit,
}

impl ConversationPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Assess | Self::EmergencyExit)
    }
}

// ---------------------------------------------------------------------------
// ConversationState
// ---------------------------------------------------------------------------

/// Accumulated intake answers for one session.
///
/// A plain value: transitions take the previous state by reference and
/// return a new one (see [`super::conversation::advance`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    pub session_id: Uuid,
    pub profile_id: Uuid,
    /// First entry is the presenting complaint.
    pub symptoms: Vec<String>,
    pub duration: Option<String>,
    /// 1..=10 once the severity step has been answered.
    pub severity: Option<u8>,
    pub red_flags: BTreeSet<String>,
    pub is_emergency: bool,
    pub step: u8,
    /// Raw reply text keyed by the step it answered.
    pub answers: BTreeMap<u8, String>,
    /// Sequence number for the next transcript message id.
    pub next_message_seq: u64,
}

impl ConversationState {
    pub fn new(session_id: Uuid, profile_id: Uuid) -> Self {
        Self {
            session_id,
            profile_id,
            symptoms: Vec::new(),
            duration: None,
            severity: None,
            red_flags: BTreeSet::new(),
            is_emergency: false,
            step: 0,
            answers: BTreeMap::new(),
            next_message_seq: 0,
        }
    }

    pub fn phase(&self) -> ConversationPhase {
        if self.is_emergency {
            return ConversationPhase::EmergencyExit;
        }
        match self.step {
            0 => ConversationPhase::Symptom,
            1 => ConversationPhase::Duration,
            2 => ConversationPhase::Severity,
            3 => ConversationPhase::RedFlags,
            _ => ConversationPhase::Assess,
        }
    }

    pub fn presenting_complaint(&self) -> Option<&str> {
        self.symptoms.first().map(String::as_str)
    }

    pub fn has_red_flags(&self) -> bool {
        !self.red_flags.is_empty()
    }

    /// Deterministic id for the next transcript message.
    pub(crate) fn next_message_id(&mut self) -> Uuid {
        let seq = self.next_message_seq;
        self.next_message_seq += 1;
        Uuid::new_v5(&self.session_id, &seq.to_be_bytes())
    }
}

// ---------------------------------------------------------------------------
// Personalization
// ---------------------------------------------------------------------------

/// Behavioral modifiers derived from a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalizationModifiers {
    pub risk_tolerance: RiskTolerance,
    pub preferred_care_method: CareMethod,
    pub urgency_multiplier: f64,
    pub tone: Tone,
    pub should_check_medications: bool,
    pub should_refer_past: bool,
}

// ---------------------------------------------------------------------------
// Reasoning
// ---------------------------------------------------------------------------

/// One rule that fired, with its user-facing explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiredRule {
    pub rule_id: String,
    /// Score contribution; zero for rules that only explain a decision.
    pub weight: u32,
    pub explanation: String,
}

impl FiredRule {
    pub fn new(rule_id: &str, weight: u32, explanation: String) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            weight,
            explanation,
        }
    }
}

/// Render reasoning entries as a single paragraph.
pub fn render_reasoning(rules: &[FiredRule]) -> String {
    rules
        .iter()
        .map(|r| r.explanation.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Risk and recommendation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub score: u32,
    /// Ordered as the rules fired.
    pub reasoning: Vec<FiredRule>,
}

/// Care setting offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CareType {
    HomeVisit,
    VideoOrInPerson,
    VideoConsultation,
    SelfCare,
}

impl CareType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::HomeVisit => "Home visit",
            Self::VideoOrInPerson => "Video or in-person visit",
            Self::VideoConsultation => "Video consultation",
            Self::SelfCare => "Self-care with monitoring",
        }
    }

    pub fn kind(&self) -> RecommendationKind {
        match self {
            Self::HomeVisit => RecommendationKind::HomeVisit,
            Self::VideoOrInPerson | Self::VideoConsultation => RecommendationKind::Video,
            Self::SelfCare => RecommendationKind::SelfCare,
        }
    }
}

/// A symptom-relief option that passed the medication safety check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReliefSuggestion {
    pub treatment: String,
    /// Set when the first choice was blocked and replaced.
    pub replaced: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub care_type: CareType,
    pub urgency: String,
    pub reasoning: Vec<FiredRule>,
    pub follow_up: Option<String>,
    pub suggested_relief: Option<ReliefSuggestion>,
}

impl Recommendation {
    pub fn kind(&self) -> RecommendationKind {
        self.care_type.kind()
    }
}

// ---------------------------------------------------------------------------
// Triage and CTA
// ---------------------------------------------------------------------------

/// Inputs to the triage mapper. Every field is optional so partial
/// outcomes (e.g. an emergency exit with no risk score) map cleanly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageInput {
    pub recommendation: Option<RecommendationKind>,
    pub risk_level: Option<RiskLevel>,
    pub red_flags_present: bool,
    pub severity: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CtaAction {
    pub label: String,
    pub action_id: ActionId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CtaConfig {
    pub level: TriageLevel,
    pub primary: CtaAction,
    pub secondary: Option<CtaAction>,
    pub hint: Option<String>,
    /// Present for every level.
    pub tertiary: CtaAction,
}

impl CtaConfig {
    pub fn actions(&self) -> Vec<&CtaAction> {
        let mut actions = vec![&self.primary];
        actions.extend(self.secondary.as_ref());
        actions.push(&self.tertiary);
        actions
    }
}

// ---------------------------------------------------------------------------
// Turn results
// ---------------------------------------------------------------------------

/// Final result of a completed intake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub modifiers: PersonalizationModifiers,
    pub risk: RiskAssessment,
    pub recommendation: Recommendation,
    pub triage_level: TriageLevel,
    pub cta: CtaConfig,
}

/// Terminal emergency result. No recommendation is produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyOutcome {
    pub rule_id: String,
    pub matched_keyword: String,
    pub tone: Tone,
    pub triage_level: TriageLevel,
    pub cta: CtaConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TurnOutcome {
    /// Intake continues; the next question was emitted.
    AwaitingAnswer { phase: ConversationPhase },
    Assessed(Box<Assessment>),
    Emergency(Box<EmergencyOutcome>),
}

/// Output of one state transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub state: ConversationState,
    /// Messages in transcript order, including the logged user message.
    pub messages: Vec<Message>,
    pub outcome: TurnOutcome,
}

// ---------------------------------------------------------------------------
// TriageError
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum TriageError {
    #[error("Conversation already finished; start a new session")]
    ConversationClosed,

    #[error("Conversation belongs to profile {expected}, got {actual}")]
    ProfileMismatch { expected: Uuid, actual: Uuid },

    #[error("Invalid value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Reference data load failed ({0}): {1}")]
    ReferenceDataLoad(String, String),

    #[error("Reference data parse failed ({0}): {1}")]
    ReferenceDataParse(String, String),

    #[error("Profile load failed ({0}): {1}")]
    ProfileLoad(String, String),

    #[error("Config load failed ({0}): {1}")]
    ConfigLoad(String, String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_follows_step() {
        let mut state = ConversationState::new(Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(state.phase(), ConversationPhase::Symptom);
        state.step = 3;
        assert_eq!(state.phase(), ConversationPhase::RedFlags);
        state.step = ASSESS_STEP;
        assert_eq!(state.phase(), ConversationPhase::Assess);
        assert!(state.phase().is_terminal());
    }

    #[test]
    fn emergency_overrides_step() {
        let mut state = ConversationState::new(Uuid::new_v4(), Uuid::new_v4());
        state.step = 1;
        state.is_emergency = true;
        assert_eq!(state.phase(), ConversationPhase::EmergencyExit);
    }

    #[test]
    fn message_ids_are_deterministic_per_session() {
        let session = Uuid::new_v4();
        let mut a = ConversationState::new(session, Uuid::nil());
        let mut b = ConversationState::new(session, Uuid::nil());
        let first = a.next_message_id();
        assert_eq!(first, b.next_message_id());
        assert_ne!(first, a.next_message_id());
        assert_eq!(a.next_message_seq, 2);
    }

    #[test]
    fn care_type_kinds() {
        assert_eq!(CareType::HomeVisit.kind(), RecommendationKind::HomeVisit);
        assert_eq!(CareType::VideoOrInPerson.kind(), RecommendationKind::Video);
        assert_eq!(CareType::VideoConsultation.kind(), RecommendationKind::Video);
        assert_eq!(CareType::SelfCare.label(), "Self-care with monitoring");
    }

    #[test]
    fn reasoning_renders_in_order() {
        let rules = vec![
            FiredRule::new("a", 1, "First.".into()),
            FiredRule::new("b", 0, "Second.".into()),
        ];
        assert_eq!(render_reasoning(&rules), "First. Second.");
    }
}

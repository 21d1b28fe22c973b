use std::path::Path;
use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::models::enums::MessageType;
use crate::models::{Message, ProfileContext};

use super::conversation::{advance, start_conversation};
use super::medication_safety::{check_medication_safety, MedicationSafety};
use super::messages::MessageTemplates;
use super::reference::KnowledgeBase;
use super::summary::SessionSummary;
use super::types::{ConversationState, TriageError, TurnOutcome};

/// Rule tables plus host settings. Shared read-only by every session.
#[derive(Debug, Clone, Default)]
pub struct TriageEngine {
    pub knowledge: KnowledgeBase,
    pub config: EngineConfig,
}

impl TriageEngine {
    pub fn new(knowledge: KnowledgeBase, config: EngineConfig) -> Self {
        Self { knowledge, config }
    }

    /// Load the knowledge base from a resources directory and, when given,
    /// settings from a JSON file.
    pub fn load(resources_dir: &Path, config_path: Option<&Path>) -> Result<Self, TriageError> {
        let knowledge = KnowledgeBase::load(resources_dir)?;
        let config = match config_path {
            Some(path) => EngineConfig::load(path)?,
            None => EngineConfig::default(),
        };
        Ok(Self::new(knowledge, config))
    }
}

/// One care subject's conversation: profile, intake state and transcript.
///
/// Owned by a single caller and driven one utterance at a time.
pub struct TriageSession {
    engine: Arc<TriageEngine>,
    profile: ProfileContext,
    state: ConversationState,
    transcript: Vec<Message>,
    outcome: TurnOutcome,
}

impl TriageSession {
    /// Start a conversation for `profile` and log its opening messages.
    pub fn start(engine: Arc<TriageEngine>, profile: ProfileContext) -> Self {
        let turn = start_conversation(&engine, &profile, Uuid::new_v4(), now());
        Self {
            engine,
            profile,
            state: turn.state,
            transcript: turn.messages,
            outcome: turn.outcome,
        }
    }

    /// Process one utterance. Returns the messages it appended.
    pub fn submit(&mut self, utterance: &str) -> Result<&[Message], TriageError> {
        let turn = advance(&self.engine, &self.state, &self.profile, utterance, now())?;

        let appended_from = self.transcript.len();
        self.transcript.extend(turn.messages);
        self.state = turn.state;
        self.outcome = turn.outcome;

        Ok(&self.transcript[appended_from..])
    }

    /// Replace the care subject. The in-progress conversation is discarded
    /// and a new one starts.
    pub fn switch_profile(&mut self, profile: ProfileContext) {
        tracing::info!(
            session_id = %self.state.session_id,
            discarded_step = self.state.step,
            "Profile switched, discarding conversation"
        );
        *self = Self::start(Arc::clone(&self.engine), profile);
    }

    /// Check a specific treatment against the profile and log the result.
    pub fn check_treatment(&mut self, candidate: &str) -> MedicationSafety {
        let result = check_medication_safety(&self.profile, candidate, &self.engine.knowledge);
        let message = Message {
            id: self.state.next_message_id(),
            message_type: MessageType::System,
            content: MessageTemplates::treatment_check(&result),
            reasoning: None,
            profile_insight: None,
            timestamp: now(),
        };
        self.transcript.push(message);
        result
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary::build(&self.profile, &self.state, &self.outcome, now())
    }

    pub fn profile(&self) -> &ProfileContext {
        &self.profile
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn outcome(&self) -> &TurnOutcome {
        &self.outcome
    }

    pub fn is_finished(&self) -> bool {
        self.state.phase().is_terminal()
    }

    pub fn engine(&self) -> &TriageEngine {
        &self.engine
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

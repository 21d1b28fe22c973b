//! Personalized symptom triage: intake conversation, risk scoring,
//! recommendation and call-to-action mapping.

pub mod conversation;
pub mod cta;
pub mod emergency;
pub mod engine;
pub mod medication_safety;
pub mod messages;
pub mod personalization;
pub mod recommendation;
pub mod reference;
pub mod scoring;
pub mod summary;
pub mod types;


pub use conversation::{advance, assess, start_conversation};
pub use cta::{
    cta_config, dispatch_action, get_triage_level, resolve_action, ActionEffect, ActionHandler,
};
pub use emergency::{screen_utterance, EmergencyMatch};
pub use engine::{TriageEngine, TriageSession};
pub use medication_safety::{check_medication_safety, InteractionHit, MedicationSafety};
pub use personalization::personalize;
pub use recommendation::generate_recommendation;
pub use reference::KnowledgeBase;
pub use scoring::score_risk;
pub use summary::SessionSummary;
pub use types::*;

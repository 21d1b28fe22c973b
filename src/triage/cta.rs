//! Reduce an outcome to a triage level and the fixed action set for it.
//!
//! Everything here is total and side-effect free. Performing an action
//! (dialing, opening a map) belongs to the host through [`ActionHandler`].

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::models::enums::{ActionId, RecommendationKind, RiskLevel, TriageLevel};

use super::types::{CtaAction, CtaConfig, TriageInput};

/// Map an outcome to a triage level. Rules are evaluated in order; the
/// first that matches wins.
pub fn get_triage_level(input: &TriageInput) -> TriageLevel {
    let severity = input.severity.unwrap_or(0);
    let is_video = input.recommendation == Some(RecommendationKind::Video);

    if input.recommendation == Some(RecommendationKind::Emergency)
        || (input.red_flags_present && severity >= 8)
    {
        return TriageLevel::Emergency;
    }
    if input.risk_level == Some(RiskLevel::High) || (is_video && severity >= 7) {
        return TriageLevel::Urgent;
    }
    if input.risk_level == Some(RiskLevel::Medium) || is_video {
        return TriageLevel::Soon;
    }
    TriageLevel::SelfCare
}

fn action(label: &str, action_id: ActionId) -> CtaAction {
    CtaAction {
        label: label.to_string(),
        action_id,
    }
}

/// The fixed action configuration for a triage level.
pub fn cta_config(level: TriageLevel) -> CtaConfig {
    let (primary, secondary, hint) = match level {
        TriageLevel::Emergency => (
            action("Get urgent help now", ActionId::EmergencyCall),
            action("Find nearest ER", ActionId::FindEr),
            "Do not delay seeking care",
        ),
        TriageLevel::Urgent => (
            action("Talk to a doctor today", ActionId::ConnectDoctor),
            action("Book home visit", ActionId::BookHomeVisit),
            "Same-day consultations available",
        ),
        TriageLevel::Soon => (
            action("Schedule teleconsult", ActionId::ScheduleTeleconsult),
            action("Home visit options", ActionId::HomeVisitOptions),
            "Book at your convenience",
        ),
        TriageLevel::SelfCare => (
            action("Set check-in reminder", ActionId::SetReminder),
            action("Home remedies checklist", ActionId::HomeRemedies),
            "Monitor and follow up if needed",
        ),
    };

    CtaConfig {
        level,
        primary,
        secondary: Some(secondary),
        hint: Some(hint.to_string()),
        tertiary: action("Save/Share Summary", ActionId::SaveShare),
    }
}

// ---------------------------------------------------------------------------
// Action resolution
// ---------------------------------------------------------------------------

/// What the host should do for an action id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum ActionEffect {
    Dial { number: String },
    OpenMap { query: String },
    /// Known id with no external behavior; the host handles it in its UI.
    PresentationOnly { action_id: ActionId },
    /// Not part of the action contract. Ignored by the host.
    Unsupported { raw_id: String },
}

/// Resolve a raw action id from the UI. Unknown ids degrade to
/// [`ActionEffect::Unsupported`] instead of failing.
pub fn resolve_action(raw_id: &str, config: &EngineConfig) -> ActionEffect {
    match ActionId::from_str(raw_id.trim()) {
        Ok(ActionId::EmergencyCall) => ActionEffect::Dial {
            number: config.emergency_number.clone(),
        },
        Ok(ActionId::FindEr) => ActionEffect::OpenMap {
            query: config.er_search_query.clone(),
        },
        Ok(action_id) => ActionEffect::PresentationOnly { action_id },
        Err(_) => {
            tracing::warn!(raw_id, "Unknown CTA action id");
            ActionEffect::Unsupported {
                raw_id: raw_id.to_string(),
            }
        }
    }
}

/// Host-side collaborator that performs resolved actions.
pub trait ActionHandler {
    type Error: std::error::Error;

    fn dial(&mut self, number: &str) -> Result<(), Self::Error>;

    fn open_map(&mut self, query: &str) -> Result<(), Self::Error>;

    /// Presentation-only actions. Default: nothing to do.
    fn present(&mut self, _action_id: ActionId) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Resolve and hand an action to the host. Unsupported ids are a no-op.
pub fn dispatch_action<H: ActionHandler>(
    raw_id: &str,
    config: &EngineConfig,
    handler: &mut H,
) -> Result<ActionEffect, H::Error> {
    let effect = resolve_action(raw_id, config);
    match &effect {
        ActionEffect::Dial { number } => handler.dial(number)?,
        ActionEffect::OpenMap { query } => handler.open_map(query)?,
        ActionEffect::PresentationOnly { action_id } => handler.present(*action_id)?,
        ActionEffect::Unsupported { .. } => {}
    }
    Ok(effect)
}

//! Five-step intake state machine.
//!
//! Symptom → Duration → Severity → RedFlags → Assess, with an emergency exit
//! reachable from every step. Transitions are pure: they take the previous
//! [`ConversationState`] by reference and return the next one together with
//! the messages produced by the turn.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;
use uuid::Uuid;

use crate::models::enums::{MessageType, RecommendationKind, Tone};
use crate::models::{Message, ProfileContext};

use super::cta::{cta_config, get_triage_level};
use super::emergency::{screen_utterance, EmergencyMatch};
use super::engine::TriageEngine;
use super::messages::MessageTemplates;
use super::personalization::{personalize, profile_insights};
use super::recommendation::generate_recommendation;
use super::scoring::score_risk;
use super::types::{
    render_reasoning, Assessment, ConversationPhase, ConversationState, EmergencyOutcome,
    TriageError, TriageInput, Turn, TurnOutcome, ASSESS_STEP,
};

/// Label recorded when the user confirms a warning sign without naming one.
pub const UNSPECIFIED_RED_FLAG: &str = "reported";

static RE_SEVERITY_BUCKET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(1\s*[-\x{2013}]\s*3|4\s*[-\x{2013}]\s*6|7\s*[-\x{2013}]\s*10)\b").unwrap()
});

static RE_LEADING_INT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d{1,3})").unwrap());

/// Parse a severity reply. A categorical bucket anywhere in the reply wins,
/// then a leading integer clamped to 1..=10. Anything else falls back to
/// `default`.
///
/// Spelled-out numbers ("ten") are not understood and take the default.
pub fn parse_severity(text: &str, default: u8) -> u8 {
    if let Some(bucket) = RE_SEVERITY_BUCKET.captures(text).and_then(|caps| caps.get(1)) {
        return match bucket.as_str().chars().next() {
            Some('1') => 2,
            Some('4') => 5,
            _ => 8,
        };
    }

    RE_LEADING_INT
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .map(|n| n.clamp(1, 10) as u8)
        .unwrap_or(default)
}

/// Red flags are present iff the reply contains "yes" (case-insensitive).
/// Named checklist items are recorded; otherwise a generic label is.
pub fn parse_red_flags(text: &str, checklist: &[String]) -> BTreeSet<String> {
    let lower = text.to_lowercase();
    if !lower.contains("yes") {
        return BTreeSet::new();
    }

    let named: BTreeSet<String> = checklist
        .iter()
        .filter(|item| lower.contains(&item.to_lowercase()))
        .cloned()
        .collect();

    if named.is_empty() {
        BTreeSet::from([UNSPECIFIED_RED_FLAG.to_string()])
    } else {
        named
    }
}

/// Open a conversation: greeting, optional missing-data advisory, and the
/// first question.
pub fn start_conversation(
    engine: &TriageEngine,
    profile: &ProfileContext,
    session_id: Uuid,
    now: NaiveDateTime,
) -> Turn {
    let mut state = ConversationState::new(session_id, profile.id);
    let mut messages = Vec::new();
    let modifiers = personalize(profile);
    let insight = join_insights(profile_insights(profile, &modifiers));

    let greeting = MessageTemplates::greeting(profile, &modifiers);
    push(&mut state, &mut messages, MessageType::Carebow, greeting, None, insight, now);

    let missing = profile.missing_fields();
    if !missing.is_empty() {
        let advisory = MessageTemplates::missing_data_advisory(profile, &missing);
        push(&mut state, &mut messages, MessageType::System, advisory, None, None, now);
    }

    let question = MessageTemplates::question(
        ConversationPhase::Symptom,
        profile,
        &engine.knowledge.red_flag_checklist,
    );
    push(
        &mut state,
        &mut messages,
        MessageType::Carebow,
        question.text,
        Some(question.why_asking),
        None,
        now,
    );

    tracing::info!(
        session_id = %session_id,
        profile_id = %profile.id,
        tone = modifiers.tone.as_str(),
        "Triage conversation started"
    );

    Turn {
        state,
        messages,
        outcome: TurnOutcome::AwaitingAnswer {
            phase: ConversationPhase::Symptom,
        },
    }
}

/// Apply one user utterance.
///
/// The emergency screen runs first on the raw text and, when positive, ends
/// the conversation without recording the answer. It also runs after the
/// conversation has finished: a positive screen still emits the emergency
/// message, any other utterance is rejected.
pub fn advance(
    engine: &TriageEngine,
    state: &ConversationState,
    profile: &ProfileContext,
    utterance: &str,
    now: NaiveDateTime,
) -> Result<Turn, TriageError> {
    if state.profile_id != profile.id {
        return Err(TriageError::ProfileMismatch {
            expected: state.profile_id,
            actual: profile.id,
        });
    }
    let emergency = screen_utterance(utterance, &engine.knowledge);
    if state.phase().is_terminal() && emergency.is_none() {
        return Err(TriageError::ConversationClosed);
    }

    let mut next = state.clone();
    let mut messages = Vec::new();
    push(
        &mut next,
        &mut messages,
        MessageType::User,
        utterance.to_string(),
        None,
        None,
        now,
    );

    if let Some(hit) = emergency {
        let outcome = emergency_exit(engine, &mut next, &mut messages, &hit, now);
        return Ok(Turn {
            state: next,
            messages,
            outcome,
        });
    }

    let phase = next.phase();
    next.answers.insert(next.step, utterance.to_string());
    match phase {
        ConversationPhase::Symptom => next.symptoms.push(utterance.to_string()),
        ConversationPhase::Duration => next.duration = Some(utterance.to_string()),
        ConversationPhase::Severity => {
            next.severity = Some(parse_severity(utterance, engine.config.default_severity))
        }
        ConversationPhase::RedFlags => {
            next.red_flags = parse_red_flags(utterance, &engine.knowledge.red_flag_checklist)
        }
        ConversationPhase::Assess | ConversationPhase::EmergencyExit => {}
    }
    next.step += 1;

    tracing::debug!(
        session_id = %next.session_id,
        step = next.step,
        "Intake answer recorded"
    );

    if next.step < ASSESS_STEP {
        let phase = next.phase();
        let question =
            MessageTemplates::question(phase, profile, &engine.knowledge.red_flag_checklist);
        push(
            &mut next,
            &mut messages,
            MessageType::Carebow,
            question.text,
            Some(question.why_asking),
            None,
            now,
        );
        return Ok(Turn {
            state: next,
            messages,
            outcome: TurnOutcome::AwaitingAnswer { phase },
        });
    }

    let assessment = assess(engine, &next, profile);
    let reasoning = assessment
        .risk
        .reasoning
        .iter()
        .chain(&assessment.recommendation.reasoning)
        .cloned()
        .collect::<Vec<_>>();
    let insight = join_insights(profile_insights(profile, &assessment.modifiers));
    push(
        &mut next,
        &mut messages,
        MessageType::Carebow,
        MessageTemplates::recommendation(&assessment.recommendation),
        Some(render_reasoning(&reasoning)),
        insight,
        now,
    );

    tracing::info!(
        session_id = %next.session_id,
        risk = assessment.risk.level.as_str(),
        score = assessment.risk.score,
        triage_level = assessment.triage_level.as_str(),
        "Triage assessment complete"
    );

    Ok(Turn {
        state: next,
        messages,
        outcome: TurnOutcome::Assessed(Box::new(assessment)),
    })
}

/// Score, recommend and map a completed intake. Pure.
pub fn assess(
    engine: &TriageEngine,
    state: &ConversationState,
    profile: &ProfileContext,
) -> Assessment {
    let modifiers = personalize(profile);
    let risk = score_risk(state, profile);
    let recommendation = generate_recommendation(&risk, profile, state, &engine.knowledge);

    let triage_level = get_triage_level(&TriageInput {
        recommendation: Some(recommendation.kind()),
        risk_level: Some(risk.level),
        red_flags_present: state.has_red_flags(),
        severity: state.severity,
    });

    Assessment {
        modifiers,
        risk,
        recommendation,
        triage_level,
        cta: cta_config(triage_level),
    }
}

fn emergency_exit(
    engine: &TriageEngine,
    state: &mut ConversationState,
    messages: &mut Vec<Message>,
    hit: &EmergencyMatch,
    now: NaiveDateTime,
) -> TurnOutcome {
    state.is_emergency = true;

    push(
        state,
        messages,
        MessageType::Emergency,
        MessageTemplates::emergency(&engine.config.emergency_number),
        Some(MessageTemplates::emergency_reasoning(hit)),
        None,
        now,
    );

    let triage_level = get_triage_level(&TriageInput {
        recommendation: Some(RecommendationKind::Emergency),
        ..TriageInput::default()
    });

    TurnOutcome::Emergency(Box::new(EmergencyOutcome {
        rule_id: hit.rule_id.clone(),
        matched_keyword: hit.keyword.clone(),
        tone: Tone::Urgent,
        triage_level,
        cta: cta_config(triage_level),
    }))
}

fn join_insights(insights: Vec<String>) -> Option<String> {
    if insights.is_empty() {
        None
    } else {
        Some(insights.join(" "))
    }
}

fn push(
    state: &mut ConversationState,
    messages: &mut Vec<Message>,
    message_type: MessageType,
    content: String,
    reasoning: Option<String>,
    profile_insight: Option<String>,
    now: NaiveDateTime,
) {
    messages.push(Message {
        id: state.next_message_id(),
        message_type,
        content,
        reasoning,
        profile_insight,
        timestamp: now,
    });
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::enums::{Relationship, RiskLevel, TriageLevel};
    use crate::triage::types::CareType;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    fn engine() -> TriageEngine {
        TriageEngine::default()
    }

    fn run(
        engine: &TriageEngine,
        profile: &ProfileContext,
        answers: &[&str],
    ) -> (ConversationState, Vec<Message>, TurnOutcome) {
        let start = start_conversation(engine, profile, Uuid::nil(), now());
        let mut state = start.state;
        let mut transcript = start.messages;
        let mut outcome = start.outcome;
        for answer in answers {
            let turn = advance(engine, &state, profile, answer, now()).unwrap();
            state = turn.state;
            transcript.extend(turn.messages);
            outcome = turn.outcome;
        }
        (state, transcript, outcome)
    }

    #[test]
    fn severity_parsing() {
        assert_eq!(parse_severity("8", 5), 8);
        assert_eq!(parse_severity(" 9/10 ", 5), 9);
        assert_eq!(parse_severity("1-3", 5), 2);
        assert_eq!(parse_severity("4 - 6", 5), 5);
        assert_eq!(parse_severity("7-10", 5), 8);
        assert_eq!(parse_severity("7\u{2013}10", 5), 8);
        assert_eq!(parse_severity("pretty bad", 5), 5);
        assert_eq!(parse_severity("ten", 5), 5);
        assert_eq!(parse_severity("15", 5), 10);
        assert_eq!(parse_severity("0", 5), 1);
        assert_eq!(parse_severity("999", 5), 10);
        assert_eq!(parse_severity("", 6), 6);
    }

    #[test]
    fn severity_bucket_inside_sentence() {
        assert_eq!(parse_severity("7-10 I think", 5), 8);
        assert_eq!(parse_severity("I'd say 7-10", 5), 8);
        assert_eq!(parse_severity("maybe 4 \u{2013} 6?", 5), 5);
        assert_eq!(parse_severity("around 1-3 today", 5), 2);
        // Not a bucket: the leading integer still applies.
        assert_eq!(parse_severity("7-100", 5), 7);
    }

    #[test]
    fn bucket_in_sentence_with_red_flags_is_emergency() {
        let profile = ProfileContext::new("Ana", Relationship::Me, Some(30));
        let (state, _, outcome) =
            run(&engine(), &profile, &["headache", "today", "I'd say 7-10", "yes"]);
        assert_eq!(state.severity, Some(8));
        let TurnOutcome::Assessed(assessment) = outcome else {
            panic!("expected assessment");
        };
        assert_eq!(assessment.triage_level, TriageLevel::Emergency);
    }

    #[test]
    fn red_flag_parsing() {
        let checklist = vec!["high fever".to_string(), "fainting".to_string()];
        assert!(parse_red_flags("no", &checklist).is_empty());
        assert_eq!(
            parse_red_flags("YES", &checklist),
            BTreeSet::from([UNSPECIFIED_RED_FLAG.to_string()])
        );
        assert_eq!(
            parse_red_flags("yes, high fever since last night", &checklist),
            BTreeSet::from(["high fever".to_string()])
        );
        // Substring rule: "eyes" contains "yes".
        assert!(!parse_red_flags("no, my eyes are fine", &checklist).is_empty());
    }

    #[test]
    fn start_emits_greeting_advisory_and_question() {
        let profile = ProfileContext::new("Ana", Relationship::Me, Some(30));
        let turn = start_conversation(&engine(), &profile, Uuid::nil(), now());
        let types: Vec<MessageType> = turn.messages.iter().map(|m| m.message_type).collect();
        assert_eq!(
            types,
            vec![MessageType::Carebow, MessageType::System, MessageType::Carebow]
        );
        assert_eq!(turn.state.step, 0);
        assert!(turn.messages[2].reasoning.is_some());
    }

    #[test]
    fn complete_profile_has_no_advisory() {
        let mut profile = ProfileContext::new("Ana", Relationship::Me, Some(30));
        profile.medications.push("Levothyroxine".into());
        profile.allergies.insert("Latex".into());
        profile.blood_group = Some("A+".into());
        let turn = start_conversation(&engine(), &profile, Uuid::nil(), now());
        assert!(turn.messages.iter().all(|m| m.message_type != MessageType::System));
    }

    #[test]
    fn steps_record_answers_in_order() {
        let profile = ProfileContext::new("Ana", Relationship::Me, Some(30));
        let (state, _, outcome) = run(&engine(), &profile, &["sore throat", "1 day", "4-6"]);
        assert_eq!(state.step, 3);
        assert_eq!(state.symptoms, vec!["sore throat"]);
        assert_eq!(state.duration.as_deref(), Some("1 day"));
        assert_eq!(state.severity, Some(5));
        assert_eq!(state.answers.get(&2).map(String::as_str), Some("4-6"));
        assert_eq!(
            outcome,
            TurnOutcome::AwaitingAnswer {
                phase: ConversationPhase::RedFlags
            }
        );
    }

    #[test]
    fn each_turn_logs_one_user_message_first() {
        let profile = ProfileContext::new("Ana", Relationship::Me, Some(30));
        let e = engine();
        let start = start_conversation(&e, &profile, Uuid::nil(), now());
        let turn = advance(&e, &start.state, &profile, "cough", now()).unwrap();
        let users = turn
            .messages
            .iter()
            .filter(|m| m.message_type == MessageType::User)
            .count();
        assert_eq!(users, 1);
        assert_eq!(turn.messages[0].message_type, MessageType::User);
        assert_eq!(turn.messages[0].content, "cough");
    }

    #[test]
    fn advance_does_not_mutate_input_state() {
        let profile = ProfileContext::new("Ana", Relationship::Me, Some(30));
        let e = engine();
        let start = start_conversation(&e, &profile, Uuid::nil(), now());
        let before = start.state.clone();
        let _ = advance(&e, &start.state, &profile, "cough", now()).unwrap();
        assert_eq!(start.state, before);
    }

    #[test]
    fn senior_end_to_end_is_home_visit_within_six_hours() {
        let mut profile = ProfileContext::new("Raj", Relationship::Father, Some(65));
        profile.conditions.insert("Hypertension".into());

        let (state, transcript, outcome) =
            run(&engine(), &profile, &["headache", "2 days", "8", "yes"]);

        assert_eq!(state.phase(), ConversationPhase::Assess);
        let TurnOutcome::Assessed(assessment) = outcome else {
            panic!("expected assessment");
        };
        assert_eq!(assessment.risk.score, 7);
        assert_eq!(assessment.risk.level, RiskLevel::High);
        assert_eq!(assessment.recommendation.care_type, CareType::HomeVisit);
        assert_eq!(assessment.recommendation.urgency, "within 6 hours");
        // red flags + severity 8
        assert_eq!(assessment.triage_level, TriageLevel::Emergency);

        let last = transcript.last().unwrap();
        assert!(last.content.contains("Home visit"));
        assert!(last.reasoning.as_deref().unwrap().contains("Hypertension"));
        assert!(last.profile_insight.as_deref().unwrap().contains("age 65"));
    }

    #[test]
    fn emergency_exits_from_any_step() {
        let profile = ProfileContext::new("Ana", Relationship::Me, Some(30));
        for prefix_len in 0..4 {
            let answers = ["headache", "2 days", "5", "no"];
            let (state, _, _) = run(&engine(), &profile, &answers[..prefix_len]);
            let step_before = state.step;

            let turn = advance(&engine(), &state, &profile, "now he can't breathe", now()).unwrap();
            assert!(turn.state.is_emergency);
            assert_eq!(turn.state.step, step_before);
            assert_eq!(turn.state.phase(), ConversationPhase::EmergencyExit);
            assert!(turn.messages.iter().any(Message::is_emergency));
            let TurnOutcome::Emergency(e) = turn.outcome else {
                panic!("expected emergency");
            };
            assert_eq!(e.tone, Tone::Urgent);
            assert_eq!(e.triage_level, TriageLevel::Emergency);
        }
    }

    #[test]
    fn emergency_answer_is_not_recorded() {
        let profile = ProfileContext::new("Ana", Relationship::Me, Some(30));
        let (state, _, _) = run(&engine(), &profile, &["sudden chest pain now"]);
        assert!(state.is_emergency);
        assert!(state.symptoms.is_empty());
        assert!(state.answers.is_empty());
    }

    #[test]
    fn terminal_states_reject_further_turns() {
        let profile = ProfileContext::new("Ana", Relationship::Me, Some(30));
        let e = engine();

        let (done, _, _) = run(&e, &profile, &["cough", "1 day", "2", "no"]);
        assert!(matches!(
            advance(&e, &done, &profile, "hello", now()),
            Err(TriageError::ConversationClosed)
        ));

        let (emergency, _, _) = run(&e, &profile, &["stroke"]);
        assert!(matches!(
            advance(&e, &emergency, &profile, "cough", now()),
            Err(TriageError::ConversationClosed)
        ));
    }

    #[test]
    fn emergency_after_assessment_is_still_screened() {
        let profile = ProfileContext::new("Ana", Relationship::Me, Some(30));
        let e = engine();
        let (done, _, _) = run(&e, &profile, &["cough", "1 day", "2", "no"]);

        let turn = advance(&e, &done, &profile, "he just became unconscious", now()).unwrap();
        assert_eq!(turn.messages.len(), 2);
        assert_eq!(turn.messages[0].message_type, MessageType::User);
        assert!(turn.messages[1].is_emergency());
        assert!(matches!(turn.outcome, TurnOutcome::Emergency(_)));
        assert_eq!(turn.state.step, done.step);
        assert_eq!(turn.state.answers, done.answers);
        assert_eq!(turn.state.phase(), ConversationPhase::EmergencyExit);

        assert!(matches!(
            advance(&e, &turn.state, &profile, "ok", now()),
            Err(TriageError::ConversationClosed)
        ));
    }

    #[test]
    fn wrong_profile_is_rejected() {
        let profile = ProfileContext::new("Ana", Relationship::Me, Some(30));
        let other = ProfileContext::new("Raj", Relationship::Father, Some(70));
        let e = engine();
        let start = start_conversation(&e, &profile, Uuid::nil(), now());
        assert!(matches!(
            advance(&e, &start.state, &other, "cough", now()),
            Err(TriageError::ProfileMismatch { .. })
        ));
    }

    #[test]
    fn unparseable_severity_defaults_without_blocking() {
        let profile = ProfileContext::new("Ana", Relationship::Me, Some(30));
        let (state, _, _) = run(&engine(), &profile, &["cough", "today", "it's really bad"]);
        assert_eq!(state.severity, Some(5));
        assert_eq!(state.step, 3);
    }

    #[test]
    fn identical_inputs_reproduce_identical_turns() {
        let mut profile = ProfileContext::new("Raj", Relationship::Father, Some(65));
        profile.conditions.insert("Hypertension".into());
        let answers = ["headache", "2 days", "8", "yes"];
        assert_eq!(run(&engine(), &profile, &answers), run(&engine(), &profile, &answers));
    }
}

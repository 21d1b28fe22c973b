//! Emergency screen, run on every raw utterance before any other processing.
//!
//! Matching is a case-insensitive substring search over the knowledge base's
//! emergency keyword groups. This is a best-effort heuristic: it will miss
//! emergencies phrased without a listed keyword, and it fires on mentions
//! that are not current ("I had chest pain last year").

use serde::{Deserialize, Serialize};

use super::reference::KnowledgeBase;

/// A positive emergency screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyMatch {
    pub rule_id: String,
    pub category: String,
    pub keyword: String,
}

/// Screen one utterance. Rules are checked in table order; first hit wins.
pub fn screen_utterance(text: &str, kb: &KnowledgeBase) -> Option<EmergencyMatch> {
    let normalized = normalize(text);

    for rule in &kb.emergency_rules {
        let hit = rule
            .keywords
            .iter()
            .find(|kw| normalized.contains(&normalize(kw)));

        if let Some(keyword) = hit {
            tracing::warn!(
                rule_id = %rule.id,
                category = %rule.category,
                "Emergency screen fired"
            );
            return Some(EmergencyMatch {
                rule_id: rule.id.clone(),
                category: rule.category.clone(),
                keyword: keyword.clone(),
            });
        }
    }

    None
}

/// Lowercase and fold typographic apostrophes so "Can’t" matches "can't".
fn normalize(text: &str) -> String {
    text.to_lowercase().replace(['\u{2019}', '\u{2018}', '`'], "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kb() -> KnowledgeBase {
        KnowledgeBase::builtin()
    }

    #[test]
    fn detects_uppercase_keyword() {
        let m = screen_utterance("I have CHEST PAIN", &kb()).unwrap();
        assert_eq!(m.rule_id, "EMG-CARDIAC");
        assert_eq!(m.keyword, "chest pain");
    }

    #[test]
    fn detects_embedded_keyword() {
        assert!(screen_utterance("sudden chest pain now", &kb()).is_some());
    }

    #[test]
    fn historical_mention_still_fires() {
        // Substring heuristic has no notion of tense.
        assert!(screen_utterance("I had chest pain last year but I'm fine", &kb()).is_some());
    }

    #[test]
    fn typographic_apostrophe_matches() {
        let m = screen_utterance("He can\u{2019}t breathe properly", &kb()).unwrap();
        assert_eq!(m.rule_id, "EMG-RESPIRATORY");
    }

    #[test]
    fn each_category_detected() {
        for (text, rule) in [
            ("there is severe bleeding from the cut", "EMG-BLEEDING"),
            ("she seems confused and drowsy", "EMG-NEURO"),
            ("I think it is a stroke", "EMG-NEURO"),
            ("thinking about suicide", "EMG-MENTAL-HEALTH"),
            ("took an overdose of pills", "EMG-MENTAL-HEALTH"),
            ("severe pain in my side", "EMG-PAIN"),
            ("I can't move my arm", "EMG-NEURO"),
            ("slurred speech since morning", "EMG-NEURO"),
        ] {
            let m = screen_utterance(text, &kb()).unwrap_or_else(|| panic!("missed: {text}"));
            assert_eq!(m.rule_id, rule, "for: {text}");
        }
    }

    #[test]
    fn ordinary_symptoms_pass() {
        for text in ["headache", "2 days", "7", "no", "mild cough and a runny nose"] {
            assert!(screen_utterance(text, &kb()).is_none(), "false positive: {text}");
        }
    }

    #[test]
    fn custom_table_is_used() {
        let mut kb = KnowledgeBase::builtin();
        kb.emergency_rules.clear();
        assert!(screen_utterance("chest pain", &kb).is_none());
    }
}

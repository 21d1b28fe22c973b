use serde::{Deserialize, Serialize};

use crate::triage::TriageError;

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = TriageError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(TriageError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(
    /// Who the care subject is relative to the app user.
    Relationship {
        Me => "me",
        Father => "father",
        Mother => "mother",
        Spouse => "spouse",
        Child => "child",
        Other => "other",
    }
);

str_enum!(
    /// Author of a transcript entry.
    MessageType {
        Carebow => "carebow",
        User => "user",
        System => "system",
        Emergency => "emergency",
    }
);

str_enum!(
    /// `High` is accepted on the wire but no personalization rule produces it.
    RiskTolerance {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
);

str_enum!(CareMethod {
    HomeVisit => "home-visit",
    Video => "video",
});

str_enum!(
    /// `Urgent` is only ever set by the emergency path.
    Tone {
        Reassuring => "reassuring",
        Cautious => "cautious",
        Urgent => "urgent",
    }
);

str_enum!(RiskLevel {
    Low => "low",
    Medium => "medium",
    High => "high",
});

str_enum!(TriageLevel {
    Emergency => "emergency",
    Urgent => "urgent",
    Soon => "soon",
    SelfCare => "self_care",
});

str_enum!(
    /// Coarse recommendation kind consumed by the triage mapper.
    RecommendationKind {
        Emergency => "emergency",
        HomeVisit => "home_visit",
        Video => "video",
        SelfCare => "self_care",
    }
);

str_enum!(
    /// Closed set of CTA action ids shared with the host UI.
    ActionId {
        EmergencyCall => "emergency_call",
        FindEr => "find_er",
        ConnectDoctor => "connect_doctor",
        BookHomeVisit => "book_home_visit",
        ScheduleTeleconsult => "schedule_teleconsult",
        HomeVisitOptions => "home_visit_options",
        SetReminder => "set_reminder",
        HomeRemedies => "home_remedies",
        SaveShare => "save_share",
    }
);

impl RiskLevel {
    /// Classify a raw risk score.
    pub fn from_score(score: u32) -> Self {
        match score {
            s if s >= 4 => Self::High,
            s if s >= 2 => Self::Medium,
            _ => Self::Low,
        }
    }
}

impl ActionId {
    pub const ALL: [ActionId; 9] = [
        Self::EmergencyCall,
        Self::FindEr,
        Self::ConnectDoctor,
        Self::BookHomeVisit,
        Self::ScheduleTeleconsult,
        Self::HomeVisitOptions,
        Self::SetReminder,
        Self::HomeRemedies,
        Self::SaveShare,
    ];
}

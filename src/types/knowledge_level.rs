use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How much the learner already knows about the topic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KnowledgeLevel {
    /// No prior exposure.
    #[default]
    #[serde(rename = "Complete Beginner")]
    CompleteBeginner,

    /// Knows the vocabulary and a few fundamentals.
    #[serde(rename = "Some Basics")]
    SomeBasics,

    /// Comfortable with the fundamentals.
    #[serde(rename = "Intermediate")]
    Intermediate,

    /// Looking for depth beyond common practice.
    #[serde(rename = "Advanced")]
    Advanced,
}

impl KnowledgeLevel {
    /// All levels, from least to most experienced.
    pub const ALL: [KnowledgeLevel; 4] = [
        KnowledgeLevel::CompleteBeginner,
        KnowledgeLevel::SomeBasics,
        KnowledgeLevel::Intermediate,
        KnowledgeLevel::Advanced,
    ];

    /// The display name embedded in the opening request.
    pub fn as_str(&self) -> &'static str {
        match self {
            KnowledgeLevel::CompleteBeginner => "Complete Beginner",
            KnowledgeLevel::SomeBasics => "Some Basics",
            KnowledgeLevel::Intermediate => "Intermediate",
            KnowledgeLevel::Advanced => "Advanced",
        }
    }

    fn alias(&self) -> &'static str {
        match self {
            KnowledgeLevel::CompleteBeginner => "beginner",
            KnowledgeLevel::SomeBasics => "basics",
            KnowledgeLevel::Intermediate => "intermediate",
            KnowledgeLevel::Advanced => "advanced",
        }
    }
}

impl fmt::Display for KnowledgeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KnowledgeLevel {
    type Err = String;

    /// Accepts the display name or its one-word alias, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        KnowledgeLevel::ALL
            .iter()
            .find(|level| {
                level.as_str().eq_ignore_ascii_case(s) || level.alias().eq_ignore_ascii_case(s)
            })
            .copied()
            .ok_or_else(|| {
                format!(
                    "Invalid knowledge level: {s}. \
                     Valid options: beginner, basics, intermediate, advanced"
                )
            })
    }
}

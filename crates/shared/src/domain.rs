use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident, $inner:ty) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(StudentId, String);
id_newtype!(TaskId, i64);

impl StudentId {
    /// Derives the server-side id from a display name: lowercase, whitespace
    /// runs collapsed to `_`, then a `_v1` suffix.
    pub fn from_name(name: &str) -> Self {
        let mut slug = String::with_capacity(name.len() + 3);
        let mut in_whitespace = false;
        for ch in name.chars() {
            if ch.is_whitespace() {
                if !in_whitespace {
                    slug.push('_');
                }
                in_whitespace = true;
            } else {
                slug.extend(ch.to_lowercase());
                in_whitespace = false;
            }
        }
        slug.push_str("_v1");
        Self(slug)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for StudentId {
    fn default() -> Self {
        Self("default".to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    English,
    Hindi,
    Hinglish,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::English => "english",
            Self::Hindi => "hindi",
            Self::Hinglish => "hinglish",
        }
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "english" | "en" => Ok(Self::English),
            "hindi" | "hi" => Ok(Self::Hindi),
            "hinglish" => Ok(Self::Hinglish),
            other => Err(format!("unsupported language '{other}'")),
        }
    }
}

/// Conversation phase of the interactive tutor.
///
/// The four known phases form a linear path. The server may answer with a
/// phase this client does not know; it is kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TutorPhase {
    #[default]
    Start,
    SubjectSelected,
    TopicSelected,
    Teaching,
    Other(String),
}

impl TutorPhase {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Start => "START",
            Self::SubjectSelected => "SUBJECT_SELECTED",
            Self::TopicSelected => "TOPIC_SELECTED",
            Self::Teaching => "TEACHING",
            Self::Other(raw) => raw,
        }
    }

    /// Position on the linear path, `None` for phases off the path.
    pub fn rank(&self) -> Option<u8> {
        match self {
            Self::Start => Some(0),
            Self::SubjectSelected => Some(1),
            Self::TopicSelected => Some(2),
            Self::Teaching => Some(3),
            Self::Other(_) => None,
        }
    }
}

impl From<String> for TutorPhase {
    fn from(value: String) -> Self {
        match value.as_str() {
            "START" => Self::Start,
            "SUBJECT_SELECTED" => Self::SubjectSelected,
            "TOPIC_SELECTED" => Self::TopicSelected,
            "TEACHING" => Self::Teaching,
            _ => Self::Other(value),
        }
    }
}

impl From<TutorPhase> for String {
    fn from(value: TutorPhase) -> Self {
        match value {
            TutorPhase::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for TutorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;

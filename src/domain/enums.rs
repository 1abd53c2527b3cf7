use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One of the six fixed life spheres.
///
/// Variant order is the canonical order used for iteration and for breaking
/// ties between spheres with equal progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SphereKey {
    Health,
    Spiritual,
    Family,
    Social,
    Work,
    Finance,
}

impl SphereKey {
    /// All keys in canonical order
    pub fn all() -> &'static [SphereKey] {
        &[
            SphereKey::Health,
            SphereKey::Spiritual,
            SphereKey::Family,
            SphereKey::Social,
            SphereKey::Work,
            SphereKey::Finance,
        ]
    }

    /// Key as stored in snapshots and sent to the suggestion endpoint
    pub fn as_str(&self) -> &'static str {
        match self {
            SphereKey::Health => "health",
            SphereKey::Spiritual => "spiritual",
            SphereKey::Family => "family",
            SphereKey::Social => "social",
            SphereKey::Work => "work",
            SphereKey::Finance => "finance",
        }
    }

    /// Default display name
    pub fn default_name(&self) -> &'static str {
        match self {
            SphereKey::Health => "Santé",
            SphereKey::Spiritual => "Spiritualité",
            SphereKey::Family => "Famille",
            SphereKey::Social => "Social",
            SphereKey::Work => "Professionnel",
            SphereKey::Finance => "Finances",
        }
    }

    /// Default emoji icon
    pub fn default_icon(&self) -> &'static str {
        match self {
            SphereKey::Health => "💪",
            SphereKey::Spiritual => "🧘",
            SphereKey::Family => "👨‍👩‍👧",
            SphereKey::Social => "👥",
            SphereKey::Work => "💼",
            SphereKey::Finance => "💰",
        }
    }

    /// Progress a fresh install starts with
    pub fn default_progress(&self) -> u8 {
        match self {
            SphereKey::Health => 60,
            SphereKey::Spiritual => 40,
            SphereKey::Family => 80,
            SphereKey::Social => 45,
            SphereKey::Work => 90,
            SphereKey::Finance => 70,
        }
    }
}

impl fmt::Display for SphereKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sphere '{0}' (expected one of: health, spiritual, family, social, work, finance)")]
pub struct UnknownSphere(pub String);

impl FromStr for SphereKey {
    type Err = UnknownSphere;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "health" => Ok(SphereKey::Health),
            "spiritual" => Ok(SphereKey::Spiritual),
            "family" => Ok(SphereKey::Family),
            "social" => Ok(SphereKey::Social),
            "work" => Ok(SphereKey::Work),
            "finance" => Ok(SphereKey::Finance),
            _ => Err(UnknownSphere(s.to_string())),
        }
    }
}

/// How often a habit is meant to be repeated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HabitFrequency {
    Once,
    Daily,
    Weekly,
}

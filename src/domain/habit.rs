use super::enums::{HabitFrequency, SphereKey};
use super::task::{deserialize_created_at, deserialize_id, new_id};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// A micro-habit adopted from a suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub sphere_key: Option<SphereKey>,
    pub text: String,
    #[serde(default = "default_frequency")]
    pub frequency: HabitFrequency,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default = "Local::now", deserialize_with = "deserialize_created_at")]
    pub created_at: DateTime<Local>,
}

fn default_frequency() -> HabitFrequency {
    HabitFrequency::Once
}

fn default_active() -> bool {
    true
}

impl Habit {
    pub fn new(text: String, sphere_key: Option<SphereKey>, frequency: HabitFrequency) -> Self {
        Self {
            id: new_id(),
            sphere_key,
            text,
            frequency,
            active: true,
            created_at: Local::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_habit_is_active() {
        let habit = Habit::new("Méditer 5 minutes".to_string(), Some(SphereKey::Spiritual), HabitFrequency::Once);
        assert!(habit.active);
        assert!(!habit.id.is_empty());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let habit: Habit = serde_json::from_str(r#"{"id": 1700000000000, "text": "Boire 1 verre d'eau"}"#).unwrap();
        assert_eq!(habit.id, "1700000000000");
        assert_eq!(habit.frequency, HabitFrequency::Once);
        assert!(habit.active);
        assert_eq!(habit.sphere_key, None);

        let habit: Habit =
            serde_json::from_str(r#"{"id": "h", "text": "Marcher", "createdAt": 1700000000000}"#).unwrap();
        assert_eq!(habit.created_at.timestamp_millis(), 1_700_000_000_000);
    }
}

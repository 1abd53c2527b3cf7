use super::task::{deserialize_created_at, deserialize_id, new_id};
use chrono::{DateTime, Local};
use serde::{Deserialize, Deserializer, Serialize};

pub const MIN_MOOD: u8 = 1;
pub const MAX_MOOD: u8 = 10;

/// Number of latest entries that feed the mood average
pub const MOOD_WINDOW: usize = 20;

/// Clamp a mood rating into 1..=10
pub fn clamp_mood(mood: i64) -> u8 {
    mood.clamp(MIN_MOOD as i64, MAX_MOOD as i64) as u8
}

fn deserialize_mood<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(|v| v.as_f64())
        .filter(|m| m.is_finite())
        .map(|m| clamp_mood(m.round() as i64)))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default = "Local::now", deserialize_with = "deserialize_created_at")]
    pub created_at: DateTime<Local>,
    #[serde(default, deserialize_with = "deserialize_mood")]
    pub mood: Option<u8>,
    #[serde(default)]
    pub gratitude: String,
    #[serde(default)]
    pub reflection: String,
}

impl JournalEntry {
    pub fn new(mood: Option<i64>, gratitude: String, reflection: String) -> Self {
        Self {
            id: new_id(),
            created_at: Local::now(),
            mood: mood.map(clamp_mood),
            gratitude,
            reflection,
        }
    }

    /// True when the entry carries nothing worth keeping
    pub fn is_blank(&self) -> bool {
        self.mood.is_none() && self.gratitude.trim().is_empty() && self.reflection.trim().is_empty()
    }
}

/// Average mood across the latest `MOOD_WINDOW` entries (oldest first in `entries`).
///
/// Entries without a mood inside the window are skipped.
pub fn rolling_mood_average(entries: &[JournalEntry]) -> Option<f64> {
    let start = entries.len().saturating_sub(MOOD_WINDOW);
    let moods: Vec<f64> = entries[start..]
        .iter()
        .filter_map(|e| e.mood.map(f64::from))
        .collect();

    if moods.is_empty() {
        return None;
    }
    Some(moods.iter().sum::<f64>() / moods.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(mood: Option<i64>) -> JournalEntry {
        JournalEntry::new(mood, String::new(), String::new())
    }

    #[test]
    fn test_mood_is_clamped() {
        assert_eq!(entry(Some(0)).mood, Some(1));
        assert_eq!(entry(Some(14)).mood, Some(10));
        assert_eq!(entry(Some(7)).mood, Some(7));
        assert_eq!(entry(None).mood, None);
    }

    #[test]
    fn test_rolling_average_empty() {
        assert_eq!(rolling_mood_average(&[]), None);
        assert_eq!(rolling_mood_average(&[entry(None), entry(None)]), None);
    }

    #[test]
    fn test_rolling_average_skips_missing_moods() {
        let entries = vec![entry(Some(4)), entry(None), entry(Some(8))];
        assert_eq!(rolling_mood_average(&entries), Some(6.0));
    }

    #[test]
    fn test_rolling_average_uses_latest_window() {
        let mut entries: Vec<JournalEntry> = (0..5).map(|_| entry(Some(1))).collect();
        entries.extend((0..MOOD_WINDOW).map(|_| entry(Some(9))));
        assert_eq!(rolling_mood_average(&entries), Some(9.0));
    }

    #[test]
    fn test_blank_entry() {
        assert!(entry(None).is_blank());
        assert!(!entry(Some(5)).is_blank());
        assert!(!JournalEntry::new(None, "Sunshine".to_string(), String::new()).is_blank());
    }

    #[test]
    fn test_deserialize_reclamps_mood() {
        let e: JournalEntry =
            serde_json::from_str(r#"{"id": 17, "mood": 42, "gratitude": "tea"}"#).unwrap();
        assert_eq!(e.id, "17");
        assert_eq!(e.mood, Some(10));
        assert_eq!(e.reflection, "");

        let e: JournalEntry = serde_json::from_str(r#"{"id": "j", "mood": null}"#).unwrap();
        assert_eq!(e.mood, None);

        let e: JournalEntry =
            serde_json::from_str(r#"{"id": "k", "createdAt": 1700000000000, "mood": 6}"#).unwrap();
        assert_eq!(e.created_at.timestamp_millis(), 1_700_000_000_000);
    }
}

//! Non-destructive overlay of a saved snapshot onto in-memory defaults.
//!
//! Each field of the snapshot only replaces its default when present and of
//! the expected type. Fields introduced after the snapshot was written keep
//! their defaults, and sphere definitions can gain fields without losing the
//! user's progress.

use crate::app::{AppState, Preferences};
use crate::domain::{coerce_progress, Habit, JournalEntry, SphereKey, SphereSet, TaskLedger};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;

/// Merge `snapshot` into `state`. Returns the number of malformed list or map
/// elements that were skipped.
pub fn merge_snapshot(state: &mut AppState, snapshot: &Value) -> usize {
    let Some(root) = snapshot.as_object() else {
        return 0;
    };
    let mut skipped = 0;

    if let Some(spheres) = root.get("spheres").and_then(Value::as_object) {
        merge_spheres(&mut state.spheres, spheres);
    }

    if let Some(items) = root.get("focusTasks").and_then(Value::as_array) {
        let (tasks, bad) = parse_elements(items, "focusTasks");
        state.focus_tasks = TaskLedger::from_tasks(tasks);
        skipped += bad;
    }

    if let Some(items) = root.get("journalEntries").and_then(Value::as_array) {
        let (entries, bad) = parse_elements::<JournalEntry>(items, "journalEntries");
        state.journal_entries = entries;
        skipped += bad;
    }

    if let Some(habits) = root.get("habits").and_then(Value::as_object) {
        let values: Vec<Value> = habits.values().cloned().collect();
        let (parsed, bad) = parse_elements::<Habit>(&values, "habits");
        state.habits = parsed.into_iter().map(|h| (h.id.clone(), h)).collect();
        skipped += bad;
    }

    if let Some(prefs) = root.get("preferences").and_then(Value::as_object) {
        merge_preferences(&mut state.preferences, prefs);
    }

    // Never trust a stored score
    state.recalculate();
    skipped
}

fn merge_spheres(spheres: &mut SphereSet, saved: &Map<String, Value>) {
    for key in SphereKey::all() {
        let Some(fields) = saved.get(key.as_str()).and_then(Value::as_object) else {
            continue;
        };
        let sphere = spheres.get_mut(*key);

        if let Some(name) = fields.get("name").and_then(Value::as_str) {
            sphere.name = name.to_string();
        }
        if let Some(icon) = fields.get("icon").and_then(Value::as_str) {
            sphere.icon = icon.to_string();
        }
        if let Some(progress) = fields
            .get("progress")
            .and_then(Value::as_f64)
            .and_then(coerce_progress)
        {
            sphere.progress = progress;
        }
    }
}

fn merge_preferences(prefs: &mut Preferences, saved: &Map<String, Value>) {
    if let Some(done) = saved.get("onboardingCompleted").and_then(Value::as_bool) {
        prefs.onboarding_completed = done;
    }
    if let Some(enabled) = saved.get("aiEnabled").and_then(Value::as_bool) {
        prefs.ai_enabled = enabled;
    }
    match saved.get("aiApiUrl") {
        Some(Value::String(url)) => prefs.ai_api_url = Some(url.clone()),
        Some(Value::Null) => prefs.ai_api_url = None,
        _ => {}
    }
}

/// Deserialize each element on its own, dropping the ones that don't fit
fn parse_elements<T: DeserializeOwned>(items: &[Value], field: &str) -> (Vec<T>, usize) {
    let mut parsed = Vec::with_capacity(items.len());
    let mut skipped = 0;

    for (i, item) in items.iter().enumerate() {
        match serde_json::from_value::<T>(item.clone()) {
            Ok(value) => parsed.push(value),
            Err(e) => {
                warn!(field, index = i, error = %e, "skipping malformed element in saved state");
                skipped += 1;
            }
        }
    }

    (parsed, skipped)
}

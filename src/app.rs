use crate::domain::{
    rolling_mood_average, Habit, HabitFrequency, JournalEntry, SphereKey, SphereSet, Task,
    TaskLedger,
};
use crate::persistence::{KeyValueStore, LoadOutcome, StateStore, StoreError};
use crate::suggest::{self, Suggestion, SuggestionConfig, SuggestionTransport};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Progress added to a sphere when an activity is logged against it
pub const ACTIVITY_BOOST: i32 = 5;

/// User preferences
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub onboarding_completed: bool,
    pub ai_enabled: bool,
    pub ai_api_url: Option<String>,
}

/// Main application state
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub spheres: SphereSet,
    /// Derived from `spheres`; refreshed by `recalculate`
    pub harmony_score: u8,
    pub focus_tasks: TaskLedger,
    /// Oldest first
    pub journal_entries: Vec<JournalEntry>,
    pub habits: BTreeMap<String, Habit>,
    pub preferences: Preferences,
}

impl Default for AppState {
    fn default() -> Self {
        let starter = [
            ("Finaliser présentation", SphereKey::Work),
            ("Appeler Maman", SphereKey::Family),
            ("Séance de sport 30 min", SphereKey::Health),
        ];
        let mut focus_tasks = TaskLedger::default();
        for (text, key) in starter {
            focus_tasks.add(text, Some(key));
        }

        let mut state = Self {
            spheres: SphereSet::default(),
            harmony_score: 0,
            focus_tasks,
            journal_entries: Vec::new(),
            habits: BTreeMap::new(),
            preferences: Preferences::default(),
        };
        state.recalculate();
        state
    }
}

impl AppState {
    /// Recompute every derived value
    pub fn recalculate(&mut self) {
        self.harmony_score = self.spheres.harmony_score();
    }

    /// Set a sphere's progress (coerced and clamped)
    pub fn set_progress(&mut self, key: SphereKey, value: f64) -> bool {
        let changed = self.spheres.set_progress(key, value);
        self.recalculate();
        changed
    }

    /// Same as `set_progress` but from a raw key; unknown keys are ignored
    pub fn set_progress_by_name(&mut self, key: &str, value: f64) -> bool {
        match key.parse::<SphereKey>() {
            Ok(key) => self.set_progress(key, value),
            Err(_) => false,
        }
    }

    /// Record an activity done for a sphere: a completed task plus a progress bump
    pub fn log_activity(&mut self, key: SphereKey, text: &str, boost: i32) -> Option<String> {
        let id = self.focus_tasks.add(text, Some(key))?.id.clone();
        self.focus_tasks.toggle_complete(&id);
        self.spheres.adjust(key, boost);
        self.recalculate();
        Some(id)
    }

    pub fn add_task(&mut self, text: &str, sphere_key: Option<SphereKey>) -> Option<String> {
        self.focus_tasks.add(text, sphere_key).map(|t| t.id.clone())
    }

    /// Flip a task's completion. Completion does not move sphere progress.
    pub fn toggle_task(&mut self, id: &str) -> Option<bool> {
        let completed = self.focus_tasks.toggle_complete(id)?;
        self.recalculate();
        Some(completed)
    }

    pub fn remove_task(&mut self, id: &str) -> Option<Task> {
        self.focus_tasks.remove(id)
    }

    /// Append a journal entry; entries with nothing in them are ignored
    pub fn add_journal_entry(
        &mut self,
        mood: Option<i64>,
        gratitude: &str,
        reflection: &str,
    ) -> Option<String> {
        let entry = JournalEntry::new(mood, gratitude.trim().to_string(), reflection.trim().to_string());
        if entry.is_blank() {
            return None;
        }
        let id = entry.id.clone();
        self.journal_entries.push(entry);
        Some(id)
    }

    /// Rolling mood average over the latest journal entries
    pub fn mood_average(&self) -> Option<f64> {
        rolling_mood_average(&self.journal_entries)
    }

    /// Adopt a suggestion: it becomes a focus task and an active habit.
    /// Returns (task id, habit id).
    pub fn accept_suggestion(&mut self, suggestion: &Suggestion) -> Option<(String, String)> {
        let text = suggestion.recommended_action.text.trim();
        let task_id = self.add_task(text, suggestion.sphere_key)?;

        let habit = Habit::new(text.to_string(), suggestion.sphere_key, HabitFrequency::Once);
        let habit_id = habit.id.clone();
        self.habits.insert(habit_id.clone(), habit);

        Some((task_id, habit_id))
    }

    pub fn active_habits(&self) -> impl Iterator<Item = &Habit> {
        self.habits.values().filter(|h| h.active)
    }
}

/// The running session: owns the state and persists it after every change
pub struct App<S: KeyValueStore> {
    state: AppState,
    store: StateStore<S>,
    save_error: Option<StoreError>,
}

impl<S: KeyValueStore> App<S> {
    /// Start from defaults and overlay whatever was persisted
    pub fn open(kv: S) -> (Self, LoadOutcome) {
        let mut store = StateStore::new(kv);
        let mut state = AppState::default();
        let outcome = store.load_into(&mut state);

        let app = Self {
            state,
            store,
            save_error: None,
        };
        (app, outcome)
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    #[cfg(test)]
    pub fn store(&self) -> &StateStore<S> {
        &self.store
    }

    /// Take the last save failure, if any. The in-memory state stays authoritative.
    pub fn take_save_error(&mut self) -> Option<StoreError> {
        self.save_error.take()
    }

    /// Write the state out, recording (not raising) any failure
    pub fn save(&mut self) -> bool {
        match self.store.save(&self.state) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "failed to save state");
                self.save_error = Some(e);
                false
            }
        }
    }

    fn persist_if(&mut self, changed: bool) {
        if changed {
            self.save();
        }
    }

    /// Set progress by raw sphere key; unknown keys and non-numbers are no-ops
    pub fn set_progress(&mut self, key: &str, value: f64) -> bool {
        let changed = self.state.set_progress_by_name(key, value);
        self.persist_if(changed);
        changed
    }

    pub fn log_activity(&mut self, key: SphereKey, text: &str, boost: i32) -> Option<String> {
        let id = self.state.log_activity(key, text, boost);
        self.persist_if(id.is_some());
        id
    }

    pub fn add_task(&mut self, text: &str, sphere_key: Option<SphereKey>) -> Option<String> {
        let id = self.state.add_task(text, sphere_key);
        self.persist_if(id.is_some());
        id
    }

    pub fn toggle_task(&mut self, id: &str) -> Option<bool> {
        let completed = self.state.toggle_task(id);
        self.persist_if(completed.is_some());
        completed
    }

    pub fn remove_task(&mut self, id: &str) -> Option<Task> {
        let removed = self.state.remove_task(id);
        self.persist_if(removed.is_some());
        removed
    }

    pub fn add_journal_entry(
        &mut self,
        mood: Option<i64>,
        gratitude: &str,
        reflection: &str,
    ) -> Option<String> {
        let id = self.state.add_journal_entry(mood, gratitude, reflection);
        self.persist_if(id.is_some());
        id
    }

    pub fn accept_suggestion(&mut self, suggestion: &Suggestion) -> Option<(String, String)> {
        let ids = self.state.accept_suggestion(suggestion);
        self.persist_if(ids.is_some());
        ids
    }

    /// Edit preferences in place and persist them
    pub fn update_preferences<F: FnOnce(&mut Preferences)>(&mut self, edit: F) {
        let before = self.state.preferences.clone();
        edit(&mut self.state.preferences);
        let changed = self.state.preferences != before;
        self.persist_if(changed);
    }

    /// Resolver config derived from the stored preferences
    pub fn suggestion_config(&self) -> SuggestionConfig {
        SuggestionConfig::from_preferences(&self.state.preferences)
    }

    /// Resolve a suggestion for the current spheres. Never fails.
    pub fn suggest(&self, config: &SuggestionConfig, transport: &dyn SuggestionTransport) -> Suggestion {
        suggest::resolve(&self.state.spheres, config, transport)
    }
}

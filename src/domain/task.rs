use super::enums::SphereKey;
use chrono::{DateTime, FixedOffset, Local, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Generate a unique, time-ordered identifier
pub fn new_id() -> String {
    Uuid::now_v7().to_string()
}

/// Accept ids written either as strings or as plain numbers.
///
/// Early snapshots used small integers and millisecond timestamps.
pub fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Int(n) => n.to_string(),
        RawId::Float(f) => format!("{}", f),
    })
}

/// Read a creation time written as an RFC 3339 string or as epoch
/// milliseconds. Anything unreadable becomes the current time.
pub fn deserialize_created_at<'de, D>(deserializer: D) -> Result<DateTime<Local>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let parsed = match value {
        Some(serde_json::Value::String(s)) => s
            .parse::<DateTime<FixedOffset>>()
            .ok()
            .map(|dt| dt.with_timezone(&Local)),
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|dt| dt.with_timezone(&Local)),
        _ => None,
    };
    Ok(parsed.unwrap_or_else(Local::now))
}

/// A focus task or habit instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub sphere_key: Option<SphereKey>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default = "Local::now", deserialize_with = "deserialize_created_at")]
    pub created_at: DateTime<Local>,
}

impl Task {
    pub fn new(text: String, sphere_key: Option<SphereKey>) -> Self {
        Self {
            id: new_id(),
            text,
            sphere_key,
            completed: false,
            created_at: Local::now(),
        }
    }
}

/// Ordered task list, most recent first.
///
/// Every mutation addresses tasks by id, never by position.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TaskLedger {
    tasks: Vec<Task>,
}

impl TaskLedger {
    /// Build a ledger keeping the given order; duplicate ids get fresh ones
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        let mut ledger = Self {
            tasks: Vec::with_capacity(tasks.len()),
        };
        for mut task in tasks {
            if task.id.is_empty() || ledger.get(&task.id).is_some() {
                task.id = new_id();
            }
            ledger.tasks.push(task);
        }
        ledger
    }

    /// Create a task from text and put it at the front. Blank text is ignored.
    pub fn add(&mut self, text: &str, sphere_key: Option<SphereKey>) -> Option<&Task> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        self.push_front(Task::new(text.to_string(), sphere_key));
        self.tasks.first()
    }

    /// Insert an already-built task at the front, replacing its id if taken
    pub fn push_front(&mut self, mut task: Task) {
        if task.id.is_empty() || self.get(&task.id).is_some() {
            task.id = new_id();
        }
        self.tasks.insert(0, task);
    }

    /// Flip the completed flag. Returns the new value, or None if not found.
    pub fn toggle_complete(&mut self, id: &str) -> Option<bool> {
        let task = self.tasks.iter_mut().find(|t| t.id == id)?;
        task.completed = !task.completed;
        Some(task.completed)
    }

    /// Remove by id. Unknown ids are a no-op.
    pub fn remove(&mut self, id: &str) -> Option<Task> {
        let pos = self.tasks.iter().position(|t| t.id == id)?;
        Some(self.tasks.remove(pos))
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Resolve a full id or a unique trailing fragment of one (as shown on the
    /// command line; the leading part of a time-ordered id is shared by tasks
    /// created close together)
    pub fn resolve_id(&self, id_or_suffix: &str) -> Option<&str> {
        if let Some(task) = self.get(id_or_suffix) {
            return Some(&task.id);
        }
        if id_or_suffix.is_empty() {
            return None;
        }
        let mut matches = self.tasks.iter().filter(|t| t.id.ends_with(id_or_suffix));
        match (matches.next(), matches.next()) {
            (Some(task), None) => Some(&task.id),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn open_count(&self) -> usize {
        self.tasks.iter().filter(|t| !t.completed).count()
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }
}

use crate::app::AppState;
use crate::domain::SphereKey;
use std::collections::BTreeMap;

/// Global task statistics
#[derive(Debug, PartialEq, Eq)]
pub struct TaskStats {
    pub total_tasks: usize,
    pub open_count: usize,
    pub completed_count: usize,
    pub untagged_count: usize,
}

/// Per-sphere statistics
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SphereStats {
    pub task_count: usize,
    pub completed_count: usize,
    pub active_habits: usize,
}

/// Encouragement line for a harmony score
pub fn harmony_message(score: u8) -> &'static str {
    match score {
        80..=u8::MAX => "Excellent équilibre de vie ! 🌟",
        60..=79 => "Votre équilibre de vie est bon ! 👍",
        40..=59 => "Quelques ajustements pourraient aider 🎯",
        _ => "Prenons soin de votre équilibre 💪",
    }
}

/// Text progress bar, `width` cells wide
pub fn progress_bar(progress: u8, width: usize) -> String {
    let filled = (progress.min(100) as usize * width + 50) / 100;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Calculate task statistics across the ledger
pub fn calculate_task_stats(state: &AppState) -> TaskStats {
    let ledger = &state.focus_tasks;
    TaskStats {
        total_tasks: ledger.len(),
        open_count: ledger.open_count(),
        completed_count: ledger.completed_count(),
        untagged_count: ledger.iter().filter(|t| t.sphere_key.is_none()).count(),
    }
}

/// Calculate per-sphere statistics; every sphere gets an entry
pub fn calculate_sphere_stats(state: &AppState) -> BTreeMap<SphereKey, SphereStats> {
    let mut stats: BTreeMap<SphereKey, SphereStats> = SphereKey::all()
        .iter()
        .map(|&key| (key, SphereStats::default()))
        .collect();

    for task in state.focus_tasks.iter() {
        let Some(key) = task.sphere_key else { continue };
        let entry = stats.entry(key).or_default();
        entry.task_count += 1;
        if task.completed {
            entry.completed_count += 1;
        }
    }

    for habit in state.active_habits() {
        if let Some(key) = habit.sphere_key {
            stats.entry(key).or_default().active_habits += 1;
        }
    }

    stats
}

use crate::app::AppState;
use crate::persistence::{files::atomic_write, report_file};
use crate::report::stats::{calculate_sphere_stats, calculate_task_stats, harmony_message, progress_bar};
use crate::suggest::{local_heuristic, weekly_plan, RecommendedAction};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use std::path::PathBuf;

const BAR_WIDTH: usize = 20;

fn format_action(action: &RecommendedAction) -> String {
    match action.rounded_minutes() {
        Some(min) => format!("{} ({} min)", action.text, min),
        None => action.text.clone(),
    }
}

/// Render the wellness report for `date` as markdown
pub fn render_report(state: &AppState, date: NaiveDate) -> String {
    let tasks = calculate_task_stats(state);
    let per_sphere = calculate_sphere_stats(state);

    let mut report = String::new();

    // Header
    report.push_str(&format!("# Harmonia Report - {}\n\n", date));

    // Summary Section
    report.push_str("## Summary\n\n");
    report.push_str(&format!("- **Harmony Score:** {}/100\n", state.harmony_score));
    report.push_str(&format!("- {}\n", harmony_message(state.harmony_score)));
    let lowest = state.spheres.lowest();
    report.push_str(&format!(
        "- **Needs Attention:** {} {} ({}%)\n",
        lowest.icon, lowest.name, lowest.progress
    ));
    match state.mood_average() {
        Some(mood) => report.push_str(&format!("- **Average Mood:** {:.1}/10\n\n", mood)),
        None => report.push_str("- **Average Mood:** no entries yet\n\n"),
    }

    // Spheres Section
    report.push_str("## Spheres\n\n");
    report.push_str("| Sphere | Progress | | Tasks | Habits |\n");
    report.push_str("|---|---|---|---|---|\n");
    for sphere in state.spheres.iter() {
        let stats = &per_sphere[&sphere.key];
        report.push_str(&format!(
            "| {} {} | {}% | `{}` | {}/{} | {} |\n",
            sphere.icon,
            sphere.name,
            sphere.progress,
            progress_bar(sphere.progress, BAR_WIDTH),
            stats.completed_count,
            stats.task_count,
            stats.active_habits
        ));
    }
    report.push('\n');

    // Tasks Section
    report.push_str("## Focus Tasks\n\n");
    report.push_str(&format!(
        "- **Total:** {} (Open: {}, Completed: {}, Untagged: {})\n\n",
        tasks.total_tasks, tasks.open_count, tasks.completed_count, tasks.untagged_count
    ));
    for task in state.focus_tasks.iter() {
        let mark = if task.completed { "x" } else { " " };
        let tag = task
            .sphere_key
            .map(|key| format!(" _{}_", key))
            .unwrap_or_default();
        report.push_str(&format!("- [{}] {}{}\n", mark, task.text, tag));
    }
    report.push('\n');

    // Habits Section
    let habits: Vec<_> = state.active_habits().collect();
    if !habits.is_empty() {
        report.push_str("## Active Habits\n\n");
        for habit in habits {
            report.push_str(&format!(
                "- {} ({:?}, since {})\n",
                habit.text,
                habit.frequency,
                habit.created_at.format("%Y-%m-%d")
            ));
        }
        report.push('\n');
    }

    // Suggestion Section
    let suggestion = local_heuristic(&state.spheres);
    report.push_str("## Suggestion\n\n");
    report.push_str(&format!(
        "- {}\n- _{}_\n\n",
        format_action(&suggestion.recommended_action),
        suggestion.reason
    ));

    // Weekly Plan Section
    report.push_str("## Weekly Plan\n\n");
    for entry in weekly_plan(&state.spheres) {
        let name = &state.spheres.get(entry.sphere).name;
        report.push_str(&format!(
            "- **{}** ({}): {}\n",
            name,
            entry.day,
            format_action(&entry.habit)
        ));
    }

    report
}

/// Write the report to `output_path`, or to the data directory by default
pub fn generate_report(
    state: &AppState,
    date: Option<NaiveDate>,
    output_path: Option<PathBuf>,
) -> Result<PathBuf> {
    let report_date = date.unwrap_or_else(|| Local::now().date_naive());
    let content = render_report(state, report_date);

    let path = match output_path {
        Some(path) => path,
        None => report_file(report_date)?,
    };
    atomic_write(&path, &content)
        .with_context(|| format!("Failed to write report: {}", path.display()))?;

    Ok(path)
}

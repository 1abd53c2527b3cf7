use super::{RecommendedAction, Suggestion};
use crate::domain::{SphereKey, SphereSet};
use serde::Serialize;

pub const MOOD_PROMPT: &str = "Comment vous sentez-vous aujourd'hui ? (1-10)";

/// Number of spheres covered by the weekly plan
pub const PLAN_SIZE: usize = 3;

/// Fixed micro-action for a sphere
pub fn micro_action(key: SphereKey) -> RecommendedAction {
    match key {
        SphereKey::Health => RecommendedAction::new("Boire 1 verre d'eau", 1),
        SphereKey::Spiritual => RecommendedAction::new("Méditer 5 minutes", 5),
        SphereKey::Family => RecommendedAction::new("Envoyer un message à un proche", 2),
        SphereKey::Social => RecommendedAction::new("Écrire à un ami", 3),
        SphereKey::Work => RecommendedAction::new("Bloc focus de 25 minutes (Pomodoro)", 25),
        SphereKey::Finance => RecommendedAction::new("Vérifier brièvement vos dépenses", 5),
    }
}

/// Generic action for anything that isn't a known sphere
pub fn break_action() -> RecommendedAction {
    RecommendedAction::new("Faire une petite pause", 3)
}

/// Template lookup by raw key; unknown keys get the generic break
pub fn micro_action_by_name(key: &str) -> RecommendedAction {
    key.parse::<SphereKey>()
        .map(micro_action)
        .unwrap_or_else(|_| break_action())
}

/// Deterministic suggestion targeting the lowest sphere.
///
/// Pure: the same spheres always give the same suggestion.
pub fn local_heuristic(spheres: &SphereSet) -> Suggestion {
    let lowest = spheres.lowest();
    Suggestion {
        recommended_action: micro_action(lowest.key),
        reason: format!("{} is at {}%", lowest.name, lowest.progress),
        sphere_key: Some(lowest.key),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckIn {
    pub mood_prompt: &'static str,
    #[serde(flatten)]
    pub suggestion: Suggestion,
}

/// Daily check-in: ask for a mood rating and offer one local action
pub fn daily_check_in(spheres: &SphereSet) -> CheckIn {
    CheckIn {
        mood_prompt: MOOD_PROMPT,
        suggestion: local_heuristic(spheres),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanEntry {
    pub day: &'static str,
    pub sphere: SphereKey,
    pub habit: RecommendedAction,
}

/// One habit per day for each of the three weakest spheres
pub fn weekly_plan(spheres: &SphereSet) -> Vec<PlanEntry> {
    spheres
        .ranked()
        .into_iter()
        .take(PLAN_SIZE)
        .map(|sphere| PlanEntry {
            day: "everyday",
            sphere: sphere.key,
            habit: micro_action(sphere.key),
        })
        .collect()
}

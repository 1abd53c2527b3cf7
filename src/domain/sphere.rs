use super::enums::SphereKey;
use serde::Serialize;
use std::collections::BTreeMap;

/// Upper bound of sphere progress (percent)
pub const MAX_PROGRESS: u8 = 100;

/// A single life sphere and its progress percentage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sphere {
    /// Fixed key (implied by the map key in snapshots)
    #[serde(skip)]
    pub key: SphereKey,
    pub name: String,
    /// Always within 0..=100
    pub progress: u8,
    pub icon: String,
}

impl Sphere {
    /// Sphere with its shipped name, icon and starting progress
    pub fn with_defaults(key: SphereKey) -> Self {
        Self {
            key,
            name: key.default_name().to_string(),
            progress: key.default_progress(),
            icon: key.default_icon().to_string(),
        }
    }
}

/// Coerce an arbitrary number to a valid progress value.
///
/// Returns None for NaN and infinities.
pub fn coerce_progress(value: f64) -> Option<u8> {
    if !value.is_finite() {
        return None;
    }
    Some(value.round().clamp(0.0, MAX_PROGRESS as f64) as u8)
}

/// The six spheres, always all present, iterated in canonical key order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SphereSet {
    spheres: BTreeMap<SphereKey, Sphere>,
}

impl Default for SphereSet {
    fn default() -> Self {
        let spheres = SphereKey::all()
            .iter()
            .map(|&key| (key, Sphere::with_defaults(key)))
            .collect();
        Self { spheres }
    }
}

impl SphereSet {
    /// Build a set with explicit progress values, in canonical order
    #[cfg(test)]
    pub fn from_progress(values: [u8; 6]) -> Self {
        let mut set = Self::default();
        for (key, value) in SphereKey::all().iter().zip(values) {
            set.set_progress(*key, value as f64);
        }
        set
    }

    pub fn get(&self, key: SphereKey) -> &Sphere {
        // The constructor inserts every key and nothing removes them
        &self.spheres[&key]
    }

    pub fn get_mut(&mut self, key: SphereKey) -> &mut Sphere {
        self.spheres
            .entry(key)
            .or_insert_with(|| Sphere::with_defaults(key))
    }

    /// Spheres in canonical order
    pub fn iter(&self) -> impl Iterator<Item = &Sphere> {
        self.spheres.values()
    }

    /// Set progress, rounding to the nearest integer and clamping to 0..=100.
    ///
    /// Returns false (and leaves the sphere untouched) for non-finite input.
    pub fn set_progress(&mut self, key: SphereKey, value: f64) -> bool {
        match coerce_progress(value) {
            Some(progress) => {
                self.get_mut(key).progress = progress;
                true
            }
            None => false,
        }
    }

    /// Add a (possibly negative) delta, clamped. Returns the new progress.
    pub fn adjust(&mut self, key: SphereKey, delta: i32) -> u8 {
        let current = self.get(key).progress as f64;
        self.set_progress(key, current + delta as f64);
        self.get(key).progress
    }

    /// Rounded mean of all six progress values (half rounds away from zero)
    pub fn harmony_score(&self) -> u8 {
        let total: u32 = self.iter().map(|s| s.progress as u32).sum();
        let mean = total as f64 / self.spheres.len() as f64;
        mean.round() as u8
    }

    /// Sphere with minimum progress; ties go to the earliest canonical key
    pub fn lowest(&self) -> &Sphere {
        self.ranked()[0]
    }

    /// All spheres sorted by ascending progress, stable on canonical order
    pub fn ranked(&self) -> Vec<&Sphere> {
        let mut ranked: Vec<&Sphere> = self.iter().collect();
        ranked.sort_by_key(|s| s.progress);
        ranked
    }
}

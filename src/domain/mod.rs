pub mod enums;
pub mod habit;
pub mod journal;
pub mod sphere;
pub mod task;

pub use enums::{HabitFrequency, SphereKey};
pub use habit::Habit;
pub use journal::{rolling_mood_average, JournalEntry};
pub use sphere::{coerce_progress, SphereSet};
pub use task::{Task, TaskLedger};

pub mod types;
pub mod capacity;
pub mod groups;
pub mod engine;

pub use types::{
    Grouping, GroupingType, Seat, SeatingChart, SeatingPreferences, TableAssignment, TableSetting,
};
pub use capacity::effective_capacity;
pub use engine::{generate, generate_with_rng};

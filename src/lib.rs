//! Classroom seating chart generator.
//!
//! Rosters are imported from CSV, edited and saved locally, then seated at tables
//! by [`seating::generate`], optionally grouped by one roster column.

pub mod config;
pub mod display;
pub mod error;
pub mod parser;
pub mod roster;
pub mod seating;
pub mod store;
pub mod web;

pub use error::{Error, Result};

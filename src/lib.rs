//! hybrid-master - Workout sets and rest timer in the terminal

pub mod alerts;
pub mod app_state;
pub mod completion;
pub mod config;
pub mod db;
pub mod render;
pub mod timer;
pub mod tui;
pub mod workout;

pub use app_state::AppState;
pub use db::Database;

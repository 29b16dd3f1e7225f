pub mod config;
pub mod error;
pub mod session_stats;
pub mod state;

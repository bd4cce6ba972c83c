//! cyclelift - Personal workout logger with cyclical rep programming
//!
//! Programs are trees of week/day workouts. Week 1 acts as a template that
//! echoes into later weeks with week-appropriate rep targets; coaching is
//! delegated to an external generative-language service.

pub mod ai;
pub mod model;
pub mod store;
pub mod sync;
pub mod tui;
pub mod workout;

pub use store::Store;

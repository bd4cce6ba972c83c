//! Workout module - effective-workout resolution, navigation and state
//! transitions
//!
//! Week 1 acts as a template: later weeks without explicit history echo the
//! week-1 exercises with week-appropriate rep targets.

pub mod mutate;
pub mod navigate;
pub mod resolver;

pub use mutate::PlanPatch;
pub use navigate::navigate;
pub use resolver::resolve;

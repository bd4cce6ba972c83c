//! Effective-workout resolver
//!
//! Decides what to display for a `(week, day)` pair: explicit history wins,
//! otherwise the week-1 template for the same day echoes forward with the
//! requested week's cycle target.

use crate::model::{DayWorkout, Exercise, Program, RepTarget, WorkoutKey};

/// Resolve the workout to display for `(week, day)`. Read-only.
///
/// An explicit history entry with at least one exercise is returned verbatim.
/// An empty entry counts as "not yet started", so the week-1 template still
/// applies to it.
pub fn resolve(program: &Program, week: u32, day: u32) -> DayWorkout {
    if let Some(stored) = program.history.get(&WorkoutKey::new(week, day))
        && !stored.exercises.is_empty()
    {
        return stored.clone();
    }

    if week > 1
        && let Some(template) = program.history.get(&WorkoutKey::new(1, day))
        && !template.exercises.is_empty()
    {
        let weekly_default = program.plan.rep_range_for_week(week);
        let exercises = template
            .exercises
            .iter()
            .map(|ex| {
                let target = if ex.target.is_custom() {
                    ex.target.clone()
                } else {
                    RepTarget::cycle(weekly_default)
                };
                Exercise {
                    id: ex.id,
                    name: ex.name.clone(),
                    target,
                    sets: Vec::new(),
                }
            })
            .collect();
        return DayWorkout {
            week,
            day,
            exercises,
        };
    }

    DayWorkout::empty(week, day)
}

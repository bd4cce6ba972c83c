//! Prompt building for the coaching calls

use crate::model::{DayWorkout, Exercise, Program, WeightUnit};

/// Goal labels offered after a review.
pub const SUGGESTED_GOALS: &[&str] = &["Bulking", "Cutting", "Gain Strength", "Endurance"];

const UNSPECIFIED_GOAL: &str = "Not specified";

fn format_set_list(exercise: &Exercise, unit: WeightUnit) -> String {
    exercise
        .sets
        .iter()
        .map(|s| format!("{}{} x {}", s.weight, unit, s.reps))
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_exercise_list(workout: &DayWorkout, unit: WeightUnit) -> String {
    workout
        .exercises
        .iter()
        .map(|ex| {
            format!(
                "- {}: {} (Target Range: {})",
                ex.name,
                format_set_list(ex, unit),
                ex.target.range()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the "Strategic Performance Review" prompt for today's session.
pub fn build_review_prompt(program: &Program, workout: &DayWorkout) -> String {
    let goal = program.goal.as_deref().unwrap_or(UNSPECIFIED_GOAL);
    let cycle = program.plan.cyclical_reps.join(", ");
    let cycle_flow = program.plan.cyclical_reps.join(" -> ");
    let total_sessions = program.history.len();

    format!(
        r#"As an elite strength and conditioning coach, provide a "Strategic Performance Review".

Current Session: Week {week}, Day {day}
Exercises performed today:
{exercises}

Program Overview:
- Program Name: {name}
- User's Goal: {goal}
- Rep Cycle Plan: {cycle}
- Total sessions logged in this program: {total_sessions}

Review Task:
1. Evaluate today: Did they hit the targets?
2. Evaluate program composition: Does the exercise selection and rep cycling logic ({cycle_flow}) align with the goal?
3. Suggestions: How should they modify the plan (reps, sets, moves) to better achieve the goal?

If User's Goal is "{UNSPECIFIED_GOAL}":
- Summarize what this current plan is best for (e.g., strength, size, or endurance).
- End by asking the user to choose a goal.

Keep the response insightful, concise (under 100 words), and professional."#,
        week = workout.week,
        day = workout.day,
        exercises = format_exercise_list(workout, program.plan.weight_unit),
        name = program.name,
    )
}

/// Build the structured-program generation prompt. The embedded example pins
/// the JSON shape [`super::GeneratedProgram`] expects back.
pub fn build_generation_prompt(goal: &str, experience: &str, days_per_week: u32) -> String {
    format!(
        r#"Find a popular and effective {goal} workout plan for a {experience} level lifter, scheduled for {days_per_week} days per week.

Return a structured JSON object that exactly matches this format:
{{
  "name": "Name of the Program",
  "goal": "{goal}",
  "plan": {{
    "daysPerWeek": {days_per_week},
    "maxWeeks": 4,
    "cyclicalReps": ["8-12", "5-8", "8-12", "5-8"],
    "weightUnit": "lb"
  }},
  "history": {{
    "W1_D1": {{
      "week": 1,
      "day": 1,
      "exercises": [
        {{ "id": "unique1", "name": "Exercise Name", "targetReps": "8-12", "sets": [] }}
      ]
    }}
  }}
}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AppState;
    use crate::workout::{mutate, resolve};

    fn program_with_logged_day() -> Program {
        let mut state = AppState::default();
        let id = mutate::create_program(&mut state, "Hypertrophy Block", None);
        let program = state.program_mut(id).unwrap();
        let exercise_id = mutate::add_exercise(program, 1, 1, "Bench Press");
        mutate::upsert_set(program, 1, 1, exercise_id, None, 135.0, 8).unwrap();
        mutate::upsert_set(program, 1, 1, exercise_id, None, 140.0, 6).unwrap();
        program.clone()
    }

    #[test]
    fn test_review_prompt_embeds_session_and_cycle() {
        let program = program_with_logged_day();
        let workout = resolve(&program, 1, 1);
        let prompt = build_review_prompt(&program, &workout);

        assert!(prompt.contains("Week 1, Day 1"));
        assert!(prompt.contains("- Bench Press: 135lb x 8, 140lb x 6 (Target Range: 6-10)"));
        assert!(prompt.contains("Program Name: Hypertrophy Block"));
        assert!(prompt.contains("Rep Cycle Plan: 6-10, 1-5, 6-10, 1-5"));
        assert!(prompt.contains("(6-10 -> 1-5 -> 6-10 -> 1-5)"));
        assert!(prompt.contains("Total sessions logged in this program: 1"));
    }

    #[test]
    fn test_review_prompt_defaults_missing_goal() {
        let program = program_with_logged_day();
        let workout = resolve(&program, 1, 1);
        let prompt = build_review_prompt(&program, &workout);
        assert!(prompt.contains("User's Goal: Not specified"));
    }

    #[test]
    fn test_review_prompt_uses_set_goal_and_unit() {
        let mut program = program_with_logged_day();
        mutate::set_goal(&mut program, "Bulking");
        program.plan.weight_unit = WeightUnit::Kg;
        let workout = resolve(&program, 1, 1);
        let prompt = build_review_prompt(&program, &workout);
        assert!(prompt.contains("User's Goal: Bulking"));
        assert!(prompt.contains("135kg x 8"));
    }

    #[test]
    fn test_generation_prompt_embeds_parameters() {
        let prompt = build_generation_prompt("Fat Loss / Cut", "Beginner", 3);
        assert!(prompt.contains("Fat Loss / Cut workout plan for a Beginner level lifter"));
        assert!(prompt.contains("scheduled for 3 days per week"));
        assert!(prompt.contains("\"daysPerWeek\": 3"));
        assert!(prompt.contains("\"W1_D1\""));
        assert!(prompt.contains("\"targetReps\""));
    }

    #[test]
    fn test_suggested_goals_listed() {
        assert_eq!(SUGGESTED_GOALS.len(), 4);
        assert!(SUGGESTED_GOALS.contains(&"Gain Strength"));
    }
}

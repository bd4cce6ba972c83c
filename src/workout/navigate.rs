//! Week/day navigation
//!
//! Weeks clamp to `[1, max_weeks]`; days roll over into the neighbouring
//! week where one exists, otherwise clamp.

use crate::model::UserPlan;

/// Apply day/week deltas to a `(week, day)` position.
///
/// Both axes may be applied in one call; the week delta is applied first.
/// The result always lies within `[1, max_weeks] x [1, days_per_week]`.
pub fn navigate(
    plan: &UserPlan,
    week: u32,
    day: u32,
    delta_day: i32,
    delta_week: i32,
) -> (u32, u32) {
    let max_weeks = plan.max_weeks.max(1);
    let days_per_week = plan.days_per_week.max(1);

    let mut week = week.clamp(1, max_weeks);
    let mut day = day.clamp(1, days_per_week);

    if delta_week != 0 {
        week = (i64::from(week) + i64::from(delta_week)).clamp(1, i64::from(max_weeks)) as u32;
    }

    if delta_day != 0 {
        let next = i64::from(day) + i64::from(delta_day);
        if next > i64::from(days_per_week) {
            if week < max_weeks {
                day = 1;
                week += 1;
            } else {
                day = days_per_week;
            }
        } else if next < 1 {
            if week > 1 {
                day = days_per_week;
                week -= 1;
            } else {
                day = 1;
            }
        } else {
            day = next as u32;
        }
    }

    (week, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> UserPlan {
        UserPlan::default() // 4 days/week, 4 weeks
    }

    #[test]
    fn test_day_step_within_week() {
        assert_eq!(navigate(&plan(), 1, 1, 1, 0), (1, 2));
        assert_eq!(navigate(&plan(), 1, 3, -1, 0), (1, 2));
    }

    #[test]
    fn test_day_rolls_over_into_next_week() {
        assert_eq!(navigate(&plan(), 1, 4, 1, 0), (2, 1));
    }

    #[test]
    fn test_day_rolls_back_into_previous_week() {
        assert_eq!(navigate(&plan(), 2, 1, -1, 0), (1, 4));
    }

    #[test]
    fn test_day_clamps_at_final_slot() {
        assert_eq!(navigate(&plan(), 4, 4, 1, 0), (4, 4));
    }

    #[test]
    fn test_day_clamps_at_first_slot() {
        assert_eq!(navigate(&plan(), 1, 1, -1, 0), (1, 1));
    }

    #[test]
    fn test_week_clamps_at_bounds() {
        assert_eq!(navigate(&plan(), 1, 2, 0, -1), (1, 2));
        assert_eq!(navigate(&plan(), 4, 2, 0, 1), (4, 2));
        assert_eq!(navigate(&plan(), 2, 2, 0, 1), (3, 2));
    }

    #[test]
    fn test_inverse_deltas_cancel_within_week() {
        let p = plan();
        for day in 1..3 {
            let forward = navigate(&p, 2, day, 1, 0);
            assert_eq!(navigate(&p, forward.0, forward.1, -1, 0), (2, day));
        }
        let up = navigate(&p, 2, 2, 0, 1);
        assert_eq!(navigate(&p, up.0, up.1, 0, -1), (2, 2));
    }

    #[test]
    fn test_both_axes_apply_independently() {
        assert_eq!(navigate(&plan(), 2, 2, 1, 1), (3, 3));
        // Week clamp composes with day rollover.
        assert_eq!(navigate(&plan(), 4, 4, 1, 1), (4, 4));
    }

    #[test]
    fn test_out_of_range_input_is_normalized() {
        // A shrunken plan can leave the cursor past the new bounds.
        let p = UserPlan {
            days_per_week: 2,
            max_weeks: 2,
            ..UserPlan::default()
        };
        assert_eq!(navigate(&p, 4, 4, 0, 0), (2, 2));
    }

    #[test]
    fn test_single_day_plan_never_escapes() {
        let p = UserPlan {
            days_per_week: 1,
            max_weeks: 1,
            ..UserPlan::default()
        };
        assert_eq!(navigate(&p, 1, 1, 1, 0), (1, 1));
        assert_eq!(navigate(&p, 1, 1, -1, 0), (1, 1));
        assert_eq!(navigate(&p, 1, 1, 0, 1), (1, 1));
    }
}

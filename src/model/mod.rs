//! Data model - programs, workouts, exercises and logged sets

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::{Result, anyhow, bail};
use chrono::{DateTime, Utc};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Rep range used when a week has no cycle entry.
pub const DEFAULT_REP_RANGE: &str = "6-10";

/// Identity record created on (mock) login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub photo_url: String,
}

impl User {
    /// Build a local account with a generated avatar URL.
    pub fn mock(name: &str, email: &str) -> Self {
        let encoded = utf8_percent_encode(name, NON_ALPHANUMERIC);
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            photo_url: format!(
                "https://ui-avatars.com/api/?name={encoded}&background=10b981&color=000&bold=true&rounded=true&size=128"
            ),
        }
    }
}

/// One logged set: weight x reps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SetRecord {
    pub id: Uuid,
    pub weight: f64,
    pub reps: u32,
    pub timestamp: DateTime<Utc>,
}

impl SetRecord {
    pub fn new(weight: f64, reps: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            weight,
            reps,
            timestamp: Utc::now(),
        }
    }
}

/// Target rep range for an exercise.
///
/// `Cycle` follows the plan's weekly default; `Custom` is pinned by the user
/// and immune to week-driven updates for the program's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RepTarget {
    Cycle { range: String },
    Custom { range: String },
}

impl RepTarget {
    pub fn cycle(range: impl Into<String>) -> Self {
        Self::Cycle {
            range: range.into(),
        }
    }

    pub fn custom(range: impl Into<String>) -> Self {
        Self::Custom {
            range: range.into(),
        }
    }

    pub fn range(&self) -> &str {
        match self {
            Self::Cycle { range } | Self::Custom { range } => range,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub id: Uuid,
    pub name: String,
    pub target: RepTarget,
    pub sets: Vec<SetRecord>,
}

impl Exercise {
    pub fn new(name: impl Into<String>, target: RepTarget) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            target,
            sets: Vec::new(),
        }
    }
}

/// Composite `(week, day)` key into a program's history.
///
/// Serialized as `"W{week}_D{day}"` so persisted blobs and the AI wire
/// format share one shape. Weeks and days start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkoutKey {
    pub week: u32,
    pub day: u32,
}

impl WorkoutKey {
    pub fn new(week: u32, day: u32) -> Self {
        Self { week, day }
    }
}

impl fmt::Display for WorkoutKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "W{}_D{}", self.week, self.day)
    }
}

impl FromStr for WorkoutKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let rest = s
            .strip_prefix('W')
            .ok_or_else(|| anyhow!("bad workout key: {s}"))?;
        let (week, day) = rest
            .split_once("_D")
            .ok_or_else(|| anyhow!("bad workout key: {s}"))?;
        let week: u32 = week.parse().map_err(|_| anyhow!("bad week in key: {s}"))?;
        let day: u32 = day.parse().map_err(|_| anyhow!("bad day in key: {s}"))?;
        if week == 0 || day == 0 {
            bail!("weeks and days start at 1: {s}");
        }
        Ok(Self { week, day })
    }
}

impl Serialize for WorkoutKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WorkoutKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Exercises logged (or planned) for one week/day slot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayWorkout {
    pub week: u32,
    pub day: u32,
    pub exercises: Vec<Exercise>,
}

impl DayWorkout {
    pub fn empty(week: u32, day: u32) -> Self {
        Self {
            week,
            day,
            exercises: Vec::new(),
        }
    }

    pub fn key(&self) -> WorkoutKey {
        WorkoutKey::new(self.week, self.day)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    Lb,
    Kg,
}

impl fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lb => write!(f, "lb"),
            Self::Kg => write!(f, "kg"),
        }
    }
}

/// Cadence configuration for a program.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserPlan {
    pub days_per_week: u32,
    pub max_weeks: u32,
    /// One rep-range label per week, index = week - 1.
    pub cyclical_reps: Vec<String>,
    pub weight_unit: WeightUnit,
}

impl UserPlan {
    /// Cycle value for a week, falling back to [`DEFAULT_REP_RANGE`] when the
    /// cycle has no entry for it.
    pub fn rep_range_for_week(&self, week: u32) -> &str {
        self.cyclical_reps
            .get(week.saturating_sub(1) as usize)
            .map(String::as_str)
            .unwrap_or(DEFAULT_REP_RANGE)
    }
}

impl Default for UserPlan {
    fn default() -> Self {
        Self {
            days_per_week: 4,
            max_weeks: 4,
            cyclical_reps: vec![
                "6-10".to_string(),
                "1-5".to_string(),
                "6-10".to_string(),
                "1-5".to_string(),
            ],
            weight_unit: WeightUnit::Lb,
        }
    }
}

/// A named multi-week training plan with its own history and configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Program {
    pub id: Uuid,
    pub name: String,
    pub goal: Option<String>,
    pub history: BTreeMap<WorkoutKey, DayWorkout>,
    pub plan: UserPlan,
    pub last_accessed: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Whole-application state, persisted as a single blob.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppState {
    pub programs: Vec<Program>,
    /// Weak reference: must be cleared when the referent is deleted.
    pub active_program_id: Option<Uuid>,
    pub user: Option<User>,
    pub last_sync: Option<DateTime<Utc>>,
}

impl AppState {
    pub fn program(&self, id: Uuid) -> Option<&Program> {
        self.programs.iter().find(|p| p.id == id)
    }

    pub fn program_mut(&mut self, id: Uuid) -> Option<&mut Program> {
        self.programs.iter_mut().find(|p| p.id == id)
    }

    pub fn active_program(&self) -> Option<&Program> {
        self.active_program_id.and_then(|id| self.program(id))
    }

    pub fn active_program_mut(&mut self) -> Option<&mut Program> {
        let id = self.active_program_id?;
        self.program_mut(id)
    }
}

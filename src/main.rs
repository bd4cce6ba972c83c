//! cyclelift - Personal workout logger with cyclical rep programming

use std::io::{self, Write};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use rand::seq::SliceRandom;
use uuid::Uuid;

use cyclelift::Store;
use cyclelift::ai::{self, GeminiClient};
use cyclelift::model::{AppState, Program, User, WeightUnit};
use cyclelift::tui::App;
use cyclelift::workout::{PlanPatch, mutate, resolve};

const DB_PATH: &str = "cyclelift.db";

const GENERATION_MESSAGES: &[&str] = &[
    "Searching methodologies...",
    "Customizing set-rep protocols...",
    "Optimizing volume...",
    "Finalizing AI block...",
];

#[derive(Parser)]
#[command(name = "cyclelift")]
#[command(version, about = "Personal workout logger with cyclical rep programming")]
struct Cli {
    /// Database path
    #[arg(long, env = "CYCLELIFT_DB", default_value = DB_PATH)]
    db: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the TUI dashboard
    Tui,

    /// List programs
    Programs,

    /// Create a program and make it active
    Create {
        name: String,

        /// Program to clone the plan and exercises from (set logs start empty)
        #[arg(short, long)]
        template: Option<String>,
    },

    /// Switch the active program
    Use {
        /// Program name or id prefix
        program: String,
    },

    /// Delete a program
    Delete {
        /// Program name or id prefix
        program: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show the workout for a week/day of the active program
    Show {
        #[arg(short, long, default_value = "1")]
        week: u32,

        #[arg(short, long, default_value = "1")]
        day: u32,
    },

    /// Add an exercise to a week/day
    Add {
        name: String,

        #[arg(short, long, default_value = "1")]
        week: u32,

        #[arg(short, long, default_value = "1")]
        day: u32,
    },

    /// Log a set, or overwrite one with --set
    Log {
        /// Exercise name
        exercise: String,

        weight: f64,

        reps: u32,

        /// Set number to overwrite instead of appending
        #[arg(short, long)]
        set: Option<usize>,

        #[arg(short, long, default_value = "1")]
        week: u32,

        #[arg(short, long, default_value = "1")]
        day: u32,
    },

    /// Remove a set from an exercise
    RemoveSet {
        /// Exercise name
        exercise: String,

        /// Set number
        set: usize,

        #[arg(short, long, default_value = "1")]
        week: u32,

        #[arg(short, long, default_value = "1")]
        day: u32,
    },

    /// Remove an exercise from a week/day
    RemoveExercise {
        /// Exercise name
        exercise: String,

        #[arg(short, long, default_value = "1")]
        week: u32,

        #[arg(short, long, default_value = "1")]
        day: u32,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Rename an exercise
    Rename {
        /// Current exercise name
        exercise: String,

        /// New name
        name: String,

        #[arg(short, long, default_value = "1")]
        week: u32,

        #[arg(short, long, default_value = "1")]
        day: u32,
    },

    /// Pin a custom rep range on an exercise (opts out of the weekly cycle)
    Reps {
        /// Exercise name
        exercise: String,

        /// Rep range label, e.g. "6-10"
        range: String,

        #[arg(short, long, default_value = "1")]
        week: u32,

        #[arg(short, long, default_value = "1")]
        day: u32,
    },

    /// Edit the active program's plan
    Plan {
        #[arg(long)]
        days_per_week: Option<u32>,

        #[arg(long)]
        max_weeks: Option<u32>,

        /// Weight unit: lb or kg
        #[arg(long)]
        unit: Option<String>,

        /// Rewrite one week's cycle entry, e.g. --week-range 2:5-8
        #[arg(long, value_name = "WEEK:RANGE")]
        week_range: Option<String>,

        /// Append a week to the rep cycle
        #[arg(long, value_name = "RANGE")]
        add_week: Option<String>,

        /// Remove a week from the rep cycle
        #[arg(long, value_name = "WEEK")]
        remove_week: Option<u32>,
    },

    /// AI performance review of a day's session
    Review {
        /// Set the training goal first (e.g. Bulking, Cutting, Gain Strength, Endurance)
        #[arg(short, long)]
        goal: Option<String>,

        #[arg(short, long, default_value = "1")]
        week: u32,

        #[arg(short, long, default_value = "1")]
        day: u32,
    },

    /// Build a new program with the AI consultant
    Generate {
        /// Training goal, e.g. "Strength & Power", "Muscle Hypertrophy"
        goal: String,

        /// Beginner, Intermediate or Advanced
        experience: String,

        /// Training days per week
        #[arg(default_value = "4")]
        days: u32,
    },

    /// Sign in with a local account
    Login {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        /// Continue as guest (remembered)
        #[arg(long)]
        skip: bool,
    },

    /// Sign out
    Logout {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show the signed-in account
    Whoami,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (GEMINI_API_KEY lives there)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let store = Store::open(&cli.db)?;

    match cli.command {
        Some(Commands::Tui) | None => {
            let mut app = App::new(store)?;
            app.run()?;
        }

        Some(Commands::Programs) => {
            let state = store.load_state()?;
            if state.programs.is_empty() {
                println!("No programs yet. Try `cyclelift create <name>` or `cyclelift generate`.");
                return Ok(());
            }
            println!("{:-<72}", "");
            for program in &state.programs {
                let id = program.id.to_string();
                let marker = if state.active_program_id == Some(program.id) {
                    "*"
                } else {
                    " "
                };
                println!(
                    "{} {} | {:24} | {} days x {} weeks | {}",
                    marker,
                    &id[..8],
                    program.name,
                    program.plan.days_per_week,
                    program.plan.max_weeks,
                    program.goal.as_deref().unwrap_or("-"),
                );
            }
        }

        Some(Commands::Create { name, template }) => {
            let mut state = store.load_state()?;
            let template_id = template
                .as_deref()
                .map(|t| find_program_id(&state, t))
                .transpose()?;
            let id = mutate::create_program(&mut state, &name, template_id);
            store.save_state(&state)?;
            let id = id.to_string();
            println!("Created {:?} (id: {}). It is now active.", name, &id[..8]);
        }

        Some(Commands::Use { program }) => {
            let mut state = store.load_state()?;
            let id = find_program_id(&state, &program)?;
            mutate::set_active_program(&mut state, id)?;
            store.save_state(&state)?;
            let name = state.program(id).map(|p| p.name.clone()).unwrap_or_default();
            println!("Active program: {name}");
        }

        Some(Commands::Delete { program, yes }) => {
            let mut state = store.load_state()?;
            let id = find_program_id(&state, &program)?;
            let name = state.program(id).map(|p| p.name.clone()).unwrap_or_default();
            if !yes && !confirm(&format!("Delete program {name:?}? This cannot be undone."))? {
                println!("Aborted.");
                return Ok(());
            }
            mutate::delete_program(&mut state, id)?;
            store.save_state(&state)?;
            println!("Deleted {name:?}.");
        }

        Some(Commands::Show { week, day }) => {
            let state = store.load_state()?;
            let program = active_program(&state)?;
            print_workout(program, week, day);
        }

        Some(Commands::Add { name, week, day }) => {
            let mut state = store.load_state()?;
            let program = active_program_mut(&mut state)?;
            mutate::add_exercise(program, week, day, &name);
            store.save_state(&state)?;
            println!("Added {name:?} at W{week} D{day}.");
        }

        Some(Commands::Log {
            exercise,
            weight,
            reps,
            set,
            week,
            day,
        }) => {
            let mut state = store.load_state()?;
            let program = active_program_mut(&mut state)?;
            let exercise_id = find_exercise_id(program, week, day, &exercise)?;
            let set_id = match set {
                Some(n) => Some(find_set_id(program, week, day, exercise_id, n)?),
                None => None,
            };
            mutate::upsert_set(program, week, day, exercise_id, set_id, weight, reps)?;
            let unit = program.plan.weight_unit;
            store.save_state(&state)?;
            println!("Logged {weight}{unit} x {reps} on {exercise} (W{week} D{day}).");
        }

        Some(Commands::RemoveSet {
            exercise,
            set,
            week,
            day,
        }) => {
            let mut state = store.load_state()?;
            let program = active_program_mut(&mut state)?;
            let exercise_id = find_exercise_id(program, week, day, &exercise)?;
            let set_id = find_set_id(program, week, day, exercise_id, set)?;
            mutate::delete_set(program, week, day, exercise_id, set_id)?;
            store.save_state(&state)?;
            println!("Removed set {set} from {exercise}.");
        }

        Some(Commands::RemoveExercise {
            exercise,
            week,
            day,
            yes,
        }) => {
            let mut state = store.load_state()?;
            let program = active_program_mut(&mut state)?;
            let exercise_id = find_exercise_id(program, week, day, &exercise)?;
            if !yes && !confirm(&format!("Delete move {exercise:?}? This cannot be undone."))? {
                println!("Aborted.");
                return Ok(());
            }
            mutate::delete_exercise(program, week, day, exercise_id)?;
            store.save_state(&state)?;
            println!("Deleted {exercise:?} from W{week} D{day}.");
        }

        Some(Commands::Rename {
            exercise,
            name,
            week,
            day,
        }) => {
            let mut state = store.load_state()?;
            let program = active_program_mut(&mut state)?;
            let exercise_id = find_exercise_id(program, week, day, &exercise)?;
            mutate::rename_exercise(program, week, day, exercise_id, &name)?;
            store.save_state(&state)?;
            println!("Renamed {exercise:?} to {name:?}.");
        }

        Some(Commands::Reps {
            exercise,
            range,
            week,
            day,
        }) => {
            let mut state = store.load_state()?;
            let program = active_program_mut(&mut state)?;
            let exercise_id = find_exercise_id(program, week, day, &exercise)?;
            mutate::set_target_reps(program, week, day, exercise_id, &range)?;
            store.save_state(&state)?;
            println!("Pinned {range:?} on {exercise}; the weekly cycle no longer applies to it.");
        }

        Some(Commands::Plan {
            days_per_week,
            max_weeks,
            unit,
            week_range,
            add_week,
            remove_week,
        }) => {
            let mut state = store.load_state()?;
            let program = active_program_mut(&mut state)?;
            let weight_unit = match unit.as_deref() {
                Some("lb") => Some(WeightUnit::Lb),
                Some("kg") => Some(WeightUnit::Kg),
                Some(other) => bail!("unknown unit {other:?} (expected lb or kg)"),
                None => None,
            };
            mutate::edit_plan(
                program,
                PlanPatch {
                    days_per_week,
                    max_weeks,
                    weight_unit,
                    cyclical_reps: None,
                },
            );
            if let Some(entry) = week_range {
                let (week, range) = entry
                    .split_once(':')
                    .ok_or_else(|| anyhow!("expected WEEK:RANGE, e.g. 2:5-8"))?;
                let week: u32 = week.parse().context("expected a week number")?;
                mutate::set_week_range(program, week, range)?;
            }
            if let Some(range) = add_week {
                mutate::push_week_range(program, &range);
            }
            if let Some(week) = remove_week {
                mutate::remove_week_range(program, week)?;
            }
            let plan = program.plan.clone();
            store.save_state(&state)?;
            println!(
                "Plan: {} days/week x {} weeks, unit {}",
                plan.days_per_week, plan.max_weeks, plan.weight_unit
            );
            println!("Cycle: {}", plan.cyclical_reps.join(", "));
        }

        Some(Commands::Review { goal, week, day }) => {
            let mut state = store.load_state()?;
            if let Some(goal) = &goal {
                let program = active_program_mut(&mut state)?;
                mutate::set_goal(program, goal);
                store.save_state(&state)?;
            }
            let program = active_program(&state)?;
            let workout = resolve(program, week, day);
            if workout.exercises.is_empty() {
                bail!("nothing to review at W{week} D{day}; log a session first");
            }

            let review = match GeminiClient::from_env() {
                Ok(client) => client.analyze_progress(program, &workout).await,
                Err(_) => ai::REVIEW_FALLBACK.to_string(),
            };
            println!("Strategic Performance Review | W{week} D{day}");
            println!("{:-<60}", "");
            println!("{review}");
            println!();
            println!(
                "Training focus options: {} (set one with `cyclelift review --goal <label>`)",
                ai::prompt::SUGGESTED_GOALS.join(", ")
            );
        }

        Some(Commands::Generate {
            goal,
            experience,
            days,
        }) => {
            let client = GeminiClient::from_env()?;
            let message = {
                let mut rng = rand::thread_rng();
                GENERATION_MESSAGES.choose(&mut rng).copied()
            }
            .unwrap_or("Consulting Training Experts...");
            println!("Building your routine. {message}");

            let generated = match client.generate_program(&goal, &experience, days).await {
                Ok(generated) => generated,
                Err(e) => {
                    eprintln!("Failed to build program. Try a manual setup.");
                    return Err(e);
                }
            };

            let mut state = store.load_state()?;
            let id = mutate::adopt_generated(&mut state, generated);
            store.save_state(&state)?;
            if let Some(program) = state.program(id) {
                println!(
                    "Created {:?}: {} days/week x {} weeks. It is now active.",
                    program.name, program.plan.days_per_week, program.plan.max_weeks
                );
                println!("Run `cyclelift show` to see W1 D1.");
            }
        }

        Some(Commands::Login { name, email, skip }) => {
            if skip {
                store.set_skip_login()?;
                println!("Continuing without login. Data stays on this device.");
                return Ok(());
            }

            let mut state = store.load_state()?;
            let user = match (name, email) {
                (Some(name), Some(email)) => {
                    let known = store.known_accounts()?;
                    match known.into_iter().find(|u| u.email == email) {
                        Some(user) => user,
                        None => {
                            let user = User::mock(&name, &email);
                            store.remember_account(&user)?;
                            user
                        }
                    }
                }
                (None, None) => pick_known_account(&store)?,
                _ => bail!("pass both --name and --email (or neither to pick a known account)"),
            };

            println!("Signed in as {} <{}>. Sync starts automatically.", user.name, user.email);
            mutate::sign_in(&mut state, user);
            store.set_skip_login()?;
            store.save_state(&state)?;
        }

        Some(Commands::Logout { yes }) => {
            let mut state = store.load_state()?;
            if state.user.is_none() {
                println!("Not signed in.");
                return Ok(());
            }
            if !yes && !confirm("Sign out? Your training data remains safe on this device.")? {
                println!("Aborted.");
                return Ok(());
            }
            mutate::sign_out(&mut state);
            store.save_state(&state)?;
            println!("Signed out.");
        }

        Some(Commands::Whoami) => {
            let state = store.load_state()?;
            match &state.user {
                Some(user) => {
                    println!("{} <{}>", user.name, user.email);
                    let last_sync = state
                        .last_sync
                        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_else(|| "never".to_string());
                    println!("Status: cloud persistent (last sync: {last_sync})");
                }
                None => println!("guest (local persistence only)"),
            }
        }
    }

    Ok(())
}

fn print_workout(program: &Program, week: u32, day: u32) {
    let workout = resolve(program, week, day);
    println!(
        "{} | W{} D{} | target {}",
        program.name,
        week,
        day,
        program.plan.rep_range_for_week(week)
    );
    println!("{:-<60}", "");
    if workout.exercises.is_empty() {
        println!("No moves logged for this day.");
        return;
    }
    for exercise in &workout.exercises {
        let marker = if exercise.target.is_custom() {
            " (custom)"
        } else {
            ""
        };
        println!("{} [{}{}]", exercise.name, exercise.target.range(), marker);
        if exercise.sets.is_empty() {
            println!("    no sets yet");
        }
        for (i, set) in exercise.sets.iter().enumerate() {
            println!(
                "    {}. {}{} x {}",
                i + 1,
                set.weight,
                program.plan.weight_unit,
                set.reps
            );
        }
    }
}

/// Resolve a program by exact name (case-insensitive) or id prefix.
fn find_program_id(state: &AppState, selector: &str) -> Result<Uuid> {
    let matches: Vec<&Program> = state
        .programs
        .iter()
        .filter(|p| {
            p.id.to_string().starts_with(selector) || p.name.eq_ignore_ascii_case(selector)
        })
        .collect();
    match matches.as_slice() {
        [program] => Ok(program.id),
        [] => bail!("no program matches {selector:?} (see `cyclelift programs`)"),
        _ => bail!("{selector:?} is ambiguous; use more of the id"),
    }
}

fn active_program(state: &AppState) -> Result<&Program> {
    state
        .active_program()
        .ok_or_else(|| anyhow!("no active program; `cyclelift create` or `cyclelift use` first"))
}

fn active_program_mut(state: &mut AppState) -> Result<&mut Program> {
    state
        .active_program_mut()
        .ok_or_else(|| anyhow!("no active program; `cyclelift create` or `cyclelift use` first"))
}

/// Find an exercise in the workout the user is looking at (explicit history
/// or the week-1 echo).
fn find_exercise_id(program: &Program, week: u32, day: u32, name: &str) -> Result<Uuid> {
    resolve(program, week, day)
        .exercises
        .iter()
        .find(|e| e.name.eq_ignore_ascii_case(name))
        .map(|e| e.id)
        .ok_or_else(|| anyhow!("no exercise {name:?} at W{week} D{day}"))
}

/// Map a 1-based set number to its id.
fn find_set_id(
    program: &Program,
    week: u32,
    day: u32,
    exercise_id: Uuid,
    number: usize,
) -> Result<Uuid> {
    let workout = resolve(program, week, day);
    let exercise = workout
        .exercises
        .iter()
        .find(|e| e.id == exercise_id)
        .ok_or_else(|| anyhow!("no such exercise at W{week} D{day}"))?;
    let index = number
        .checked_sub(1)
        .ok_or_else(|| anyhow!("set numbers start at 1"))?;
    exercise
        .sets
        .get(index)
        .map(|s| s.id)
        .ok_or_else(|| anyhow!("{} has {} set(s)", exercise.name, exercise.sets.len()))
}

fn pick_known_account(store: &Store) -> Result<User> {
    let known = store.known_accounts()?;
    if known.is_empty() {
        bail!("no known accounts; pass --name and --email");
    }
    println!("Choose an account:");
    for (i, user) in known.iter().enumerate() {
        println!("  {}. {} <{}>", i + 1, user.name, user.email);
    }
    let choice = prompt_line("Account number: ")?;
    let number: usize = choice.trim().parse().context("expected a number")?;
    let index = number
        .checked_sub(1)
        .ok_or_else(|| anyhow!("account numbers start at 1"))?;
    known
        .into_iter()
        .nth(index)
        .ok_or_else(|| anyhow!("no account number {number}"))
}

fn prompt_line(prompt: &str) -> Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line)
}

fn confirm(prompt: &str) -> Result<bool> {
    let answer = prompt_line(&format!("{prompt} [y/N] "))?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

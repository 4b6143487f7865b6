//! liftlog - Personal gym tracker

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use liftlog::activity::{
    ActivityKind, DayPlan, ExerciseInput, LogRequest, PlanSource, SetInput, compute_streak, log_activity, parse_sets,
    week_strip,
};
use liftlog::config::{Calendar, Config, CountPolicy, DEFAULT_DB_PATH, day_bounds};
use liftlog::db::Database;
use liftlog::exercises::{MuscleGroup, NewExercise, standard_muscle_group, starting_weights};
use liftlog::measurements::{self, Metric, NewBodyStat, TimeRange};
use liftlog::plan::{Direction, NewPlan, PlanExercise, WorkoutPlan};
use liftlog::stats::{BodyTrend, personal_records};
use liftlog::tui::App;

#[derive(Parser)]
#[command(name = "liftlog")]
#[command(author, version, about = "Personal gym tracker: plan rotation, daily log and streaks")]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, env = "LIFTLOG_DB", default_value = DEFAULT_DB_PATH)]
    db: String,

    /// Day boundary as whole hours east of UTC (local time zone if unset)
    #[arg(long, global = true, env = "LIFTLOG_UTC_OFFSET", allow_negative_numbers = true)]
    utc_offset: Option<i32>,

    /// Which logged days advance the plan rotation
    #[arg(long, global = true, env = "LIFTLOG_COUNT_POLICY", value_enum, default_value_t = CountPolicy::Workouts)]
    count_policy: CountPolicy,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl Cli {
    fn config(&self) -> Result<Config> {
        let calendar = match self.utc_offset {
            Some(hours) => Calendar::with_offset_hours(hours)
                .with_context(|| format!("UTC offset {} is outside -12..=14", hours))?,
            None => Calendar::local(),
        };
        Ok(Config {
            db_path: self.db.clone(),
            calendar,
            count_policy: self.count_policy,
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the exercise catalogue
    Exercise {
        #[command(subcommand)]
        action: ExerciseAction,
    },

    /// Manage workout plans
    Plan {
        #[command(subcommand)]
        action: PlanAction,
    },

    /// Show the plan due today (or on --date)
    Today {
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Pick a plan for a day instead of the rotation
    Override {
        #[command(subcommand)]
        action: OverrideAction,
    },

    /// Log a workout or a rest day
    Log {
        #[command(subcommand)]
        action: LogAction,
    },

    /// List logged days
    History {
        /// Number of records to show
        #[arg(short, long, default_value = "14")]
        limit: usize,
        /// Only days from this date up to today
        #[arg(short, long)]
        since: Option<NaiveDate>,
    },

    /// Show current and longest streak
    Streak,

    /// Personal records from logged sets
    Records {
        /// Only exercises whose name contains this
        filter: Option<String>,
    },

    /// Body measurements
    Measure {
        #[command(subcommand)]
        action: MeasureAction,
    },

    /// Database maintenance
    Db {
        #[command(subcommand)]
        action: DbAction,
    },

    /// Open TUI dashboard
    Tui,

    /// Start Telegram bot
    Bot {
        /// Telegram bot token (or set TELOXIDE_TOKEN env var)
        #[arg(short, long, env = "TELOXIDE_TOKEN")]
        token: String,
    },
}

#[derive(Subcommand)]
enum ExerciseAction {
    /// Add an exercise
    Add {
        name: String,
        #[arg(short, long)]
        muscle: Option<String>,
        #[arg(short, long)]
        equipment: Option<String>,
        #[arg(short, long, default_value = "3")]
        sets: u32,
        #[arg(short, long, default_value = "10")]
        reps: u32,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long)]
        image: Option<String>,
    },
    /// List exercises
    List {
        /// Filter by muscle group
        #[arg(short, long)]
        muscle: Option<String>,
    },
    /// Edit an exercise; omitted fields keep their value
    Edit {
        exercise: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        muscle: Option<String>,
        #[arg(short, long)]
        equipment: Option<String>,
        #[arg(short, long)]
        sets: Option<u32>,
        #[arg(short, long)]
        reps: Option<u32>,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Set or clear an exercise image reference
    Image { exercise: String, url: Option<String> },
}

#[derive(Subcommand)]
enum PlanAction {
    /// Create an empty plan
    Create {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long)]
        image: Option<String>,
    },
    /// List plans in rotation order
    List,
    /// Show one plan
    Show { plan: String },
    /// Append an exercise to a plan
    Add { plan: String, exercise: String },
    /// Remove the exercise at a position
    Remove { plan: String, position: u32 },
    /// Move the exercise at a position up or down
    Move {
        plan: String,
        position: u32,
        #[arg(value_enum)]
        direction: Direction,
    },
    /// Change target sets and reps at a position
    Sets { plan: String, position: u32, sets: u32, reps: u32 },
    /// Rename a plan or change its description
    Edit {
        plan: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Set or clear a plan image reference
    Image { plan: String, url: Option<String> },
}

#[derive(Subcommand)]
enum OverrideAction {
    Set {
        plan: String,
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
    Clear {
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
}

#[derive(Subcommand)]
enum LogAction {
    /// Log a workout; plan exercises without --set are zero-filled
    Workout {
        /// Plan name or id (default: the plan due that day)
        #[arg(short, long)]
        plan: Option<String>,
        #[arg(short, long)]
        date: Option<NaiveDate>,
        /// Results as "Exercise=60x10 60x8" (repeatable)
        #[arg(short, long = "set")]
        sets: Vec<String>,
        #[arg(short, long, default_value = "")]
        notes: String,
        /// Prefill missing exercises with suggested starting weights
        #[arg(long)]
        suggested: bool,
    },
    /// Log a rest day
    Rest {
        #[arg(short, long)]
        date: Option<NaiveDate>,
        #[arg(short, long, default_value = "")]
        notes: String,
    },
}

#[derive(Subcommand)]
enum MeasureAction {
    /// Record weight, body fat and/or muscle mass
    Add {
        #[arg(short, long)]
        weight: Option<f64>,
        #[arg(short, long)]
        body_fat: Option<f64>,
        #[arg(short, long)]
        muscle_mass: Option<f64>,
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
    /// List measurements
    List {
        #[arg(short, long, value_enum, default_value_t = TimeRange::All)]
        range: TimeRange,
    },
    /// Delete a measurement by id
    Delete { id: i64 },
    /// Fit a trend line for one metric
    Trend {
        #[arg(short, long, value_enum, default_value_t = Metric::Weight)]
        metric: Metric,
        #[arg(short, long, value_enum, default_value_t = TimeRange::ThreeMonths)]
        range: TimeRange,
    },
}

#[derive(Subcommand)]
enum DbAction {
    /// Schema capabilities and row counts
    Info,
    /// Add missing optional columns
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("liftlog=info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config()?;

    let mut db = Database::open(&config.db_path).with_context(|| format!("opening {}", config.db_path))?;
    let today = config.calendar.today();

    match cli.command {
        Some(Commands::Exercise { action }) => run_exercise(&db, action)?,
        Some(Commands::Plan { action }) => run_plan(&db, action)?,

        Some(Commands::Today { date }) => print_day(&db, &config, date.unwrap_or(today))?,

        Some(Commands::Override { action }) => match action {
            OverrideAction::Set { plan, date } => {
                let plan = find_plan(&db, &plan)?;
                let date = date.unwrap_or(today);
                db.set_override(date, plan.id)?;
                println!("{} will be {}", date, plan.name);
            }
            OverrideAction::Clear { date } => {
                let date = date.unwrap_or(today);
                if db.clear_override(date)? {
                    println!("Override for {} cleared", date);
                } else {
                    println!("No override for {}", date);
                }
            }
        },

        Some(Commands::Log { action }) => run_log(&db, &config, action)?,

        Some(Commands::History { limit, since }) => {
            let entries = match since {
                Some(since) => {
                    let (_, end) = day_bounds(today).context("today is out of range")?;
                    let mut entries = db.get_activities_between(since, end)?;
                    entries.reverse();
                    entries
                }
                None => db.get_activities()?,
            };
            let plans = db.get_plans()?;
            println!("Recent activity:");
            println!("{:-<60}", "");
            for e in entries.iter().take(limit) {
                let what = match e.kind {
                    ActivityKind::Rest => "Rest day".to_string(),
                    ActivityKind::Workout { plan_id } => plan_name(&plans, plan_id),
                };
                let volume: f64 = e.exercises.iter().map(|r| r.volume()).sum();
                println!(
                    "{} | {:20} | {:>8.0} kg | {}",
                    e.date,
                    what,
                    volume,
                    if e.notes.is_empty() { "-" } else { e.notes.lines().next().unwrap_or("-") }
                );
            }
        }

        Some(Commands::Streak) => {
            let entries = db.get_activities()?;
            let streak = compute_streak(&entries, today);
            println!("Current streak: {} days ({})", streak.current, streak.message());
            println!("Longest streak: {} days", streak.longest);
            let strip: Vec<String> = week_strip(&entries, today)
                .iter()
                .map(|m| {
                    let mark = match m.status {
                        liftlog::activity::DayStatus::Workout => "W",
                        liftlog::activity::DayStatus::Rest => "R",
                        liftlog::activity::DayStatus::Empty => ".",
                    };
                    format!("{} {}", m.date.format("%a"), mark)
                })
                .collect();
            println!("{}", strip.join(" | "));
        }

        Some(Commands::Records { filter }) => {
            let entries = db.get_activities()?;
            let records = personal_records(&entries, filter.as_deref());
            if records.is_empty() {
                println!("No personal records yet. Log some workouts!");
            }
            for r in records {
                println!("{:24} {:?}: {} on {}", r.exercise_name, r.kind, r.value_label(), r.achieved_on);
            }
        }

        Some(Commands::Measure { action }) => run_measure(&db, today, action)?,

        Some(Commands::Db { action }) => match action {
            DbAction::Info => {
                println!("Database: {}", config.db_path);
                println!(
                    "Exercise details column: {}",
                    if db.capabilities().structured_payload { "yes" } else { "no (stored in notes)" }
                );
                for (table, count) in db.table_counts()? {
                    println!("{:24} {}", table, count);
                }
            }
            DbAction::Migrate => {
                let added = db.migrate()?;
                if added.is_empty() {
                    println!("Schema is up to date");
                } else {
                    println!("Added: {}", added.join(", "));
                }
            }
        },

        Some(Commands::Tui) | None => {
            let mut app = App::new(db, config)?;
            app.run()?;
        }

        Some(Commands::Bot { token }) => {
            // The bot opens its own shared connection
            drop(db);
            println!("Starting Telegram bot...");
            println!("Database: {}", config.db_path);
            liftlog::bot::run_bot(token, config).await?;
        }
    }

    Ok(())
}

fn plan_name(plans: &[WorkoutPlan], plan_id: i64) -> String {
    plans
        .iter()
        .find(|p| p.id == plan_id)
        .map(|p| p.name.clone())
        .unwrap_or_else(|| format!("plan #{}", plan_id))
}

/// Plan by id or by name
fn find_plan(db: &Database, key: &str) -> Result<WorkoutPlan> {
    if let Ok(id) = key.parse::<i64>() {
        return Ok(db.get_plan(id)?);
    }
    db.find_plan_by_name(key)?
        .with_context(|| format!("no plan named '{}'", key))
}

fn slot_at(plan: &WorkoutPlan, position: u32) -> Result<&PlanExercise> {
    plan.exercises
        .iter()
        .find(|e| e.position == position)
        .with_context(|| format!("{} has no exercise at position {}", plan.name, position))
}

fn print_plan(plan: &WorkoutPlan) {
    println!("{} (id {})", plan.name, plan.id);
    if let Some(desc) = &plan.description {
        println!("  {}", desc);
    }
    if plan.exercises.is_empty() {
        println!("  (no exercises)");
    }
    for slot in &plan.exercises {
        println!("  {}. {:24} {}x{}", slot.position, slot.exercise_name, slot.sets, slot.reps);
    }
}

fn print_day(db: &Database, config: &Config, date: NaiveDate) -> Result<()> {
    let snapshot = db.day_snapshot(date, config.count_policy)?;
    match snapshot.resolve() {
        DayPlan::Workout { plan, source } => {
            let why = match source {
                PlanSource::Logged => "already logged",
                PlanSource::Override => "override",
                PlanSource::Rotation => "rotation",
            };
            println!("{}: {} ({})", date, plan.name, why);
            print_plan(plan);
        }
        DayPlan::Rest => println!("{}: rest day", date),
        DayPlan::NoPlans => println!("No plans yet. Create one with `liftlog plan create <name>`"),
    }
    Ok(())
}

fn run_exercise(db: &Database, action: ExerciseAction) -> Result<()> {
    match action {
        ExerciseAction::Add { name, muscle, equipment, sets, reps, description, image } => {
            let exercise = db.add_exercise(NewExercise {
                name,
                description,
                muscle_group: muscle,
                equipment,
                default_sets: sets,
                default_reps: reps,
                image_url: image,
            })?;
            println!(
                "Added: {} [{}] {}x{} (id: {})",
                exercise.name,
                exercise.muscle_group.as_deref().unwrap_or("-"),
                exercise.default_sets,
                exercise.default_reps,
                exercise.id
            );
        }
        ExerciseAction::List { muscle } => {
            let muscle = muscle.as_deref().and_then(standard_muscle_group);
            if let Some(group) = muscle.as_deref().and_then(MuscleGroup::from_label) {
                println!("{}: {}", group.label(), group.description());
            }
            let exercises = db.get_exercises(muscle.as_deref())?;
            if exercises.is_empty() {
                println!("No exercises. Muscle groups:");
                for group in MuscleGroup::all() {
                    println!("  {:12} {}", group.label(), group.description());
                }
            }
            for ex in exercises {
                let start = starting_weights(&ex.name)
                    .map(|w| {
                        let sets: Vec<String> = w.sets.iter().map(|(kg, reps)| format!("{}x{}", kg, reps)).collect();
                        format!(" start: {}", sets.join(" "))
                    })
                    .unwrap_or_default();
                println!(
                    "{:4} {:24} {:12} {:14} {}x{}{}",
                    ex.id,
                    ex.name,
                    ex.muscle_group.as_deref().unwrap_or("-"),
                    ex.equipment.as_deref().unwrap_or("-"),
                    ex.default_sets,
                    ex.default_reps,
                    start
                );
            }
        }
        ExerciseAction::Edit { exercise, name, muscle, equipment, sets, reps, description } => {
            let ex = db
                .find_exercise_by_name(&exercise)?
                .with_context(|| format!("no exercise named '{}'", exercise))?;
            let updated = db.update_exercise(
                ex.id,
                NewExercise {
                    name: name.unwrap_or(ex.name),
                    description: description.or(ex.description),
                    muscle_group: muscle.or(ex.muscle_group),
                    equipment: equipment.or(ex.equipment),
                    default_sets: sets.unwrap_or(ex.default_sets),
                    default_reps: reps.unwrap_or(ex.default_reps),
                    image_url: ex.image_url,
                },
            )?;
            println!(
                "Updated: {} [{}] {}x{} (id: {})",
                updated.name,
                updated.muscle_group.as_deref().unwrap_or("-"),
                updated.default_sets,
                updated.default_reps,
                updated.id
            );
        }
        ExerciseAction::Image { exercise, url } => {
            let ex = db
                .find_exercise_by_name(&exercise)?
                .with_context(|| format!("no exercise named '{}'", exercise))?;
            db.set_exercise_image(ex.id, url.as_deref())?;
            println!("Image updated for {}", ex.name);
        }
    }
    Ok(())
}

fn run_plan(db: &Database, action: PlanAction) -> Result<()> {
    match action {
        PlanAction::Create { name, description, image } => {
            let plan = db.create_plan(NewPlan { name, description, image_url: image })?;
            println!("Created plan {} (id: {})", plan.name, plan.id);
        }
        PlanAction::List => {
            let plans = db.get_plans()?;
            if plans.is_empty() {
                println!("No plans yet");
            }
            for (i, plan) in plans.iter().enumerate() {
                println!("{}. {} ({} exercises)", i + 1, plan.name, plan.exercises.len());
            }
        }
        PlanAction::Show { plan } => print_plan(&find_plan(db, &plan)?),
        PlanAction::Add { plan, exercise } => {
            let plan = find_plan(db, &plan)?;
            let ex = db
                .find_exercise_by_name(&exercise)?
                .with_context(|| format!("no exercise named '{}'", exercise))?;
            let slot = db.add_plan_exercise(plan.id, ex.id)?;
            println!("Added {} to {} at position {}", slot.exercise_name, plan.name, slot.position);
        }
        PlanAction::Remove { plan, position } => {
            let plan = find_plan(db, &plan)?;
            let slot_id = slot_at(&plan, position)?.id;
            print_plan(&db.remove_plan_exercise(plan.id, slot_id)?);
        }
        PlanAction::Move { plan, position, direction } => {
            let plan = find_plan(db, &plan)?;
            let slot_id = slot_at(&plan, position)?.id;
            print_plan(&db.move_plan_exercise(plan.id, slot_id, direction)?);
        }
        PlanAction::Sets { plan, position, sets, reps } => {
            let plan = find_plan(db, &plan)?;
            let slot_id = slot_at(&plan, position)?.id;
            db.update_plan_targets(plan.id, slot_id, sets, reps)?;
            print_plan(&db.get_plan(plan.id)?);
        }
        PlanAction::Edit { plan, name, description } => {
            let plan = find_plan(db, &plan)?;
            let updated = db.update_plan(
                plan.id,
                NewPlan {
                    name: name.unwrap_or(plan.name),
                    description: description.or(plan.description),
                    image_url: plan.image_url,
                },
            )?;
            print_plan(&updated);
        }
        PlanAction::Image { plan, url } => {
            let plan = find_plan(db, &plan)?;
            db.set_plan_image(plan.id, url.as_deref())?;
            println!("Image updated for {}", plan.name);
        }
    }
    Ok(())
}

/// `"Bench Press=60x10 60x8"` against the plan (or the exercise catalogue)
fn parse_set_arg(db: &Database, plan: &WorkoutPlan, arg: &str) -> Result<ExerciseInput> {
    let Some((name, sets)) = arg.split_once('=') else {
        bail!("expected \"Exercise=60x10 60x8\", got '{}'", arg);
    };
    let name = name.trim();
    let sets: Vec<SetInput> = parse_sets(sets).with_context(|| format!("could not read sets in '{}'", arg))?;

    let (exercise_id, exercise_name) = match plan
        .exercises
        .iter()
        .find(|e| e.exercise_name.eq_ignore_ascii_case(name))
    {
        Some(slot) => (slot.exercise_id, slot.exercise_name.clone()),
        None => {
            let ex = db
                .find_exercise_by_name(name)?
                .with_context(|| format!("no exercise named '{}'", name))?;
            (ex.id, ex.name)
        }
    };
    Ok(ExerciseInput {
        exercise_id,
        exercise_name,
        sets,
        notes: None,
    })
}

fn run_log(db: &Database, config: &Config, action: LogAction) -> Result<()> {
    let today = config.calendar.today();
    match action {
        LogAction::Workout { plan, date, sets, notes, suggested } => {
            let date = date.unwrap_or(today);
            let plan = match plan {
                Some(key) => find_plan(db, &key)?,
                None => {
                    let snapshot = db.day_snapshot(date, config.count_policy)?;
                    match snapshot.resolve().plan() {
                        Some(plan) => plan.clone(),
                        None => bail!("no plan due on {}; pass --plan", date),
                    }
                }
            };

            let mut inputs = sets
                .iter()
                .map(|arg| parse_set_arg(db, &plan, arg))
                .collect::<Result<Vec<_>>>()?;

            if suggested {
                for slot in &plan.exercises {
                    if inputs.iter().any(|i| i.exercise_id == slot.exercise_id) {
                        continue;
                    }
                    if let Some(start) = starting_weights(&slot.exercise_name) {
                        inputs.push(ExerciseInput {
                            exercise_id: slot.exercise_id,
                            exercise_name: slot.exercise_name.clone(),
                            sets: start.sets.iter().map(|(weight, reps)| SetInput { weight: *weight, reps: *reps }).collect(),
                            notes: start.notes.map(str::to_string),
                        });
                    }
                }
            }

            let mut request = LogRequest::workout(date, &plan);
            request.inputs = inputs;
            request.notes = notes;
            let entry = log_activity(db, request)?;

            println!("Logged {} on {} (id: {})", plan.name, entry.date, entry.id);
            for result in &entry.exercises {
                let sets: Vec<String> = result.sets.iter().map(|s| format!("{}x{}", s.weight, s.reps)).collect();
                println!("  {:24} {}", result.exercise_name, sets.join(" "));
            }
        }
        LogAction::Rest { date, notes } => {
            let mut request = LogRequest::rest(date.unwrap_or(today));
            request.notes = notes;
            let entry = log_activity(db, request)?;
            println!("Rest day logged for {} (id: {})", entry.date, entry.id);
        }
    }
    Ok(())
}

fn run_measure(db: &Database, today: NaiveDate, action: MeasureAction) -> Result<()> {
    match action {
        MeasureAction::Add { weight, body_fat, muscle_mass, date } => {
            let stat = db.add_body_stat(NewBodyStat { date, weight, body_fat, muscle_mass }, today)?;
            println!("Recorded measurement for {} (id: {})", stat.date, stat.id);
        }
        MeasureAction::List { range } => {
            let stats = db.get_body_stats(range.start(today))?;
            println!("{:>5} | {:10} | {:>8} | {:>8} | {:>8}", "id", "date", "weight", "fat %", "muscle");
            println!("{:-<52}", "");
            let cell = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{:.1}", v));
            for s in &stats {
                println!(
                    "{:>5} | {} | {:>8} | {:>8} | {:>8}",
                    s.id,
                    s.date,
                    cell(s.weight),
                    cell(s.body_fat),
                    cell(s.muscle_mass)
                );
            }
            for metric in [Metric::Weight, Metric::BodyFat, Metric::MuscleMass] {
                if let Some(p) = measurements::progress(&stats, metric) {
                    println!(
                        "{}: {:+.1} {} ({:+.1}%){}",
                        metric.label(),
                        p.change,
                        metric.unit(),
                        p.percentage,
                        if p.is_improvement(metric) { " - nice!" } else { "" }
                    );
                }
            }
        }
        MeasureAction::Delete { id } => {
            db.delete_body_stat(id)?;
            println!("Deleted measurement {}", id);
        }
        MeasureAction::Trend { metric, range } => {
            let stats = db.get_body_stats(range.start(today))?;
            match BodyTrend::fit(&stats, metric) {
                Some(trend) => println!("{}", trend.format_summary(today)),
                None => println!("Need at least 3 {} readings for a trend", metric.label().to_lowercase()),
            }
        }
    }
    Ok(())
}

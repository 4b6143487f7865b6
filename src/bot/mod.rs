//! Telegram bot module - Log today's workout from the phone

use std::sync::Arc;

use chrono::NaiveDate;
use teloxide::{
    dispatching::dialogue::{Dialogue, InMemStorage},
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup},
    utils::command::BotCommands,
};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::activity::{
    ActivityKind, DayPlan, ExerciseInput, LogRequest, PlanSource, compute_streak, log_activity, parse_sets,
};
use crate::config::Config;
use crate::db::Database;
use crate::plan::WorkoutPlan;

type MyDialogue = Dialogue<State, InMemStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;
type SharedDb = Arc<Mutex<Database>>;

const HISTORY_LIMIT: usize = 7;

#[derive(Clone, Default)]
pub enum State {
    #[default]
    Start,
    /// Collecting sets for the plan exercise at `index`
    WaitingForSets {
        date: NaiveDate,
        plan_id: i64,
        index: usize,
        inputs: Vec<ExerciseInput>,
    },
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Commands:")]
pub enum Command {
    #[command(description = "Start")]
    Start,
    #[command(description = "Show help")]
    Help,
    #[command(description = "Today's plan")]
    Today,
    #[command(description = "Pick a different plan for today")]
    Plans,
    #[command(description = "Log today's workout")]
    Log,
    #[command(description = "Log a rest day")]
    Rest,
    #[command(description = "Current streak")]
    Streak,
    #[command(description = "Recent activity")]
    History,
}

fn make_plans_keyboard(plans: &[WorkoutPlan]) -> InlineKeyboardMarkup {
    let buttons: Vec<Vec<InlineKeyboardButton>> = plans
        .chunks(2)
        .map(|chunk| {
            chunk
                .iter()
                .map(|p| InlineKeyboardButton::callback(p.name.clone(), format!("plan:{}", p.id)))
                .collect()
        })
        .collect();

    InlineKeyboardMarkup::new(buttons)
}

fn describe_day(db: &Database, config: &Config) -> crate::Result<String> {
    let snapshot = db.day_snapshot(config.calendar.today(), config.count_policy)?;
    let text = match snapshot.resolve() {
        DayPlan::Workout { plan, source } => {
            let heading = match source {
                PlanSource::Logged => "Done today",
                PlanSource::Override => "Picked for today",
                PlanSource::Rotation => "Up next",
            };
            let mut text = format!("{}: {}\n", heading, plan.name);
            for slot in &plan.exercises {
                text.push_str(&format!("{}. {} - {}x{}\n", slot.position, slot.exercise_name, slot.sets, slot.reps));
            }
            text
        }
        DayPlan::Rest => "Rest day logged.".to_string(),
        DayPlan::NoPlans => "No plans yet. Create one with `liftlog plan create`.".to_string(),
    };
    Ok(text)
}

fn set_prompt(plan: &WorkoutPlan, index: usize) -> Option<String> {
    let slot = plan.exercises.get(index)?;
    Some(format!(
        "{}/{} {} (target {}x{})\n\nSend sets as weight x reps, e.g. `60x10 60x8`, or `skip`.",
        index + 1,
        plan.exercises.len(),
        slot.exercise_name,
        slot.sets,
        slot.reps
    ))
}

/// Start the Telegram bot
pub async fn run_bot(token: String, config: Config) -> anyhow::Result<()> {
    let bot = Bot::new(token);
    let db: SharedDb = Arc::new(Mutex::new(Database::open(&config.db_path)?));

    let handler = dptree::entry()
        .enter_dialogue::<Update, InMemStorage<State>, State>()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(Update::filter_message().endpoint(handle_message))
        .branch(Update::filter_callback_query().endpoint(handle_callback));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![InMemStorage::<State>::new(), db, config])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    dialogue: MyDialogue,
    db: SharedDb,
    config: Config,
) -> HandlerResult {
    match cmd {
        Command::Start => {
            let text = "liftlog\n\n\
                /today - today's plan\n\
                /plans - pick a different plan\n\
                /log - log today's workout\n\
                /rest - log a rest day\n\
                /streak - current streak\n\
                /history - recent activity";
            bot.send_message(msg.chat.id, text).await?;
        }

        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
        }

        Command::Today => {
            let text = describe_day(&*db.lock().await, &config)?;
            bot.send_message(msg.chat.id, text).await?;
        }

        Command::Plans => {
            let plans = db.lock().await.get_plans()?;
            if plans.is_empty() {
                bot.send_message(msg.chat.id, "No plans yet.").await?;
            } else {
                bot.send_message(msg.chat.id, "Pick today's plan:")
                    .reply_markup(make_plans_keyboard(&plans))
                    .await?;
            }
        }

        Command::Log => {
            let date = config.calendar.today();
            let snapshot = db.lock().await.day_snapshot(date, config.count_policy)?;
            let Some(plan) = snapshot.resolve().plan() else {
                bot.send_message(msg.chat.id, "Nothing to log: no plan for today.").await?;
                return Ok(());
            };
            let Some(prompt) = set_prompt(plan, 0) else {
                bot.send_message(msg.chat.id, format!("{} has no exercises.", plan.name)).await?;
                return Ok(());
            };

            dialogue
                .update(State::WaitingForSets {
                    date,
                    plan_id: plan.id,
                    index: 0,
                    inputs: Vec::new(),
                })
                .await?;
            bot.send_message(msg.chat.id, format!("Logging {}\n\n{}", plan.name, prompt))
                .await?;
        }

        Command::Rest => {
            let date = config.calendar.today();
            let entry = log_activity(&*db.lock().await, LogRequest::rest(date))?;
            dialogue.reset().await?;
            info!("Rest day {} logged from chat {}", entry.date, msg.chat.id);
            bot.send_message(msg.chat.id, "Rest day logged. Recover well!").await?;
        }

        Command::Streak => {
            let entries = db.lock().await.get_activities()?;
            let streak = compute_streak(&entries, config.calendar.today());
            let text = format!(
                "{} day streak\n{}\n\nLongest: {} days",
                streak.current,
                streak.message(),
                streak.longest
            );
            bot.send_message(msg.chat.id, text).await?;
        }

        Command::History => {
            let (entries, plans) = {
                let db = db.lock().await;
                (db.get_activities()?, db.get_plans()?)
            };
            if entries.is_empty() {
                bot.send_message(msg.chat.id, "Nothing logged yet. Try /log!").await?;
            } else {
                let mut text = String::from("Recent activity:\n\n");
                for e in entries.iter().take(HISTORY_LIMIT) {
                    let what = match e.kind {
                        ActivityKind::Rest => "Rest day".to_string(),
                        ActivityKind::Workout { plan_id } => plans
                            .iter()
                            .find(|p| p.id == plan_id)
                            .map(|p| p.name.clone())
                            .unwrap_or_else(|| format!("plan #{}", plan_id)),
                    };
                    text.push_str(&format!("{} - {}\n", e.date.format("%a %d %b"), what));
                }
                bot.send_message(msg.chat.id, text).await?;
            }
        }
    }

    Ok(())
}

async fn handle_callback(bot: Bot, q: CallbackQuery, db: SharedDb, config: Config) -> HandlerResult {
    if let Some(plan_id) = q.data.as_deref().and_then(|d| d.strip_prefix("plan:")) {
        match plan_id.parse::<i64>() {
            Ok(plan_id) => {
                let text = {
                    let db = db.lock().await;
                    db.set_override(config.calendar.today(), plan_id)?;
                    describe_day(&db, &config)?
                };
                if let Some(msg) = q.message {
                    bot.edit_message_text(msg.chat().id, msg.id(), text).await?;
                }
            }
            Err(e) => warn!("Bad plan callback {:?}: {}", plan_id, e),
        }
    }

    bot.answer_callback_query(q.id).await?;
    Ok(())
}

async fn handle_message(bot: Bot, msg: Message, dialogue: MyDialogue, db: SharedDb) -> HandlerResult {
    let state = dialogue.get().await?.unwrap_or_default();

    match state {
        State::WaitingForSets { date, plan_id, index, mut inputs } => {
            let Some(text) = msg.text() else {
                return Ok(());
            };
            let db = db.lock().await;
            let plan = db.get_plan(plan_id)?;
            let Some(slot) = plan.exercises.get(index) else {
                dialogue.reset().await?;
                return Ok(());
            };

            if !text.trim().eq_ignore_ascii_case("skip") {
                let Some(sets) = parse_sets(text) else {
                    bot.send_message(msg.chat.id, "Send sets like `60x10 60x8`, or `skip`.").await?;
                    return Ok(());
                };
                inputs.push(ExerciseInput {
                    exercise_id: slot.exercise_id,
                    exercise_name: slot.exercise_name.clone(),
                    sets,
                    notes: None,
                });
            }

            if let Some(prompt) = set_prompt(&plan, index + 1) {
                dialogue
                    .update(State::WaitingForSets {
                        date,
                        plan_id,
                        index: index + 1,
                        inputs,
                    })
                    .await?;
                bot.send_message(msg.chat.id, prompt).await?;
                return Ok(());
            }

            let mut request = LogRequest::workout(date, &plan);
            request.inputs = inputs;
            let entry = log_activity(&*db, request)?;
            let volume: f64 = entry.exercises.iter().map(|r| r.volume()).sum();
            dialogue.reset().await?;

            bot.send_message(
                msg.chat.id,
                format!(
                    "Logged {}!\n\n{} exercises, {:.0} kg total volume\n\n/streak - check your streak",
                    plan.name,
                    entry.exercises.len(),
                    volume
                ),
            )
            .await?;
        }

        State::Start => {
            bot.send_message(msg.chat.id, "Send /log to record today's workout")
                .await?;
        }
    }

    Ok(())
}

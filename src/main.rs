//! hybrid-master - Workout sets and rest timer in the terminal

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use tokio::runtime::Handle;
use tracing::info;

use hybrid_master::alerts::{Alerts, DesktopNotifier, Silent, Sound, SystemSound};
use hybrid_master::completion::CompletionState;
use hybrid_master::config::{DEFAULT_DB_PATH, DEFAULT_LOG_PATH, Settings};
use hybrid_master::render::{WorkoutView, render_day};
use hybrid_master::timer::{TimerEngine, TokioScheduler, format_time};
use hybrid_master::tui::App;
use hybrid_master::workout::{Program, block_for_week, tempo_for_block};
use hybrid_master::{AppState, Database};

#[derive(Parser)]
#[command(name = "hybrid-master")]
#[command(author, version, about = "Workout sets and rest timer")]
struct Cli {
    /// SQLite file for timer snapshots and the rest log
    #[arg(long, env = "HM_DB", default_value = DEFAULT_DB_PATH, global = true)]
    db: PathBuf,

    /// Program file (JSON); the built-in program is used when omitted
    #[arg(long, env = "HM_PLAN", global = true)]
    plan: Option<PathBuf>,

    /// Log file for the TUI
    #[arg(long, env = "HM_LOG", default_value = DEFAULT_LOG_PATH, global = true)]
    log: PathBuf,

    /// Disable the completion sound
    #[arg(long, global = true)]
    no_sound: bool,

    /// Disable desktop notifications
    #[arg(long, global = true)]
    no_notify: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open TUI
    Tui {
        /// Restore the timer saved on last exit
        #[arg(long)]
        resume: bool,
    },

    /// Print a day of the program
    Show {
        /// Week number (1-based)
        #[arg(short, long, default_value = "1")]
        week: u32,

        /// Day number (1-based)
        #[arg(short, long, default_value = "1")]
        day: usize,
    },

    /// List finished rests
    Rests {
        /// Number of records to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
}

impl Cli {
    fn settings(&self) -> Settings {
        Settings {
            db_path: self.db.clone(),
            plan_path: self.plan.clone(),
            log_path: self.log.clone(),
            sound: !self.no_sound,
            notifications: !self.no_notify,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let settings = cli.settings();

    match cli.command {
        Some(Commands::Show { week, day }) => {
            tracing_subscriber::fmt::init();
            let program = load_program(&settings)?;
            show_day(&program, week, day)?;
        }

        Some(Commands::Rests { limit }) => {
            tracing_subscriber::fmt::init();
            let db = Database::open(&settings.db_path)?;
            let rests = db.get_rests(limit)?;
            println!("Recent rests:");
            println!("{:-<60}", "");
            for r in &rests {
                println!(
                    "{} | {:20} | {:>8} | {:>8}",
                    r.completed_at.format("%Y-%m-%d %H:%M"),
                    r.exercise_id.as_deref().unwrap_or("-"),
                    r.target_secs.map(format_time).unwrap_or_else(|| "-".to_string()),
                    format_time(r.elapsed_secs)
                );
            }
        }

        Some(Commands::Tui { resume }) => run_tui(&settings, resume)?,

        None => run_tui(&settings, false)?,
    }

    Ok(())
}

fn load_program(settings: &Settings) -> Result<Program> {
    match &settings.plan_path {
        Some(path) => {
            let program = Program::load(path)?;
            info!("Loaded program {} from {}", program.name, path.display());
            Ok(program)
        }
        None => Ok(Program::demo()),
    }
}

fn run_tui(settings: &Settings, resume: bool) -> Result<()> {
    // Logs go to a file, the terminal belongs to the TUI
    let log_file = File::create(&settings.log_path)?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();

    let program = load_program(settings)?;
    let db = Database::open(&settings.db_path)?;

    let (scheduler, ticks) = TokioScheduler::new(Handle::current());
    let sound: Box<dyn Sound> = if settings.sound {
        Box::new(SystemSound)
    } else {
        Box::new(Silent)
    };
    let alerts = Alerts::new(sound, Box::new(DesktopNotifier::new(settings.notifications)));
    let mut timer = TimerEngine::new(Box::new(scheduler), alerts);
    timer.init();

    if resume && let Some(saved) = db.load_snapshot()? {
        info!("Resuming timer saved at {}", saved.saved_at);
        timer.restore(&saved.snapshot);
    }

    let state = AppState::new(program, timer);
    let mut app = App::new(state, db, ticks)?;
    app.run()
}

fn show_day(program: &Program, week: u32, day: usize) -> Result<()> {
    if week < 1 || week > program.max_weeks {
        bail!("week {} out of range 1..={}", week, program.max_weeks);
    }
    if day < 1 || day > program.days.len() {
        bail!("day {} out of range 1..={}", day, program.days.len());
    }

    let workout = program.day(day - 1);
    let block = block_for_week(week);
    println!(
        "{} | Week {}/{} | Block {} | Tempo {}",
        program.name,
        week,
        program.max_weeks,
        block,
        tempo_for_block(block)
    );
    println!("{}", workout.map(|d| d.name.as_str()).unwrap_or("-"));
    println!("{:-<60}", "");

    let cards = match render_day(workout, &CompletionState::new()) {
        WorkoutView::RestDay => {
            println!("🏖️ Rest day today!");
            return Ok(());
        }
        WorkoutView::Exercises(cards) => cards,
    };

    for card in cards {
        println!(
            "{} {}{}",
            card.icon,
            card.name,
            if card.superset.is_superset() { " [superset]" } else { "" }
        );
        let params: Vec<String> = card
            .params
            .iter()
            .map(|p| format!("{} {}", p.label, p.value))
            .collect();
        if !params.is_empty() {
            println!("   {}", params.join(" | "));
        }
        if let Some(muscles) = &card.muscles {
            println!("   🎯 {}", muscles);
        }
        if let Some(notes) = &card.notes {
            println!("   📝 {}", notes);
        }
        if let Some(progression) = &card.progression {
            println!("   ☑️ Progression {}", progression.label());
        }
        println!();
    }

    Ok(())
}

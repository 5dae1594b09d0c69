mod render;
mod shell;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use presence_core::dashboard::{PresenceStatus, StudentFilter, EXPORT_ACK};
use presence_core::{Directory, Draw, Page, Role, Roster, RngDraw, Session, StudentProfile};
use presence_live::{spawn_pipeline, Config, LoginService, PipelineEvent};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

/// Profile shown on the student dashboard when nobody is logged in.
const DEFAULT_STUDENT: &str = "CS2021002";

#[derive(Parser)]
#[command(name = "presence", about = "Presence AI attendance demo")]
struct Cli {
    /// TOML settings file; PRESENCE_* variables still override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the live detection feed with the camera on
    Live {
        /// How long to keep the camera on
        #[arg(short, long, default_value_t = 20)]
        seconds: u64,
        /// Seed for reproducible detections
        #[arg(long)]
        seed: Option<u64>,
        /// Print events and records as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Log in once as a student
    Login {
        #[arg(short, long)]
        enrollment_id: String,
        #[arg(short, long)]
        password: String,
    },
    /// List the student roster
    Roster,
    /// Show the admin dashboard
    Dashboard {
        /// Match on name or enrollment id
        #[arg(long)]
        search: Option<String>,
        /// Branch code, or "all"
        #[arg(long)]
        branch: Option<String>,
        /// "present", "absent" or "all"
        #[arg(long)]
        status: Option<String>,
        /// Export the table
        #[arg(long)]
        export: bool,
    },
    /// Show a student's dashboard
    Student {
        #[arg(short, long)]
        enrollment_id: Option<String>,
    },
    /// Interactive session
    Shell {
        /// Seed for reproducible detections
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load(path)?.with_env_overrides().validated()?,
        None => Config::from_env()?,
    };

    match cli.command {
        Commands::Live {
            seconds,
            seed,
            json,
        } => live(&config, seconds, seed, json).await?,
        Commands::Login {
            enrollment_id,
            password,
        } => {
            let directory = config.directory()?;
            let fallback = default_student(&directory)?;
            let mut service =
                LoginService::new(directory, config.lockout(), config.login_delay());
            let mut session = Session::new();
            session.select_role(Role::Student);
            session.request_navigation(Page::Dashboard);

            let welcome = service
                .login_into(&mut session, &enrollment_id, &password)
                .await?;
            println!("{welcome}");
            render::page(&session);
            render::student_dashboard(session.authenticated_student(), &fallback);
        }
        Commands::Roster => render::roster(&config.directory()?),
        Commands::Dashboard {
            search,
            branch,
            status,
            export,
        } => {
            let filter = build_filter(search, branch, status)?;
            render::admin_dashboard(&filter);
            if export {
                println!();
                println!("{EXPORT_ACK}");
            }
        }
        Commands::Student { enrollment_id } => {
            let directory = config.directory()?;
            let fallback = default_student(&directory)?;
            let student = match &enrollment_id {
                Some(id) => Some(
                    directory
                        .profile(id)
                        .with_context(|| format!("no student enrolled as {id}"))?,
                ),
                None => None,
            };
            render::student_dashboard(student, &fallback);
        }
        Commands::Shell { seed } => {
            shell::Shell::new(config, seed)?.run().await?;
        }
    }

    Ok(())
}

async fn live(config: &Config, seconds: u64, seed: Option<u64>, json: bool) -> Result<()> {
    let handle = spawn_pipeline(config.pipeline(), config.directory()?, make_draw(seed));
    let mut events = handle.subscribe();
    handle.set_camera(true).await?;

    let deadline = tokio::time::sleep(Duration::from_secs(seconds));
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            event = events.recv() => match event {
                Ok(event) => print_event(&event, json)?,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event feed lagged");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    handle.set_camera(false).await?;
    let snapshot = handle.snapshot().await?;
    let records = handle.records().await?;
    if json {
        println!("{}", serde_json::to_string(&snapshot)?);
        for record in &records {
            println!("{}", serde_json::to_string(record)?);
        }
    } else {
        println!();
        render::snapshot(&snapshot);
        for record in &records {
            render::record(record);
        }
    }
    Ok(())
}

fn print_event(event: &PipelineEvent, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
    } else {
        render::event(event);
    }
    Ok(())
}

/// Seeded draws when asked, entropy otherwise.
pub(crate) fn make_draw(seed: Option<u64>) -> Box<dyn Draw + Send> {
    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    Box::new(RngDraw(rng))
}

pub(crate) fn default_student(directory: &Directory) -> Result<StudentProfile> {
    directory
        .profile(DEFAULT_STUDENT)
        .or_else(|| directory.students().first())
        .cloned()
        .context("roster has no students")
}

/// `"all"` or a missing value leaves that column unfiltered.
pub(crate) fn build_filter(
    search: Option<String>,
    branch: Option<String>,
    status: Option<String>,
) -> Result<StudentFilter> {
    let branch = branch.filter(|b| !b.eq_ignore_ascii_case("all"));
    let status = match status.as_deref() {
        None => None,
        Some(s) if s.eq_ignore_ascii_case("all") => None,
        Some(s) => Some(s.parse::<PresenceStatus>()?),
    };
    Ok(StudentFilter {
        search: search.unwrap_or_default(),
        branch,
        status,
    })
}

mod config;
mod controller;
mod error;
mod models;
mod state;
mod utils;
use std::time::Instant;
use anyhow::{Context, Result};
use dotenv::dotenv;
use log::{debug, error, info, warn};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use tokio::io::{AsyncBufReadExt, BufReader};
use crate::config::Settings;
use crate::controller::FormController;
use crate::utils::backend::HttpBackend;
use crate::utils::commands::{parse_command, Command, USAGE};
use crate::utils::render::render_page;

// Entry point for the async main function, powered by tokio runtime.
#[tokio::main]
async fn main() {
    // Loads environment variables from a `.env` file, if present.
    dotenv().ok();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Invalid configuration: {:#}", e);
            return;
        }
    };

    // Terminal logging, mixed stdout/stderr, automatic color support.
    if let Err(e) = TermLogger::init(settings.log_level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto) {
        eprintln!("Logger setup failed: {}", e);
    }

    if let Err(e) = run(settings).await {
        error!("{:#}", e);
    }
}

async fn run(settings: Settings) -> Result<()> {
    info!("Using GPA backend at {}", settings.base_url);
    let backend = HttpBackend::new(settings.base_url)?;
    let mut form = FormController::new(backend);

    // Shows when an operation is waiting on the backend; the full form is redrawn once it answers.
    let mut updates = form.subscribe();
    let spinner = tokio::spawn(async move {
        let mut was_busy = false;
        while updates.changed().await.is_ok() {
            let busy = updates.borrow_and_update().busy;
            if busy && !was_busy {
                println!("... waiting for the backend");
            }
            was_busy = busy;
        }
    });

    // The page only fails to load when the backend is unreachable; the banner says so.
    if let Err(e) = form.load_page().await {
        warn!("Starting without server state: {}", e);
    }
    println!("{}", render_page(form.state(), Instant::now()));
    println!("{}", USAGE);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read from stdin")? {
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };

        let outcome = match command {
            Command::Part(part) => form.select_part(&part).await,
            Command::Semester(semester) => form.select_semester(&semester).await,
            Command::Grade { course_code, grade } => form.choose_grade(&course_code, grade),
            Command::Add => form.add_semester().await,
            Command::Reset => form.reset_session().await,
            Command::Save => form.save_calculation().await,
            Command::Load(record_id) => form.load_calculation(&record_id).await,
            Command::Show => Ok(()),
            Command::Help => {
                println!("{}", USAGE);
                continue;
            }
            Command::Quit => break,
        };
        if let Err(e) = outcome {
            debug!("Operation ended with: {}", e);
        }

        println!("{}", render_page(form.state(), Instant::now()));
    }

    spinner.abort();
    info!("Bye");
    Ok(())
}

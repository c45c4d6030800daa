//! `snaptext`: command-line front end for the capture-to-text pipeline.

use clap::{Parser, Subcommand};
use snaptext::capture::ImageSource;
use snaptext::config::AppConfig;
use snaptext::{App, RunReport};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "snaptext")]
#[command(about = "Photograph text, extract it with OCR, keep no copy of the photo")]
#[command(version)]
struct Cli {
    /// Print the diagnostic block to stderr
    #[arg(short, long, global = true)]
    diagnostics: bool,

    /// Print the result view as JSON instead of plain text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture a photo with the configured camera command and extract its text
    Scan,
    /// Extract text from an existing image; the original file is left in place
    Import {
        path: PathBuf,
    },
    /// Extract text from a freshly captured photo and delete it afterwards
    Process {
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    snaptext::init();
    let cli = Cli::parse();
    let app = App::from_config(AppConfig::from_env());

    let report = match cli.command {
        Commands::Scan => app.pipeline.trigger(ImageSource::Camera).await,
        Commands::Import { path } => {
            app.gallery.select(path);
            app.pipeline.trigger(ImageSource::Gallery).await
        }
        Commands::Process { path } => app.process_file(path).await,
    };

    let Some(report) = report else {
        eprintln!("snaptext: a scan is already in progress");
        return ExitCode::FAILURE;
    };
    render(&app, &report, cli.diagnostics, cli.json)
}

fn render(app: &App, report: &RunReport, diagnostics: bool, json: bool) -> ExitCode {
    if report.is_cancelled() {
        eprintln!("snaptext: capture cancelled");
        return ExitCode::FAILURE;
    }

    let view = app.pipeline.view();
    let notification = report.outcome.notification();
    if json {
        let out = serde_json::json!({
            "view": view,
            "trace": report.trace,
            "notification": notification,
        });
        match serde_json::to_string_pretty(&out) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("snaptext: failed to serialize result: {}", e),
        }
    } else {
        print!("{}", view.extracted_text);
        if !view.extracted_text.ends_with('\n') {
            println!();
        }
        if diagnostics {
            eprintln!("--- diagnostics ---\n{}", report.trace);
        }
        if let Some(note) = &notification {
            eprintln!("[{}] {}", note.title, note.message);
        }
    }

    if notification.is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

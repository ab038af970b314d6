//! docfeedback: grade Google Docs with an LLM and write the feedback back.

use std::path::PathBuf;
use std::sync::Arc;

use docfeedback_core::FeedbackConfig;
use docfeedback_docs::extract_document_id;
use docfeedback_grade::GENRES;
use docfeedback_server::cli::{self, Command, GradeArgs};
use docfeedback_server::{build_router, AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn resolve_data_dir() -> PathBuf {
    std::env::var("DOCFEEDBACK_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let exe_dir = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()));
            if let Some(dir) = exe_dir {
                let parent_data = dir.join("../data");
                if parent_data.exists() {
                    return parent_data;
                }
            }
            PathBuf::from("data")
        })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match cli::parse_args(&args) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("{}", message);
            std::process::exit(1);
        }
    };

    match command {
        Command::Help => {
            println!("{}", cli::USAGE);
            Ok(())
        }
        Command::Genres => {
            for rubric in GENRES {
                println!("{}\t{}\t{}", rubric.genre.slug(), rubric.name, rubric.description);
            }
            Ok(())
        }
        Command::ExtractId(reference) => match extract_document_id(&reference) {
            Ok(id) => {
                println!("{}", id);
                Ok(())
            }
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        },
        Command::CheckAccess(reference) => check_access(&reference).await,
        Command::Grade(grade) => run_grade(grade).await,
        Command::Serve => serve().await,
    }
}

async fn check_access(reference: &str) -> anyhow::Result<()> {
    let document_id = match extract_document_id(reference) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let config = FeedbackConfig::from_env(resolve_data_dir())?;
    let state = AppState::new(config);
    let access = state.docs.check_access(&document_id).await?;
    println!("{}", serde_json::to_string_pretty(&access)?);
    Ok(())
}

async fn run_grade(grade: GradeArgs) -> anyhow::Result<()> {
    let config = FeedbackConfig::from_env(resolve_data_dir())?;
    let state = AppState::new(config);

    let Some(context) = state.feedback_context() else {
        eprintln!("No LLM provider configured. Set OPENAI_API_KEY or ANTHROPIC_API_KEY.");
        std::process::exit(1);
    };

    let report = context.run(&grade.into_request()).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn serve() -> anyhow::Result<()> {
    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let config = FeedbackConfig::from_env(&data_dir)?;
    let port = config.port;

    let state = Arc::new(AppState::new(config));
    let caps = state.capabilities();
    info!(
        "Document source: {}, LLM configured: {}",
        caps.mode, caps.llm
    );

    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("docfeedback server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

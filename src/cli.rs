use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::controller::UiController;
use crate::error::{AppError, Result};
use crate::models::Upload;
use crate::render::format_results;

#[derive(Parser, Debug)]
#[command(name = "meeting-console", about = "Console for the meeting assistant backend")]
pub struct Cli {
    /// Overrides BACKEND_URL from the environment.
    #[arg(long)]
    pub backend_url: Option<String>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Serve the browser console (default)
    Serve,
    /// Start recording a meeting
    Record,
    /// Stop the current recording
    Stop,
    /// Summarize a transcript file or a piece of text
    Summarize {
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,
        #[arg(long)]
        text: Option<String>,
    },
    /// Search meeting summaries
    Search { query: String },
}

/// Runs a one-shot command and returns what should be printed. `Serve` is
/// handled by the binary and yields nothing here.
pub async fn run(controller: &UiController, command: Command) -> Result<String> {
    match command {
        Command::Serve => Ok(String::new()),
        Command::Record => controller.start_recording().await,
        Command::Stop => controller.stop_recording().await,
        Command::Summarize { file: _, text: Some(text) } => controller.summarize_text(text).await,
        Command::Summarize { file, text: None } => {
            let upload = match file {
                Some(path) => Some(read_upload(&path).await?),
                None => None,
            };
            controller.summarize_file(upload).await
        }
        Command::Search { query } => Ok(format_results(&controller.search(query).await?)),
    }
}

/// The line printed on stderr when a command fails.
pub fn error_line(err: &dyn std::error::Error) -> String {
    format!("Error: {}", err)
}

async fn read_upload(path: &Path) -> Result<Upload> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| AppError::Validation(format!("Cannot read {}: {}", path.display(), e)))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "transcript.txt".to_string());
    let content_type = match path.extension().and_then(|ext| ext.to_str()) {
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    };
    Ok(Upload::new(file_name, bytes).with_content_type(content_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_print_their_message_not_their_variant() {
        let err = AppError::Status {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(error_line(&err), "Error: Backend answered 500: boom");

        let err = AppError::Validation("Please select a file.".to_string());
        assert_eq!(error_line(&err), "Error: Please select a file.");
    }

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["meeting-console"]).expect("parse");
        assert_eq!(cli.command, None);
    }

    #[test]
    fn file_and_text_are_mutually_exclusive() {
        let err = Cli::try_parse_from(["meeting-console", "summarize", "--file", "a.txt", "--text", "b"])
            .expect_err("should conflict");
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn backend_url_is_a_global_flag() {
        let cli = Cli::try_parse_from(["meeting-console", "--backend-url", "http://10.0.0.2:8000", "search", "budget"])
            .expect("parse");
        assert_eq!(cli.backend_url.as_deref(), Some("http://10.0.0.2:8000"));
        assert_eq!(cli.command, Some(Command::Search { query: "budget".to_string() }));
    }
}

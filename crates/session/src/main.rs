//! mindlaw - convert DOCX packages to editor markup from the command line

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docx_import::DocumentImporter;
use session::{ImportHandle, SessionRegistry, SettingsManager};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mindlaw", about = "Import legal documents into editor markup")]
struct Cli {
    /// Settings file (JSON); defaults apply when it does not exist
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a DOCX file and print the markup
    Convert {
        /// Input DOCX file
        input: PathBuf,

        /// Write the markup here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print markup and diagnostics as one JSON object
        #[arg(long)]
        json: bool,
    },
    /// Import a DOCX file and print word and character counts
    Stats {
        /// Input DOCX file
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut settings = match &cli.settings {
        Some(path) => SettingsManager::with_path(path.clone()),
        None => SettingsManager::new(std::env::current_dir()?),
    };
    let settings = settings.load().await?.clone();
    let importer = DocumentImporter::new(settings.import.to_options());

    match cli.command {
        Command::Convert {
            input,
            output,
            json,
        } => {
            let bytes = read_input(&input).await?;
            let result = ImportHandle::spawn(importer, bytes).join().await?;

            for diagnostic in &result.diagnostics {
                eprintln!("{:?}: {}", diagnostic.severity, diagnostic.message);
            }
            let rendered = if json {
                serde_json::to_string_pretty(&result)?
            } else {
                result.markup
            };
            match output {
                Some(path) => tokio::fs::write(&path, rendered)
                    .await
                    .with_context(|| format!("writing {}", path.display()))?,
                None => println!("{rendered}"),
            }
        }
        Command::Stats { input } => {
            let bytes = read_input(&input).await?;
            let result = ImportHandle::spawn(importer, bytes).join().await?;

            let title = input
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            let registry = SessionRegistry::new(settings.editing);
            let session = registry.open(title, result).await;
            let snapshot = session.snapshot();
            println!(
                "{}: {} words, {} characters, {} diagnostics",
                session.title(),
                snapshot.word_count,
                snapshot.character_count,
                session.diagnostics().len()
            );
        }
    }

    Ok(())
}

async fn read_input(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))
}

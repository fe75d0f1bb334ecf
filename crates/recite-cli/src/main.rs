mod commands;
mod output;

use clap::{Parser, Subcommand};
use recite_core::error::ReciteError;
use recite_core::settings::{self, Settings};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(
    name = "recite",
    version,
    about = "Extract text from PDFs and images and read it aloud"
)]
struct Cli {
    /// JSON settings file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract text from a PDF or image (PNG, JPEG, HEIC, ...)
    Extract {
        /// Path to the document
        input_file: PathBuf,

        /// Declared media type (default: guessed from the extension)
        #[arg(long, value_name = "TYPE")]
        media_type: Option<String>,

        /// Output format: text (default) or json
        #[arg(short, long, default_value = "text")]
        output: String,

        /// Also write the extracted text to a file
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// List the voices the speech engine offers
    Voices,
    /// Extract a document, then control read-aloud from stdin
    Read {
        /// Path to the document
        input_file: PathBuf,

        /// Declared media type (default: guessed from the extension)
        #[arg(long, value_name = "TYPE")]
        media_type: Option<String>,

        /// Voice name from `recite voices` (default: engine default)
        #[arg(long)]
        voice: Option<String>,
    },
    /// Inspect settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective settings as JSON
    Show,
    /// Validate a settings file
    Validate {
        /// Path to JSON settings file
        file: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "recite=debug,recite_core=debug"
    } else {
        "recite=info,recite_core=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> Result<(), ReciteError> {
    let settings = match &cli.config {
        Some(path) => settings::load_settings(path)?,
        None => Settings::default(),
    };

    match cli.command {
        Commands::Extract {
            input_file,
            media_type,
            output,
            out,
        } => commands::extract::run(input_file, media_type, &output, out, &settings).await,
        Commands::Voices => commands::voices::run(&settings).await,
        Commands::Read {
            input_file,
            media_type,
            voice,
        } => commands::read::run(input_file, media_type, voice, &settings).await,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show(&settings),
            ConfigAction::Validate { file } => commands::config::validate(&file),
        },
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        match e {
            // The diagnostic was already logged by the pipeline.
            ReciteError::Extraction(ref x) => eprintln!("{}", x.user_message()),
            _ => eprintln!("Error: {e}"),
        }
        std::process::exit(1);
    }
}

//! Jimaku CLI: plan timeline edits, burn in captions, and export edited video.
//!
//! Usage:
//!   jimaku plan <EDITS>                 Show the segments an edit list produces
//!   jimaku burn <INPUT> <EDITS>         Burn the edit list's cues into the video
//!   jimaku edit <INPUT> <EDITS>         Apply the edit list's cuts/trims/splits/speed changes
//!   jimaku subtitles <EDITS> -o <FILE>  Write the cues as an SRT or ASS file
//!   jimaku validate <EDITS>             Check an edit list for problems
//!   jimaku init <EDITS>                 Create a starter edit list
//!   jimaku check                        Check that the encoder is usable

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use jimaku_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "jimaku",
    about = "Non-destructive video cutting and caption burn-in",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of the standard location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the output segments an edit list produces
    Plan {
        /// Path to the edit list (*.jimaku.json)
        edits: PathBuf,

        /// Source duration in seconds
        #[arg(short, long, conflicts_with = "input")]
        duration: Option<f64>,

        /// Source video to probe for its duration
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Print the segments as JSON
        #[arg(long)]
        json: bool,
    },

    /// Burn the edit list's cues into the whole video
    Burn {
        /// Source video
        input: PathBuf,

        /// Path to the edit list (*.jimaku.json)
        edits: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Apply the edit list's timeline edits
    Edit {
        /// Source video
        input: PathBuf,

        /// Path to the edit list (*.jimaku.json)
        edits: PathBuf,

        /// Output file path (split exports add _partN siblings)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write the edit list's cues as subtitles (.srt, or .ass for a styled script)
    Subtitles {
        /// Path to the edit list (*.jimaku.json)
        edits: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Validate an edit list
    Validate {
        /// Path to the edit list (*.jimaku.json)
        edits: PathBuf,
    },

    /// Create a starter edit list
    Init {
        /// Where to write the edit list
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,

        /// Also write the default config file if none exists
        #[arg(long)]
        with_config: bool,
    },

    /// Check encoder availability and configuration
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load(),
    };

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    jimaku_common::logging::init_logging(&logging);
    tracing::debug!(config = ?cli.config, "Configuration loaded");

    match cli.command {
        Commands::Plan {
            edits,
            duration,
            input,
            json,
        } => commands::plan::run(&config, edits, duration, input, json).await,
        Commands::Burn {
            input,
            edits,
            output,
        } => commands::burn::run(&config, input, edits, output).await,
        Commands::Edit {
            input,
            edits,
            output,
        } => commands::edit::run(&config, input, edits, output).await,
        Commands::Subtitles { edits, output } => commands::subtitles::run(edits, output),
        Commands::Validate { edits } => commands::validate::run(edits),
        Commands::Init {
            path,
            force,
            with_config,
        } => commands::init::run(path, force, with_config),
        Commands::Check => commands::check::run(&config, cli.config.as_deref()).await,
    }
}

//! Cepstra CLI - Command-line interface for mel-cepstral speech analysis
//!
//! This binary provides commands for extracting mel-cepstra and pitch
//! tracks from mono WAV files and for resynthesizing speech from them.

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use cepstra_cli::commands;
use cepstra_cli::commands::analyze::AnalyzeOptions;
use cepstra_cli::commands::pitch::PitchOptions;
use cepstra_cli::commands::synth::SynthOptions;
use cepstra_cli::config::PipelineConfig;

/// Cepstra - Mel-Cepstral Speech Analysis and Synthesis
#[derive(Parser)]
#[command(name = "cepstra")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Pipeline config file (JSON); flags override its values
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log debug events to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate a mel-cepstrum for every frame of a WAV file
    Analyze {
        /// Path to the mono WAV file
        #[arg(short, long)]
        input: String,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,

        /// Model order
        #[arg(long)]
        order: Option<usize>,

        /// All-pass constant
        #[arg(long, allow_hyphen_values = true)]
        alpha: Option<f64>,

        /// Generalization exponent in [-1, 0] (0 selects the mel-cepstrum)
        #[arg(long, allow_hyphen_values = true)]
        gamma: Option<f64>,

        /// Samples per analysis frame (also the FFT length)
        #[arg(long)]
        frame_length: Option<usize>,

        /// Samples between frames
        #[arg(long)]
        frame_shift: Option<usize>,

        /// Analysis window
        #[arg(long, value_parser = ["blackman", "hamming", "hann", "bartlett", "trapezoid", "rectangular"])]
        window: Option<String>,
    },

    /// Track the fundamental frequency of a WAV file
    Pitch {
        /// Path to the mono WAV file
        #[arg(short, long)]
        input: String,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,

        /// Lowest candidate frequency in Hz
        #[arg(long)]
        min_hz: Option<f64>,

        /// Highest candidate frequency in Hz
        #[arg(long)]
        max_hz: Option<f64>,

        /// Voicing threshold in [0, 1]
        #[arg(long)]
        threshold: Option<f64>,

        /// Samples between frames
        #[arg(long)]
        frame_shift: Option<usize>,

        /// Encoding of the track
        #[arg(long, value_parser = ["period", "frequency", "log_frequency"])]
        format: Option<String>,
    },

    /// Resynthesize a WAV file from a mel-cepstrum and a pitch track
    Synth {
        /// Mel-cepstrum JSON written by `cepstra analyze`
        #[arg(short, long)]
        cepstrum: String,

        /// Pitch track JSON written by `cepstra pitch`
        #[arg(short, long)]
        pitch: String,

        /// Output WAV file
        #[arg(short, long)]
        output: String,

        /// Noise seed for unvoiced frames
        #[arg(long)]
        seed: Option<u32>,

        /// Pade approximation order (4 or 5)
        #[arg(long, value_parser = clap::value_parser!(u8).range(4..=5))]
        pade: Option<u8>,

        /// Use the transposed filter structure
        #[arg(long)]
        transposed: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match PipelineConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            return ExitCode::from(1);
        }
    };

    let result = match cli.command {
        Commands::Analyze {
            input,
            output,
            order,
            alpha,
            gamma,
            frame_length,
            frame_shift,
            window,
        } => commands::analyze::run(
            &input,
            output.as_deref(),
            &config,
            &AnalyzeOptions {
                order,
                alpha,
                gamma,
                frame_length,
                frame_shift,
                window,
            },
        ),
        Commands::Pitch {
            input,
            output,
            min_hz,
            max_hz,
            threshold,
            frame_shift,
            format,
        } => commands::pitch::run(
            &input,
            output.as_deref(),
            &config,
            &PitchOptions {
                min_hz,
                max_hz,
                threshold,
                frame_shift,
                format,
            },
        ),
        Commands::Synth {
            cepstrum,
            pitch,
            output,
            seed,
            pade,
            transposed,
        } => commands::synth::run(
            &cepstrum,
            &pitch,
            &output,
            &config,
            &SynthOptions {
                seed,
                pade,
                transposed,
            },
        ),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}

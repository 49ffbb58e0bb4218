use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use speaker_roles::{
    classify, label_counts, non_target_labels, read_transcript, write_log_json, write_transcript,
    ClassifierConfig, ClassifierError, OpenAiClient, OpenAiConfig, TargetRoles,
};

#[derive(Parser)]
#[command(name = "speaker-roles")]
#[command(author, version, about = "Relabel diarized transcripts with speaker roles", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Map generic speaker labels to roles using the reasoning service
    Classify {
        /// Input transcript file ('-' for stdin)
        #[arg(default_value = "-")]
        input: PathBuf,

        /// Output transcript file ('-' for stdout)
        #[arg(default_value = "-")]
        output: PathBuf,

        /// Target role names, comma separated
        #[arg(long, value_delimiter = ',', default_value = "Agent,Customer")]
        roles: Vec<String>,

        /// Run the safeguard review after relabeling
        #[arg(long)]
        safeguard: bool,

        /// Write the classification log as JSON to this file
        #[arg(long)]
        log: Option<PathBuf>,

        /// Model to use (overrides OPENAI_MODEL)
        #[arg(long)]
        model: Option<String>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show the labels in a transcript without contacting the service
    Labels {
        /// Input transcript file ('-' for stdin)
        #[arg(default_value = "-")]
        input: PathBuf,

        /// Target role names, comma separated
        #[arg(long, value_delimiter = ',', default_value = "Agent,Customer")]
        roles: Vec<String>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Classify {
            input,
            output,
            roles,
            safeguard,
            log,
            model,
            verbose,
        } => {
            setup_logging(verbose);
            classify_transcript(input, output, roles, safeguard, log, model).await
        }
        Commands::Labels {
            input,
            roles,
            verbose,
        } => {
            setup_logging(verbose);
            show_labels(input, roles)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn exit_code(error: &anyhow::Error) -> u8 {
    match error.downcast_ref::<ClassifierError>() {
        Some(ClassifierError::InvalidJsonResponse(_)) => 2,
        Some(ClassifierError::MissingSpeakerMapping(_)) => 3,
        Some(ClassifierError::SpeakerNotFound(_)) => 4,
        Some(ClassifierError::Configuration(_)) => 5,
        None => 1,
    }
}

async fn classify_transcript(
    input: PathBuf,
    output: PathBuf,
    roles: Vec<String>,
    safeguard: bool,
    log_path: Option<PathBuf>,
    model: Option<String>,
) -> Result<()> {
    let target_roles = TargetRoles::new(roles)?;

    let transcript = read_transcript(&input)?;
    if transcript.trim().is_empty() {
        bail!("Input transcript is empty");
    }

    let mut api_config = OpenAiConfig::from_env()?;
    if let Some(model) = model {
        api_config.model = model;
    }
    let client = OpenAiClient::new(api_config);

    info!(
        "Classifying transcript with roles [{}] using {}",
        target_roles.as_slice().join(", "),
        client.model()
    );

    let config = ClassifierConfig::new(target_roles, safeguard);
    let result = classify(&client, &transcript, &config).await?;

    write_transcript(&output, &result.transcript)?;

    if let Some(path) = log_path {
        write_log_json(&path, &result.log)?;
        info!("Log written to {:?}", path);
    }

    info!(
        "Complete: {} log entries, {} safeguard corrections",
        result.log.len(),
        result.corrections.len()
    );

    Ok(())
}

fn show_labels(input: PathBuf, roles: Vec<String>) -> Result<()> {
    let target_roles = TargetRoles::new(roles)?;
    let transcript = read_transcript(&input)?;

    let counts = label_counts(&transcript);
    let to_map = non_target_labels(&transcript, &target_roles);

    println!("Label Analysis");
    println!("==============");
    println!("Target roles: {}", target_roles.as_slice().join(", "));
    println!("Labels found: {}", counts.len());
    println!();

    for (label, count) in &counts {
        let marker = if to_map.contains(label) {
            "needs mapping"
        } else {
            "target role"
        };
        println!("{}: {} utterances ({})", label, count, marker);
    }

    println!();
    if to_map.is_empty() {
        println!("No labels need mapping");
    } else {
        println!(
            "Labels to map: {}",
            to_map.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
        );
    }

    Ok(())
}

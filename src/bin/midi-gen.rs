use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use midi_gen_client::{
    set_download_progress_callback, ClientConfig, GenerationParams, JobClient, UploadOptions,
    WaitOptions,
};
use std::{process, time::Duration};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "midi-gen")]
#[command(about = "Turn MIDI files into rendered music with a remote generation service", long_about = None)]
#[command(version)]
struct Cli {
    /// API token (overrides MIDI_GEN_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Service endpoint (overrides MIDI_GEN_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GenerateArgs {
    #[arg(short, long, default_value = "pop")]
    style: String,

    #[arg(short, long)]
    prompt: Option<String>,

    /// Target length in seconds
    #[arg(short, long, default_value_t = 180)]
    duration: u32,
}

impl GenerateArgs {
    fn params(&self) -> GenerationParams {
        let mut params = GenerationParams::default()
            .style(self.style.clone())
            .duration_secs(self.duration);
        if let Some(prompt) = &self.prompt {
            params = params.prompt(prompt.clone());
        }
        params
    }
}

#[derive(Args)]
struct WaitArgs {
    /// Give up after this many seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Seconds between status checks
    #[arg(long)]
    interval: Option<u64>,
}

impl WaitArgs {
    fn options(&self, base: WaitOptions) -> WaitOptions {
        WaitOptions {
            timeout: self.timeout.map(Duration::from_secs).unwrap_or(base.timeout),
            poll_interval: self.interval.map(Duration::from_secs).unwrap_or(base.poll_interval),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a MIDI file and print the server response
    Upload {
        file: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        style: Option<String>,

        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// Upload a MIDI file and start a generation job
    Generate {
        file: String,

        #[command(flatten)]
        generation: GenerateArgs,
    },

    /// Print the current status of a job
    Status { job_id: String },

    /// Block until a job completes or fails
    Wait {
        job_id: String,

        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Download a finished result
    Download { url: String, output: String },

    /// Generate, wait, and download in one go
    Render {
        file: String,

        output: String,

        #[command(flatten)]
        generation: GenerateArgs,

        #[command(flatten)]
        wait: WaitArgs,
    },
}

fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "midi_gen_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => process::exit(0),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut cfg = ClientConfig::from_env()?;
    if let Some(key) = cli.api_key {
        cfg.api_key = key;
    }
    if let Some(url) = cli.base_url {
        cfg.base_url = url;
    }
    if cfg.api_key.trim().is_empty() {
        bail!("no API token: pass --api-key or set MIDI_GEN_API_KEY");
    }

    let client = JobClient::from_config(&cfg).context("failed to build client")?;

    if !cli.quiet {
        setup_progress_callback();
    }

    match cli.command {
        Commands::Upload {
            file,
            title,
            style,
            tags,
        } => {
            let opts = UploadOptions {
                title,
                style,
                tags: (!tags.is_empty()).then_some(tags),
            };
            let result = client.upload_midi(&file, &opts)?;
            print_json(&result)
        }
        Commands::Generate { file, generation } => {
            let job = client.generate_from_midi(&file, &generation.params())?;
            print_json(&job)
        }
        Commands::Status { job_id } => {
            let report = client.get_generation_status(&job_id)?;
            print_json(&report)
        }
        Commands::Wait { job_id, wait } => {
            let report = client.wait_for_completion(&job_id, &wait.options(cfg.wait))?;
            print_json(&report)
        }
        Commands::Download { url, output } => {
            let bytes = client.download_result(&url, &output)?;
            if !cli.quiet {
                eprintln!("Saved {} bytes to {}", bytes, output);
            }
            Ok(())
        }
        Commands::Render {
            file,
            output,
            generation,
            wait,
        } => {
            let report = client.render(&file, &generation.params(), &wait.options(cfg.wait), &output)?;
            if cli.quiet {
                println!("{}", output);
                Ok(())
            } else {
                eprintln!("Saved to {}", output);
                print_json(&report)
            }
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn setup_progress_callback() {
    set_download_progress_callback(|downloaded, total| {
        if total > 0 {
            let percent = (downloaded as f64 / total as f64 * 100.0).round() as u64;
            let downloaded_mb = downloaded as f64 / 1_000_000.0;
            let total_mb = total as f64 / 1_000_000.0;
            eprint!(
                "\rDownloading audio: {:>3}% ({:.2} MB / {:.2} MB)",
                percent, downloaded_mb, total_mb
            );
            if downloaded >= total {
                eprintln!();
            }
        } else {
            eprint!("\rDownloading audio: {:.2} MB", downloaded as f64 / 1_000_000.0);
        }
    });
}

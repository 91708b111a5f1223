use std::{
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Result;
use clap::{Parser, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use skipgate_core::{
    AniSkipClient, ApiConfig, FetchStatus, SimulatedPlayer, SkipController, SkipRequest,
    SkipType, SkipWindows, Visibility, format_chapters_vtt, format_timestamp,
    format_windows_readable,
};
use tokio::fs;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", secs / 60.0, secs % 60.0)
    }
}

/// CLI wrapper for SkipType (needed for clap ValueEnum)
#[derive(Clone, Copy, ValueEnum)]
enum CliSkipType {
    Op,
    Ed,
    MixedOp,
    MixedEd,
    Recap,
}

impl From<CliSkipType> for SkipType {
    fn from(cli: CliSkipType) -> Self {
        match cli {
            CliSkipType::Op => SkipType::Op,
            CliSkipType::Ed => SkipType::Ed,
            CliSkipType::MixedOp => SkipType::MixedOp,
            CliSkipType::MixedEd => SkipType::MixedEd,
            CliSkipType::Recap => SkipType::Recap,
        }
    }
}

#[derive(Parser)]
#[command(name = "skipgate")]
#[command(about = "Look up AniSkip opening/ending windows and preview skip buttons")]
struct Cli {
    /// MyAnimeList id of the series
    mal_id: u64,

    /// Episode number
    episode: u32,

    /// Episode length in seconds, if known
    #[arg(short = 'l', long)]
    episode_length: Option<f64>,

    /// Skip-times API base URL (defaults to SKIPGATE_API_URL or the public AniSkip API)
    #[arg(long)]
    api_url: Option<String>,

    /// Skip types to request, comma separated. Defaults to all.
    #[arg(short, long, value_delimiter = ',')]
    types: Vec<CliSkipType>,

    /// Write the windows as a WebVTT chapters file
    #[arg(long)]
    vtt: Option<PathBuf>,

    /// Playback times in seconds to preview the skip buttons at
    #[arg(long = "at", value_name = "SECONDS")]
    at: Vec<f64>,

    /// Print windows as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    mal_id: u64,
    episode: u32,
    windows: &'a SkipWindows,
    preview: Vec<PreviewLine>,
}

#[derive(Serialize)]
struct PreviewLine {
    time: f64,
    visibility: Visibility,
    skip_to: Option<f64>,
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn api_config(cli: &Cli) -> ApiConfig {
    let mut config = ApiConfig::from_env();
    if let Some(url) = &cli.api_url {
        config.base_url = url.clone();
    }
    if !cli.types.is_empty() {
        config.types = cli.types.iter().copied().map(SkipType::from).collect();
    }
    config
}

/// Replays each time through the simulated player and records what the
/// skip buttons would do there.
fn preview(
    controller: &SkipController,
    player: &SimulatedPlayer,
    times: &[f64],
) -> Vec<PreviewLine> {
    times
        .iter()
        .map(|&time| {
            player.set_time(time);
            let visibility = controller.visibility();
            let skipped = controller.skip_opening() || controller.skip_ending();
            PreviewLine {
                time,
                visibility,
                skip_to: skipped.then(|| player.position()),
            }
        })
        .collect()
}

fn print_preview(lines: &[PreviewLine]) {
    for line in lines {
        let shown = |on: bool| {
            if on {
                style("shown").green().bold()
            } else {
                style("hidden").dim()
            }
        };
        let jump = line
            .skip_to
            .map(|to| format!(" → skip to {}", format_timestamp(to)))
            .unwrap_or_default();
        println!(
            "  {} opening: {}  ending: {}{}",
            style(format!("[{}]", format_timestamp(line.time))).cyan(),
            shown(line.visibility.opening),
            shown(line.visibility.ending),
            style(jump).yellow()
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = api_config(&cli);
    tracing::debug!(
        base_url = %config.base_url,
        types = config.types.len(),
        timeout = ?config.timeout,
        "resolved api config"
    );

    let client = match AniSkipClient::new(config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    };

    let mut request = SkipRequest::new(cli.mal_id, cli.episode);
    if let Some(len) = cli.episode_length {
        request = request.with_episode_length(len);
    }

    let player = SimulatedPlayer::new(cli.episode_length.unwrap_or(0.0));
    let controller = SkipController::mount(Arc::new(player.clone()), Arc::new(client), request);

    if !cli.json {
        println!(
            "\n{}  {}\n",
            style("skipgate").cyan().bold(),
            style(format!("MAL {} · episode {}", cli.mal_id, cli.episode)).dim()
        );
    }

    let started = Instant::now();
    let spinner = create_spinner("Fetching skip times...");
    let status = controller.settled().await;
    let elapsed = style(format!("[{}]", format_duration(started.elapsed()))).dim();

    if status != FetchStatus::Ready {
        spinner.finish_with_message(format!(
            "{} No skip times available {}",
            style("✗").yellow().bold(),
            elapsed
        ));
        if cli.json {
            let output = JsonOutput {
                mal_id: cli.mal_id,
                episode: cli.episode,
                windows: &SkipWindows::default(),
                preview: Vec::new(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        return Ok(());
    }

    let windows = controller.windows();
    spinner.finish_with_message(format!(
        "{} Found {} window(s) {}",
        style("✓").green().bold(),
        windows.len(),
        elapsed
    ));

    if let Some(path) = &cli.vtt {
        fs::write(path, format_chapters_vtt(&windows)).await?;
        tracing::debug!(path = %path.display(), "wrote chapters vtt");
        if !cli.json {
            println!(
                "{} {}",
                style("Saved:").dim(),
                style(path.display()).cyan()
            );
        }
    }

    let lines = preview(&controller, &player, &cli.at);

    if cli.json {
        let output = JsonOutput {
            mal_id: cli.mal_id,
            episode: cli.episode,
            windows: &windows,
            preview: lines,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", style("─".repeat(60)).dim());
    print!("{}", format_windows_readable(&windows));

    if !lines.is_empty() {
        println!("{}", style("─".repeat(60)).dim());
        print_preview(&lines);
    }

    Ok(())
}

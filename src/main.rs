//! Main entry point for the nextup CLI application.

mod simulate;

use crate::simulate::{ConsoleHost, SimulatedPlayer, Timeline, spawn_clock};
use clap::{Parser, Subcommand};
use log::{debug, info, warn};
use nextup::config::Config;
use nextup::engine::{HostEvent, PlaybackEngine, PlaybackRequest};
use nextup::error::{AppError, Result};
use nextup::preferences::{ConfigPreferences, MemoryPreferences, PreferenceStore};
use nextup::progress::{JsonProgressStore, MemoryProgressStore, ProgressStore};
use nextup::reachability::{Reachability, next_episode};
use nextup::types::{Series, Translation};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Command-line arguments for the nextup application.
#[derive(Parser, Debug)]
#[command(
    name = "nextup",
    version,
    about = "Episodic playback continuity engine",
    long_about = "Find the next episode of a series, manage the preferred stream quality \
                  and run simulated playback sessions against a JSON catalog."
)]
struct Args {
    /// Log verbosity level: 0=error, 1=warn, 2=info, 3=debug, 4=trace
    #[arg(short, long, default_value_t = 1, global = true)]
    log: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show where playback continues after an episode
    Next {
        /// Series catalog in JSON
        #[arg(short, long)]
        catalog: PathBuf,

        /// Translation group label
        #[arg(short, long)]
        group: String,

        /// Season number, starting at 1
        #[arg(short, long)]
        season: usize,

        /// Episode number, starting at 1
        #[arg(short, long)]
        episode: usize,

        /// Ignore other translations when the group runs out
        #[arg(long)]
        no_siblings: bool,
    },

    /// Show or change the preferred stream quality
    Quality {
        /// Quality label to prefer, e.g. "1080p"
        label: Option<String>,

        /// Forget the stored preference
        #[arg(long, conflicts_with = "label")]
        clear: bool,
    },

    /// Play a catalog through a simulated player
    Play {
        /// Series catalog in JSON
        #[arg(short, long)]
        catalog: PathBuf,

        /// Translation group label
        #[arg(short, long)]
        group: String,

        /// Season number, starting at 1 (defaults to the first episode)
        #[arg(short, long, requires = "episode")]
        season: Option<usize>,

        /// Episode number, starting at 1
        #[arg(short, long, requires = "season")]
        episode: Option<usize>,

        /// Length of every simulated episode in seconds
        #[arg(short, long, default_value_t = 120.0)]
        duration: f64,

        /// Playback speed multiplier
        #[arg(long, default_value_t = 10.0)]
        speed: f64,

        /// Leave prompts unanswered so episodes play out
        #[arg(short, long)]
        manual: bool,
    },
}

/// Load a series catalog from a JSON file.
fn load_series(path: &Path) -> Result<Series> {
    let content = fs::read_to_string(path)?;
    let series: Series = serde_json::from_str(&content)?;
    debug!("Loaded {}", series.to_display());
    Ok(series)
}

/// Convert a 1-based CLI number to an index.
fn to_index(value: usize, what: &str) -> Result<usize> {
    value
        .checked_sub(1)
        .ok_or_else(|| AppError::InvalidInput(format!("{} numbers start at 1", what)))
}

fn find_translation<'a>(series: &'a Series, group: &str) -> Result<&'a Translation> {
    series.translation(group).ok_or_else(|| {
        let known: Vec<&str> = series
            .translations
            .iter()
            .map(|t| t.group_label.as_str())
            .collect();
        AppError::NotFound(format!(
            "translation '{}' (known: {})",
            group,
            known.join(", ")
        ))
    })
}

fn print_next(
    catalog: &Path,
    group: &str,
    season: usize,
    episode: usize,
    no_siblings: bool,
) -> Result<()> {
    let series = load_series(catalog)?;
    let translation = find_translation(&series, group)?;
    let siblings = if no_siblings {
        Vec::new()
    } else {
        series.siblings(group)
    };

    let season_index = to_index(season, "Season")?;
    let episode_index = to_index(episode, "Episode")?;
    if translation.episode(season_index, episode_index).is_none() {
        return Err(AppError::NotFound(format!(
            "S{} E{} in {}",
            season, episode, group
        )));
    }

    match next_episode(translation, season_index, episode_index, &siblings) {
        Reachability::Available {
            season_index,
            episode_index,
            folder,
        } => {
            println!(
                "Next: S{} E{} - {}",
                season_index + 1,
                episode_index + 1,
                folder.title
            );
        }
        Reachability::EndOfTranslation => {
            println!("{} ends here, but another translation continues.", group);
        }
        Reachability::EndOfSeries => println!("End of series."),
    }
    Ok(())
}

fn update_quality(label: Option<String>, clear: bool) -> Result<()> {
    let mut preferences = ConfigPreferences::open_default()?;
    if clear {
        preferences.set_preferred_quality(None)?;
    } else if let Some(label) = label {
        preferences.set_preferred_quality(Some(label))?;
    }

    match preferences.preferred_quality() {
        Some(quality) => println!("Preferred quality: {}", quality),
        None => println!("Preferred quality: best available"),
    }
    Ok(())
}

struct Session {
    catalog: PathBuf,
    group: String,
    season: Option<usize>,
    episode: Option<usize>,
    duration: f64,
    speed: f64,
    manual: bool,
}

async fn play(config: &Config, session: Session) -> Result<()> {
    if session.duration <= 0.0 || session.speed <= 0.0 {
        return Err(AppError::InvalidInput(
            "duration and speed must be positive".to_string(),
        ));
    }

    let series = load_series(&session.catalog)?;
    let translation = find_translation(&series, &session.group)?;
    debug!(
        "{} has {} episodes",
        translation.group_label,
        translation.episode_count()
    );
    let (season_index, episode_index) = match (session.season, session.episode) {
        (Some(season), Some(episode)) => (to_index(season, "Season")?, to_index(episode, "Episode")?),
        _ => translation.first_episode().ok_or_else(|| {
            AppError::NotFound(format!("episodes in {}", translation.group_label))
        })?,
    };
    let request = PlaybackRequest::Episode {
        content_id: series.content_id.clone(),
        season_index,
        episode_index,
    };

    let progress: Box<dyn ProgressStore> = match JsonProgressStore::open_default() {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!("Failed to open progress store: {}. Progress will not be saved.", e);
            Box::new(MemoryProgressStore::new())
        }
    };
    let preferences: Box<dyn PreferenceStore> = match ConfigPreferences::open_default() {
        Ok(preferences) => Box::new(preferences),
        Err(e) => {
            warn!("Failed to open preferences: {}. Using defaults.", e);
            Box::new(MemoryPreferences::new(config.preferred_quality.as_deref()))
        }
    };

    let (tx, rx) = mpsc::unbounded_channel();
    let timeline = Arc::new(Mutex::new(Timeline::new(session.duration)));
    let clock = spawn_clock(timeline.clone(), tx.clone(), session.speed);

    let interrupt = tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted");
            let _ = interrupt.send(HostEvent::Teardown.into());
        }
    });

    let player = SimulatedPlayer::new(timeline, tx.clone());
    let host = ConsoleHost::new(series, session.group, tx, !session.manual);
    let engine = PlaybackEngine::new(
        request,
        player,
        host,
        progress,
        preferences,
        config.engine_settings(),
    );

    let engine = engine.run(rx).await;
    clock.abort();

    if let Some(context) = engine.context() {
        println!("Stopped at {}", context.display_title());
    }
    debug!("Engine finished in {:?}", engine.state());
    Ok(())
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging
    let log_level = match args.log {
        0 => log::LevelFilter::Error,
        1 => log::LevelFilter::Warn,
        2 => log::LevelFilter::Info,
        3 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .format_target(false)
        .init();

    debug!("Log level set to {:?}", log_level);

    let config = Config::load().unwrap_or_else(|e| {
        warn!("Failed to load config: {}. Using defaults.", e);
        Config::new()
    });

    match args.command {
        Command::Next {
            catalog,
            group,
            season,
            episode,
            no_siblings,
        } => print_next(&catalog, &group, season, episode, no_siblings)?,
        Command::Quality { label, clear } => update_quality(label, clear)?,
        Command::Play {
            catalog,
            group,
            season,
            episode,
            duration,
            speed,
            manual,
        } => {
            let session = Session {
                catalog,
                group,
                season,
                episode,
                duration,
                speed,
                manual,
            };
            play(&config, session).await?
        }
    }

    Ok(())
}

use anyhow::{Context, Result, bail};
use clap::Parser;
use hazard_snake::game::GameConfig;
use hazard_snake::modes::HumanMode;
use hazard_snake::persistence::{FileBackend, MemoryBackend, TopScoreStore};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

#[derive(Parser)]
#[command(name = "hazard_snake")]
#[command(version, about = "Snake with timed obstacles and a persistent top score")]
struct Cli {
    /// JSON file with game settings; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grid width
    #[arg(long)]
    width: Option<usize>,

    /// Grid height
    #[arg(long)]
    height: Option<usize>,

    /// Target frames per second
    #[arg(long)]
    fps: Option<u32>,

    /// Where the top score is stored
    #[arg(long)]
    score_file: Option<PathBuf>,

    /// Keep the top score in memory only
    #[arg(long)]
    no_persist: bool,

    /// Write logs to this file (the terminal is taken by the game)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn game_config(&self) -> Result<GameConfig> {
        let mut config = match &self.config {
            Some(path) => GameConfig::from_json_file(path)?,
            None => GameConfig::default(),
        };

        if let Some(width) = self.width {
            config.grid_width = width;
        }
        if let Some(height) = self.height {
            config.grid_height = height;
        }
        if let Some(fps) = self.fps {
            config.frames_per_second = fps;
        }
        if let Some(path) = &self.score_file {
            config.score_file = path.clone();
        }

        if let Err(reason) = config.validate() {
            bail!("Invalid configuration: {reason}");
        }
        Ok(config)
    }
}

fn init_logging(log_file: Option<&PathBuf>) -> Result<()> {
    let Some(path) = log_file else {
        return Ok(());
    };

    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create log file {:?}", path))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_ref())?;

    let config = cli.game_config()?;

    let store = if cli.no_persist {
        TopScoreStore::open(MemoryBackend::new())
    } else {
        TopScoreStore::open(FileBackend::new(&config.score_file))
    }
    .context("Failed to start top score store")?;
    let store = Arc::new(store);
    let top_score_before = store.top_score();

    let mut human_mode = HumanMode::new(config, store.clone());
    let summary = human_mode.run().await?;

    store
        .shutdown()
        .context("Top score could not be saved")?;

    println!("Game has terminated successfully!");
    println!("Score: {}", summary.score);
    println!("Size: {}", summary.size);
    if store.top_score() > top_score_before {
        println!("Nice! You set a new top score!");
    } else {
        println!("Better luck next time! You didn't set a new top score this time.");
    }

    Ok(())
}

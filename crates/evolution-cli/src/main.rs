use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use evolution_core::persistence;
use evolution_core::world::format_population;
use evolution_core::{Mode, SimConfig, World};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Run and steer an evolving world saved on disk", long_about = None)]
struct Args {
    /// World save file.
    #[arg(short, long, default_value = "world.json")]
    save: PathBuf,

    /// Optional JSON file with simulation settings.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a fresh world and save it.
    New {
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        mode: Option<Mode>,
    },
    /// Advance the saved world by a number of ticks.
    Run {
        #[arg(short, long, default_value_t = 100)]
        ticks: u64,
    },
    /// Catch up on the time elapsed since the world was last saved.
    Resume,
    /// Spend influence on an intervention.
    Intervene {
        action: String,
        #[arg(short, long)]
        target: Option<u64>,
    },
    /// Print a summary of the saved world.
    Stats {
        #[arg(long)]
        json: bool,
    },
}

fn load_config(path: Option<&Path>) -> Result<SimConfig> {
    let Some(path) = path else {
        return Ok(SimConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: SimConfig = serde_json::from_str(&text)
        .with_context(|| format!("parsing config {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

fn load_world(path: &Path, config: SimConfig) -> Result<World> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading save {}", path.display()))?;
    persistence::from_json_str(&text, config)
        .with_context(|| format!("loading save {}", path.display()))
}

fn save_world(path: &Path, world: &mut World) -> Result<()> {
    world.checkpoint(Utc::now());
    let text = persistence::to_json_string(world)?;
    fs::write(path, text).with_context(|| format!("writing save {}", path.display()))?;
    tracing::debug!(path = %path.display(), "world saved");
    Ok(())
}

fn print_summary(world: &World) {
    let stats = world.stats();
    println!(
        "Year {} | {} species alive | population {} | influence {} | extinct {}",
        stats.year,
        stats.live_species,
        format_population(stats.total_population),
        stats.influence_points,
        stats.total_extinct
    );
    if let Some(dominant) = &stats.dominant {
        println!(
            "Dominant: {} ({}, {})",
            dominant.name,
            dominant.phase,
            format_population(dominant.population)
        );
    }
    for s in world.species() {
        let status = if s.is_extinct() { " [extinct]" } else { "" };
        println!(
            "  #{:<3} {:<28} {:>8}  {:<13} gen {}{}",
            s.id,
            s.name,
            format_population(s.population()),
            s.phase.as_str(),
            s.generation,
            status
        );
    }
    for event in world.events().take(5) {
        println!("  - {event}");
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;

    match args.command {
        Command::New { seed, mode } => {
            if let Some(seed) = seed {
                config.seed = seed;
            }
            if let Some(mode) = mode {
                config.mode = mode;
            }
            let mut world = World::try_new(config)?;
            save_world(&args.save, &mut world)?;
            print_summary(&world);
        }
        Command::Run { ticks } => {
            let mut world = load_world(&args.save, config)?;
            let ran = world.tick(ticks);
            tracing::info!(ticks = ran, year = world.year(), "simulation advanced");
            save_world(&args.save, &mut world)?;
            print_summary(&world);
        }
        Command::Resume => {
            let mut world = load_world(&args.save, config)?;
            let ran = world.fast_forward_now();
            println!("Replayed {ran} ticks while you were away.");
            save_world(&args.save, &mut world)?;
            print_summary(&world);
        }
        Command::Intervene { action, target } => {
            let mut world = load_world(&args.save, config)?;
            let report = world.apply_named_intervention(&action, target)?;
            println!("{} (cost {})", report.message, report.cost);
            save_world(&args.save, &mut world)?;
        }
        Command::Stats { json } => {
            let world = load_world(&args.save, config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&world.stats())?);
            } else {
                print_summary(&world);
            }
        }
    }
    Ok(())
}

pub mod interventions;
pub mod lifecycle;
pub mod metrics;

pub use interventions::{Intervention, InterventionError, InterventionReport};
pub use metrics::*;

use crate::config::{Mode, SimConfig, SimConfigError};
use crate::environment::{EnvParam, Environment};
use crate::genome::Genome;
use crate::naming;
use crate::species::lifecycle::random_velocity;
use crate::species::{Species, SpeciesId};
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::{error::Error, fmt};

/// Maximum number of retained event log lines, newest first.
pub const EVENT_LOG_LEN: usize = 60;
/// Extinct species kept after pruning, for display only.
pub const RETAINED_EXTINCT: usize = 5;

/// A pending radiation spike waiting to be undone.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RadiationPulse {
    pub revert_at_tick: u64,
    pub previous: f64,
}

pub struct World {
    pub(crate) config: SimConfig,
    pub(crate) environment: Environment,
    pub(crate) species: Vec<Species>,
    pub(crate) tick_count: u64,
    pub(crate) influence_points: u64,
    pub(crate) events: VecDeque<String>,
    pub(crate) mode: Mode,
    pub(crate) total_extinct: u64,
    pub(crate) paused: bool,
    pub(crate) last_checkpoint_time: DateTime<Utc>,
    pub(crate) rad_pulse: Option<RadiationPulse>,
    pub(crate) rng: ChaCha12Rng,
    pub(crate) next_species_id: SpeciesId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorldInitError {
    Config(SimConfigError),
    TooManySpecies { max: usize, actual: usize },
    DuplicateSpeciesId(SpeciesId),
}

impl fmt::Display for WorldInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorldInitError::Config(e) => write!(f, "{}", e),
            WorldInitError::TooManySpecies { max, actual } => {
                write!(f, "live species ({actual}) exceed supported maximum ({max})")
            }
            WorldInitError::DuplicateSpeciesId(id) => write!(f, "duplicate species id {id}"),
        }
    }
}

impl From<SimConfigError> for WorldInitError {
    fn from(err: SimConfigError) -> Self {
        WorldInitError::Config(err)
    }
}

impl Error for WorldInitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            WorldInitError::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl World {
    pub fn new(config: SimConfig) -> Self {
        Self::try_new(config).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Builds a world and seeds `config.initial_species` starter species.
    pub fn try_new(config: SimConfig) -> Result<Self, WorldInitError> {
        let mut world = Self::with_species(config, Vec::new())?;
        let population = world.config.initial_population;
        for _ in 0..world.config.initial_species {
            let genome = Genome::random_starter(&mut world.rng);
            let species = world.spawn(genome, population);
            world.species.push(species);
        }
        world.log_event("Life stirs in the primordial seas");
        Ok(world)
    }

    /// Builds a world around an explicit starting roster.
    pub fn with_species(
        config: SimConfig,
        species: Vec<Species>,
    ) -> Result<Self, WorldInitError> {
        config.validate()?;
        let live = species.iter().filter(|s| s.is_alive()).count();
        if live > SimConfig::MAX_LIVE_SPECIES {
            return Err(WorldInitError::TooManySpecies {
                max: SimConfig::MAX_LIVE_SPECIES,
                actual: live,
            });
        }
        let mut seen = HashSet::with_capacity(species.len());
        for s in &species {
            if !seen.insert(s.id) {
                return Err(WorldInitError::DuplicateSpeciesId(s.id));
            }
        }
        let next_species_id = species.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        Ok(Self {
            environment: config.environment.clone().clamped(),
            species,
            tick_count: 0,
            influence_points: config.mode.starting_influence(),
            events: VecDeque::with_capacity(EVENT_LOG_LEN),
            mode: config.mode,
            total_extinct: 0,
            paused: false,
            last_checkpoint_time: Utc::now(),
            rad_pulse: None,
            rng: ChaCha12Rng::seed_from_u64(config.seed),
            next_species_id,
            config,
        })
    }

    pub(crate) fn next_id(&mut self) -> SpeciesId {
        let id = self.next_species_id;
        self.next_species_id += 1;
        id
    }

    /// Creates a fresh species with a name, colour, position and heading.
    pub(crate) fn spawn(&mut self, genome: Genome, population: u64) -> Species {
        let id = self.next_id();
        let name = naming::species_name(&mut self.rng);
        let color = naming::random_color(&mut self.rng);
        let position = [
            self.rng.random_range(0.1..0.9),
            self.rng.random_range(0.1..0.9),
        ];
        let velocity = random_velocity(&mut self.rng);
        Species::new(id, genome, population)
            .with_name(name)
            .with_color(color)
            .at(position, velocity)
    }

    pub(crate) fn log_event(&mut self, message: impl AsRef<str>) {
        let line = format!("Year {}: {}", self.year(), message.as_ref());
        tracing::info!(target: "evolution_core::events", "{line}");
        self.events.push_front(line);
        self.events.truncate(EVENT_LOG_LEN);
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn set_environment(&mut self, param: EnvParam, value: f64) {
        self.environment.set(param, value);
    }

    /// Full roster: live species first, then up to five retained extinct ones.
    pub fn species(&self) -> &[Species] {
        &self.species
    }

    pub fn species_by_id(&self, id: SpeciesId) -> Option<&Species> {
        self.species.iter().find(|s| s.id == id)
    }

    pub fn alive_species(&self) -> impl Iterator<Item = &Species> {
        self.species.iter().filter(|s| s.is_alive())
    }

    pub fn live_count(&self) -> usize {
        self.alive_species().count()
    }

    pub fn total_population(&self) -> u64 {
        self.alive_species()
            .fold(0u64, |total, s| total.saturating_add(s.population()))
    }

    /// Live species with the largest population; the earliest wins ties.
    pub fn dominant(&self) -> Option<&Species> {
        self.alive_species().fold(None, |best: Option<&Species>, s| match best {
            Some(b) if b.population() >= s.population() => Some(b),
            _ => Some(s),
        })
    }

    /// Event log, newest first.
    pub fn events(&self) -> impl Iterator<Item = &str> {
        self.events.iter().map(String::as_str)
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Simulated years; one tick is ten years.
    pub fn year(&self) -> u64 {
        self.tick_count * 10
    }

    pub fn influence_points(&self) -> u64 {
        self.influence_points
    }

    pub fn set_influence_points(&mut self, points: u64) {
        self.influence_points = points;
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn total_extinct(&self) -> u64 {
        self.total_extinct
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn last_checkpoint_time(&self) -> DateTime<Utc> {
        self.last_checkpoint_time
    }

    pub fn rad_pulse(&self) -> Option<RadiationPulse> {
        self.rad_pulse
    }
}

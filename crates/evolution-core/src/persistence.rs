//! Conversion between a [`World`] and a plain nested-map document.
//!
//! The storage itself belongs to the caller; this module only guarantees that
//! a document either loads into a complete world or is rejected.

use crate::config::{Mode, SimConfig};
use crate::environment::{EnvParam, Environment};
use crate::genome::{GeneKey, Genome};
use crate::species::{Phase, Species, SpeciesId, HISTORY_LEN};
use crate::world::{RadiationPulse, World, WorldInitError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};
use std::{error::Error, fmt};

/// Number of most recent events written to a document.
pub const PERSISTED_EVENTS: usize = 30;

fn default_color() -> [f32; 4] {
    [1.0, 1.0, 1.0, 1.0]
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpeciesRecord {
    pub id: SpeciesId,
    #[serde(default)]
    pub dna: BTreeMap<String, f64>,
    pub population: u64,
    #[serde(default)]
    pub generation: u32,
    #[serde(default)]
    pub age: u64,
    pub name: String,
    #[serde(default = "default_color")]
    pub color: [f32; 4],
    #[serde(default)]
    pub phase: Phase,
    #[serde(default)]
    pub adaptations: Vec<String>,
    #[serde(default)]
    pub history: Vec<u64>,
    #[serde(default)]
    pub extinct: bool,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub vx: f64,
    #[serde(default)]
    pub vy: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorldRecord {
    #[serde(default)]
    pub env: BTreeMap<String, f64>,
    #[serde(default)]
    pub species: Vec<SpeciesRecord>,
    #[serde(default)]
    pub tick_count: u64,
    #[serde(default)]
    pub year: u64,
    #[serde(default)]
    pub influence_points: u64,
    /// Newest first.
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub total_extinct: u64,
    pub last_checkpoint_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rad_pulse: Option<RadiationPulse>,
}

#[derive(Debug)]
pub enum PersistError {
    Malformed(serde_json::Error),
    Invalid(WorldInitError),
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistError::Malformed(e) => write!(f, "malformed world document: {e}"),
            PersistError::Invalid(e) => write!(f, "invalid world document: {e}"),
        }
    }
}

impl Error for PersistError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PersistError::Malformed(e) => Some(e),
            PersistError::Invalid(e) => Some(e),
        }
    }
}

impl From<serde_json::Error> for PersistError {
    fn from(err: serde_json::Error) -> Self {
        PersistError::Malformed(err)
    }
}

impl From<WorldInitError> for PersistError {
    fn from(err: WorldInitError) -> Self {
        PersistError::Invalid(err)
    }
}

impl SpeciesRecord {
    fn from_species(s: &Species) -> Self {
        Self {
            id: s.id,
            dna: s
                .genome
                .genes()
                .map(|g| (g.key.as_str().to_string(), g.value()))
                .collect(),
            population: s.population(),
            generation: s.generation,
            age: s.age,
            name: s.name.clone(),
            color: s.color,
            phase: s.phase,
            adaptations: s.adaptations.clone(),
            history: s.history().collect(),
            extinct: s.is_extinct(),
            x: s.position[0],
            y: s.position[1],
            vx: s.velocity[0],
            vy: s.velocity[1],
        }
    }

    fn into_species(self) -> Species {
        for key in self.dna.keys() {
            if key.parse::<GeneKey>().is_err() {
                tracing::warn!(species = self.id, gene = %key, "ignoring unknown gene");
            }
        }
        // Genes missing from older documents start at zero.
        let genome = Genome::with_overrides(
            GeneKey::ALL.map(|k| (k, self.dna.get(k.as_str()).copied().unwrap_or(0.0))),
        );
        if self.extinct != (self.population == 0) {
            tracing::warn!(species = self.id, "extinct flag disagrees with population");
        }

        let mut species = Species::new(self.id, genome, self.population)
            .with_name(self.name)
            .with_color(self.color)
            .at([self.x, self.y], [self.vx, self.vy]);
        species.generation = self.generation;
        species.age = self.age;
        species.phase = self.phase;
        for label in self.adaptations {
            if !species.adaptations.contains(&label) {
                species.adaptations.push(label);
            }
        }
        let skip = self.history.len().saturating_sub(HISTORY_LEN);
        for snapshot in self.history.into_iter().skip(skip) {
            species.record_snapshot(snapshot);
        }
        species
    }
}

/// Missing parameters take their default values.
fn environment_from_map(map: &BTreeMap<String, f64>) -> Environment {
    let mut env = Environment::default();
    for (name, &value) in map {
        match name.parse::<EnvParam>() {
            Ok(param) => env.set(param, value),
            Err(_) => tracing::warn!(param = %name, "ignoring unknown environment parameter"),
        }
    }
    env
}

pub fn to_record(world: &World) -> WorldRecord {
    WorldRecord {
        env: world
            .environment()
            .iter()
            .map(|(p, v)| (p.as_str().to_string(), v))
            .collect(),
        species: world.species().iter().map(SpeciesRecord::from_species).collect(),
        tick_count: world.tick_count(),
        year: world.year(),
        influence_points: world.influence_points(),
        events: world
            .events()
            .take(PERSISTED_EVENTS)
            .map(str::to_string)
            .collect(),
        mode: world.mode(),
        total_extinct: world.total_extinct(),
        last_checkpoint_time: world.last_checkpoint_time(),
        rad_pulse: world.rad_pulse(),
    }
}

/// Rebuilds a world from a record. The RNG restarts from `config.seed`.
pub fn from_record(record: WorldRecord, config: SimConfig) -> Result<World, PersistError> {
    let species = record
        .species
        .into_iter()
        .map(SpeciesRecord::into_species)
        .collect();
    let mut world = World::with_species(config, species)?;
    world.environment = environment_from_map(&record.env);
    world.tick_count = record.tick_count;
    world.influence_points = record.influence_points;
    world.events = record.events.into_iter().collect::<VecDeque<_>>();
    world.events.truncate(crate::world::EVENT_LOG_LEN);
    world.mode = record.mode;
    world.total_extinct = record.total_extinct;
    world.last_checkpoint_time = record.last_checkpoint_time;
    world.rad_pulse = record.rad_pulse;
    Ok(world)
}

pub fn to_dict(world: &World) -> Result<Value, PersistError> {
    Ok(serde_json::to_value(to_record(world))?)
}

pub fn from_dict(value: &Value, config: SimConfig) -> Result<World, PersistError> {
    let record = WorldRecord::deserialize(value)?;
    from_record(record, config)
}

pub fn to_json_string(world: &World) -> Result<String, PersistError> {
    Ok(serde_json::to_string_pretty(&to_record(world))?)
}

pub fn from_json_str(text: &str, config: SimConfig) -> Result<World, PersistError> {
    let record: WorldRecord = serde_json::from_str(text)?;
    from_record(record, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::Intervention;
    use chrono::TimeZone;
    use serde_json::json;

    fn busy_world() -> World {
        let mut world = World::new(SimConfig {
            seed: 17,
            initial_species: 5,
            ..SimConfig::default()
        });
        world.checkpoint(Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap());
        world.set_influence_points(100);
        world.tick(400);
        world.apply_intervention(Intervention::RadPulse, None).unwrap();
        world
    }

    #[test]
    fn round_trip_preserves_observable_state() {
        let world = busy_world();
        let doc = to_dict(&world).unwrap();
        let restored = from_dict(&doc, world.config().clone()).unwrap();

        assert_eq!(restored.species(), world.species());
        assert_eq!(restored.environment(), world.environment());
        assert_eq!(restored.tick_count(), world.tick_count());
        assert_eq!(restored.year(), world.year());
        assert_eq!(restored.influence_points(), world.influence_points());
        assert_eq!(restored.total_extinct(), world.total_extinct());
        assert_eq!(restored.mode(), world.mode());
        assert_eq!(restored.rad_pulse(), world.rad_pulse());
        assert_eq!(
            restored.last_checkpoint_time(),
            world.last_checkpoint_time()
        );
        assert_eq!(to_dict(&restored).unwrap(), doc);
    }

    #[test]
    fn only_recent_events_are_written() {
        let world = busy_world();
        let record = to_record(&world);
        assert!(record.events.len() <= PERSISTED_EVENTS);
        assert_eq!(record.events.first().map(String::as_str), world.events().next());
    }

    #[test]
    fn missing_genes_default_to_zero_and_unknown_keys_are_ignored() {
        let doc = json!({
            "env": {"water": 9.0, "humidity": 3.0},
            "species": [{
                "id": 4, "population": 50, "name": "Cyanozoa novus",
                "dna": {"speed": 3.5, "wings": 2.0},
                "x": 0.4, "y": 0.6
            }],
            "tick_count": 12,
            "mode": "god",
            "last_checkpoint_time": "2026-03-01T00:00:00Z"
        });
        let world = from_dict(&doc, SimConfig::default()).unwrap();
        let s = &world.species()[0];
        assert_eq!(s.gene(GeneKey::Speed), 3.5);
        assert_eq!(s.gene(GeneKey::Intelligence), 0.0);
        assert_eq!(world.environment().water, 9.0);
        assert_eq!(world.environment().temperature, 5.0);
        assert_eq!(world.year(), 120);
        assert_eq!(world.mode(), Mode::God);

        // New ids continue after the highest stored one.
        let mut world = world;
        world.set_influence_points(20);
        world.apply_intervention(Intervention::SeedLife, None).unwrap();
        assert_eq!(world.species().last().map(|s| s.id), Some(5));
    }

    #[test]
    fn missing_environment_keys_take_defaults_not_config() {
        let config = SimConfig {
            environment: Environment {
                water: 9.0,
                radiation: 7.0,
                ..Environment::default()
            },
            ..SimConfig::default()
        };
        let doc = json!({
            "env": {"temperature": 8.0},
            "last_checkpoint_time": "2026-03-01T00:00:00Z"
        });
        let world = from_dict(&doc, config).unwrap();
        let expected = Environment {
            temperature: 8.0,
            ..Environment::default()
        };
        assert_eq!(world.environment(), &expected);
    }

    #[test]
    fn malformed_documents_are_rejected() {
        let missing_time = json!({"species": []});
        assert!(matches!(
            from_dict(&missing_time, SimConfig::default()),
            Err(PersistError::Malformed(_))
        ));

        let bad_phase = json!({
            "species": [{"id": 1, "population": 5, "name": "x", "x": 0.5, "y": 0.5,
                         "phase": "ascended"}],
            "last_checkpoint_time": "2026-03-01T00:00:00Z"
        });
        assert!(from_dict(&bad_phase, SimConfig::default()).is_err());

        let duplicate = json!({
            "species": [
                {"id": 1, "population": 5, "name": "a", "x": 0.5, "y": 0.5},
                {"id": 1, "population": 5, "name": "b", "x": 0.5, "y": 0.5}
            ],
            "last_checkpoint_time": "2026-03-01T00:00:00Z"
        });
        assert!(matches!(
            from_dict(&duplicate, SimConfig::default()),
            Err(PersistError::Invalid(WorldInitError::DuplicateSpeciesId(1)))
        ));
    }

    #[test]
    fn extinct_flag_follows_population_and_history_is_bounded() {
        let history: Vec<u64> = (0..150).collect();
        let doc = json!({
            "species": [{
                "id": 2, "population": 0, "name": "Pyropod ignotus",
                "extinct": false, "x": 0.5, "y": 0.5,
                "history": history
            }],
            "last_checkpoint_time": "2026-03-01T00:00:00Z"
        });
        let world = from_dict(&doc, SimConfig::default()).unwrap();
        let s = &world.species()[0];
        assert!(s.is_extinct());
        assert_eq!(s.history().len(), HISTORY_LEN);
        assert_eq!(s.history().next(), Some(30));
    }
}

use super::{RadiationPulse, World};
use crate::config::SimConfig;
use crate::environment::{EnvParam, ENV_MAX};
use crate::genome::{GeneKey, Genome};
use crate::species::SpeciesId;
use rand::Rng;
use std::fmt;
use std::str::FromStr;

pub const SEED_LIFE_POPULATION: u64 = 30;
pub const FORCED_MUTATION_RADIATION: f64 = 6.0;

/// The catalog of player actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Intervention {
    ForceMutation,
    Catastrophe,
    Virus,
    BoostIntel,
    Climate,
    FoodBloom,
    RadPulse,
    MassExtinction,
    SeedLife,
}

impl Intervention {
    pub const ALL: [Intervention; 9] = [
        Intervention::ForceMutation,
        Intervention::Catastrophe,
        Intervention::Virus,
        Intervention::BoostIntel,
        Intervention::Climate,
        Intervention::FoodBloom,
        Intervention::RadPulse,
        Intervention::MassExtinction,
        Intervention::SeedLife,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Intervention::ForceMutation => "force_mutation",
            Intervention::Catastrophe => "catastrophe",
            Intervention::Virus => "virus",
            Intervention::BoostIntel => "boost_intel",
            Intervention::Climate => "climate",
            Intervention::FoodBloom => "food_bloom",
            Intervention::RadPulse => "rad_pulse",
            Intervention::MassExtinction => "mass_extinction",
            Intervention::SeedLife => "seed_life",
        }
    }

    /// Price in influence points before the mode multiplier.
    pub fn base_cost(self) -> u64 {
        match self {
            Intervention::ForceMutation => 5,
            Intervention::Catastrophe => 8,
            Intervention::Virus => 10,
            Intervention::BoostIntel => 15,
            Intervention::Climate => 12,
            Intervention::FoodBloom => 6,
            Intervention::RadPulse => 8,
            Intervention::MassExtinction => 25,
            Intervention::SeedLife => 20,
        }
    }

    pub fn requires_target(self) -> bool {
        matches!(
            self,
            Intervention::ForceMutation | Intervention::Virus | Intervention::BoostIntel
        )
    }
}

impl fmt::Display for Intervention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intervention {
    type Err = InterventionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Intervention::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| InterventionError::UnknownAction(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterventionError {
    UnknownAction(String),
    InsufficientPoints { required: u64, available: u64 },
    MissingTarget(Intervention),
    TargetNotFound(SpeciesId),
    RosterFull { max: usize },
}

impl fmt::Display for InterventionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterventionError::UnknownAction(name) => write!(f, "invalid action: {name:?}"),
            InterventionError::InsufficientPoints {
                required,
                available,
            } => write!(
                f,
                "not enough influence: {required} required, {available} available"
            ),
            InterventionError::MissingTarget(action) => {
                write!(f, "{action} requires a target species")
            }
            InterventionError::TargetNotFound(id) => write!(f, "no live species with id {id}"),
            InterventionError::RosterFull { max } => {
                write!(f, "the world already holds {max} live species")
            }
        }
    }
}

impl std::error::Error for InterventionError {}

/// Outcome of a successful intervention.
#[derive(Debug, Clone, PartialEq)]
pub struct InterventionReport {
    pub action: Intervention,
    pub cost: u64,
    pub target: Option<SpeciesId>,
    pub message: String,
}

impl World {
    pub fn intervention_cost(&self, action: Intervention) -> u64 {
        action.base_cost() * self.mode.cost_multiplier()
    }

    /// Parses `action` and applies it.
    pub fn apply_named_intervention(
        &mut self,
        action: &str,
        target: Option<SpeciesId>,
    ) -> Result<InterventionReport, InterventionError> {
        let action = action.parse::<Intervention>()?;
        self.apply_intervention(action, target)
    }

    /// Applies a player action. Points are deducted only on success; a
    /// rejected request leaves the world untouched.
    pub fn apply_intervention(
        &mut self,
        action: Intervention,
        target: Option<SpeciesId>,
    ) -> Result<InterventionReport, InterventionError> {
        let cost = self.intervention_cost(action);
        if self.influence_points < cost {
            return Err(InterventionError::InsufficientPoints {
                required: cost,
                available: self.influence_points,
            });
        }

        let target_idx = if action.requires_target() {
            let id = target.ok_or(InterventionError::MissingTarget(action))?;
            Some(
                self.species
                    .iter()
                    .position(|s| s.id == id && s.is_alive())
                    .ok_or(InterventionError::TargetNotFound(id))?,
            )
        } else {
            None
        };

        if action == Intervention::SeedLife && self.live_count() >= SimConfig::MAX_LIVE_SPECIES {
            return Err(InterventionError::RosterFull {
                max: SimConfig::MAX_LIVE_SPECIES,
            });
        }

        self.influence_points -= cost;
        let message = match (action, target_idx) {
            (Intervention::ForceMutation, Some(idx)) => self.force_mutation(idx),
            (Intervention::Virus, Some(idx)) => self.virus(idx),
            (Intervention::BoostIntel, Some(idx)) => self.boost_intel(idx),
            (Intervention::Catastrophe, _) => self.catastrophe(),
            (Intervention::Climate, _) => self.climate_shift(),
            (Intervention::FoodBloom, _) => self.food_bloom(),
            (Intervention::RadPulse, _) => self.rad_pulse_start(),
            (Intervention::MassExtinction, _) => self.mass_extinction(),
            (Intervention::SeedLife, _) => self.seed_life(),
            // Targeted actions always carry an index past the checks above.
            (_, None) => String::new(),
        };
        self.log_event(&message);

        Ok(InterventionReport {
            action,
            cost,
            target: target_idx.map(|idx| self.species[idx].id),
            message,
        })
    }

    /// Removes `floor(population * fraction)` and handles extinction.
    fn cull(&mut self, idx: usize, fraction: f64) {
        let population = self.species[idx].population();
        let loss = (population as f64 * fraction).floor() as u64;
        self.set_population_at(idx, population.saturating_sub(loss));
    }

    fn set_population_at(&mut self, idx: usize, population: u64) {
        let was_alive = self.species[idx].is_alive();
        self.species[idx].set_population(population);
        if was_alive && population == 0 {
            self.record_extinction(idx);
        }
    }

    fn force_mutation(&mut self, idx: usize) -> String {
        let species = &mut self.species[idx];
        species.genome = species.genome.mutate(&mut self.rng, FORCED_MUTATION_RADIATION);
        species.generation += 1;
        species.update_adaptations();
        species.reclassify();
        format!("Forced mutation reshapes {}", species.name)
    }

    fn virus(&mut self, idx: usize) -> String {
        let fraction = self.rng.random_range(0.35..0.75);
        self.cull(idx, fraction);
        format!(
            "A virus ravages {}: {:.0}% perish",
            self.species[idx].name,
            fraction * 100.0
        )
    }

    fn boost_intel(&mut self, idx: usize) -> String {
        let species = &mut self.species[idx];
        let intelligence = species.gene(GeneKey::Intelligence);
        species.genome.set(GeneKey::Intelligence, intelligence + 2.5);
        species.reclassify();
        format!("{} gains a spark of intelligence", species.name)
    }

    fn catastrophe(&mut self) -> String {
        let live: Vec<usize> = self
            .species
            .iter()
            .enumerate()
            .filter_map(|(idx, s)| s.is_alive().then_some(idx))
            .collect();
        for idx in live {
            let fraction = self.rng.random_range(0.25..0.65);
            self.cull(idx, fraction);
        }
        "A global catastrophe strikes every living species".to_string()
    }

    fn climate_shift(&mut self) -> String {
        let temperature = self.rng.random_range(1.0..9.0);
        let water = self.rng.random_range(1.0..9.0);
        self.environment.set(EnvParam::Temperature, temperature);
        self.environment.set(EnvParam::Water, water);
        format!("The climate shifts: temperature {temperature:.1}, water {water:.1}")
    }

    fn food_bloom(&mut self) -> String {
        let resources = (self.environment.resources + 3.0).min(ENV_MAX);
        self.environment.set(EnvParam::Resources, resources);
        "A food bloom enriches the world".to_string()
    }

    fn rad_pulse_start(&mut self) -> String {
        // Stacked pulses revert to the value from before the first one.
        let previous = self
            .rad_pulse
            .map(|p| p.previous)
            .unwrap_or(self.environment.radiation);
        let radiation = (self.environment.radiation + 4.0).min(ENV_MAX);
        self.environment.set(EnvParam::Radiation, radiation);
        self.rad_pulse = Some(RadiationPulse {
            revert_at_tick: self.tick_count + self.config.rad_pulse_ticks,
            previous,
        });
        "A radiation pulse sweeps the planet".to_string()
    }

    fn mass_extinction(&mut self) -> String {
        let mut spared: Option<(usize, f64)> = None;
        for (idx, s) in self.species.iter().enumerate() {
            if !s.is_alive() {
                continue;
            }
            let fitness = s.genome.fitness(&self.environment);
            if spared.map_or(true, |(_, best)| fitness > best) {
                spared = Some((idx, fitness));
            }
        }
        let Some((spared_idx, _)) = spared else {
            return "A mass extinction sweeps an empty world".to_string();
        };
        let victims: Vec<usize> = self
            .species
            .iter()
            .enumerate()
            .filter_map(|(idx, s)| (s.is_alive() && idx != spared_idx).then_some(idx))
            .collect();
        for idx in victims {
            let population = self.species[idx].population() / 10;
            self.set_population_at(idx, population);
        }
        format!(
            "Mass extinction! Only {} is spared",
            self.species[spared_idx].name
        )
    }

    fn seed_life(&mut self) -> String {
        let genome = Genome::random_starter(&mut self.rng);
        let species = self.spawn(genome, SEED_LIFE_POPULATION);
        let message = format!("New life takes hold: {}", species.name);
        self.species.push(species);
        message
    }
}

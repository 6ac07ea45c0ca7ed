pub mod lifecycle;

pub use lifecycle::{tick_species, TickOutcome};

use crate::genome::{GeneKey, Genome, ParseNameError};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

/// Maximum number of population snapshots kept per species.
pub const HISTORY_LEN: usize = 120;

/// Positions are kept inside `[POS_MIN, POS_MAX]` on both axes.
pub const POS_MIN: f64 = 0.03;
pub const POS_MAX: f64 = 0.97;

pub type SpeciesId = u64;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Microscopic,
    Aquatic,
    Terrestrial,
    Predatory,
    Intelligent,
    Civilized,
    Technological,
}

impl Phase {
    pub const ALL: [Phase; 7] = [
        Phase::Microscopic,
        Phase::Aquatic,
        Phase::Terrestrial,
        Phase::Predatory,
        Phase::Intelligent,
        Phase::Civilized,
        Phase::Technological,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Microscopic => "microscopic",
            Phase::Aquatic => "aquatic",
            Phase::Terrestrial => "terrestrial",
            Phase::Predatory => "predatory",
            Phase::Intelligent => "intelligent",
            Phase::Civilized => "civilized",
            Phase::Technological => "technological",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Phase::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ParseNameError {
                kind: "phase",
                name: s.to_string(),
            })
    }
}

/// Pure classification over the current genes and age. First match wins.
pub fn classify_phase(genome: &Genome, age: u64) -> Phase {
    let intelligence = genome.get(GeneKey::Intelligence);
    if intelligence >= 9.0 {
        Phase::Technological
    } else if intelligence >= 7.5 {
        Phase::Civilized
    } else if intelligence >= 5.5 {
        Phase::Intelligent
    } else if genome.get(GeneKey::Aggression) >= 7.0 && genome.get(GeneKey::Speed) >= 6.0 {
        Phase::Predatory
    } else if genome.get(GeneKey::Aquatic) >= 5.0 {
        Phase::Aquatic
    } else if age > 200 {
        Phase::Terrestrial
    } else {
        Phase::Microscopic
    }
}

/// Labels a genome currently qualifies for, in display order.
pub fn earned_adaptations(genome: &Genome) -> Vec<String> {
    let mut labels: Vec<String> = genome
        .genes()
        .filter(|g| g.value() >= 8.5)
        .map(|g| format!("Master of {}", g.key))
        .collect();
    if genome.get(GeneKey::Intelligence) > 7.0 {
        labels.push("Emergent consciousness".to_string());
    }
    if genome.get(GeneKey::Aquatic) > 7.0 && genome.get(GeneKey::Speed) > 6.0 {
        labels.push("Dominion of the oceans".to_string());
    }
    labels
}

/// A population sharing one genome, positioned on the unit square.
#[derive(Clone, Debug, PartialEq)]
pub struct Species {
    pub id: SpeciesId,
    pub genome: Genome,
    population: u64,
    pub generation: u32,
    pub age: u64,
    pub name: String,
    pub color: [f32; 4],
    pub phase: Phase,
    /// Insertion-ordered, duplicate-free.
    pub adaptations: Vec<String>,
    history: VecDeque<u64>,
    extinct: bool,
    pub position: [f64; 2],
    pub velocity: [f64; 2],
}

impl Species {
    pub fn new(id: SpeciesId, genome: Genome, population: u64) -> Self {
        let phase = classify_phase(&genome, 0);
        Self {
            id,
            genome,
            population,
            generation: 0,
            age: 0,
            name: format!("Species {id}"),
            color: [1.0, 1.0, 1.0, 1.0],
            phase,
            adaptations: Vec::new(),
            history: VecDeque::new(),
            extinct: population == 0,
            position: [0.5, 0.5],
            velocity: [0.0, 0.0],
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }

    pub fn at(mut self, position: [f64; 2], velocity: [f64; 2]) -> Self {
        self.position = [clamp_pos(position[0]), clamp_pos(position[1])];
        self.velocity = velocity;
        self
    }

    pub fn population(&self) -> u64 {
        self.population
    }

    /// Sets the population and keeps the extinction flag consistent with it.
    pub fn set_population(&mut self, population: u64) {
        self.population = population;
        self.extinct = population == 0;
    }

    pub fn is_extinct(&self) -> bool {
        self.extinct
    }

    pub fn is_alive(&self) -> bool {
        !self.extinct
    }

    pub(crate) fn go_extinct(&mut self) {
        self.population = 0;
        self.extinct = true;
    }

    pub fn history(&self) -> impl ExactSizeIterator<Item = u64> + '_ {
        self.history.iter().copied()
    }

    pub(crate) fn record_snapshot(&mut self, population: u64) {
        self.history.push_back(population);
        while self.history.len() > HISTORY_LEN {
            self.history.pop_front();
        }
    }

    pub fn gene(&self, key: GeneKey) -> f64 {
        self.genome.get(key)
    }

    pub fn reclassify(&mut self) {
        self.phase = classify_phase(&self.genome, self.age);
    }

    /// Adds newly earned labels; labels are never removed.
    pub fn update_adaptations(&mut self) {
        for label in earned_adaptations(&self.genome) {
            if !self.adaptations.contains(&label) {
                self.adaptations.push(label);
            }
        }
    }

    pub fn distance_to(&self, other: &Species) -> f64 {
        let dx = self.position[0] - other.position[0];
        let dy = self.position[1] - other.position[1];
        (dx * dx + dy * dy).sqrt()
    }
}

pub(crate) fn clamp_pos(v: f64) -> f64 {
    if v.is_nan() {
        0.5
    } else {
        v.clamp(POS_MIN, POS_MAX)
    }
}

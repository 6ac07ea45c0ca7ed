use crate::environment::Environment;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const GENE_MIN: f64 = 0.0;
pub const GENE_MAX: f64 = 10.0;
pub const GENE_DEFAULT: f64 = 1.0;

/// Lower bound of the fitness score.
pub const FITNESS_FLOOR: f64 = 0.05;

/// The closed set of heritable traits. Order is the storage order inside a
/// [`Genome`] and the iteration order everywhere else.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneKey {
    Speed,
    Resistance,
    Reproduction,
    Intelligence,
    Metabolism,
    Camouflage,
    Aggression,
    Aquatic,
    Size,
}

impl GeneKey {
    pub const COUNT: usize = 9;

    pub const ALL: [GeneKey; Self::COUNT] = [
        GeneKey::Speed,
        GeneKey::Resistance,
        GeneKey::Reproduction,
        GeneKey::Intelligence,
        GeneKey::Metabolism,
        GeneKey::Camouflage,
        GeneKey::Aggression,
        GeneKey::Aquatic,
        GeneKey::Size,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GeneKey::Speed => "speed",
            GeneKey::Resistance => "resistance",
            GeneKey::Reproduction => "reproduction",
            GeneKey::Intelligence => "intelligence",
            GeneKey::Metabolism => "metabolism",
            GeneKey::Camouflage => "camouflage",
            GeneKey::Aggression => "aggression",
            GeneKey::Aquatic => "aquatic",
            GeneKey::Size => "size",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for GeneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a member of a closed key set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseNameError {
    pub kind: &'static str,
    pub name: String,
}

impl fmt::Display for ParseNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} name: {:?}", self.kind, self.name)
    }
}

impl std::error::Error for ParseNameError {}

impl FromStr for GeneKey {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GeneKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ParseNameError {
                kind: "gene",
                name: s.to_string(),
            })
    }
}

/// Standard normal sample via Box-Muller, drawn from the caller's RNG.
pub(crate) fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u1: f64 = rng.random::<f64>().max(f64::EPSILON);
    let u2: f64 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// A single bounded trait. `lo <= value <= hi` holds after every mutation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Gene {
    pub key: GeneKey,
    value: f64,
    pub lo: f64,
    pub hi: f64,
}

impl Gene {
    pub fn new(key: GeneKey, value: f64) -> Self {
        Self {
            key,
            value: clamp_gene(value, GENE_MIN, GENE_MAX),
            lo: GENE_MIN,
            hi: GENE_MAX,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn set(&mut self, value: f64) {
        self.value = clamp_gene(value, self.lo, self.hi);
    }

    /// With probability `min(0.9, 0.04 * radiation)` add N(0, 0.6 * radiation).
    pub fn mutate<R: Rng + ?Sized>(&mut self, rng: &mut R, radiation: f64) {
        let chance = (0.04 * radiation).min(0.9);
        if rng.random::<f64>() < chance {
            let delta = standard_normal(rng) * 0.6 * radiation;
            self.set(self.value + delta);
        }
    }
}

fn clamp_gene(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        lo
    } else {
        value.clamp(lo, hi)
    }
}

/// Fixed bundle of nine genes. Copies are deep; mutation is copy-on-write.
#[derive(Clone, Debug, PartialEq)]
pub struct Genome {
    genes: [Gene; GeneKey::COUNT],
}

impl Default for Genome {
    fn default() -> Self {
        Self {
            genes: GeneKey::ALL.map(|k| Gene::new(k, GENE_DEFAULT)),
        }
    }
}

impl Genome {
    /// Default genome with selected genes replaced (values are clamped).
    pub fn with_overrides<I>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (GeneKey, f64)>,
    {
        let mut genome = Self::default();
        for (key, value) in overrides {
            genome.set(key, value);
        }
        genome
    }

    /// Every gene drawn uniformly from [0.5, 3.0].
    pub fn random_starter<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            genes: GeneKey::ALL.map(|k| Gene::new(k, rng.random_range(0.5..=3.0))),
        }
    }

    pub fn gene(&self, key: GeneKey) -> &Gene {
        &self.genes[key.index()]
    }

    pub fn get(&self, key: GeneKey) -> f64 {
        self.genes[key.index()].value
    }

    pub fn set(&mut self, key: GeneKey, value: f64) {
        self.genes[key.index()].set(value);
    }

    pub fn genes(&self) -> impl Iterator<Item = &Gene> {
        self.genes.iter()
    }

    /// Returns a mutated copy; `self` is left untouched.
    pub fn mutate<R: Rng + ?Sized>(&self, rng: &mut R, radiation: f64) -> Genome {
        let mut child = self.clone();
        for gene in &mut child.genes {
            gene.mutate(rng, radiation);
        }
        if rng.random::<f64>() < 0.008 * radiation {
            let idx = rng.random_range(0..GeneKey::COUNT);
            let boost = rng.random_range(1.0..=3.0);
            let gene = &mut child.genes[idx];
            gene.set(gene.value + boost);
        }
        child
    }

    /// Uniform crossover: each gene comes from `self` or `other` with p = 0.5.
    pub fn crossover<R: Rng + ?Sized>(&self, other: &Genome, rng: &mut R) -> Genome {
        let mut child = self.clone();
        for (slot, theirs) in child.genes.iter_mut().zip(other.genes.iter()) {
            if rng.random::<bool>() {
                *slot = *theirs;
            }
        }
        child
    }

    /// Environment-dependent score, never below [`FITNESS_FLOOR`].
    pub fn fitness(&self, env: &Environment) -> f64 {
        let speed = self.get(GeneKey::Speed);
        let resistance = self.get(GeneKey::Resistance);
        let intelligence = self.get(GeneKey::Intelligence);
        let metabolism = self.get(GeneKey::Metabolism);
        let camouflage = self.get(GeneKey::Camouflage);
        let aquatic = self.get(GeneKey::Aquatic);

        let mut score = 0.0;

        if env.temperature > 7.0 || env.temperature < 3.0 {
            score += resistance * 2.0;
        } else {
            score += resistance * 0.6;
        }

        if env.water > 6.0 {
            score += aquatic * 2.5;
            score -= (2.0 - aquatic).max(0.0) * 0.8;
        } else {
            score -= aquatic * 0.4;
        }

        score -= env.radiation * 0.15 * (10.0 - resistance) * 0.1;

        if env.predator_pressure > 0.0 {
            score += speed * 1.5 + camouflage * 2.0 + intelligence * 1.0;
        }

        if env.resources < 3.0 {
            score += -metabolism * 0.5 + intelligence * 2.0;
        } else {
            score += env.resources * 0.3;
        }

        score += intelligence * 0.8;

        score.max(FITNESS_FLOOR)
    }
}

use super::World;
use crate::species::{Phase, SpeciesId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DominantSummary {
    pub id: SpeciesId,
    pub name: String,
    pub population: u64,
    pub phase: Phase,
    pub generation: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WorldStats {
    pub tick_count: u64,
    pub year: u64,
    pub live_species: usize,
    pub extinct_retained: usize,
    pub total_extinct: u64,
    pub total_population: u64,
    pub influence_points: u64,
    pub mean_generation: f32,
    pub max_generation: u32,
    pub dominant: Option<DominantSummary>,
    /// Live species per phase, in `Phase::ALL` order.
    pub phase_counts: Vec<(Phase, usize)>,
}

/// Compact population label: `1.2B`, `3.4M`, `12K`, or the plain number.
pub fn format_population(n: u64) -> String {
    let v = n as f64;
    if n >= 1_000_000_000 {
        format!("{:.1}B", v / 1_000_000_000.0)
    } else if n >= 1_000_000 {
        format!("{:.1}M", v / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.0}K", v / 1_000.0)
    } else {
        n.to_string()
    }
}

impl World {
    pub fn stats(&self) -> WorldStats {
        let live = self.live_count();
        let generation_sum: f32 = self.alive_species().map(|s| s.generation as f32).sum();
        let phase_counts = Phase::ALL
            .into_iter()
            .map(|phase| (phase, self.alive_species().filter(|s| s.phase == phase).count()))
            .collect();
        WorldStats {
            tick_count: self.tick_count,
            year: self.year(),
            live_species: live,
            extinct_retained: self.species.len() - live,
            total_extinct: self.total_extinct,
            total_population: self.total_population(),
            influence_points: self.influence_points,
            mean_generation: if live > 0 {
                generation_sum / live as f32
            } else {
                0.0
            },
            max_generation: self.alive_species().map(|s| s.generation).max().unwrap_or(0),
            dominant: self.dominant().map(|s| DominantSummary {
                id: s.id,
                name: s.name.clone(),
                population: s.population(),
                phase: s.phase,
                generation: s.generation,
            }),
            phase_counts,
        }
    }
}

use super::{World, RETAINED_EXTINCT};
use crate::config::SimConfig;
use crate::environment::{EnvParam, DRIFT_MAX, DRIFT_MIN};
use crate::species::{tick_species, TickOutcome};
use chrono::{DateTime, Utc};
use rand::Rng;

pub const CLIMATE_DRIFT_EVERY: u64 = 300;
pub const INFLUENCE_EVERY: u64 = 80;
pub const SPECIATION_EVERY: u64 = 250;
pub const SPECIATION_MIN_POPULATION: u64 = 150;
pub const SPECIATION_CHANCE: f64 = 0.06;

impl World {
    /// Advances the simulation by up to `n` unit ticks, stopping at once if the
    /// world is paused. Returns the number of ticks actually run.
    pub fn tick(&mut self, n: u64) -> u64 {
        let mut ran = 0;
        for _ in 0..n {
            if self.paused {
                break;
            }
            self.step();
            ran += 1;
        }
        ran
    }

    fn step(&mut self) {
        self.tick_count += 1;

        if self.tick_count % CLIMATE_DRIFT_EVERY == 0 {
            self.drift_climate();
        }
        self.expire_rad_pulse();

        let live: Vec<usize> = self
            .species
            .iter()
            .enumerate()
            .filter_map(|(idx, s)| s.is_alive().then_some(idx))
            .collect();

        let mut offspring = Vec::new();
        for idx in live {
            match tick_species(&mut self.species, idx, &self.environment, &mut self.rng) {
                TickOutcome::Extinct => self.record_extinction(idx),
                TickOutcome::Survived => {
                    if self.may_speciate(idx, offspring.len()) {
                        let child_id = self.next_id();
                        let child =
                            self.species[idx].split(child_id, &self.environment, &mut self.rng);
                        let parent_name = self.species[idx].name.clone();
                        tracing::debug!(parent = %parent_name, child = child.id, "speciation");
                        self.log_event(format!(
                            "{} diverged into a new species: {}",
                            parent_name, child.name
                        ));
                        offspring.push(child);
                    }
                }
                TickOutcome::Skipped => {}
            }
        }
        self.species.extend(offspring);

        self.prune_extinct();

        if self.tick_count % INFLUENCE_EVERY == 0 {
            let income = (self.live_count() as u64 / 2).max(1) * self.mode.income_multiplier();
            self.influence_points += income;
        }
    }

    /// Eligibility is checked after the species' own tick; `queued` counts
    /// offspring already waiting to join the roster this tick.
    fn may_speciate(&mut self, idx: usize, queued: usize) -> bool {
        let species = &self.species[idx];
        species.population() > SPECIATION_MIN_POPULATION
            && species.age % SPECIATION_EVERY == 0
            && self.live_count() + queued < SimConfig::MAX_LIVE_SPECIES
            && self.rng.random::<f64>() < SPECIATION_CHANCE
    }

    pub(crate) fn record_extinction(&mut self, idx: usize) {
        let name = self.species[idx].name.clone();
        self.total_extinct += 1;
        tracing::debug!(species = %name, "extinction");
        self.log_event(format!("{name} has gone extinct"));
    }

    fn prune_extinct(&mut self) {
        if self.species.iter().all(|s| s.is_alive()) {
            return;
        }
        let (mut kept, extinct): (Vec<_>, Vec<_>) = std::mem::take(&mut self.species)
            .into_iter()
            .partition(|s| s.is_alive());
        let skip = extinct.len().saturating_sub(RETAINED_EXTINCT);
        kept.extend(extinct.into_iter().skip(skip));
        self.species = kept;
    }

    fn drift_climate(&mut self) {
        let param = EnvParam::DRIFTING[self.rng.random_range(0..EnvParam::DRIFTING.len())];
        let delta = self.rng.random_range(-0.3..0.3);
        let value = (self.environment.get(param) + delta).clamp(DRIFT_MIN, DRIFT_MAX);
        tracing::debug!(%param, value, "climate drift");
        self.environment.set(param, value);
    }

    fn expire_rad_pulse(&mut self) {
        let Some(pulse) = self.rad_pulse else {
            return;
        };
        if self.tick_count >= pulse.revert_at_tick {
            self.environment.set(EnvParam::Radiation, pulse.previous);
            self.rad_pulse = None;
            self.log_event("Radiation levels have returned to normal");
        }
    }

    /// Records `now` as the last time the observer was present.
    pub fn checkpoint(&mut self, now: DateTime<Utc>) {
        self.last_checkpoint_time = now;
    }

    /// Ticks due for the time elapsed since the last checkpoint, capped.
    pub fn offline_ticks_due(&self, now: DateTime<Utc>) -> u64 {
        let elapsed_ms = (now - self.last_checkpoint_time).num_milliseconds().max(0);
        let due = (elapsed_ms as f64 / 1000.0 * self.config.offline_ticks_per_second).floor();
        (due as u64).min(self.config.max_offline_ticks)
    }

    /// Replays the ticks owed for the observer's absence and moves the
    /// checkpoint to `now`. Returns the number of ticks replayed.
    pub fn fast_forward(&mut self, now: DateTime<Utc>) -> u64 {
        let due = self.offline_ticks_due(now);
        self.last_checkpoint_time = now;
        if due == 0 || self.paused {
            return 0;
        }
        tracing::info!(ticks = due, "offline catch-up");
        self.log_event(format!(
            "While you were away, {} years went by ({} ticks)",
            due * 10,
            due
        ));
        self.tick(due)
    }

    pub fn fast_forward_now(&mut self) -> u64 {
        self.fast_forward(Utc::now())
    }
}

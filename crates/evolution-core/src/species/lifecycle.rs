use super::{clamp_pos, Species, SpeciesId, POS_MAX, POS_MIN};
use crate::environment::Environment;
use crate::genome::GeneKey;
use crate::naming;
use rand::Rng;

/// Predators act on prey closer than this.
pub const PREDATION_RADIUS: f64 = 0.18;
/// Minimum aggression advantage a predator needs over its prey.
pub const PREDATION_MIN_ADVANTAGE: f64 = 1.5;

pub const SNAPSHOT_EVERY: u64 = 60;
pub const MUTATION_EVERY: u64 = 80;
pub const SPLIT_JITTER: f64 = 0.12;
pub const MAX_START_SPEED: f64 = 0.004;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The species was already extinct; nothing changed.
    Skipped,
    Survived,
    /// The species died out during this tick.
    Extinct,
}

pub(crate) fn random_velocity<R: Rng + ?Sized>(rng: &mut R) -> [f64; 2] {
    [
        rng.random_range(-MAX_START_SPEED..=MAX_START_SPEED),
        rng.random_range(-MAX_START_SPEED..=MAX_START_SPEED),
    ]
}

/// Carrying capacity for a species with the given intelligence.
pub fn carrying_capacity(env: &Environment, intelligence: f64) -> u64 {
    (env.resources * 120.0 * (1.0 + intelligence * 0.25)).floor().max(0.0) as u64
}

fn floor_mul(population: u64, factor: f64) -> u64 {
    (population as f64 * factor).floor().max(0.0) as u64
}

impl Species {
    fn integrate_motion(&mut self) {
        for axis in 0..2 {
            let next = self.position[axis] + self.velocity[axis];
            if !(POS_MIN..=POS_MAX).contains(&next) {
                self.velocity[axis] = -self.velocity[axis];
            }
            self.position[axis] = clamp_pos(next);
        }
    }

    /// Removes `deaths` individuals. Returns `true` if none are left.
    fn suffer_deaths(&mut self, deaths: u64) -> bool {
        self.population = self.population.saturating_sub(deaths);
        if self.population == 0 {
            self.go_extinct();
        }
        self.extinct
    }

    /// Ageing, motion, mortality and reproduction.
    /// Returns the carrying capacity, or `None` if the species died out.
    fn advance<R: Rng + ?Sized>(&mut self, env: &Environment, rng: &mut R) -> Option<u64> {
        self.age += 1;
        self.integrate_motion();

        let fitness = self.genome.fitness(env);
        let death_rate = (0.20 - fitness * 0.012).max(0.005);
        let mut deaths = floor_mul(self.population, death_rate * rng.random_range(0.5..1.5));

        if rng.random::<f64>() < 0.0008 * env.catastrophes {
            let lost = floor_mul(self.population, rng.random_range(0.10..0.55));
            deaths = deaths.saturating_add(lost);
        }
        if rng.random::<f64>() < 0.0004 * env.volcanic {
            let lost = floor_mul(self.population, rng.random_range(0.05..0.30));
            deaths = deaths.saturating_add(lost);
        }

        if self.suffer_deaths(deaths) {
            return None;
        }

        let reproduction = self.gene(GeneKey::Reproduction);
        let births = floor_mul(
            self.population,
            reproduction * 0.025 * rng.random_range(0.6..1.4),
        );
        let cap = carrying_capacity(env, self.gene(GeneKey::Intelligence));
        self.population = cap.min(self.population.saturating_add(births));
        if self.population == 0 {
            // Zero resources leave no carrying capacity at all.
            self.go_extinct();
            return None;
        }
        Some(cap)
    }

    /// Snapshots, periodic mutation and phase classification.
    fn finish_tick<R: Rng + ?Sized>(&mut self, env: &Environment, rng: &mut R) {
        if self.age % SNAPSHOT_EVERY == 0 {
            self.record_snapshot(self.population);
        }
        if self.age % MUTATION_EVERY == 0 && rng.random::<f64>() < 0.12 + env.radiation * 0.04 {
            self.genome = self.genome.mutate(rng, env.radiation);
            self.generation += 1;
            self.update_adaptations();
        }
        self.reclassify();
    }

    /// Speciation: a quarter of the population leaves with a strongly
    /// diverged genome and becomes a new species.
    pub fn split<R: Rng + ?Sized>(
        &mut self,
        child_id: SpeciesId,
        env: &Environment,
        rng: &mut R,
    ) -> Species {
        let genome = self.genome.mutate(rng, env.radiation * 2.0);
        let child_population = self.population / 4;
        self.population -= child_population;
        if self.population == 0 {
            self.go_extinct();
        }

        let position = [
            self.position[0] + rng.random_range(-SPLIT_JITTER..=SPLIT_JITTER),
            self.position[1] + rng.random_range(-SPLIT_JITTER..=SPLIT_JITTER),
        ];
        let velocity = random_velocity(rng);
        let name = naming::child_name(&self.name, rng);
        let color = naming::jitter_color(self.color, rng);

        let mut child = Species::new(child_id, genome, child_population)
            .with_name(name)
            .with_color(color)
            .at(position, velocity);
        child.generation = self.generation + 1;
        child.adaptations = self.adaptations.clone();
        child.update_adaptations();
        child.reclassify();
        child
    }
}

/// Runs one tick of the species at `idx` against the whole roster.
///
/// Species are processed in roster order by the caller, and predation reads
/// and writes other roster members immediately, so earlier updates in the
/// same tick are visible to later species.
pub fn tick_species<R: Rng + ?Sized>(
    roster: &mut [Species],
    idx: usize,
    env: &Environment,
    rng: &mut R,
) -> TickOutcome {
    let Some(species) = roster.get_mut(idx) else {
        return TickOutcome::Skipped;
    };
    if species.extinct {
        return TickOutcome::Skipped;
    }
    let Some(cap) = species.advance(env, rng) else {
        return TickOutcome::Extinct;
    };

    if prey_upon(roster, idx, cap) {
        return TickOutcome::Extinct;
    }

    roster[idx].finish_tick(env, rng);
    TickOutcome::Survived
}

/// Lets every stronger, nearby live species feed on `roster[idx]`.
/// Returns `true` if the prey was wiped out, which ends the pass early.
pub(crate) fn prey_upon(roster: &mut [Species], idx: usize, cap: u64) -> bool {
    for j in 0..roster.len() {
        if j == idx || roster[j].extinct {
            continue;
        }
        let advantage = roster[j].gene(GeneKey::Aggression) - roster[idx].gene(GeneKey::Aggression);
        if roster[idx].distance_to(&roster[j]) >= PREDATION_RADIUS
            || advantage <= PREDATION_MIN_ADVANTAGE
        {
            continue;
        }

        let prey = floor_mul(roster[idx].population, 0.04 * advantage / 10.0);
        roster[idx].population = roster[idx].population.saturating_sub(prey);

        let predator = &mut roster[j];
        let fed = cap.min(predator.population.saturating_add(prey / 2));
        predator.population = predator.population.max(fed);

        if roster[idx].population == 0 {
            roster[idx].go_extinct();
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::Genome;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    fn calm_env() -> Environment {
        Environment {
            catastrophes: 0.0,
            volcanic: 0.0,
            radiation: 0.0,
            ..Environment::default()
        }
    }

    fn species(id: u64, aggression: f64, population: u64, position: [f64; 2]) -> Species {
        Species::new(
            id,
            Genome::with_overrides([(GeneKey::Aggression, aggression)]),
            population,
        )
        .at(position, [0.0, 0.0])
    }

    #[test]
    fn extinct_species_are_skipped() {
        let mut roster = vec![species(1, 1.0, 0, [0.5, 0.5])];
        let mut rng = ChaCha12Rng::seed_from_u64(1);
        let outcome = tick_species(&mut roster, 0, &calm_env(), &mut rng);
        assert_eq!(outcome, TickOutcome::Skipped);
        assert_eq!(roster[0].age, 0);
    }

    #[test]
    fn small_population_survives_calm_tick() {
        // At most floor(10 * 0.2 * 1.5) = 3 natural deaths, so 10 cannot die out.
        let mut rng = ChaCha12Rng::seed_from_u64(2);
        for _ in 0..50 {
            let mut roster = vec![Species::new(
                1,
                Genome::with_overrides([(GeneKey::Reproduction, 0.0)]),
                10,
            )];
            let outcome = tick_species(&mut roster, 0, &calm_env(), &mut rng);
            assert_eq!(outcome, TickOutcome::Survived);
            assert!(roster[0].population() >= 7 && roster[0].population() <= 10);
            assert_eq!(roster[0].is_extinct(), roster[0].population() == 0);
        }
    }

    #[test]
    fn population_is_capped_by_carrying_capacity() {
        let env = Environment {
            resources: 1.0,
            ..calm_env()
        };
        let mut roster = vec![Species::new(1, Genome::default(), 10_000)];
        let mut rng = ChaCha12Rng::seed_from_u64(3);
        tick_species(&mut roster, 0, &env, &mut rng);
        // floor(1 * 120 * 1.25)
        assert_eq!(roster[0].population(), 150);
    }

    #[test]
    fn zero_resources_extinguish() {
        let env = Environment {
            resources: 0.0,
            ..calm_env()
        };
        let mut roster = vec![Species::new(1, Genome::default(), 500)];
        let mut rng = ChaCha12Rng::seed_from_u64(4);
        assert_eq!(tick_species(&mut roster, 0, &env, &mut rng), TickOutcome::Extinct);
        assert!(roster[0].is_extinct());
    }

    #[test]
    fn walls_bounce() {
        let mut s = Species::new(1, Genome::default(), 10).at([0.96, 0.5], [0.05, -0.01]);
        s.integrate_motion();
        assert_eq!(s.position[0], POS_MAX);
        assert!(s.velocity[0] < 0.0);
        assert!((s.position[1] - 0.49).abs() < 1e-12);
        assert_eq!(s.velocity[1], -0.01);
    }

    #[test]
    fn weaker_species_loses_to_nearby_predator() {
        let mut roster = vec![
            species(1, 1.0, 1_000, [0.5, 0.5]),
            species(2, 4.0, 200, [0.55, 0.55]),
        ];
        let wiped = prey_upon(&mut roster, 0, 10_000);
        assert!(!wiped);
        // floor(1000 * 0.04 * 3 / 10) = 12 taken, 6 gained.
        assert_eq!(roster[0].population(), 988);
        assert_eq!(roster[1].population(), 206);
    }

    #[test]
    fn predator_gain_never_lowers_population_above_cap() {
        let mut roster = vec![
            species(1, 1.0, 1_000, [0.5, 0.5]),
            species(2, 4.0, 900, [0.5, 0.5]),
        ];
        prey_upon(&mut roster, 0, 300);
        assert_eq!(roster[0].population(), 988);
        assert_eq!(roster[1].population(), 900);
    }

    #[test]
    fn distant_or_marginal_predators_are_ignored() {
        let mut roster = vec![
            species(1, 1.0, 1_000, [0.2, 0.2]),
            species(2, 9.0, 100, [0.6, 0.6]),
            species(3, 2.5, 100, [0.2, 0.2]),
        ];
        prey_upon(&mut roster, 0, 10_000);
        assert_eq!(roster[0].population(), 1_000);
        assert_eq!(roster[1].population(), 100);
        assert_eq!(roster[2].population(), 100);
    }

    #[test]
    fn each_stronger_neighbour_feeds_in_roster_order() {
        let mut roster = vec![
            species(1, 0.0, 25, [0.5, 0.5]),
            species(2, 10.0, 10, [0.5, 0.5]),
            species(3, 10.0, 10, [0.5, 0.5]),
        ];
        // floor(25 * 0.04) = 1 for the first predator, then floor(24 * 0.04) = 0.
        assert!(!prey_upon(&mut roster, 0, 100));
        assert_eq!(roster[0].population(), 24);
        assert_eq!(roster[1].population(), 10, "prey / 2 rounds down to zero");
        assert_eq!(roster[2].population(), 10);
    }

    #[test]
    fn emptied_prey_ends_the_predation_pass() {
        let mut roster = vec![
            species(1, 0.0, 0, [0.5, 0.5]),
            species(2, 10.0, 10, [0.5, 0.5]),
            species(3, 10.0, 10, [0.5, 0.5]),
        ];
        // A bite takes at most 4%, so only a prey already emptied this tick
        // can be finished off.
        roster[0].extinct = false;
        assert!(prey_upon(&mut roster, 0, 100));
        assert!(roster[0].is_extinct());
        assert_eq!(roster[0].population(), 0);
        assert_eq!(roster[1].population(), 10);
        assert_eq!(roster[2].population(), 10);
    }

    #[test]
    fn predator_gain_saturates_at_huge_populations() {
        let mut roster = vec![
            species(1, 0.0, 1_000, [0.5, 0.5]),
            species(2, 10.0, u64::MAX, [0.5, 0.5]),
        ];
        assert!(!prey_upon(&mut roster, 0, u64::MAX));
        assert_eq!(roster[0].population(), 960);
        assert_eq!(roster[1].population(), u64::MAX);
    }

    #[test]
    fn huge_population_is_clamped_to_capacity() {
        let genome = Genome::with_overrides([
            (GeneKey::Reproduction, 10.0),
            (GeneKey::Speed, 10.0),
            (GeneKey::Camouflage, 10.0),
            (GeneKey::Intelligence, 10.0),
        ]);
        let mut roster = vec![Species::new(1, genome, u64::MAX)];
        let mut rng = ChaCha12Rng::seed_from_u64(6);
        let outcome = tick_species(&mut roster, 0, &calm_env(), &mut rng);
        assert_eq!(outcome, TickOutcome::Survived);
        // floor(5 * 120 * (1 + 10 * 0.25))
        assert_eq!(roster[0].population(), 2_100);
    }

    #[test]
    fn ten_individuals_die_out_only_when_deaths_reach_ten() {
        for (deaths, extinct) in [(9, false), (10, true), (25, true)] {
            let mut s = Species::new(1, Genome::default(), 10);
            assert_eq!(s.suffer_deaths(deaths), extinct, "{deaths} deaths");
            assert_eq!(s.is_extinct(), extinct);
            assert_eq!(s.population(), 10u64.saturating_sub(deaths));
        }
    }

    #[test]
    fn split_moves_a_quarter_into_the_child() {
        let mut parent = Species::new(1, Genome::default(), 401)
            .with_name("Protozoa primus")
            .at([0.5, 0.5], [0.0, 0.0]);
        parent.generation = 3;
        parent.adaptations.push("Master of speed".into());
        let mut rng = ChaCha12Rng::seed_from_u64(9);
        let child = parent.split(7, &Environment::default(), &mut rng);
        assert_eq!(child.id, 7);
        assert_eq!(child.population(), 100);
        assert_eq!(parent.population(), 301);
        assert_eq!(child.generation, 4);
        assert!(child.name.starts_with("Protozoa "));
        assert!(child.adaptations.contains(&"Master of speed".to_string()));
        for axis in 0..2 {
            assert!((child.position[axis] - 0.5).abs() <= SPLIT_JITTER + 1e-12);
        }
    }

    #[test]
    fn snapshots_every_sixty_ticks() {
        let fertile = Genome::with_overrides([(GeneKey::Reproduction, 8.0)]);
        let mut roster = vec![Species::new(1, fertile, 100)];
        let mut rng = ChaCha12Rng::seed_from_u64(5);
        for _ in 0..125 {
            tick_species(&mut roster, 0, &calm_env(), &mut rng);
        }
        assert_eq!(roster[0].history().len(), 2);
    }
}

use evolution_core::persistence;
use evolution_core::{SimConfig, World};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use std::time::Instant;

fn create_worlds(count: usize, seed: u64) -> Vec<World> {
    let mut rng = ChaCha12Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            World::new(SimConfig {
                seed: rng.random(),
                initial_species: rng.random_range(3..=12),
                ..SimConfig::default()
            })
        })
        .collect()
}

fn main() {
    let num_worlds = 50;
    let ticks = 5_000;
    println!("Benchmarking {} worlds for {} ticks each", num_worlds, ticks);

    let mut worlds = create_worlds(num_worlds, 42);

    let start = Instant::now();
    for world in &mut worlds {
        world.tick(ticks);
    }
    let duration_ticks = start.elapsed();
    println!("Time for {} ticks across all worlds: {:?}", ticks, duration_ticks);
    println!(
        "Avg time per world tick: {:?}",
        duration_ticks / (ticks as u32 * num_worlds as u32)
    );

    let start = Instant::now();
    let mut bytes = 0;
    for world in &worlds {
        match persistence::to_json_string(world) {
            Ok(text) => bytes += text.len(),
            Err(e) => eprintln!("save failed: {e}"),
        }
    }
    let duration_save = start.elapsed();
    println!("Time to serialise all worlds: {:?} ({} bytes)", duration_save, bytes);

    let live: usize = worlds.iter().map(World::live_count).sum();
    let extinct: u64 = worlds.iter().map(World::total_extinct).sum();
    let max_generation = worlds
        .iter()
        .map(|w| w.stats().max_generation)
        .max()
        .unwrap_or(0);
    println!(
        "Live species: {} | total extinctions: {} | deepest generation: {}",
        live, extinct, max_generation
    );
}

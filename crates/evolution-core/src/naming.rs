//! Binomial species names and display colours.

use rand::Rng;

static GENUS_HEADS: &[&str] = &[
    "Proto", "Cyano", "Myco", "Xeno", "Thermo", "Hydro", "Litho", "Pyro", "Cryo", "Halo",
    "Necto", "Ptero", "Velo", "Arche", "Helio", "Noctu",
];

static GENUS_TAILS: &[&str] = &[
    "zoa", "bion", "pod", "morpha", "cyte", "saurus", "phyta", "derma", "gnathus", "ceros",
];

static EPITHETS: &[&str] = &[
    "primus", "vulgaris", "ferox", "agilis", "minutus", "gigas", "aquaticus", "sapiens",
    "tenax", "velox", "obscurus", "lucidus", "borealis", "australis", "ignotus", "novus",
];

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, pool: &[&'a str]) -> &'a str {
    pool[rng.random_range(0..pool.len())]
}

pub fn species_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "{}{} {}",
        pick(rng, GENUS_HEADS),
        pick(rng, GENUS_TAILS),
        pick(rng, EPITHETS)
    )
}

/// Offspring keep the parent's genus and receive a fresh epithet.
pub fn child_name<R: Rng + ?Sized>(parent: &str, rng: &mut R) -> String {
    let genus = parent.split_whitespace().next().unwrap_or(parent);
    let epithet = pick(rng, EPITHETS);
    format!("{genus} {epithet}")
}

/// Saturated colour from a random hue; alpha is always 1.
pub fn random_color<R: Rng + ?Sized>(rng: &mut R) -> [f32; 4] {
    let hue: f32 = rng.random_range(0.0..6.0);
    let x = 1.0 - ((hue % 2.0) - 1.0).abs();
    let (r, g, b) = match hue as u32 {
        0 => (1.0, x, 0.0),
        1 => (x, 1.0, 0.0),
        2 => (0.0, 1.0, x),
        3 => (0.0, x, 1.0),
        4 => (x, 0.0, 1.0),
        _ => (1.0, 0.0, x),
    };
    // Keep colours off pure black/white so they read on a dark map.
    [0.2 + 0.8 * r, 0.2 + 0.8 * g, 0.2 + 0.8 * b, 1.0]
}

pub fn jitter_color<R: Rng + ?Sized>(color: [f32; 4], rng: &mut R) -> [f32; 4] {
    let mut out = color;
    for channel in out.iter_mut().take(3) {
        *channel = (*channel + rng.random_range(-0.15f32..=0.15)).clamp(0.0, 1.0);
    }
    out[3] = 1.0;
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    #[test]
    fn names_are_binomial_and_deterministic() {
        let a = species_name(&mut ChaCha12Rng::seed_from_u64(1));
        let b = species_name(&mut ChaCha12Rng::seed_from_u64(1));
        assert_eq!(a, b);
        assert_eq!(a.split_whitespace().count(), 2);
    }

    #[test]
    fn child_keeps_genus() {
        let mut rng = ChaCha12Rng::seed_from_u64(2);
        let child = child_name("Protozoa primus", &mut rng);
        assert!(child.starts_with("Protozoa "));
    }

    #[test]
    fn colours_stay_in_unit_range() {
        let mut rng = ChaCha12Rng::seed_from_u64(3);
        for _ in 0..100 {
            let c = jitter_color(random_color(&mut rng), &mut rng);
            assert!(c.iter().all(|v| (0.0..=1.0).contains(v)));
            assert_eq!(c[3], 1.0);
        }
    }
}

pub mod config;
pub mod environment;
pub mod genome;
pub mod naming;
pub mod persistence;
pub mod species;
pub mod world;

pub use config::{Mode, SimConfig, SimConfigError};
pub use environment::{EnvParam, Environment};
pub use genome::{Gene, GeneKey, Genome};
pub use species::{Phase, Species, SpeciesId};
pub use world::{Intervention, InterventionError, InterventionReport, World, WorldStats};

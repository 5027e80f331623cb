//! Rotating group assignment.
//!
//! A [`Mixer`] splits a population into groups of fixed sizes, round after
//! round, so that every pair of persons ends up sharing a group about as often
//! as any other pair. Together and apart constraints are honored first, in
//! list order.
//!
//! ```
//! use group_mixer::{Constraint, Mixer, MixerConfig};
//!
//! let persons = ["A", "B", "C", "D", "E", "F"].map(String::from).into_iter().collect();
//! let groups = [("g1".to_string(), 3), ("g2".to_string(), 3)].into_iter().collect();
//! let constraints = vec![Constraint::together(["A", "B"]).in_group("g1")];
//! let config = MixerConfig::new().with_random_seed(7);
//!
//! let mut mixer = Mixer::with_config(&config, persons, groups, Vec::new(), constraints).unwrap();
//! let entry = mixer.new_entry().unwrap();
//! assert!(entry["g1"].contains("A") && entry["g1"].contains("B"));
//! mixer.save_entry(entry).unwrap();
//! ```

pub mod action;
pub mod cache;
pub mod config;
pub mod engine;
pub mod generate;
pub mod interchange;
pub mod model;
pub mod util;
pub mod validate;

pub use cache::{OccurrenceSummary, Occurrences};
pub use config::MixerConfig;
pub use engine::{MixError, Mixer};
pub use generate::{EntryGenerator, GenerateError};
pub use model::condition::Constraint;
pub use model::entity::{GroupId, PersonId, Population};
pub use model::group::{Entry, GroupSizes, History};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{debug, info};

use crate::cache::Occurrences;
use crate::config::MixerConfig;
use crate::generate::{EntryGenerator, GenerateError};
use crate::model::condition::Constraint;
use crate::model::entity::{GroupId, PersonId, Population};
use crate::model::group::{find_duplicate, total_capacity, Entry, GroupSizes, History};
use crate::validate::{validate_constraints, ConstraintError};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum MixError {
    #[error("group '{group}' has a null size")]
    NonPositiveGroupSize { group: GroupId },
    #[error("the groups cannot contain all the persons ({persons} persons, {capacity} seats)")]
    InsufficientCapacity { persons: usize, capacity: usize },
    #[error("person '{person}' appears more than once in round {round}")]
    DuplicatePlacement { person: PersonId, round: usize },
    #[error(transparent)]
    Constraint(#[from] ConstraintError),
    #[error(transparent)]
    Generate(#[from] GenerateError),
}

/// Owns the population, the groups, the history and the constraints, and
/// produces new rounds from them.
///
/// Every mutation is validated first; a rejected one leaves the mixer as it was.
#[derive(Debug, Clone)]
pub struct Mixer {
    population: Population,
    group_sizes: GroupSizes,
    history: History,
    constraints: Vec<Constraint>,
    rng: SmallRng,
}

impl Mixer {
    pub fn new(
        population: Population,
        group_sizes: GroupSizes,
        history: History,
        constraints: Vec<Constraint>,
    ) -> Result<Mixer, MixError> {
        Mixer::with_config(&MixerConfig::default(), population, group_sizes, history, constraints)
    }

    pub fn with_config(
        config: &MixerConfig,
        population: Population,
        group_sizes: GroupSizes,
        history: History,
        constraints: Vec<Constraint>,
    ) -> Result<Mixer, MixError> {
        check_setup(&population, &group_sizes, &constraints)?;
        for (round, entry) in history.iter().enumerate() {
            check_entry(entry, round)?;
        }

        let rng = match config.random_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Ok(Mixer { population, group_sizes, history, constraints, rng })
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn group_sizes(&self) -> &GroupSizes {
        &self.group_sizes
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn capacity(&self) -> usize {
        total_capacity(&self.group_sizes)
    }

    pub fn occurrences(&self) -> Occurrences {
        Occurrences::compute(&self.population, &self.group_sizes, &self.history)
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = SmallRng::seed_from_u64(seed);
    }

    pub fn set_population(&mut self, population: Population) -> Result<(), MixError> {
        check_setup(&population, &self.group_sizes, &self.constraints).map_err(rejected)?;
        self.population = population;
        Ok(())
    }

    pub fn set_group_sizes(&mut self, group_sizes: GroupSizes) -> Result<(), MixError> {
        check_setup(&self.population, &group_sizes, &self.constraints).map_err(rejected)?;
        self.group_sizes = group_sizes;
        Ok(())
    }

    pub fn set_constraints(&mut self, constraints: Vec<Constraint>) -> Result<(), MixError> {
        check_setup(&self.population, &self.group_sizes, &constraints).map_err(rejected)?;
        self.constraints = constraints;
        Ok(())
    }

    /// Generates the next round with the mixer's own random source.
    ///
    /// The round is not added to the history; see [`Mixer::save_entry`].
    pub fn new_entry(&mut self) -> Result<Entry, MixError> {
        let Mixer { population, group_sizes, history, constraints, rng } = self;
        generate_entry(population, group_sizes, history, constraints, rng)
    }

    /// Generates the next round, breaking ties with `rng`.
    pub fn new_entry_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Entry, MixError> {
        generate_entry(&self.population, &self.group_sizes, &self.history, &self.constraints, rng)
    }

    /// Appends `entry` to the history.
    ///
    /// Only the no-duplicate rule is checked: an entry edited by the caller may
    /// leave persons out or overfill a group.
    pub fn save_entry(&mut self, entry: Entry) -> Result<(), MixError> {
        let round = self.history.len();
        check_entry(&entry, round).map_err(rejected)?;
        info!(event = "entry_saved", round = round, groups = entry.len());
        self.history.push(entry);
        Ok(())
    }
}

fn generate_entry<R: Rng + ?Sized>(
    population: &Population,
    group_sizes: &GroupSizes,
    history: &History,
    constraints: &[Constraint],
    rng: &mut R,
) -> Result<Entry, MixError> {
    let occurrences = Occurrences::compute(population, group_sizes, history);
    let entry = EntryGenerator::new(population, group_sizes, &occurrences, constraints).generate(rng)?;
    info!(
        event = "entry_generated",
        round = history.len(),
        persons = population.len(),
        groups = entry.len(),
    );
    Ok(entry)
}

fn rejected(err: MixError) -> MixError {
    debug!(event = "mutation_rejected", error = %err);
    err
}

fn check_setup(
    population: &Population,
    group_sizes: &GroupSizes,
    constraints: &[Constraint],
) -> Result<(), MixError> {
    check_group_sizes(group_sizes)?;
    check_capacity(population, group_sizes)?;
    validate_constraints(constraints, population, group_sizes)?;
    Ok(())
}

fn check_group_sizes(group_sizes: &GroupSizes) -> Result<(), MixError> {
    match group_sizes.iter().find(|(_, size)| **size == 0) {
        Some((group, _)) => Err(MixError::NonPositiveGroupSize { group: group.clone() }),
        None => Ok(()),
    }
}

fn check_capacity(population: &Population, group_sizes: &GroupSizes) -> Result<(), MixError> {
    let capacity = total_capacity(group_sizes);
    if population.len() > capacity {
        return Err(MixError::InsufficientCapacity { persons: population.len(), capacity });
    }
    Ok(())
}

fn check_entry(entry: &Entry, round: usize) -> Result<(), MixError> {
    match find_duplicate(entry) {
        Some(person) => Err(MixError::DuplicatePlacement { person: person.clone(), round }),
        None => Ok(()),
    }
}

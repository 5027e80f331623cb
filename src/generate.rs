use std::collections::VecDeque;
use std::slice;

use indexmap::IndexSet;
use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, warn};

use crate::action::{ActionError, Draft};
use crate::cache::{Occurrences, PersonOccurrence};
use crate::model::condition::Constraint;
use crate::model::entity::{GroupId, PersonId, Population};
use crate::model::group::{Entry, GroupSizes};
use crate::util::{choose, shuffled, Mean};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum GenerateError {
    #[error("constraint #{index} cannot be satisfied: {reason}")]
    Unsatisfiable { index: usize, reason: String },
    #[error("no group can take person '{person}'")]
    NoGroupAvailable { person: PersonId },
    #[error("{} persons were left without a group", unplaced.len())]
    Incomplete { unplaced: Vec<PersonId> },
    #[error(transparent)]
    Action(#[from] ActionError),
}

fn unsatisfiable(index: usize, reason: impl Into<String>) -> GenerateError {
    GenerateError::Unsatisfiable { index, reason: reason.into() }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    ConstraintsPending,
    BulkPairingPending,
    FillRemaining,
    Done,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::ConstraintsPending => "constraints_pending",
            Phase::BulkPairingPending => "bulk_pairing_pending",
            Phase::FillRemaining => "fill_remaining",
            Phase::Done => "done",
        }
    }
}

/// Builds one entry from precomputed occurrence statistics.
///
/// Constraints are resolved first, in list order. Pairs of persons who have
/// rarely been together are then seeded into empty groups, and everyone left
/// joins the group whose members they have met the least. Every tie is broken
/// through the supplied random source, so a seeded source gives a
/// reproducible entry.
///
/// A generator produces a single entry: [`EntryGenerator::generate`] consumes it.
pub struct EntryGenerator<'a> {
    population: &'a Population,
    group_sizes: &'a GroupSizes,
    occurrences: &'a Occurrences,
    constraints: &'a [Constraint],
}

impl<'a> EntryGenerator<'a> {
    pub fn new(
        population: &'a Population,
        group_sizes: &'a GroupSizes,
        occurrences: &'a Occurrences,
        constraints: &'a [Constraint],
    ) -> EntryGenerator<'a> {
        EntryGenerator { population, group_sizes, occurrences, constraints }
    }

    pub fn generate<R: Rng + ?Sized>(self, rng: &mut R) -> Result<Entry, GenerateError> {
        let mut draft = Draft::new(self.population, self.group_sizes);

        enter(Phase::ConstraintsPending, &draft);
        for (index, constraint) in self.constraints.iter().enumerate() {
            debug!(event = "constraint", index = index, kind = constraint.kind(), persons = constraint.persons().len());
            draft = match constraint {
                Constraint::Apart { persons } => self.satisfy_apart(draft, index, persons, rng)?,
                Constraint::Together { persons, mandatory_group, forbidden_groups } => self
                    .satisfy_together(
                        draft,
                        index,
                        persons,
                        mandatory_group.as_ref(),
                        forbidden_groups.as_ref(),
                        rng,
                    )?,
            };
        }

        enter(Phase::BulkPairingPending, &draft);
        draft = self.insert_least_paired_couples(draft, rng)?;

        enter(Phase::FillRemaining, &draft);
        draft = self.insert_remaining(draft, rng)?;

        enter(Phase::Done, &draft);
        if !draft.unplaced().is_empty() {
            return Err(GenerateError::Incomplete {
                unplaced: draft.unplaced().iter().cloned().collect(),
            });
        }
        Ok(draft.into_entry())
    }

    fn satisfy_apart<R: Rng + ?Sized>(
        &self,
        mut draft: Draft,
        index: usize,
        persons: &IndexSet<PersonId>,
        rng: &mut R,
    ) -> Result<Draft, GenerateError> {
        let sorted = self.by_pairing_count(persons, rng);
        let mut available: IndexSet<GroupId> = draft
            .group_ids()
            .filter(|group| !draft.is_full(group))
            .cloned()
            .collect();
        let mut priority: IndexSet<GroupId> = available
            .iter()
            .filter(|group| draft.occupancy(group) > 0)
            .cloned()
            .collect();

        let mut taken: IndexSet<&GroupId> = IndexSet::new();
        for person in &sorted {
            if let Some(group) = draft.group_of(person) {
                if !taken.insert(group) {
                    return Err(unsatisfiable(
                        index,
                        format!("members are already placed together in group '{group}'"),
                    ));
                }
                available.shift_remove(group);
                priority.shift_remove(group);
            }
        }

        let pending = sorted.into_iter().filter(|p| draft.is_unplaced(p)).collect_vec();
        for person in pending {
            let group = match self.route(&draft, &person, &priority, rng) {
                Some(group) => group,
                None => {
                    let best = self.best_by_group_occurrences(&draft, slice::from_ref(&person), &available);
                    choose(rng, &best).ok_or_else(|| {
                        unsatisfiable(index, format!("no group left to keep '{person}' apart"))
                    })?
                }
            };
            draft = draft.place(&person, &group)?;
            available.shift_remove(&group);
            priority.shift_remove(&group);
        }
        Ok(draft)
    }

    fn satisfy_together<R: Rng + ?Sized>(
        &self,
        draft: Draft,
        index: usize,
        persons: &IndexSet<PersonId>,
        mandatory_group: Option<&GroupId>,
        forbidden_groups: Option<&IndexSet<GroupId>>,
        rng: &mut R,
    ) -> Result<Draft, GenerateError> {
        let sorted = self.by_pairing_count(persons, rng);
        let used: IndexSet<GroupId> = sorted
            .iter()
            .filter_map(|person| draft.group_of(person))
            .cloned()
            .collect();

        if !used.is_empty() {
            return self.join_placed_members(draft, index, sorted, used, mandatory_group, forbidden_groups, rng);
        }

        if let Some(group) = mandatory_group {
            let room = draft.room(group);
            if room == 0 {
                return Err(unsatisfiable(index, format!("mandatory group '{group}' is already full")));
            }
            if room < sorted.len() {
                warn!(
                    event = "together_spill",
                    constraint = index,
                    group = %group,
                    placed = room,
                    spilled = sorted.len() - room,
                );
            }
            return Ok(draft.place_all(sorted.iter().take(room), group)?);
        }

        let candidates: IndexSet<GroupId> = draft
            .group_ids()
            .filter(|group| forbidden_groups.map_or(true, |forbidden| !forbidden.contains(*group)))
            .cloned()
            .collect();
        let mut party = sorted;
        let best = loop {
            if party.is_empty() {
                return Err(unsatisfiable(index, "no allowed group has room left"));
            }
            let mut best = self.best_by_person_occurrences(&draft, &party, &candidates);
            if best.is_empty() {
                best = self.best_by_group_occurrences(&draft, &party, &candidates);
            } else if best.len() > 1 {
                best = self.best_by_group_occurrences(&draft, &party, &best);
            }
            if !best.is_empty() {
                break best;
            }
            // the member with the most past pairings is dropped first
            party.pop();
        };
        if party.len() < persons.len() {
            warn!(
                event = "together_spill",
                constraint = index,
                placed = party.len(),
                spilled = persons.len() - party.len(),
            );
        }
        let group = choose(rng, &best).ok_or_else(|| unsatisfiable(index, "no allowed group has room left"))?;
        Ok(draft.place_all(&party, &group)?)
    }

    /// Routes the unplaced members of a together constraint to the group where
    /// part of the party already sits.
    #[allow(clippy::too_many_arguments)]
    fn join_placed_members<R: Rng + ?Sized>(
        &self,
        mut draft: Draft,
        index: usize,
        sorted: Vec<PersonId>,
        used: IndexSet<GroupId>,
        mandatory_group: Option<&GroupId>,
        forbidden_groups: Option<&IndexSet<GroupId>>,
        rng: &mut R,
    ) -> Result<Draft, GenerateError> {
        if used.len() > 1 {
            return Err(unsatisfiable(
                index,
                format!("members are already split across groups {}", used.iter().join(", ")),
            ));
        }
        if let Some(group) = mandatory_group.filter(|group| !used.contains(*group)) {
            return Err(unsatisfiable(
                index,
                format!("members are already placed outside mandatory group '{group}'"),
            ));
        }
        if let Some(group) = forbidden_groups.and_then(|forbidden| used.iter().find(|g| forbidden.contains(*g))) {
            return Err(unsatisfiable(
                index,
                format!("members are already placed in forbidden group '{group}'"),
            ));
        }

        let pending = sorted.into_iter().filter(|p| draft.is_unplaced(p)).collect_vec();
        for person in pending {
            let group = self
                .route(&draft, &person, &used, rng)
                .ok_or_else(|| unsatisfiable(index, format!("no room left for '{person}' with the rest of the party")))?;
            draft = draft.place(&person, &group)?;
        }
        Ok(draft)
    }

    fn insert_least_paired_couples<R: Rng + ?Sized>(
        &self,
        mut draft: Draft,
        rng: &mut R,
    ) -> Result<Draft, GenerateError> {
        let mut pairs: Vec<&PersonOccurrence> = self.occurrences.person_occurrences().collect();
        pairs.shuffle(rng);
        pairs.sort_by_key(|occurrence| {
            let first = self.occurrences.pairing_count(occurrence.pair.first());
            let second = self.occurrences.pairing_count(occurrence.pair.second());
            (occurrence.count, first.min(second))
        });

        let mut empty: IndexSet<GroupId> = draft
            .group_ids()
            .filter(|group| draft.occupancy(group) == 0)
            .cloned()
            .collect();

        for occurrence in pairs {
            if draft.unplaced().len() < 2 {
                break;
            }
            let couple = [occurrence.pair.first().clone(), occurrence.pair.second().clone()];
            if !couple.iter().all(|person| draft.is_unplaced(person)) {
                continue;
            }
            let best = self.best_by_group_occurrences(&draft, &couple, &empty);
            let Some(group) = choose(rng, &best) else {
                break;
            };
            draft = draft.place_all(&couple, &group)?;
            empty.shift_remove(&group);
        }
        Ok(draft)
    }

    fn insert_remaining<R: Rng + ?Sized>(&self, mut draft: Draft, rng: &mut R) -> Result<Draft, GenerateError> {
        let mut queue: VecDeque<PersonId> = self.by_pairing_count(draft.unplaced(), rng).into();

        while let Some(person) = queue.pop_front() {
            match self.route(&draft, &person, self.group_sizes.keys(), rng) {
                Some(group) => draft = draft.place(&person, &group)?,
                None => {
                    queue.push_front(person);
                    break;
                }
            }
        }

        // only empty groups are left
        for person in queue {
            let best = self.best_by_group_occurrences(&draft, slice::from_ref(&person), self.group_sizes.keys());
            let group = choose(rng, &best).ok_or_else(|| GenerateError::NoGroupAvailable { person: person.clone() })?;
            draft = draft.place(&person, &group)?;
        }
        Ok(draft)
    }

    /// Best non-empty group of `pool` for a single person, by person
    /// occurrences then group occurrences. Ties left are picked at random.
    fn route<'g, R: Rng + ?Sized>(
        &self,
        draft: &Draft,
        person: &PersonId,
        pool: impl IntoIterator<Item = &'g GroupId>,
        rng: &mut R,
    ) -> Option<GroupId> {
        let persons = slice::from_ref(person);
        let mut best = self.best_by_person_occurrences(draft, persons, pool);
        if best.len() > 1 {
            best = self.best_by_group_occurrences(draft, persons, &best);
        }
        choose(rng, &best)
    }

    /// Non-empty groups with room for all of `persons` whose current members
    /// have the lowest mean pair count with them, keeping the largest ones.
    fn best_by_person_occurrences<'g>(
        &self,
        draft: &Draft,
        persons: &[PersonId],
        candidates: impl IntoIterator<Item = &'g GroupId>,
    ) -> Vec<GroupId> {
        let best = candidates
            .into_iter()
            .filter(|group| {
                let occupancy = draft.occupancy(group);
                occupancy > 0 && occupancy + persons.len() <= draft.capacity(group)
            })
            .min_set_by_key(|group| {
                Mean::of(persons.iter().flat_map(|person| {
                    draft
                        .members(group)
                        .map(move |member| self.occurrences.person_occurrence(person, member))
                }))
            });
        largest(draft, best)
    }

    /// Groups with room for all of `persons` where they have been placed the
    /// least on average, keeping the largest ones.
    fn best_by_group_occurrences<'g>(
        &self,
        draft: &Draft,
        persons: &[PersonId],
        candidates: impl IntoIterator<Item = &'g GroupId>,
    ) -> Vec<GroupId> {
        let best = candidates
            .into_iter()
            .filter(|group| draft.occupancy(group) + persons.len() <= draft.capacity(group))
            .min_set_by_key(|group| {
                Mean::of(persons.iter().map(|person| self.occurrences.group_occurrence(person, group)))
            });
        largest(draft, best)
    }

    /// `persons` in ascending pairing count. Equal counts come out in random order.
    fn by_pairing_count<'p, R: Rng + ?Sized>(
        &self,
        persons: impl IntoIterator<Item = &'p PersonId>,
        rng: &mut R,
    ) -> Vec<PersonId> {
        let mut sorted = shuffled(rng, persons.into_iter().cloned());
        sorted.sort_by_key(|person| self.occurrences.pairing_count(person));
        sorted
    }
}

fn largest(draft: &Draft, groups: Vec<&GroupId>) -> Vec<GroupId> {
    groups
        .into_iter()
        .max_set_by_key(|group| draft.capacity(group))
        .into_iter()
        .cloned()
        .collect()
}

fn enter(phase: Phase, draft: &Draft) {
    debug!(event = "phase", phase = phase.as_str(), unplaced = draft.unplaced().len());
}

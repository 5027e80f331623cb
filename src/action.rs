use indexmap::IndexSet;
use thiserror::Error;

use crate::model::entity::{GroupId, PersonId, Population};
use crate::model::group::{empty_entry, group_of, Entry, GroupSizes};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ActionError {
    #[error("unknown group '{0}'")]
    UnknownGroup(GroupId),
    #[error("unknown person '{0}'")]
    UnknownPerson(PersonId),
    #[error("group '{group}' is full ({capacity} persons)")]
    GroupFull { group: GroupId, capacity: usize },
    #[error("person '{person}' is already placed in group '{group}'")]
    AlreadyPlaced { person: PersonId, group: GroupId },
}

/// A partially built entry together with the persons still waiting for a group.
///
/// Placements consume the draft and hand back the updated one, so each
/// generation step reads as a transformation from one draft to the next.
#[derive(Debug, Clone)]
pub struct Draft {
    entry: Entry,
    capacities: GroupSizes,
    unplaced: IndexSet<PersonId>,
}

impl Draft {
    pub fn new(population: &Population, group_sizes: &GroupSizes) -> Draft {
        Draft {
            entry: empty_entry(group_sizes),
            capacities: group_sizes.clone(),
            unplaced: population.clone(),
        }
    }

    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    pub fn unplaced(&self) -> &IndexSet<PersonId> {
        &self.unplaced
    }

    pub fn is_unplaced(&self, person: &str) -> bool {
        self.unplaced.contains(person)
    }

    pub fn group_of(&self, person: &str) -> Option<&GroupId> {
        group_of(&self.entry, person)
    }

    pub fn group_ids(&self) -> impl Iterator<Item = &GroupId> {
        self.entry.keys()
    }

    pub fn members(&self, group: &str) -> impl Iterator<Item = &PersonId> {
        self.entry.get(group).into_iter().flatten()
    }

    pub fn occupancy(&self, group: &str) -> usize {
        self.entry.get(group).map_or(0, IndexSet::len)
    }

    pub fn capacity(&self, group: &str) -> usize {
        self.capacities.get(group).copied().unwrap_or(0)
    }

    pub fn room(&self, group: &str) -> usize {
        self.capacity(group).saturating_sub(self.occupancy(group))
    }

    pub fn is_full(&self, group: &str) -> bool {
        self.room(group) == 0
    }

    pub fn place(mut self, person: &str, group: &str) -> Result<Draft, ActionError> {
        if !self.unplaced.contains(person) {
            return Err(match self.group_of(person) {
                Some(placed) => ActionError::AlreadyPlaced {
                    person: person.to_owned(),
                    group: placed.clone(),
                },
                None => ActionError::UnknownPerson(person.to_owned()),
            });
        }
        let capacity = self.capacity(group);
        let members = self
            .entry
            .get_mut(group)
            .ok_or_else(|| ActionError::UnknownGroup(group.to_owned()))?;
        if members.len() >= capacity {
            return Err(ActionError::GroupFull { group: group.to_owned(), capacity });
        }
        members.insert(person.to_owned());
        self.unplaced.shift_remove(person);
        Ok(self)
    }

    pub fn place_all<'p>(
        self,
        persons: impl IntoIterator<Item = &'p PersonId>,
        group: &str,
    ) -> Result<Draft, ActionError> {
        persons
            .into_iter()
            .try_fold(self, |draft, person| draft.place(person, group))
    }

    pub fn into_entry(self) -> Entry {
        self.entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> Draft {
        let population: Population = ["a", "b", "c"].iter().map(|p| p.to_string()).collect();
        let sizes: GroupSizes = [("g1".to_string(), 2), ("g2".to_string(), 1)].into_iter().collect();
        Draft::new(&population, &sizes)
    }

    #[test]
    fn placing_moves_person_out_of_unplaced() {
        let draft = draft().place("a", "g1").unwrap();
        assert!(!draft.is_unplaced("a"));
        assert_eq!(draft.group_of("a").map(String::as_str), Some("g1"));
        assert_eq!(draft.occupancy("g1"), 1);
        assert_eq!(draft.room("g1"), 1);
        assert_eq!(draft.unplaced().len(), 2);
    }

    #[test]
    fn placement_errors() {
        let draft = draft().place("a", "g2").unwrap();
        assert_eq!(
            draft.clone().place("b", "g2").unwrap_err(),
            ActionError::GroupFull { group: "g2".into(), capacity: 1 }
        );
        assert_eq!(
            draft.clone().place("a", "g1").unwrap_err(),
            ActionError::AlreadyPlaced { person: "a".into(), group: "g2".into() }
        );
        assert_eq!(draft.clone().place("z", "g1").unwrap_err(), ActionError::UnknownPerson("z".into()));
        assert_eq!(draft.place("b", "g9").unwrap_err(), ActionError::UnknownGroup("g9".into()));
    }

    #[test]
    fn place_all_stops_at_capacity() {
        let persons = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let err = draft().place_all(&persons, "g1").unwrap_err();
        assert_eq!(err, ActionError::GroupFull { group: "g1".into(), capacity: 2 });
        let draft = draft().place_all(&persons[..2], "g1").unwrap();
        assert!(draft.is_full("g1"));
        assert_eq!(draft.members("g1").count(), 2);
    }
}

use indexmap::IndexMap;
use itertools::Itertools;

use crate::model::entity::{group_key, GroupId, GroupKey, PairKey, PersonId, Population};
use crate::model::group::{GroupSizes, History};
use crate::util::Mean;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonOccurrence {
    pub pair: PairKey,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupOccurrence {
    pub person: PersonId,
    pub group: GroupId,
    pub count: usize,
}

/// Distribution of the pair counts in an [`Occurrences`].
#[derive(Debug, Clone, PartialEq)]
pub struct OccurrenceSummary {
    pub pairs: usize,
    pub min: usize,
    pub max: usize,
    pub mean: f64,
}

/// Statistics accumulated from the history for the current population and groups.
///
/// Only pairs of current persons and (current person, current group) keys are
/// tracked. Rounds mentioning departed persons or removed groups still count
/// toward the pairing count of the current persons who sat with them.
#[derive(Debug, Clone)]
pub struct Occurrences {
    pairing_counts: IndexMap<PersonId, usize>,
    person_occurrences: IndexMap<PairKey, PersonOccurrence>,
    group_occurrences: IndexMap<GroupKey, GroupOccurrence>,
}

impl Occurrences {
    pub fn compute(population: &Population, group_sizes: &GroupSizes, history: &History) -> Occurrences {
        let mut pairing_counts: IndexMap<PersonId, usize> = population
            .iter()
            .map(|person| (person.clone(), 0))
            .collect();
        let mut person_occurrences: IndexMap<PairKey, PersonOccurrence> = population
            .iter()
            .tuple_combinations()
            .map(|(a, b)| {
                let pair = PairKey::new(a, b);
                (pair.clone(), PersonOccurrence { pair, count: 0 })
            })
            .collect();
        let mut group_occurrences: IndexMap<GroupKey, GroupOccurrence> = population
            .iter()
            .cartesian_product(group_sizes.keys())
            .map(|(person, group)| {
                let occurrence = GroupOccurrence {
                    person: person.clone(),
                    group: group.clone(),
                    count: 0,
                };
                (group_key(person, group), occurrence)
            })
            .collect();

        for entry in history {
            for (group, members) in entry {
                let others = members.len().saturating_sub(1);
                for person in members {
                    if let Some(count) = pairing_counts.get_mut(person) {
                        *count += others;
                    }
                    if let Some(occurrence) = group_occurrences.get_mut(&group_key(person, group)) {
                        occurrence.count += 1;
                    }
                }
                for (a, b) in members.iter().tuple_combinations() {
                    if let Some(occurrence) = person_occurrences.get_mut(&PairKey::new(a, b)) {
                        occurrence.count += 1;
                    }
                }
            }
        }

        Occurrences { pairing_counts, person_occurrences, group_occurrences }
    }

    pub fn pairing_count(&self, person: &str) -> usize {
        self.pairing_counts.get(person).copied().unwrap_or(0)
    }

    pub fn person_occurrence(&self, a: &str, b: &str) -> usize {
        self.person_occurrences
            .get(&PairKey::new(a, b))
            .map_or(0, |occurrence| occurrence.count)
    }

    pub fn group_occurrence(&self, person: &str, group: &str) -> usize {
        self.group_occurrences
            .get(&group_key(person, group))
            .map_or(0, |occurrence| occurrence.count)
    }

    pub fn pairing_counts(&self) -> &IndexMap<PersonId, usize> {
        &self.pairing_counts
    }

    pub fn person_occurrences(&self) -> impl Iterator<Item = &PersonOccurrence> {
        self.person_occurrences.values()
    }

    pub fn group_occurrences(&self) -> impl Iterator<Item = &GroupOccurrence> {
        self.group_occurrences.values()
    }

    pub fn max_person_occurrence(&self) -> usize {
        self.person_occurrences().map(|o| o.count).max().unwrap_or(0)
    }

    pub fn summary(&self) -> OccurrenceSummary {
        let counts = self.person_occurrences().map(|o| o.count).collect_vec();
        let (min, max) = counts.iter().copied().minmax().into_option().unwrap_or((0, 0));
        let mean = Mean::of(counts.iter().copied()).value();
        OccurrenceSummary { pairs: counts.len(), min, max, mean }
    }
}

#[cfg(test)]
mod tests {
    use indexmap::{IndexMap, IndexSet};

    use super::*;
    use crate::model::group::Entry;

    fn population(ids: &[&str]) -> Population {
        ids.iter().map(|id| id.to_string()).collect()
    }

    fn sizes(groups: &[(&str, usize)]) -> GroupSizes {
        groups.iter().map(|(g, n)| (g.to_string(), *n)).collect()
    }

    fn entry(groups: &[(&str, &[&str])]) -> Entry {
        groups
            .iter()
            .map(|(g, members)| (g.to_string(), members.iter().map(|m| m.to_string()).collect::<IndexSet<_>>()))
            .collect::<IndexMap<_, _>>()
    }

    #[test]
    fn empty_history_is_all_zero() {
        let occurrences = Occurrences::compute(
            &population(&["a", "b", "c"]),
            &sizes(&[("g1", 2), ("g2", 2)]),
            &Vec::new(),
        );
        assert_eq!(occurrences.person_occurrences().count(), 3);
        assert_eq!(occurrences.group_occurrences().count(), 6);
        assert!(occurrences.pairing_counts().values().all(|c| *c == 0));
        assert_eq!(occurrences.max_person_occurrence(), 0);
    }

    #[test]
    fn history_accumulates() {
        let history = vec![
            entry(&[("g1", &["a", "b", "c"]), ("g2", &["d"])]),
            entry(&[("g1", &["a", "d"]), ("g2", &["b", "c"])]),
        ];
        let occurrences = Occurrences::compute(
            &population(&["a", "b", "c", "d"]),
            &sizes(&[("g1", 3), ("g2", 3)]),
            &history,
        );
        assert_eq!(occurrences.pairing_count("a"), 3);
        assert_eq!(occurrences.pairing_count("d"), 1);
        assert_eq!(occurrences.person_occurrence("c", "b"), 2);
        assert_eq!(occurrences.person_occurrence("a", "d"), 1);
        assert_eq!(occurrences.person_occurrence("b", "d"), 0);
        assert_eq!(occurrences.group_occurrence("a", "g1"), 2);
        assert_eq!(occurrences.group_occurrence("d", "g2"), 1);
        assert_eq!(occurrences.max_person_occurrence(), 2);

        let summary = occurrences.summary();
        assert_eq!(summary.pairs, 6);
        assert_eq!((summary.min, summary.max), (0, 2));
        assert_eq!(summary.mean, 5.0 / 6.0);
    }

    #[test]
    fn departed_persons_and_groups_are_ignored() {
        let history = vec![entry(&[("g1", &["a", "gone"]), ("old", &["b"])])];
        let occurrences = Occurrences::compute(&population(&["a", "b"]), &sizes(&[("g1", 2)]), &history);
        assert_eq!(occurrences.pairing_count("a"), 1);
        assert_eq!(occurrences.pairing_count("gone"), 0);
        assert_eq!(occurrences.person_occurrences().count(), 1);
        assert_eq!(occurrences.group_occurrence("b", "old"), 0);
        assert_eq!(occurrences.group_occurrences().count(), 2);
    }
}

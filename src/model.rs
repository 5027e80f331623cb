pub mod entity {
    use indexmap::IndexSet;

    pub type PersonId = String;
    pub type GroupId = String;
    pub type Population = IndexSet<PersonId>;

    /// Unordered pair of persons. `PairKey::new(a, b) == PairKey::new(b, a)`.
    #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct PairKey(PersonId, PersonId);

    impl PairKey {
        pub fn new(a: &str, b: &str) -> PairKey {
            if a <= b {
                PairKey(a.to_owned(), b.to_owned())
            } else {
                PairKey(b.to_owned(), a.to_owned())
            }
        }
        pub fn first(&self) -> &PersonId {
            &self.0
        }
        pub fn second(&self) -> &PersonId {
            &self.1
        }
    }

    /// Key of a (person, group) statistic.
    pub type GroupKey = (PersonId, GroupId);

    pub fn group_key(person: &str, group: &str) -> GroupKey {
        (person.to_owned(), group.to_owned())
    }
}


pub mod group {
    use indexmap::{IndexMap, IndexSet};
    use super::entity::{GroupId, PersonId};

    /// Capacity of every group, in declaration order.
    pub type GroupSizes = IndexMap<GroupId, usize>;

    /// One round: the persons placed in each group.
    pub type Entry = IndexMap<GroupId, IndexSet<PersonId>>;

    /// Past rounds, oldest first.
    pub type History = Vec<Entry>;

    /// Seats across all groups. Saturates instead of overflowing.
    pub fn total_capacity(group_sizes: &GroupSizes) -> usize {
        group_sizes.values().fold(0usize, |total, size| total.saturating_add(*size))
    }

    pub fn empty_entry(group_sizes: &GroupSizes) -> Entry {
        group_sizes.keys().map(|group| (group.clone(), IndexSet::new())).collect()
    }

    /// First person found in more than one group of `entry`, if any.
    pub fn find_duplicate(entry: &Entry) -> Option<&PersonId> {
        let mut seen = IndexSet::new();
        entry.values().flatten().find(|person| !seen.insert(*person))
    }

    pub fn group_of<'a>(entry: &'a Entry, person: &str) -> Option<&'a GroupId> {
        entry
            .iter()
            .find(|(_, members)| members.contains(person))
            .map(|(group, _)| group)
    }
}

pub mod condition {
    use indexmap::IndexSet;
    use super::entity::{GroupId, PersonId};

    /// A hard requirement on the next entry. Constraints are applied in list order.
    #[derive(Debug, Clone, PartialEq)]
    pub enum Constraint {
        /// All `persons` share one group, optionally pinned to `mandatory_group`
        /// and never inside `forbidden_groups`.
        Together {
            persons: IndexSet<PersonId>,
            mandatory_group: Option<GroupId>,
            forbidden_groups: Option<IndexSet<GroupId>>,
        },
        /// No two of `persons` share a group.
        Apart {
            persons: IndexSet<PersonId>,
        },
    }

    impl Constraint {
        pub fn together<I, P>(persons: I) -> Constraint
        where
            I: IntoIterator<Item = P>,
            P: Into<PersonId>,
        {
            Constraint::Together {
                persons: persons.into_iter().map(Into::into).collect(),
                mandatory_group: None,
                forbidden_groups: None,
            }
        }

        pub fn apart<I, P>(persons: I) -> Constraint
        where
            I: IntoIterator<Item = P>,
            P: Into<PersonId>,
        {
            Constraint::Apart {
                persons: persons.into_iter().map(Into::into).collect(),
            }
        }

        /// Pins a together constraint to `group`. No effect on apart constraints.
        pub fn in_group(mut self, group: impl Into<GroupId>) -> Constraint {
            if let Constraint::Together { mandatory_group, .. } = &mut self {
                *mandatory_group = Some(group.into());
            }
            self
        }

        /// Excludes `groups` for a together constraint. No effect on apart constraints.
        pub fn not_in_groups<I, G>(mut self, groups: I) -> Constraint
        where
            I: IntoIterator<Item = G>,
            G: Into<GroupId>,
        {
            if let Constraint::Together { forbidden_groups, .. } = &mut self {
                *forbidden_groups = Some(groups.into_iter().map(Into::into).collect());
            }
            self
        }

        pub fn persons(&self) -> &IndexSet<PersonId> {
            match self {
                Constraint::Together { persons, .. } | Constraint::Apart { persons } => persons,
            }
        }

        pub fn kind(&self) -> &'static str {
            match self {
                Constraint::Together { .. } => "together",
                Constraint::Apart { .. } => "apart",
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use indexmap::{IndexMap, IndexSet};

    use super::condition::Constraint;
    use super::entity::PairKey;
    use super::group::{find_duplicate, group_of, total_capacity, Entry, GroupSizes};

    fn entry(groups: &[(&str, &[&str])]) -> Entry {
        groups
            .iter()
            .map(|(group, members)| {
                (group.to_string(), members.iter().map(|m| m.to_string()).collect::<IndexSet<_>>())
            })
            .collect::<IndexMap<_, _>>()
    }

    #[test]
    fn pair_key_is_unordered() {
        assert_eq!(PairKey::new("bob", "alice"), PairKey::new("alice", "bob"));
        let key = PairKey::new("bob", "alice");
        assert_eq!(key.first(), "alice");
        assert_eq!(key.second(), "bob");
    }

    #[test]
    fn duplicate_detection() {
        let ok = entry(&[("g1", &["a", "b"]), ("g2", &["c"])]);
        assert_eq!(find_duplicate(&ok), None);
        let bad = entry(&[("g1", &["a", "b"]), ("g2", &["c", "a"])]);
        assert_eq!(find_duplicate(&bad).map(String::as_str), Some("a"));
        assert_eq!(group_of(&ok, "c").map(String::as_str), Some("g2"));
        assert_eq!(group_of(&ok, "z"), None);
    }

    #[test]
    fn total_capacity_saturates() {
        let sizes: GroupSizes = [("g1".to_string(), 3), ("g2".to_string(), 4)].into_iter().collect();
        assert_eq!(total_capacity(&sizes), 7);
        let huge: GroupSizes = [("g1".to_string(), usize::MAX), ("g2".to_string(), 1)].into_iter().collect();
        assert_eq!(total_capacity(&huge), usize::MAX);
    }

    #[test]
    fn constraint_builders() {
        let together = Constraint::together(["a", "b"]).in_group("g1").not_in_groups(["g2"]);
        match &together {
            Constraint::Together { persons, mandatory_group, forbidden_groups } => {
                assert_eq!(persons.len(), 2);
                assert_eq!(mandatory_group.as_deref(), Some("g1"));
                assert!(forbidden_groups.as_ref().is_some_and(|f| f.contains("g2")));
            }
            Constraint::Apart { .. } => panic!("expected together"),
        }
        let apart = Constraint::apart(["a", "b"]).in_group("g1");
        assert_eq!(apart, Constraint::apart(["a", "b"]));
        assert_eq!(apart.kind(), "apart");
    }
}

use thiserror::Error;

use crate::model::condition::Constraint;
use crate::model::entity::{GroupId, PersonId, Population};
use crate::model::group::GroupSizes;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConstraintError {
    #[error("constraint #{index} has no persons")]
    EmptyPersons { index: usize },
    #[error("the person '{person}' in constraint #{index} does not exist")]
    UnknownPerson { index: usize, person: PersonId },
    #[error("the mandatory group '{group}' in constraint #{index} does not exist")]
    UnknownMandatoryGroup { index: usize, group: GroupId },
    #[error("the forbidden group '{group}' in constraint #{index} does not exist")]
    UnknownForbiddenGroup { index: usize, group: GroupId },
    #[error("constraint #{index} forbids every group")]
    AllGroupsForbidden { index: usize },
    #[error("constraint #{index} both requires and forbids group '{group}'")]
    MandatoryGroupForbidden { index: usize, group: GroupId },
    #[error("constraint #{index} keeps {persons} persons apart but there are only {groups} groups")]
    ApartExceedsGroups { index: usize, persons: usize, groups: usize },
}

/// Structural check of `constraints` against the population and the groups.
///
/// Interactions between constraints (a mandatory group filled by an earlier
/// constraint, a party split by an earlier apart) are only detected while
/// generating an entry.
pub fn validate_constraints(
    constraints: &[Constraint],
    population: &Population,
    group_sizes: &GroupSizes,
) -> Result<(), ConstraintError> {
    for (index, constraint) in constraints.iter().enumerate() {
        let persons = constraint.persons();
        if persons.is_empty() {
            return Err(ConstraintError::EmptyPersons { index });
        }
        if let Some(person) = persons.iter().find(|p| !population.contains(*p)) {
            return Err(ConstraintError::UnknownPerson { index, person: person.clone() });
        }
        match constraint {
            Constraint::Together { mandatory_group, forbidden_groups, .. } => {
                if let Some(group) = mandatory_group {
                    if !group_sizes.contains_key(group) {
                        return Err(ConstraintError::UnknownMandatoryGroup { index, group: group.clone() });
                    }
                }
                if let Some(forbidden) = forbidden_groups {
                    if let Some(group) = forbidden.iter().find(|g| !group_sizes.contains_key(*g)) {
                        return Err(ConstraintError::UnknownForbiddenGroup { index, group: group.clone() });
                    }
                    if let Some(group) = mandatory_group.as_ref().filter(|g| forbidden.contains(*g)) {
                        return Err(ConstraintError::MandatoryGroupForbidden { index, group: group.clone() });
                    }
                    if group_sizes.keys().all(|g| forbidden.contains(g)) {
                        return Err(ConstraintError::AllGroupsForbidden { index });
                    }
                }
            }
            Constraint::Apart { persons } => {
                if persons.len() > group_sizes.len() {
                    return Err(ConstraintError::ApartExceedsGroups {
                        index,
                        persons: persons.len(),
                        groups: group_sizes.len(),
                    });
                }
            }
        }
    }
    Ok(())
}

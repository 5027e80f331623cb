//! Plain records for moving a project in and out of the mixer.
//!
//! Sets become lists and ordered maps become plain objects, in the same
//! order they were imported, so `export(import(x)) == x` for any record
//! whose person lists hold no duplicates. A history round that names a
//! person twice is rejected on import.
//!
//! ```
//! use group_mixer::interchange::ProjectRecord;
//!
//! let project = ProjectRecord::from_json_str(r#"{
//!     "persons": ["ann", "bob", "cid"],
//!     "groupSizes": {"g1": 2, "g2": 2},
//!     "constraints": [{"type": "apart", "persons": ["ann", "bob"]}]
//! }"#).unwrap();
//! let mixer = project.clone().into_mixer(&Default::default()).unwrap();
//! assert_eq!(mixer.population().len(), 3);
//! ```

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::MixerConfig;
use crate::engine::{MixError, Mixer};
use crate::model::condition::Constraint;
use crate::model::entity::Population;
use crate::model::group::{Entry, GroupSizes, History};

#[derive(Debug, Error)]
pub enum InterchangeError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Mix(#[from] MixError),
}

pub type GroupSizesRecord = IndexMap<String, usize>;
pub type EntryRecord = IndexMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ConstraintRecord {
    Together {
        #[serde(alias = "personIds")]
        persons: Vec<String>,
        #[serde(rename = "mandatoryGroup", default, skip_serializing_if = "Option::is_none")]
        mandatory_group: Option<String>,
        #[serde(rename = "forbiddenGroups", default, skip_serializing_if = "Option::is_none")]
        forbidden_groups: Option<Vec<String>>,
    },
    Apart {
        #[serde(alias = "personIds")]
        persons: Vec<String>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub persons: Vec<String>,
    pub group_sizes: GroupSizesRecord,
    #[serde(default)]
    pub history: Vec<EntryRecord>,
    #[serde(default)]
    pub constraints: Vec<ConstraintRecord>,
}

impl ProjectRecord {
    pub fn from_json_str(s: &str) -> Result<Self, InterchangeError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn to_json_string(&self) -> Result<String, InterchangeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn into_mixer(self, config: &MixerConfig) -> Result<Mixer, InterchangeError> {
        let mixer = Mixer::with_config(
            config,
            import_persons(self.persons),
            import_group_sizes(self.group_sizes),
            import_history(self.history)?,
            import_constraints(self.constraints),
        )?;
        Ok(mixer)
    }

    pub fn from_mixer(mixer: &Mixer) -> Self {
        ProjectRecord {
            persons: export_persons(mixer.population()),
            group_sizes: export_group_sizes(mixer.group_sizes()),
            history: export_history(mixer.history()),
            constraints: export_constraints(mixer.constraints()),
        }
    }
}

pub fn import_persons(persons: Vec<String>) -> Population {
    persons.into_iter().collect()
}

pub fn import_group_sizes(group_sizes: GroupSizesRecord) -> GroupSizes {
    group_sizes
}

/// Converts the record of round `round`. A person listed twice inside one
/// group is a [`MixError::DuplicatePlacement`]; duplicates across groups are
/// left to the mixer's own entry check.
pub fn import_entry(entry: EntryRecord, round: usize) -> Result<Entry, MixError> {
    entry
        .into_iter()
        .map(|(group, members)| {
            let mut seen = IndexSet::with_capacity(members.len());
            for person in members {
                if seen.contains(&person) {
                    return Err(MixError::DuplicatePlacement { person, round });
                }
                seen.insert(person);
            }
            Ok((group, seen))
        })
        .collect()
}

pub fn import_history(history: Vec<EntryRecord>) -> Result<History, MixError> {
    history
        .into_iter()
        .enumerate()
        .map(|(round, entry)| import_entry(entry, round))
        .collect()
}

pub fn import_constraint(constraint: ConstraintRecord) -> Constraint {
    match constraint {
        ConstraintRecord::Together { persons, mandatory_group, forbidden_groups } => Constraint::Together {
            persons: persons.into_iter().collect(),
            mandatory_group,
            forbidden_groups: forbidden_groups.map(|groups| groups.into_iter().collect()),
        },
        ConstraintRecord::Apart { persons } => Constraint::Apart {
            persons: persons.into_iter().collect(),
        },
    }
}

pub fn import_constraints(constraints: Vec<ConstraintRecord>) -> Vec<Constraint> {
    constraints.into_iter().map(import_constraint).collect()
}

pub fn export_persons(population: &Population) -> Vec<String> {
    population.iter().cloned().collect()
}

pub fn export_group_sizes(group_sizes: &GroupSizes) -> GroupSizesRecord {
    group_sizes.clone()
}

pub fn export_entry(entry: &Entry) -> EntryRecord {
    entry
        .iter()
        .map(|(group, members)| (group.clone(), members.iter().cloned().collect()))
        .collect()
}

pub fn export_history(history: &History) -> Vec<EntryRecord> {
    history.iter().map(export_entry).collect()
}

pub fn export_constraint(constraint: &Constraint) -> ConstraintRecord {
    match constraint {
        Constraint::Together { persons, mandatory_group, forbidden_groups } => ConstraintRecord::Together {
            persons: persons.iter().cloned().collect(),
            mandatory_group: mandatory_group.clone(),
            forbidden_groups: forbidden_groups.as_ref().map(|groups| groups.iter().cloned().collect()),
        },
        Constraint::Apart { persons } => ConstraintRecord::Apart {
            persons: persons.iter().cloned().collect(),
        },
    }
}

pub fn export_constraints(constraints: &[Constraint]) -> Vec<ConstraintRecord> {
    constraints.iter().map(export_constraint).collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn project_json() -> serde_json::Value {
        json!({
            "persons": ["Timothé", "François", "Laurent", "Théo", "Arnaud", "Jean"],
            "groupSizes": {"g2": 3, "g1": 3},
            "history": [
                {"g1": ["Timothé", "François", "Laurent"], "g2": ["Théo", "Arnaud", "Jean"]}
            ],
            "constraints": [
                {"type": "together", "persons": ["Timothé", "François"], "mandatoryGroup": "g1"},
                {"type": "together", "persons": ["Jean"], "forbiddenGroups": ["g2"]},
                {"type": "apart", "persons": ["Arnaud", "Laurent"]}
            ]
        })
    }

    #[test]
    fn project_round_trips_through_mixer() {
        let record: ProjectRecord = serde_json::from_value(project_json()).unwrap();
        let mixer = record.clone().into_mixer(&MixerConfig::new().with_random_seed(3)).unwrap();
        let exported = ProjectRecord::from_mixer(&mixer);
        assert_eq!(exported, record);
        assert_eq!(serde_json::to_value(&exported).unwrap(), project_json());
    }

    #[test]
    fn json_string_round_trip() {
        let record: ProjectRecord = serde_json::from_value(project_json()).unwrap();
        let text = record.to_json_string().unwrap();
        assert_eq!(ProjectRecord::from_json_str(&text).unwrap(), record);
    }

    #[test]
    fn constraint_records() {
        let records: Vec<ConstraintRecord> = serde_json::from_value(json!([
            {"type": "together", "personIds": ["a"], "forbiddenGroups": []},
            {"type": "apart", "persons": ["a", "b"]}
        ]))
        .unwrap();
        let constraints = import_constraints(records.clone());
        assert_eq!(constraints[1], Constraint::apart(["a", "b"]));
        assert_eq!(export_constraints(&constraints), records);
        assert_eq!(
            serde_json::to_value(&records[0]).unwrap(),
            json!({"type": "together", "persons": ["a"], "forbiddenGroups": []})
        );
        assert!(serde_json::from_value::<ConstraintRecord>(json!({"type": "near", "persons": []})).is_err());
    }

    #[test]
    fn entry_keeps_member_order() {
        let record: EntryRecord = serde_json::from_str(r#"{"g1": ["c", "a", "b"], "g0": []}"#).unwrap();
        let entry = import_entry(record.clone(), 0).unwrap();
        assert_eq!(entry.keys().collect::<Vec<_>>(), ["g1", "g0"]);
        assert_eq!(export_entry(&entry), record);
        assert_eq!(
            serde_json::to_string(&export_entry(&entry)).unwrap(),
            r#"{"g1":["c","a","b"],"g0":[]}"#
        );
    }

    #[test]
    fn repeated_member_in_history_is_rejected() {
        let history: Vec<EntryRecord> = serde_json::from_str(
            r#"[{"g1": ["a", "b"], "g2": ["c"]}, {"g1": ["a", "c", "a"], "g2": ["b"]}]"#,
        )
        .unwrap();
        assert_eq!(
            import_history(history.clone()).unwrap_err(),
            MixError::DuplicatePlacement { person: "a".into(), round: 1 }
        );
        let project = ProjectRecord {
            persons: vec!["a".into(), "b".into(), "c".into()],
            group_sizes: [("g1".to_string(), 3), ("g2".to_string(), 3)].into_iter().collect(),
            history,
            constraints: Vec::new(),
        };
        assert!(matches!(
            project.into_mixer(&MixerConfig::default()),
            Err(InterchangeError::Mix(MixError::DuplicatePlacement { round: 1, .. }))
        ));
    }

    #[test]
    fn invalid_project_is_rejected() {
        let err = ProjectRecord::from_json_str(r#"{"persons": ["a", "b"], "groupSizes": {"g1": 1}}"#)
            .unwrap()
            .into_mixer(&MixerConfig::default())
            .unwrap_err();
        assert!(matches!(err, InterchangeError::Mix(MixError::InsufficientCapacity { .. })));
        assert!(matches!(ProjectRecord::from_json_str("{"), Err(InterchangeError::Json(_))));
    }
}

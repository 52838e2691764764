//! Mutually-exclusive template groups.
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::template::{ObjectType, TemplateName};

/// A set of templates of which at most one spawns per selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionGroup {
    pub name: String,
    pub object_type: ObjectType,
    /// Member names in discovery order.
    pub members: Vec<TemplateName>,
}

impl ExclusionGroup {
    pub fn new(name: impl Into<String>, object_type: impl Into<ObjectType>) -> Self {
        Self {
            name: name.into(),
            object_type: object_type.into(),
            members: Vec::new(),
        }
    }
}

/// Maps exclusion group names to their members.
#[derive(Debug, Clone, Default)]
pub struct ExclusionIndex {
    groups: HashMap<String, ExclusionGroup>,
}

impl ExclusionIndex {
    pub fn new() -> Self {
        Self {
            groups: HashMap::new(),
        }
    }

    /// Adds `template` to `group`, creating the group on first sight.
    ///
    /// Returns `true` if the group was created by this call. Fails when the template's object
    /// type differs from the one the group was created with; the index is left unchanged.
    pub fn add_member(
        &mut self,
        group: &str,
        template: &str,
        object_type: &str,
    ) -> Result<bool> {
        let created = !self.groups.contains_key(group);
        let entry = self
            .groups
            .entry(group.to_owned())
            .or_insert_with(|| ExclusionGroup::new(group, object_type));

        if entry.object_type != object_type {
            return Err(Error::ExclusionTypeMismatch {
                group: group.to_owned(),
                template: template.to_owned(),
                expected: entry.object_type.clone(),
                found: object_type.to_owned(),
            });
        }

        entry.members.push(template.to_owned());
        Ok(created)
    }

    pub fn get(&self, group: &str) -> Option<&ExclusionGroup> {
        self.groups.get(group)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

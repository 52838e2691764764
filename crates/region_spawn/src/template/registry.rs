//! Registry of named templates with routing into candidates, exclusion groups and stages.
use std::collections::HashMap;

use tracing::debug;

use crate::error::{Error, Result};
use crate::selection::{Candidate, CandidateIndex};
use crate::template::exclusion::ExclusionIndex;
use crate::template::stage::StageQueue;
use crate::template::{Template, TemplateName};

/// Where a template ended up after [`TemplateRegistry::register`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// Indexed for the initial generation pass.
    Immediate,
    /// Parked in the stage queue.
    Deferred { stage: u32 },
    /// Authored for a different theater; dropped.
    TheaterMismatch { expected: String, found: String },
}

/// Owns every template of a region and the indexes derived from them.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: HashMap<TemplateName, Template>,
    exclusions: ExclusionIndex,
    candidates: CandidateIndex,
    stages: StageQueue,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a template authored for `active_theater`.
    ///
    /// Duplicate names and exclusion groups spanning object types are errors. A template for
    /// another theater is not an error; it is reported as [`Registration::TheaterMismatch`] and
    /// nothing is stored.
    pub fn register(&mut self, template: Template, active_theater: &str) -> Result<Registration> {
        if self.contains(&template.name) {
            return Err(Error::DuplicateTemplate {
                name: template.name,
            });
        }

        if template.theater != active_theater {
            return Ok(Registration::TheaterMismatch {
                expected: active_theater.to_owned(),
                found: template.theater,
            });
        }

        if !template.is_immediate() {
            let stage = template.stage;
            debug!("Deferring template '{}' to stage {}.", template.name, stage);
            self.stages.push(template);
            return Ok(Registration::Deferred { stage });
        }

        index_template(&template, &mut self.exclusions, &mut self.candidates)?;
        self.templates.insert(template.name.clone(), template);
        Ok(Registration::Immediate)
    }

    /// Stores a template by name without indexing it as a candidate or routing it by stage.
    pub fn insert_direct(&mut self, template: Template) -> Result<()> {
        if self.contains(&template.name) {
            return Err(Error::DuplicateTemplate {
                name: template.name,
            });
        }
        self.templates.insert(template.name.clone(), template);
        Ok(())
    }

    /// Moves the templates of `stage` out of the queue into the registry.
    ///
    /// Returns the candidates and exclusion groups formed by those templates alone; groups
    /// registered in other stages do not take part. The whole bucket is validated before anything
    /// moves, so on error the queue and the registry are unchanged.
    pub fn admit_stage(&mut self, stage: u32) -> Result<(CandidateIndex, ExclusionIndex)> {
        let mut exclusions = ExclusionIndex::new();
        let mut candidates = CandidateIndex::new();
        for template in self.stages.pending(stage) {
            if self.templates.contains_key(&template.name) {
                return Err(Error::DuplicateTemplate {
                    name: template.name.clone(),
                });
            }
            index_template(template, &mut exclusions, &mut candidates)?;
        }
        for template in self.stages.take(stage) {
            self.templates.insert(template.name.clone(), template);
        }
        Ok((candidates, exclusions))
    }

    /// Returns admitted templates to their stage buckets, in the given order.
    pub fn restore_stage(&mut self, names: &[TemplateName]) {
        for name in names {
            if let Some(template) = self.templates.remove(name) {
                debug!("Returning template '{}' to stage {}.", name, template.stage);
                self.stages.push(template);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    /// Returns `true` if the name is taken, either by a stored or a deferred template.
    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name) || self.stages.contains(name)
    }

    pub fn exclusions(&self) -> &ExclusionIndex {
        &self.exclusions
    }

    pub fn candidates(&self) -> &CandidateIndex {
        &self.candidates
    }

    pub fn stages(&self) -> &StageQueue {
        &self.stages
    }

    /// Number of stored (non-deferred) templates.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

fn index_template(
    template: &Template,
    exclusions: &mut ExclusionIndex,
    candidates: &mut CandidateIndex,
) -> Result<()> {
    let entry = match &template.exclusion_group {
        Some(group) => {
            let created = exclusions.add_member(group, &template.name, &template.object_type)?;
            if !created {
                return Ok(());
            }
            Candidate::ExclusionGroup(group.clone())
        }
        None => Candidate::Template(template.name.clone()),
    };
    candidates
        .entry(template.object_type.clone())
        .or_default()
        .push(entry);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const THEATER: &str = "Caucasus";

    fn template(name: &str, object_type: &str) -> Template {
        Template::new(name, object_type, THEATER)
    }

    #[test]
    fn unique_registrations_are_all_stored() {
        let mut registry = TemplateRegistry::new();
        for i in 0..5 {
            let r = registry
                .register(template(&format!("t{i}"), "sam"), THEATER)
                .unwrap();
            assert_eq!(r, Registration::Immediate);
        }
        assert_eq!(registry.len(), 5);
        assert_eq!(registry.candidates()["sam"].len(), 5);
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let mut registry = TemplateRegistry::new();
        registry.register(template("a", "sam"), THEATER).unwrap();
        let err = registry.register(template("a", "ewr"), THEATER).unwrap_err();
        assert!(matches!(err, Error::DuplicateTemplate { ref name } if name == "a"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_of_deferred_template_is_rejected() {
        let mut registry = TemplateRegistry::new();
        registry
            .register(template("late", "sam").with_stage(2), THEATER)
            .unwrap();
        assert!(registry.register(template("late", "sam"), THEATER).is_err());
    }

    #[test]
    fn theater_mismatch_is_dropped() {
        let mut registry = TemplateRegistry::new();
        let r = registry
            .register(Template::new("a", "sam", "Syria"), THEATER)
            .unwrap();
        assert!(matches!(r, Registration::TheaterMismatch { .. }));
        assert!(registry.get("a").is_none());
        assert!(registry.candidates().is_empty());
    }

    #[test]
    fn deferred_templates_are_not_candidates() {
        let mut registry = TemplateRegistry::new();
        let r = registry
            .register(template("late", "sam").with_stage(2), THEATER)
            .unwrap();
        assert_eq!(r, Registration::Deferred { stage: 2 });
        assert!(registry.get("late").is_none());
        assert!(registry.candidates().is_empty());
        assert_eq!(registry.stages().pending(2).len(), 1);
    }

    #[test]
    fn exclusion_group_yields_single_candidate() {
        let mut registry = TemplateRegistry::new();
        for name in ["x", "y", "z"] {
            registry
                .register(template(name, "sam").with_exclusion_group("g"), THEATER)
                .unwrap();
        }
        registry.register(template("solo", "sam"), THEATER).unwrap();

        assert_eq!(
            registry.candidates()["sam"],
            vec![
                Candidate::ExclusionGroup("g".into()),
                Candidate::Template("solo".into())
            ]
        );
        assert_eq!(registry.exclusions().get("g").unwrap().members.len(), 3);
        assert!(registry.get("y").is_some());
    }

    #[test]
    fn exclusion_group_with_mixed_types_fails_on_second_member() {
        let mut registry = TemplateRegistry::new();
        registry
            .register(template("a", "sam").with_exclusion_group("g"), THEATER)
            .unwrap();
        let err = registry
            .register(template("b", "ewr").with_exclusion_group("g"), THEATER)
            .unwrap_err();
        assert!(matches!(err, Error::ExclusionTypeMismatch { .. }));
        assert!(registry.get("b").is_none());
    }

    #[test]
    fn admit_stage_builds_local_indexes() {
        let mut registry = TemplateRegistry::new();
        registry
            .register(template("a", "ship").with_stage(2), THEATER)
            .unwrap();
        registry
            .register(
                template("b", "sam").with_stage(2).with_exclusion_group("g"),
                THEATER,
            )
            .unwrap();
        registry
            .register(template("c", "sam").with_stage(3), THEATER)
            .unwrap();

        let (candidates, exclusions) = registry.admit_stage(2).unwrap();
        assert_eq!(candidates.len(), 2);
        assert!(exclusions.get("g").is_some());
        assert!(registry.get("a").is_some());
        assert!(registry.get("c").is_none());

        let (again, _) = registry.admit_stage(2).unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn failed_admission_leaves_bucket_in_place() {
        let mut registry = TemplateRegistry::new();
        for t in [
            template("a", "sam").with_exclusion_group("g"),
            template("b", "ewr").with_exclusion_group("g"),
            template("c", "ship"),
        ] {
            registry.register(t.with_stage(2), THEATER).unwrap();
        }

        let err = registry.admit_stage(2).unwrap_err();
        assert!(matches!(err, Error::ExclusionTypeMismatch { .. }));
        assert!(registry.is_empty());
        assert_eq!(registry.stages().pending(2).len(), 3);
    }

    #[test]
    fn restore_stage_requeues_in_order() {
        let mut registry = TemplateRegistry::new();
        for name in ["x", "y"] {
            registry
                .register(template(name, "armor").with_stage(4), THEATER)
                .unwrap();
        }
        registry.admit_stage(4).unwrap();
        assert_eq!(registry.len(), 2);

        registry.restore_stage(&["x".to_owned(), "y".to_owned()]);
        assert!(registry.is_empty());
        let names: Vec<_> = registry
            .stages()
            .pending(4)
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(names, vec!["x", "y"]);
        assert!(registry.contains("x"));
    }

    #[test]
    fn insert_direct_skips_candidate_index() {
        let mut registry = TemplateRegistry::new();
        registry
            .insert_direct(template("region_airspace", "airspace"))
            .unwrap();
        assert!(registry.get("region_airspace").is_some());
        assert!(registry.candidates().is_empty());
        assert!(registry
            .insert_direct(template("region_airspace", "airspace"))
            .is_err());
    }
}

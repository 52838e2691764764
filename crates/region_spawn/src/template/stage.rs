//! Deferred templates waiting for a later generation stage.
use std::collections::BTreeMap;

use crate::template::Template;

/// Buckets of templates keyed by stage number.
#[derive(Debug, Clone, Default)]
pub struct StageQueue {
    buckets: BTreeMap<u32, Vec<Template>>,
}

impl StageQueue {
    pub fn new() -> Self {
        Self {
            buckets: BTreeMap::new(),
        }
    }

    pub fn push(&mut self, template: Template) {
        self.buckets.entry(template.stage).or_default().push(template);
    }

    /// Removes and returns the bucket for `stage`. An unknown or already drained stage yields an
    /// empty list.
    pub fn take(&mut self, stage: u32) -> Vec<Template> {
        self.buckets.remove(&stage).unwrap_or_default()
    }

    pub fn pending(&self, stage: u32) -> &[Template] {
        self.buckets.get(&stage).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Stage numbers that still hold templates, ascending.
    pub fn stages(&self) -> impl Iterator<Item = u32> + '_ {
        self.buckets.keys().copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.buckets
            .values()
            .flatten()
            .any(|template| template.name == name)
    }

    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_drains_only_requested_stage() {
        let mut queue = StageQueue::new();
        queue.push(Template::new("a", "sam", "t").with_stage(2));
        queue.push(Template::new("b", "sam", "t").with_stage(2));
        queue.push(Template::new("c", "ship", "t").with_stage(3));

        assert_eq!(queue.stages().collect::<Vec<_>>(), vec![2, 3]);
        let stage_two = queue.take(2);
        assert_eq!(stage_two.len(), 2);
        assert_eq!(stage_two[0].name, "a");
        assert!(queue.take(2).is_empty());
        assert_eq!(queue.pending(3).len(), 1);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn contains_searches_all_buckets() {
        let mut queue = StageQueue::new();
        queue.push(Template::new("late", "ship", "t").with_stage(4));
        assert!(queue.contains("late"));
        assert!(!queue.contains("early"));
    }
}

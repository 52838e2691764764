//! Constraint-bounded random selection of templates for one object type.
//!
//! A selection pass consumes a working list of [`Candidate`]s and spawns templates until the
//! resolved limit is reached or the candidates run out:
//! - templates flagged `spawn_always` are spawned first, unconditionally, and count toward the
//!   limit;
//! - the remaining candidates are drawn uniformly without replacement. Drawing an
//!   [`Candidate::ExclusionGroup`] spawns exactly one uniformly chosen member of that group.
//!
//! Randomness comes from any [rand::RngCore]. [random_int], [random_index] and [pick_uniform]
//! are the only places that turn raw bits into choices.
use std::collections::BTreeMap;

use rand::RngCore;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::template::exclusion::ExclusionIndex;
use crate::template::registry::TemplateRegistry;
use crate::template::{ObjectType, Template, TemplateName};

/// An entry in the per-object-type candidate list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    /// A single concrete template.
    Template(TemplateName),
    /// An exclusion group; one member spawns when the group is drawn.
    ExclusionGroup(String),
}

/// Candidates grouped by object type, in registration order.
pub type CandidateIndex = BTreeMap<ObjectType, Vec<Candidate>>;

/// Configured spawn bounds for one object type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpawnLimits {
    pub min: usize,
    pub max: usize,
}

impl SpawnLimits {
    /// Creates limits, rejecting `min > max`.
    pub fn try_new(min: usize, max: usize) -> Result<Self> {
        let limits = Self { min, max };
        limits.validate()?;
        Ok(limits)
    }

    /// Limits that resolve to exactly `count`.
    pub fn exact(count: usize) -> Self {
        Self {
            min: count,
            max: count,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.min > self.max {
            return Err(Error::InvalidLimits {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Counters of a single selection pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunLimits {
    pub min: usize,
    pub max: usize,
    /// Target drawn from `[min, max]`.
    pub limit: usize,
    /// Templates spawned so far.
    pub current: usize,
}

/// Why a template was spawned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpawnReason {
    /// `spawn_always` override.
    Forced,
    /// Drawn as a standalone candidate.
    Random,
    /// Drawn as the member of an exclusion group.
    Exclusion { group: String },
    /// Region airspace synthesized after generation.
    Airspace,
}

/// Summary of a selection pass.
#[derive(Debug, Clone)]
pub struct SelectionOutcome {
    pub object_type: ObjectType,
    /// Number of candidates the pass started with.
    pub available: usize,
    pub limits: RunLimits,
    /// Spawned templates in spawn order.
    pub spawned: Vec<(TemplateName, SpawnReason)>,
}

/// Draws a uniform integer from the inclusive range `[min, max]`.
///
/// Fails with [`Error::InvalidLimits`] when `min > max`.
pub fn random_int<R: RngCore + ?Sized>(rng: &mut R, min: usize, max: usize) -> Result<usize> {
    if min > max {
        return Err(Error::InvalidLimits { min, max });
    }
    let span = (max - min) as u64;
    if span == u64::MAX {
        return Ok(min + rng.next_u64() as usize);
    }
    Ok(min + bounded(rng, span + 1) as usize)
}

/// Multiply-shift bounded draw in `[0, span)` with rejection of the biased low region.
///
/// Consumes only `next_u64`, so a given `RngCore` (including `FixedRng`-style stubs) yields the
/// same picks regardless of the `rand` distribution code in use.
fn bounded<R: RngCore + ?Sized>(rng: &mut R, span: u64) -> u64 {
    let threshold = span.wrapping_neg() % span;
    loop {
        let m = (rng.next_u64() as u128) * (span as u128);
        if (m as u64) >= threshold {
            return (m >> 64) as u64;
        }
    }
}

/// Draws a uniform index into a collection of `len` elements.
pub fn random_index<R: RngCore + ?Sized>(rng: &mut R, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(bounded(rng, len as u64) as usize)
}

/// Picks a uniformly random element, or `None` for an empty slice.
pub fn pick_uniform<'a, T, R: RngCore + ?Sized>(items: &'a [T], rng: &mut R) -> Option<&'a T> {
    random_index(rng, items.len()).and_then(|idx| items.get(idx))
}

/// Runs selection passes against a template registry and an exclusion index.
pub struct Selector<'a> {
    templates: &'a TemplateRegistry,
    exclusions: &'a ExclusionIndex,
}

impl<'a> Selector<'a> {
    pub fn new(templates: &'a TemplateRegistry, exclusions: &'a ExclusionIndex) -> Self {
        Self {
            templates,
            exclusions,
        }
    }

    /// Selects and spawns templates of `object_type` from `candidates`.
    ///
    /// `limits` defaults to exactly the number of candidates. `spawn` is invoked once per chosen
    /// template; an error from it aborts the pass.
    pub fn select<R, F>(
        &self,
        object_type: &str,
        candidates: Vec<Candidate>,
        limits: Option<SpawnLimits>,
        rng: &mut R,
        mut spawn: F,
    ) -> Result<SelectionOutcome>
    where
        R: RngCore + ?Sized,
        F: FnMut(&Template, &SpawnReason) -> Result<()>,
    {
        let available = candidates.len();
        let limits = limits.unwrap_or(SpawnLimits::exact(available));
        let drawn = random_int(rng, limits.min, limits.max)?;
        let mut run = RunLimits {
            min: limits.min,
            max: limits.max,
            limit: drawn.min(limits.min.max(available)),
            current: 0,
        };
        let mut spawned = Vec::new();

        info!(
            "Selecting '{}': {} candidates, limit {} (min {}, max {}).",
            object_type, available, run.limit, run.min, run.max
        );

        let (forced, mut remaining): (Vec<Candidate>, Vec<Candidate>) =
            candidates.into_iter().partition(|c| self.is_forced(c));

        for candidate in forced {
            if let Candidate::Template(name) = candidate {
                let template = self.template(&name)?;
                spawn(template, &SpawnReason::Forced)?;
                run.current += 1;
                spawned.push((name, SpawnReason::Forced));
            }
        }
        run.limit = run.limit.max(run.current);

        while run.current < run.limit {
            let Some(idx) = random_index(rng, remaining.len()) else {
                break;
            };
            let (name, reason) = match remaining.remove(idx) {
                Candidate::Template(name) => (name, SpawnReason::Random),
                Candidate::ExclusionGroup(group) => {
                    let member = self.exclusion_member(&group, rng)?;
                    (member, SpawnReason::Exclusion { group })
                }
            };
            let template = self.template(&name)?;
            spawn(template, &reason)?;
            run.current += 1;
            spawned.push((name, reason));
        }

        if run.current < run.limit {
            debug!(
                "'{}' under-supplied: spawned {} of {}.",
                object_type, run.current, run.limit
            );
        }

        Ok(SelectionOutcome {
            object_type: object_type.to_owned(),
            available,
            limits: run,
            spawned,
        })
    }

    fn is_forced(&self, candidate: &Candidate) -> bool {
        match candidate {
            Candidate::Template(name) => self
                .templates
                .get(name)
                .is_some_and(|template| template.spawn_always),
            Candidate::ExclusionGroup(_) => false,
        }
    }

    fn template(&self, name: &str) -> Result<&'a Template> {
        self.templates.get(name).ok_or_else(|| Error::UnknownTemplate {
            name: name.to_owned(),
        })
    }

    fn exclusion_member<R: RngCore + ?Sized>(
        &self,
        group: &str,
        rng: &mut R,
    ) -> Result<TemplateName> {
        let members = self
            .exclusions
            .get(group)
            .map(|g| g.members.as_slice())
            .unwrap_or(&[]);
        pick_uniform(members, rng).cloned().ok_or_else(|| {
            Error::InvalidConfig(format!("exclusion group '{group}' has no members"))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    const THEATER: &str = "Caucasus";

    struct FixedRng {
        value: u64,
    }

    impl RngCore for FixedRng {
        fn next_u32(&mut self) -> u32 {
            (self.value >> 32) as u32
        }

        fn next_u64(&mut self) -> u64 {
            self.value
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            let bytes = self.value.to_le_bytes();
            for (i, b) in dest.iter_mut().enumerate() {
                *b = bytes[i % 8];
            }
        }
    }

    fn registry(templates: Vec<Template>) -> TemplateRegistry {
        let mut registry = TemplateRegistry::new();
        for t in templates {
            registry.register(t, THEATER).unwrap();
        }
        registry
    }

    fn run(
        registry: &TemplateRegistry,
        object_type: &str,
        limits: Option<SpawnLimits>,
        rng: &mut impl RngCore,
    ) -> (SelectionOutcome, Vec<String>) {
        let selector = Selector::new(registry, registry.exclusions());
        let candidates = registry
            .candidates()
            .get(object_type)
            .cloned()
            .unwrap_or_default();
        let mut names = Vec::new();
        let outcome = selector
            .select(object_type, candidates, limits, rng, |t, _| {
                names.push(t.name.clone());
                Ok(())
            })
            .unwrap();
        (outcome, names)
    }

    #[test]
    fn random_int_rejects_inverted_range() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            random_int(&mut rng, 3, 2),
            Err(Error::InvalidLimits { min: 3, max: 2 })
        ));
    }

    #[test]
    fn random_int_is_deterministic_for_equal_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..10 {
            assert_eq!(random_int(&mut rng, 4, 4).unwrap(), 4);
        }
    }

    #[test]
    fn random_int_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut seen = HashSet::new();
        for _ in 0..500 {
            let v = random_int(&mut rng, 2, 5).unwrap();
            assert!((2..=5).contains(&v));
            seen.insert(v);
        }
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn pick_uniform_maps_high_bits_to_index() {
        let items = ["a", "b", "c", "d"];
        let mut low = FixedRng { value: 1 << 62 };
        assert_eq!(pick_uniform(&items, &mut low), Some(&"b"));
        let mut high = FixedRng { value: u64::MAX };
        assert_eq!(pick_uniform(&items, &mut high), Some(&"d"));
        let empty: [&str; 0] = [];
        assert!(pick_uniform(&empty, &mut high).is_none());
    }

    #[test]
    fn spawn_limits_validate_bounds() {
        assert!(SpawnLimits::try_new(1, 3).is_ok());
        assert!(SpawnLimits::try_new(4, 3).is_err());
    }

    #[test]
    fn exact_limit_spawns_exactly_k_without_duplicates() {
        let templates = (0..8)
            .map(|i| Template::new(format!("t{i}"), "sam", THEATER))
            .collect();
        let registry = registry(templates);

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let (outcome, names) = run(&registry, "sam", Some(SpawnLimits::exact(3)), &mut rng);
            assert_eq!(names.len(), 3);
            assert_eq!(names.iter().collect::<HashSet<_>>().len(), 3);
            assert_eq!(outcome.limits.current, 3);
            assert_eq!(outcome.limits.limit, 3);
        }
    }

    #[test]
    fn unconfigured_limits_spawn_everything() {
        let registry = registry(vec![
            Template::new("a", "ship", THEATER),
            Template::new("b", "ship", THEATER),
            Template::new("c", "ship", THEATER),
        ]);
        let mut rng = StdRng::seed_from_u64(5);
        let (outcome, names) = run(&registry, "ship", None, &mut rng);
        assert_eq!(outcome.available, 3);
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(sorted, vec!["a", "b", "c"]);
    }

    #[test]
    fn forced_templates_always_spawn_and_count() {
        let registry = registry(vec![
            Template::new("f1", "sam", THEATER).with_spawn_always(true),
            Template::new("r1", "sam", THEATER),
            Template::new("f2", "sam", THEATER).with_spawn_always(true),
            Template::new("r2", "sam", THEATER),
        ]);

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let (outcome, names) = run(&registry, "sam", Some(SpawnLimits::exact(3)), &mut rng);
            assert_eq!(&names[..2], &["f1".to_string(), "f2".to_string()]);
            assert_eq!(names.len(), 3);
            assert_eq!(
                outcome
                    .spawned
                    .iter()
                    .filter(|(_, r)| *r == SpawnReason::Forced)
                    .count(),
                2
            );
        }
    }

    #[test]
    fn forced_templates_exceeding_limit_raise_it() {
        let registry = registry(vec![
            Template::new("f1", "sam", THEATER).with_spawn_always(true),
            Template::new("f2", "sam", THEATER).with_spawn_always(true),
            Template::new("r1", "sam", THEATER),
        ]);
        let mut rng = StdRng::seed_from_u64(3);
        let (outcome, names) = run(&registry, "sam", Some(SpawnLimits::exact(1)), &mut rng);
        assert_eq!(names, vec!["f1", "f2"]);
        assert_eq!(outcome.limits.limit, 2);
        assert_eq!(outcome.limits.current, 2);
    }

    #[test]
    fn under_supply_is_accepted() {
        let registry = registry(vec![Template::new("only", "ewr", THEATER)]);
        let mut rng = StdRng::seed_from_u64(8);
        let (outcome, names) = run(&registry, "ewr", Some(SpawnLimits::exact(5)), &mut rng);
        assert_eq!(names, vec!["only"]);
        // `min` keeps the limit above the single candidate; exhaustion ends the pass.
        assert_eq!(outcome.limits.limit, 5);
        assert_eq!(outcome.limits.current, 1);
    }

    #[test]
    fn limit_is_clamped_to_available_above_min() {
        let registry = registry(
            ["a", "b", "c"]
                .into_iter()
                .map(|n| Template::new(n, "armor", THEATER))
                .collect(),
        );
        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            let limits = SpawnLimits::try_new(1, 10).unwrap();
            let (outcome, names) = run(&registry, "armor", Some(limits), &mut rng);
            assert!((1..=3).contains(&outcome.limits.limit));
            assert_eq!(names.len(), outcome.limits.limit);
        }
    }

    #[test]
    fn exclusion_group_spawns_one_member_uniformly() {
        let registry = registry(
            ["x", "y", "z"]
                .into_iter()
                .map(|n| Template::new(n, "sam", THEATER).with_exclusion_group("g"))
                .collect(),
        );
        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut rng = StdRng::seed_from_u64(2024);
        let trials = 3000;
        for _ in 0..trials {
            let (outcome, names) = run(&registry, "sam", Some(SpawnLimits::exact(1)), &mut rng);
            assert_eq!(names.len(), 1);
            assert_eq!(
                outcome.spawned[0].1,
                SpawnReason::Exclusion { group: "g".into() }
            );
            *counts.entry(names[0].clone()).or_default() += 1;
        }
        for name in ["x", "y", "z"] {
            let c = counts.get(name).copied().unwrap_or(0);
            assert!((800..1200).contains(&c), "{name} drawn {c} times");
        }
    }

    #[test]
    fn exclusion_group_never_spawns_two_members() {
        let registry = registry(
            ["x", "y", "z"]
                .into_iter()
                .map(|n| Template::new(n, "sam", THEATER).with_exclusion_group("g"))
                .collect(),
        );
        let mut rng = StdRng::seed_from_u64(11);
        let (_, names) = run(&registry, "sam", Some(SpawnLimits::exact(3)), &mut rng);
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn forced_member_of_exclusion_group_is_not_forced() {
        let registry = registry(vec![
            Template::new("x", "sam", THEATER)
                .with_exclusion_group("g")
                .with_spawn_always(true),
            Template::new("y", "sam", THEATER).with_exclusion_group("g"),
        ]);
        let mut rng = StdRng::seed_from_u64(4);
        let (_, names) = run(&registry, "sam", Some(SpawnLimits::exact(0)), &mut rng);
        assert!(names.is_empty());
    }

    #[test]
    fn spawn_error_aborts_pass() {
        let registry = registry(vec![
            Template::new("a", "sam", THEATER),
            Template::new("b", "sam", THEATER),
        ]);
        let selector = Selector::new(&registry, registry.exclusions());
        let mut rng = StdRng::seed_from_u64(1);
        let err = selector
            .select(
                "sam",
                registry.candidates()["sam"].clone(),
                None,
                &mut rng,
                |_, _| Err(Error::Asset("factory failed".into())),
            )
            .unwrap_err();
        assert!(matches!(err, Error::Asset(_)));
    }

    #[test]
    fn inverted_limits_fail_fast() {
        let registry = registry(vec![Template::new("a", "sam", THEATER)]);
        let selector = Selector::new(&registry, registry.exclusions());
        let mut rng = StdRng::seed_from_u64(1);
        let result = selector.select(
            "sam",
            registry.candidates()["sam"].clone(),
            Some(SpawnLimits { min: 2, max: 1 }),
            &mut rng,
            |_, _| Ok(()),
        );
        assert!(matches!(result, Err(Error::InvalidLimits { .. })));
    }
}

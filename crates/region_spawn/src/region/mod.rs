//! Regions: the aggregate that owns templates and drives generation.
//!
//! A [`Region`] is filled with templates through [`Region::add_template`] and then generated once
//! with [`Region::generate`]. The initial pass selects templates per object type listed in
//! [`GenerationConfig::startup_types`], spawns them through the [`SpawnContext`] collaborators,
//! and finally synthesizes an airspace template centered on the spawned assets. Templates of later
//! stages stay queued until [`Region::generate_staged_templates`] is called for their stage.
use std::collections::BTreeMap;

use glam::{DVec2, DVec3};
use mint::Vector2;
use rand::RngCore;
use tracing::{debug, info, warn};

use crate::asset::{AssetFactory, AssetManager, RegionInfo};
use crate::error::{Error, Result};
use crate::events::{EventSink, GenerationEvent, GenerationEventKind};
use crate::selection::{CandidateIndex, SelectionOutcome, Selector, SpawnLimits, SpawnReason};
use crate::template::exclusion::ExclusionIndex;
use crate::template::registry::{Registration, TemplateRegistry};
use crate::template::{ObjectType, Template, TemplateName, IMMEDIATE_STAGE};

pub mod airspace;
pub mod boundary;
pub mod centroid;

use boundary::{Boundary, TriangleContainment};
use centroid::Centroid;

pub const DEFAULT_AIRSPACE_RADIUS: f64 = 55560.0;
pub const DEFAULT_AIRSPACE_PRIORITY: i32 = 1000;
pub const DEFAULT_AIRSPACE_COALITION: &str = "neutral";

/// Region metadata as produced by a definition loader.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegionDefinition {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub priority: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub limits: BTreeMap<ObjectType, SpawnLimits>,
    #[cfg_attr(feature = "serde", serde(default = "default_airspace"))]
    pub airspace: bool,
}

#[cfg(feature = "serde")]
fn default_airspace() -> bool {
    true
}

/// Configuration of a single region.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct RegionConfig {
    /// Display name, also used to name the synthesized airspace.
    pub name: String,
    /// Ordering weight among regions.
    pub priority: i32,
    /// Spawn bounds per object type. Types without an entry spawn every candidate.
    pub limits: BTreeMap<ObjectType, SpawnLimits>,
    /// Synthesize an airspace template after the initial pass.
    pub airspace: bool,
    /// Active theater; templates for other theaters are dropped.
    pub theater: String,
}

impl RegionConfig {
    pub fn new(name: impl Into<String>, theater: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            priority: 0,
            limits: BTreeMap::new(),
            airspace: true,
            theater: theater.into(),
        }
    }

    /// Builds a config from loader metadata for the active theater.
    pub fn from_definition(definition: RegionDefinition, theater: impl Into<String>) -> Self {
        Self {
            name: definition.name,
            priority: definition.priority,
            limits: definition.limits,
            airspace: definition.airspace,
            theater: theater.into(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_limits(mut self, object_type: impl Into<ObjectType>, limits: SpawnLimits) -> Self {
        self.limits.insert(object_type.into(), limits);
        self
    }

    pub fn with_airspace(mut self, airspace: bool) -> Self {
        self.airspace = airspace;
        self
    }

    /// Validates the configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidConfig("region name must not be empty".into()));
        }
        if self.theater.trim().is_empty() {
            return Err(Error::InvalidConfig(format!(
                "region '{}' has no theater",
                self.name
            )));
        }
        for limits in self.limits.values() {
            limits.validate()?;
        }
        Ok(())
    }
}

/// Settings shared by every region of a generation run.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Object types generated by the initial pass, in generation order.
    pub startup_types: Vec<ObjectType>,
    /// Radius of synthesized airspace volumes in world units.
    pub airspace_radius: f64,
    /// Priority assigned to synthesized airspace templates.
    pub airspace_priority: i32,
    /// Coalition owning synthesized airspace templates.
    pub airspace_coalition: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            startup_types: Vec::new(),
            airspace_radius: DEFAULT_AIRSPACE_RADIUS,
            airspace_priority: DEFAULT_AIRSPACE_PRIORITY,
            airspace_coalition: DEFAULT_AIRSPACE_COALITION.to_owned(),
        }
    }
}

impl GenerationConfig {
    pub fn new<I, S>(startup_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ObjectType>,
    {
        Self {
            startup_types: startup_types.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_airspace_radius(mut self, radius: f64) -> Self {
        self.airspace_radius = radius;
        self
    }

    pub fn with_airspace_priority(mut self, priority: i32) -> Self {
        self.airspace_priority = priority;
        self
    }

    pub fn with_airspace_coalition(mut self, coalition: impl Into<String>) -> Self {
        self.airspace_coalition = coalition.into();
        self
    }

    /// Validates the configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if !(self.airspace_radius.is_finite() && self.airspace_radius > 0.0) {
            return Err(Error::InvalidConfig(
                "airspace_radius must be finite and > 0".into(),
            ));
        }
        for (i, t) in self.startup_types.iter().enumerate() {
            if self.startup_types[..i].contains(t) {
                return Err(Error::InvalidConfig(format!(
                    "startup type '{t}' listed twice"
                )));
            }
        }
        Ok(())
    }
}

/// Collaborators used to turn selected templates into assets.
pub struct SpawnContext<'a> {
    pub config: &'a GenerationConfig,
    pub factory: &'a dyn AssetFactory,
    pub manager: &'a mut dyn AssetManager,
}

impl<'a> SpawnContext<'a> {
    pub fn new(
        config: &'a GenerationConfig,
        factory: &'a dyn AssetFactory,
        manager: &'a mut dyn AssetManager,
    ) -> Self {
        Self {
            config,
            factory,
            manager,
        }
    }
}

/// Lifecycle of a region's initial generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationState {
    Uninitialized,
    /// Entered at the start of [`Region::generate`]; a region whose pass failed stays here.
    Generating,
    Done,
}

/// A template that was spawned.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnRecord {
    pub template: TemplateName,
    pub object_type: ObjectType,
    pub reason: SpawnReason,
    /// Location reported by the asset, if any.
    pub location: Option<DVec3>,
}

/// Result of an initial or staged generation pass.
#[non_exhaustive]
#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    pub region: String,
    pub stage: u32,
    /// One outcome per object type that had candidates, in generation order.
    pub selections: Vec<SelectionOutcome>,
    /// Every spawned template in spawn order, including airspace.
    pub spawned: Vec<SpawnRecord>,
    /// Mean location of the assets spawned by selection.
    pub centroid: Option<DVec3>,
    /// Name of the synthesized airspace template.
    pub airspace: Option<TemplateName>,
}

impl GenerationReport {
    pub fn new(region: impl Into<String>, stage: u32) -> Self {
        Self {
            region: region.into(),
            stage,
            ..Default::default()
        }
    }

    pub fn spawned_names(&self) -> impl Iterator<Item = &str> {
        self.spawned.iter().map(|r| r.template.as_str())
    }
}

/// A region of the map with its templates and generation state.
pub struct Region {
    info: RegionInfo,
    config: RegionConfig,
    boundary: Boundary,
    registry: TemplateRegistry,
    state: GenerationState,
    spawned: Vec<SpawnRecord>,
}

impl Region {
    pub fn try_new(config: RegionConfig, boundary: Boundary) -> Result<Self> {
        config.validate()?;
        if boundary.is_empty() {
            warn!("Region '{}' has an empty boundary.", config.name);
        }
        Ok(Self {
            info: RegionInfo::new(config.name.clone(), config.priority),
            config,
            boundary,
            registry: TemplateRegistry::new(),
            state: GenerationState::Uninitialized,
            spawned: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn priority(&self) -> i32 {
        self.info.priority
    }

    pub fn info(&self) -> &RegionInfo {
        &self.info
    }

    pub fn config(&self) -> &RegionConfig {
        &self.config
    }

    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    pub fn state(&self) -> GenerationState {
        self.state
    }

    /// Every template spawned by this region so far, across all passes.
    pub fn spawned(&self) -> &[SpawnRecord] {
        &self.spawned
    }

    /// Stages that still hold deferred templates, ascending.
    pub fn pending_stages(&self) -> Vec<u32> {
        self.registry.stages().stages().collect()
    }

    /// Registers a template with this region.
    ///
    /// Templates authored for another theater are dropped with a warning and reported as
    /// [`Registration::TheaterMismatch`]. While airspace synthesis is enabled the name
    /// `{region}_airspace` is reserved.
    pub fn add_template(&mut self, template: Template) -> Result<Registration> {
        self.add_template_with_events(template, &mut ())
    }

    /// Like [`Region::add_template`]; a theater mismatch is also sent to `sink` as
    /// [`GenerationEvent::Warning`].
    pub fn add_template_with_events(
        &mut self,
        template: Template,
        sink: &mut dyn EventSink,
    ) -> Result<Registration> {
        if self.config.airspace && template.name == airspace::template_name(&self.info.name) {
            return Err(Error::DuplicateTemplate {
                name: template.name,
            });
        }

        let name = template.name.clone();
        let registration = self.registry.register(template, &self.config.theater)?;
        if let Registration::TheaterMismatch { expected, found } = &registration {
            let message = format!(
                "template '{name}' is for theater '{found}', region is in '{expected}'; ignoring"
            );
            warn!("Region '{}': {}.", self.info.name, message);
            if sink.wants(GenerationEventKind::Warning) {
                sink.send(GenerationEvent::Warning {
                    context: self.info.name.clone(),
                    message,
                });
            }
        }
        Ok(registration)
    }

    pub fn get_template_by_name(&self, name: &str) -> Option<&Template> {
        self.registry.get(name)
    }

    pub fn is_inside(&self, point: impl Into<Vector2<f64>>) -> bool {
        self.boundary.contains(DVec2::from(point.into()))
    }

    pub fn is_inside_with(
        &self,
        point: impl Into<Vector2<f64>>,
        test: &dyn TriangleContainment,
    ) -> bool {
        self.boundary
            .contains_with(DVec2::from(point.into()), test)
    }

    /// Runs the initial generation pass. May only be called once.
    pub fn generate<R: RngCore + ?Sized>(
        &mut self,
        ctx: &mut SpawnContext<'_>,
        rng: &mut R,
    ) -> Result<GenerationReport> {
        self.generate_with_events(ctx, rng, &mut ())
    }

    pub fn generate_with_events<R: RngCore + ?Sized>(
        &mut self,
        ctx: &mut SpawnContext<'_>,
        rng: &mut R,
        sink: &mut dyn EventSink,
    ) -> Result<GenerationReport> {
        if self.state != GenerationState::Uninitialized {
            return Err(Error::AlreadyGenerated {
                region: self.info.name.clone(),
            });
        }
        ctx.config.validate()?;
        self.state = GenerationState::Generating;

        let snapshot = self.registry.candidates().clone();
        for object_type in snapshot.keys() {
            if !ctx.config.startup_types.contains(object_type) {
                debug!(
                    "Region '{}': '{}' is not a startup type; not generated.",
                    self.info.name, object_type
                );
            }
        }
        let order: Vec<ObjectType> = ctx
            .config
            .startup_types
            .iter()
            .filter(|t| snapshot.get(*t).is_some_and(|c| !c.is_empty()))
            .cloned()
            .collect();

        info!(
            "Generating region '{}' | object types: {:?}.",
            self.info.name, order
        );
        if sink.wants(GenerationEventKind::GenerationStarted) {
            sink.send(GenerationEvent::GenerationStarted {
                region: self.info.name.clone(),
                object_types: order.clone(),
            });
        }

        let mut report = GenerationReport::new(self.info.name.clone(), IMMEDIATE_STAGE);
        let mut centroid = Centroid::new();
        let pass = Pass {
            registry: &self.registry,
            exclusions: self.registry.exclusions(),
            info: &self.info,
            limits: &self.config.limits,
        };
        pass.run(snapshot, &order, ctx, rng, &mut centroid, sink, &mut report)?;
        report.centroid = centroid.point();

        if self.config.airspace {
            let name = self.spawn_airspace(&centroid, ctx, sink, &mut report)?;
            report.airspace = Some(name);
        }

        self.spawned.extend(report.spawned.iter().cloned());
        self.state = GenerationState::Done;

        if sink.wants(GenerationEventKind::GenerationFinished) {
            sink.send(GenerationEvent::GenerationFinished {
                report: report.clone(),
            });
        }
        Ok(report)
    }

    /// Generates the templates deferred to `stage`.
    ///
    /// The stage bucket is drained; calling again for the same stage, or for a stage without
    /// templates, returns an empty report.
    pub fn generate_staged_templates<R: RngCore + ?Sized>(
        &mut self,
        stage: u32,
        ctx: &mut SpawnContext<'_>,
        rng: &mut R,
    ) -> Result<GenerationReport> {
        self.generate_staged_templates_with_events(stage, ctx, rng, &mut ())
    }

    pub fn generate_staged_templates_with_events<R: RngCore + ?Sized>(
        &mut self,
        stage: u32,
        ctx: &mut SpawnContext<'_>,
        rng: &mut R,
        sink: &mut dyn EventSink,
    ) -> Result<GenerationReport> {
        let mut report = GenerationReport::new(self.info.name.clone(), stage);
        let names: Vec<TemplateName> = self
            .registry
            .stages()
            .pending(stage)
            .iter()
            .map(|t| t.name.clone())
            .collect();
        let pending = names.len();
        if pending == 0 {
            debug!(
                "Region '{}' has no templates for stage {}; skipping.",
                self.info.name, stage
            );
            return Ok(report);
        }

        let (candidates, exclusions) = self.registry.admit_stage(stage)?;
        let order: Vec<ObjectType> = candidates.keys().cloned().collect();

        info!(
            "Generating stage {} of region '{}' | templates: {} | object types: {:?}.",
            stage, self.info.name, pending, order
        );
        if sink.wants(GenerationEventKind::StageStarted) {
            sink.send(GenerationEvent::StageStarted {
                region: self.info.name.clone(),
                stage,
                templates: pending,
            });
        }

        let mut centroid = Centroid::new();
        let pass = Pass {
            registry: &self.registry,
            exclusions: &exclusions,
            info: &self.info,
            limits: &self.config.limits,
        };
        let result = pass.run(candidates, &order, ctx, rng, &mut centroid, sink, &mut report);
        if let Err(err) = result {
            warn!(
                "Stage {} of region '{}' failed; its templates stay queued: {}",
                stage, self.info.name, err
            );
            self.registry.restore_stage(&names);
            return Err(err);
        }
        report.centroid = centroid.point();

        self.spawned.extend(report.spawned.iter().cloned());

        if sink.wants(GenerationEventKind::GenerationFinished) {
            sink.send(GenerationEvent::GenerationFinished {
                report: report.clone(),
            });
        }
        Ok(report)
    }

    fn spawn_airspace(
        &mut self,
        centroid: &Centroid,
        ctx: &mut SpawnContext<'_>,
        sink: &mut dyn EventSink,
        report: &mut GenerationReport,
    ) -> Result<TemplateName> {
        let center = centroid.point_or_origin();
        let template =
            airspace::synthesize(&self.info.name, &self.config.theater, center, ctx.config);
        let name = template.name.clone();
        self.registry.insert_direct(template)?;

        info!(
            "Region '{}' airspace '{}' centered at {:?} ({} assets).",
            self.info.name,
            name,
            center,
            centroid.count()
        );
        if sink.wants(GenerationEventKind::AirspaceSynthesized) {
            sink.send(GenerationEvent::AirspaceSynthesized {
                template: name.clone(),
                center,
                from_assets: !centroid.is_empty(),
            });
        }

        let template = self
            .registry
            .get(&name)
            .ok_or_else(|| Error::UnknownTemplate { name: name.clone() })?;
        let record = materialize(
            template,
            SpawnReason::Airspace,
            &self.info,
            ctx,
            None,
            sink,
        )?;
        report.spawned.push(record);
        Ok(name)
    }
}

/// Borrowed state of one generation pass.
struct Pass<'a> {
    registry: &'a TemplateRegistry,
    exclusions: &'a ExclusionIndex,
    info: &'a RegionInfo,
    limits: &'a BTreeMap<ObjectType, SpawnLimits>,
}

impl Pass<'_> {
    #[allow(clippy::too_many_arguments)]
    fn run<R: RngCore + ?Sized>(
        &self,
        mut candidates: CandidateIndex,
        order: &[ObjectType],
        ctx: &mut SpawnContext<'_>,
        rng: &mut R,
        centroid: &mut Centroid,
        sink: &mut dyn EventSink,
        report: &mut GenerationReport,
    ) -> Result<()> {
        let selector = Selector::new(self.registry, self.exclusions);
        for object_type in order {
            let Some(list) = candidates.remove(object_type).filter(|c| !c.is_empty()) else {
                continue;
            };

            if sink.wants(GenerationEventKind::SelectionStarted) {
                sink.send(GenerationEvent::SelectionStarted {
                    object_type: object_type.clone(),
                    candidates: list.len(),
                });
            }

            let spawned = &mut report.spawned;
            let outcome = selector.select(
                object_type,
                list,
                self.limits.get(object_type).copied(),
                rng,
                |template, reason| {
                    let record = materialize(
                        template,
                        reason.clone(),
                        self.info,
                        &mut *ctx,
                        Some(&mut *centroid),
                        &mut *sink,
                    )?;
                    spawned.push(record);
                    Ok(())
                },
            )?;

            if sink.wants(GenerationEventKind::SelectionFinished) {
                sink.send(GenerationEvent::from(&outcome));
            }
            report.selections.push(outcome);
        }
        Ok(())
    }
}

/// Creates the asset for `template`, stores it in the manager, then activates it.
fn materialize(
    template: &Template,
    reason: SpawnReason,
    info: &RegionInfo,
    ctx: &mut SpawnContext<'_>,
    centroid: Option<&mut Centroid>,
    sink: &mut dyn EventSink,
) -> Result<SpawnRecord> {
    let asset = ctx
        .factory
        .create(&template.object_type, template, info)?;
    let name = asset.name().to_owned();
    ctx.manager.add(asset)?;

    let manager: &dyn AssetManager = &*ctx.manager;
    let asset = manager
        .get_asset(&name)
        .ok_or_else(|| Error::Asset(format!("asset '{name}' not found after adding it")))?;
    asset.generate(manager, info)?;
    let location = asset.location().map(DVec3::from);

    if let (Some(centroid), Some(point)) = (centroid, location) {
        centroid.add(point);
    }

    debug!(
        "Region '{}' spawned '{}' ({}, {:?}).",
        info.name, template.name, template.object_type, reason
    );
    let record = SpawnRecord {
        template: template.name.clone(),
        object_type: template.object_type.clone(),
        reason,
        location,
    };
    if sink.wants(GenerationEventKind::TemplateSpawned) {
        sink.send(GenerationEvent::TemplateSpawned {
            record: record.clone(),
        });
    }
    Ok(record)
}

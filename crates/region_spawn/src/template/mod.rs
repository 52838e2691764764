//! Template definitions and the indexes that partition them for generation.
//!
//! A [`Template`] is an immutable description of something a region can spawn. Templates are
//! registered into a [`registry::TemplateRegistry`], which routes them either into the immediate
//! candidate index (grouped by object type and [`exclusion`] group) or into a deferred
//! [`stage::StageQueue`] bucket.
use std::collections::BTreeMap;

use glam::DVec3;

pub mod exclusion;
pub mod registry;
pub mod stage;

pub type TemplateName = String;
pub type ObjectType = String;

/// The stage whose templates are generated by the initial region pass.
pub const IMMEDIATE_STAGE: u32 = 1;

/// Object type of synthesized region airspace templates.
pub const AIRSPACE: &str = "airspace";

/// A single value in a template payload.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PayloadValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Point(DVec3),
}

/// Opaque template data forwarded to asset factories untouched.
pub type Payload = BTreeMap<String, PayloadValue>;

/// Immutable spawnable asset definition.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Template {
    /// Unique name within a region.
    pub name: TemplateName,
    /// Category tag selecting the asset factory (e.g. `airspace`, `sam`, `ship`).
    pub object_type: ObjectType,
    /// Optional mutually-exclusive group this template belongs to.
    pub exclusion_group: Option<String>,
    /// Generation stage; [`IMMEDIATE_STAGE`] spawns during the initial pass.
    pub stage: u32,
    /// Always spawn, regardless of limits and random draws.
    pub spawn_always: bool,
    /// Theater (map) the template was authored for.
    pub theater: String,
    /// Extra data for the asset factory.
    pub payload: Payload,
}

impl Template {
    /// Create a stage-1 template with no exclusion group and an empty payload.
    pub fn new(
        name: impl Into<TemplateName>,
        object_type: impl Into<ObjectType>,
        theater: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            object_type: object_type.into(),
            exclusion_group: None,
            stage: IMMEDIATE_STAGE,
            spawn_always: false,
            theater: theater.into(),
            payload: Payload::new(),
        }
    }

    pub fn with_exclusion_group(mut self, group: impl Into<String>) -> Self {
        self.exclusion_group = Some(group.into());
        self
    }

    pub fn with_stage(mut self, stage: u32) -> Self {
        self.stage = stage;
        self
    }

    pub fn with_spawn_always(mut self, spawn_always: bool) -> Self {
        self.spawn_always = spawn_always;
        self
    }

    pub fn with_payload(mut self, key: impl Into<String>, value: PayloadValue) -> Self {
        self.payload.insert(key.into(), value);
        self
    }

    /// Returns `true` if the template belongs to the initial generation pass.
    pub fn is_immediate(&self) -> bool {
        self.stage == IMMEDIATE_STAGE
    }

    pub fn payload_number(&self, key: &str) -> Option<f64> {
        match self.payload.get(key) {
            Some(PayloadValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn payload_text(&self, key: &str) -> Option<&str> {
        match self.payload.get(key) {
            Some(PayloadValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn payload_point(&self, key: &str) -> Option<DVec3> {
        match self.payload.get(key) {
            Some(PayloadValue::Point(p)) => Some(*p),
            _ => None,
        }
    }
}

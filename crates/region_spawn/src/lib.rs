#![forbid(unsafe_code)]
//! region_spawn: Constraint-bounded template selection and spawn limiting for map regions.
//!
//! Modules:
//! - template: template definitions, registry, exclusion groups and deferred stages
//! - selection: forced and random selection of candidates under min/max limits
//! - region: regions, generation passes, boundaries, centroid and airspace synthesis
//! - asset: collaborator traits for creating and storing spawned assets
//! - events: observable generation events and sinks
//! - inventory: per-base stock ledgers with check and withdraw
pub mod asset;
pub mod error;
pub mod events;
pub mod inventory;
pub mod region;
pub mod selection;
pub mod template;

/// Convenient re-exports for common types. Import with `use region_spawn::prelude::*;`.
pub mod prelude {
    pub use crate::asset::{Asset, AssetFactory, AssetManager, FnFactory, RegionInfo};
    pub use crate::error::{Error, Result};
    pub use crate::events::{
        EventSink, FnSink, GenerationEvent, GenerationEventKind, MultiSink, VecSink,
    };
    pub use crate::inventory::{
        Category, CheckResult, Inventory, InventoryRegistry, Quantity, RequestQuantity,
        WithdrawalRequest,
    };
    pub use crate::region::boundary::{
        BarycentricTest, Boundary, BoundaryTriangle, TriangleContainment,
    };
    pub use crate::region::centroid::Centroid;
    pub use crate::region::{
        GenerationConfig, GenerationReport, GenerationState, Region, RegionConfig,
        RegionDefinition, SpawnContext, SpawnRecord,
    };
    pub use crate::selection::{
        pick_uniform, random_int, Candidate, RunLimits, SelectionOutcome, Selector, SpawnLimits,
        SpawnReason,
    };
    pub use crate::template::registry::{Registration, TemplateRegistry};
    pub use crate::template::{ObjectType, PayloadValue, Template, TemplateName, AIRSPACE};
}

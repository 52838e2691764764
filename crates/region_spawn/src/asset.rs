//! Boundary to the asset layer that turns selected templates into live objects.
//!
//! The crate never constructs assets itself. A region hands each selected [`Template`] to an
//! [`AssetFactory`], activates the returned [`Asset`] and stores it in an [`AssetManager`].
use std::collections::HashMap;

use mint::Vector3;

use crate::error::Result;
use crate::template::Template;

/// Identity of the region an asset is spawned for.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionInfo {
    pub name: String,
    pub priority: i32,
}

impl RegionInfo {
    pub fn new(name: impl Into<String>, priority: i32) -> Self {
        Self {
            name: name.into(),
            priority,
        }
    }
}

/// A spawned object bound to a template.
pub trait Asset {
    fn name(&self) -> &str;

    /// Activates the asset in the world.
    ///
    /// Runs after the asset was added to `manager`, so `manager.get_asset(self.name())` finds it.
    /// Assets that track activation state keep it in a `Cell` or similar.
    fn generate(&self, manager: &dyn AssetManager, region: &RegionInfo) -> Result<()>;

    /// World position, if the asset has one.
    fn location(&self) -> Option<Vector3<f64>>;
}

/// Builds assets for templates; dispatches on object type.
pub trait AssetFactory {
    fn create(
        &self,
        object_type: &str,
        template: &Template,
        region: &RegionInfo,
    ) -> Result<Box<dyn Asset>>;
}

/// Owns spawned assets by name.
pub trait AssetManager {
    fn add(&mut self, asset: Box<dyn Asset>) -> Result<()>;

    fn get_asset(&self, name: &str) -> Option<&dyn Asset>;
}

/// A plain map is the simplest asset manager; later assets replace earlier ones of the same name.
impl AssetManager for HashMap<String, Box<dyn Asset>> {
    fn add(&mut self, asset: Box<dyn Asset>) -> Result<()> {
        self.insert(asset.name().to_owned(), asset);
        Ok(())
    }

    fn get_asset(&self, name: &str) -> Option<&dyn Asset> {
        self.get(name).map(|a| a.as_ref())
    }
}

/// An asset factory that forwards to a user-provided closure.
pub struct FnFactory<F>
where
    F: Fn(&str, &Template, &RegionInfo) -> Result<Box<dyn Asset>>,
{
    f: F,
}

impl<F> FnFactory<F>
where
    F: Fn(&str, &Template, &RegionInfo) -> Result<Box<dyn Asset>>,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> AssetFactory for FnFactory<F>
where
    F: Fn(&str, &Template, &RegionInfo) -> Result<Box<dyn Asset>>,
{
    #[inline]
    fn create(
        &self,
        object_type: &str,
        template: &Template,
        region: &RegionInfo,
    ) -> Result<Box<dyn Asset>> {
        (self.f)(object_type, template, region)
    }
}

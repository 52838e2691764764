//! Per-base stock ledgers.
//!
//! An [`Inventory`] tracks quantities of items grouped by [`Category`]. Consumers first
//! [`Inventory::check`] a [`WithdrawalRequest`] and then [`Inventory::withdraw`] it;
//! [`Inventory::try_withdraw`] does both under one exclusive borrow. Ledgers of all bases live in
//! an explicitly constructed [`InventoryRegistry`] that is passed to whoever needs it.
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::error::{Error, Result};

/// Stock level. Unchecked withdrawals may drive it below zero.
pub type Quantity = i64;

/// Requested amount of one item; requests cannot add stock.
pub type RequestQuantity = u32;

/// Item quantities grouped by category.
pub type ItemLines = BTreeMap<Category, BTreeMap<String, Quantity>>;

/// Requested item quantities grouped by category.
pub type RequestLines = BTreeMap<Category, BTreeMap<String, RequestQuantity>>;

/// Stock category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Category {
    #[cfg_attr(feature = "serde", serde(rename = "airframes"))]
    Airframes,
    #[cfg_attr(feature = "serde", serde(rename = "munitions"))]
    Munitions,
    #[cfg_attr(feature = "serde", serde(rename = "ground units"))]
    GroundUnits,
    #[cfg_attr(feature = "serde", serde(rename = "naval"))]
    Naval,
    #[cfg_attr(feature = "serde", serde(rename = "trains"))]
    Trains,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Airframes,
        Category::Munitions,
        Category::GroundUnits,
        Category::Naval,
        Category::Trains,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Airframes => "airframes",
            Category::Munitions => "munitions",
            Category::GroundUnits => "ground units",
            Category::Naval => "naval",
            Category::Trains => "trains",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| Error::InvalidConfig(format!("unknown inventory category '{s}'")))
    }
}

/// Quantities a consumer wants to take out of an inventory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WithdrawalRequest {
    lines: RequestLines,
}

impl WithdrawalRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a line; quantities for the same item accumulate.
    pub fn with(
        mut self,
        category: Category,
        item: impl Into<String>,
        quantity: RequestQuantity,
    ) -> Self {
        self.add(category, item, quantity);
        self
    }

    pub fn add(&mut self, category: Category, item: impl Into<String>, quantity: RequestQuantity) {
        let line = self
            .lines
            .entry(category)
            .or_default()
            .entry(item.into())
            .or_default();
        *line = line.saturating_add(quantity);
    }

    pub fn lines(&self) -> &RequestLines {
        &self.lines
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &str, RequestQuantity)> {
        self.lines.iter().flat_map(|(category, items)| {
            items
                .iter()
                .map(move |(item, qty)| (*category, item.as_str(), *qty))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.lines.values().all(BTreeMap::is_empty)
    }
}

/// Outcome of [`Inventory::check`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckResult {
    /// Validity per requested item.
    pub items: BTreeMap<Category, BTreeMap<String, bool>>,
    /// `true` when every item is valid.
    pub all: bool,
}

impl CheckResult {
    pub fn is_valid(&self, category: Category, item: &str) -> Option<bool> {
        self.items.get(&category)?.get(item).copied()
    }

    /// Items whose stock does not cover the request.
    pub fn insufficient(&self) -> impl Iterator<Item = (Category, &str)> {
        self.items.iter().flat_map(|(category, items)| {
            items
                .iter()
                .filter(|(_, ok)| !**ok)
                .map(move |(item, _)| (*category, item.as_str()))
        })
    }
}

/// Stock of a single base.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Inventory {
    stock: ItemLines,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_lines(stock: ItemLines) -> Self {
        Self { stock }
    }

    pub fn with_stock(
        mut self,
        category: Category,
        item: impl Into<String>,
        quantity: Quantity,
    ) -> Self {
        self.deposit(category, item, quantity);
        self
    }

    /// Adds `quantity` (negative removes), saturating at the `Quantity` bounds.
    pub fn deposit(&mut self, category: Category, item: impl Into<String>, quantity: Quantity) {
        let stock = self
            .stock
            .entry(category)
            .or_default()
            .entry(item.into())
            .or_default();
        *stock = stock.saturating_add(quantity);
    }

    /// Current quantity; unknown items have none.
    pub fn quantity(&self, category: Category, item: &str) -> Quantity {
        self.stock
            .get(&category)
            .and_then(|items| items.get(item))
            .copied()
            .unwrap_or(0)
    }

    pub fn stock(&self) -> &ItemLines {
        &self.stock
    }

    /// Validates a request against current stock.
    ///
    /// A line is valid only if stock is strictly greater than the requested quantity; asking for
    /// exactly what is left fails.
    pub fn check(&self, request: &WithdrawalRequest) -> CheckResult {
        let mut result = CheckResult {
            items: BTreeMap::new(),
            all: true,
        };
        for (category, item, quantity) in request.iter() {
            let ok = self.quantity(category, item) > Quantity::from(quantity);
            result.all &= ok;
            result
                .items
                .entry(category)
                .or_default()
                .insert(item.to_owned(), ok);
        }
        result
    }

    /// Subtracts every line of the request without validation. Stock may go negative.
    pub fn withdraw(&mut self, request: &WithdrawalRequest) {
        for (category, item, quantity) in request.iter() {
            debug!("Withdrawing {} x '{}' ({}).", quantity, item, category);
            self.deposit(category, item, -Quantity::from(quantity));
        }
    }

    /// Checks the request and withdraws it only if every line is valid.
    pub fn try_withdraw(&mut self, request: &WithdrawalRequest) -> CheckResult {
        let result = self.check(request);
        if result.all {
            self.withdraw(request);
        }
        result
    }
}

/// Inventories of all bases, keyed by base name.
#[derive(Debug, Clone, Default)]
pub struct InventoryRegistry {
    bases: BTreeMap<String, Inventory>,
}

impl InventoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the registry from its source of truth. Listing a base twice is an error.
    pub fn from_bases<I, S>(bases: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Inventory)>,
        S: Into<String>,
    {
        let mut registry = Self::new();
        for (name, inventory) in bases {
            let name = name.into();
            if registry.bases.contains_key(&name) {
                return Err(Error::InvalidConfig(format!(
                    "inventory for base '{name}' listed twice"
                )));
            }
            registry.bases.insert(name, inventory);
        }
        Ok(registry)
    }

    /// Inserts or replaces a base's inventory, returning the previous one.
    pub fn insert(&mut self, base: impl Into<String>, inventory: Inventory) -> Option<Inventory> {
        self.bases.insert(base.into(), inventory)
    }

    pub fn base(&self, name: &str) -> Result<&Inventory> {
        self.bases.get(name).ok_or_else(|| Error::UnknownBase {
            name: name.to_owned(),
        })
    }

    pub fn base_mut(&mut self, name: &str) -> Result<&mut Inventory> {
        self.bases.get_mut(name).ok_or_else(|| Error::UnknownBase {
            name: name.to_owned(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Inventory)> {
        self.bases.iter().map(|(name, inv)| (name.as_str(), inv))
    }

    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }
}

//! Unified asset catalog projected from the three origin pools.
//!
//! Each pool lives in its own table upstream; the catalog flattens them into
//! one read-mostly snapshot that search, selection and the custody workflow
//! all consume. A snapshot carries a `version` so derived structures (the
//! search corpus) can be cached until the catalog changes.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{Date, DbId};

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Normalize a name for comparison: trimmed and case-folded.
pub fn normalize_key(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Normalize an optional name; `None` and blank values both become `""`.
pub fn normalize_opt(value: Option<&str>) -> String {
    value.map(normalize_key).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Origin pools
// ---------------------------------------------------------------------------

/// One of the three physically separate asset collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OriginPool {
    Federal,
    State,
    Unlisted,
}

impl OriginPool {
    pub const ALL: [OriginPool; 3] = [OriginPool::Federal, OriginPool::State, OriginPool::Unlisted];

    /// Tag stored in ledger rows.
    pub fn as_str(self) -> &'static str {
        match self {
            OriginPool::Federal => "FEDERAL",
            OriginPool::State => "STATE",
            OriginPool::Unlisted => "UNLISTED",
        }
    }

    /// Backing table holding this pool's assets.
    pub fn table(self) -> &'static str {
        match self {
            OriginPool::Federal => "assets_federal",
            OriginPool::State => "assets_state",
            OriginPool::Unlisted => "assets_unlisted",
        }
    }
}

impl fmt::Display for OriginPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OriginPool {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FEDERAL" => Ok(OriginPool::Federal),
            "STATE" => Ok(OriginPool::State),
            "UNLISTED" => Ok(OriginPool::Unlisted),
            other => Err(CoreError::Validation(format!(
                "Unknown origin pool '{other}'. Must be one of: FEDERAL, STATE, UNLISTED"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Searchable fields
// ---------------------------------------------------------------------------

/// Asset fields exposed to search, suggestion and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Identifier,
    Description,
    Category,
    Condition,
    Status,
    Area,
    Custodian,
    Holder,
}

impl FieldType {
    pub const COUNT: usize = 8;

    pub const ALL: [FieldType; FieldType::COUNT] = [
        FieldType::Identifier,
        FieldType::Description,
        FieldType::Category,
        FieldType::Condition,
        FieldType::Status,
        FieldType::Area,
        FieldType::Custodian,
        FieldType::Holder,
    ];

    /// Dense index into per-field arrays.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Identifier => "identifier",
            FieldType::Description => "description",
            FieldType::Category => "category",
            FieldType::Condition => "condition",
            FieldType::Status => "status",
            FieldType::Area => "area",
            FieldType::Custodian => "custodian",
            FieldType::Holder => "holder",
        }
    }
}

// ---------------------------------------------------------------------------
// Assets
// ---------------------------------------------------------------------------

/// Catalog-wide key of an asset: ids are only unique within a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetRef {
    pub pool: OriginPool,
    pub id: DbId,
}

/// One physical item, as projected from its origin pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: DbId,
    pub pool: OriginPool,
    pub inventory_code: String,
    pub description: String,
    /// "Rubro".
    pub category: String,
    pub condition: String,
    pub status: String,
    pub value: Option<Decimal>,
    pub acquired_on: Option<Date>,
    pub location: Option<String>,
    pub area: Option<String>,
    pub custodian: Option<String>,
    pub holder: Option<String>,
    pub decommission_date: Option<Date>,
    pub decommission_cause: Option<String>,
    pub image_ref: Option<String>,
}

impl Asset {
    pub fn key(&self) -> AssetRef {
        AssetRef {
            pool: self.pool,
            id: self.id,
        }
    }

    /// Raw value of a searchable field; absent optional fields read as `""`.
    pub fn field_value(&self, field: FieldType) -> &str {
        match field {
            FieldType::Identifier => &self.inventory_code,
            FieldType::Description => &self.description,
            FieldType::Category => &self.category,
            FieldType::Condition => &self.condition,
            FieldType::Status => &self.status,
            FieldType::Area => self.area.as_deref().unwrap_or(""),
            FieldType::Custodian => self.custodian.as_deref().unwrap_or(""),
            FieldType::Holder => self.holder.as_deref().unwrap_or(""),
        }
    }

    /// Whether the asset currently sits under a custodian.
    pub fn is_in_custody(&self) -> bool {
        !normalize_opt(self.custodian.as_deref()).is_empty()
    }
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// A committed search filter: the field value must contain `needle`
/// (case-insensitive).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogFilter {
    pub field: FieldType,
    pub needle: String,
}

impl CatalogFilter {
    pub fn new(field: FieldType, needle: impl Into<String>) -> Self {
        Self {
            field,
            needle: needle.into(),
        }
    }

    pub fn matches(&self, asset: &Asset) -> bool {
        let needle = normalize_key(&self.needle);
        needle.is_empty() || asset.field_value(self.field).to_lowercase().contains(&needle)
    }
}

// ---------------------------------------------------------------------------
// Catalog snapshot
// ---------------------------------------------------------------------------

/// Immutable snapshot of every asset across all pools.
#[derive(Debug, Clone, Default)]
pub struct AssetCatalog {
    version: u64,
    assets: Vec<Asset>,
}

impl AssetCatalog {
    pub fn new(version: u64, assets: Vec<Asset>) -> Self {
        Self { version, assets }
    }

    /// Build a snapshot by concatenating pools in the given order.
    pub fn from_pools<I>(version: u64, pools: I) -> Self
    where
        I: IntoIterator<Item = Vec<Asset>>,
    {
        let assets = pools.into_iter().flatten().collect();
        Self { version, assets }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn get(&self, key: AssetRef) -> Option<&Asset> {
        self.assets.iter().find(|a| a.key() == key)
    }

    /// Look up by inventory code within one pool (codes are unique per pool).
    pub fn find_by_code(&self, pool: OriginPool, inventory_code: &str) -> Option<&Asset> {
        self.assets
            .iter()
            .find(|a| a.pool == pool && a.inventory_code == inventory_code)
    }

    /// Resolve a list of keys, failing on the first unknown one.
    pub fn resolve_all(&self, keys: &[AssetRef]) -> Result<Vec<Asset>, CoreError> {
        keys.iter()
            .map(|key| {
                self.get(*key).cloned().ok_or_else(|| {
                    CoreError::not_found("asset", format!("{}/{}", key.pool, key.id))
                })
            })
            .collect()
    }

    /// Assets matching every filter, in catalog order.
    pub fn filter(&self, filters: &[CatalogFilter]) -> Vec<&Asset> {
        self.assets
            .iter()
            .filter(|asset| filters.iter().all(|f| f.matches(asset)))
            .collect()
    }
}

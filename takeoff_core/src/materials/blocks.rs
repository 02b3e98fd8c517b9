//! Masonry block catalog.
//!
//! The built-in catalog is embedded from `data/block_types.toml` and parsed on
//! first use. A deployment may install its own catalog once, before any
//! masonry calculation runs; after that the catalog is immutable for the life
//! of the process.

use std::collections::HashSet;
use std::path::Path;

use once_cell::sync::{Lazy, OnceCell};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{CalcError, CalcResult};

const BUILTIN_CATALOG_TOML: &str = include_str!("../../data/block_types.toml");

static BUILTIN: Lazy<BlockCatalog> = Lazy::new(|| {
    BlockCatalog::from_toml_str(BUILTIN_CATALOG_TOML).expect("embedded block catalog is valid")
});

static INSTALLED: OnceCell<BlockCatalog> = OnceCell::new();

/// A block size and its commercial data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockType {
    /// Display name, also the lookup key (e.g. "40 x 20 x 20 cm (hollow)")
    pub name: String,
    /// Face length along the wall (m)
    pub length_m: f64,
    /// Face height (m)
    pub height_m: f64,
    /// Wall thickness (m). Not used by the area formulas.
    pub thickness_m: f64,
    /// Blocks delivered per pallet (>= 1)
    pub units_per_pallet: u32,
    /// Default price per block
    pub default_cost: f64,
}

impl BlockType {
    /// Face area covered by one block (m²)
    pub fn face_area_m2(&self) -> f64 {
        self.length_m * self.height_m
    }

    fn validate(&self) -> CalcResult<()> {
        if self.name.trim().is_empty() {
            return Err(CalcError::invalid_input("name", "\"\"", "Block name cannot be empty"));
        }
        if self.units_per_pallet < 1 {
            return Err(CalcError::invalid_input(
                format!("{}.units_per_pallet", self.name),
                self.units_per_pallet.to_string(),
                "A pallet must hold at least one block",
            ));
        }
        if self.length_m <= 0.0 || self.height_m <= 0.0 {
            return Err(CalcError::invalid_input(
                format!("{}.length_m/height_m", self.name),
                format!("{} x {}", self.length_m, self.height_m),
                "Block face dimensions must be positive",
            ));
        }
        if self.default_cost < 0.0 {
            return Err(CalcError::invalid_input(
                format!("{}.default_cost", self.name),
                self.default_cost.to_string(),
                "Default cost cannot be negative",
            ));
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(rename = "block", default)]
    blocks: Vec<BlockType>,
}

/// Ordered, name-addressable collection of block types.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockCatalog {
    blocks: Vec<BlockType>,
}

impl BlockCatalog {
    /// Build a catalog from entries, rejecting empty catalogs, duplicate
    /// names and invalid entries.
    pub fn new(blocks: Vec<BlockType>) -> CalcResult<Self> {
        if blocks.is_empty() {
            return Err(CalcError::invalid_input("block", "[]", "Block catalog cannot be empty"));
        }
        let mut seen = HashSet::new();
        for block in &blocks {
            block.validate()?;
            if !seen.insert(block.name.as_str()) {
                return Err(CalcError::invalid_input(
                    "name",
                    block.name.clone(),
                    "Duplicate block name in catalog",
                ));
            }
        }
        Ok(BlockCatalog { blocks })
    }

    /// Parse a catalog from TOML text (`[[block]]` tables).
    pub fn from_toml_str(text: &str) -> CalcResult<Self> {
        let file: CatalogFile = toml::from_str(text).map_err(|e| CalcError::SerializationError {
            reason: format!("Invalid block catalog: {}", e),
        })?;
        Self::new(file.blocks)
    }

    /// Read a catalog from a TOML file.
    pub fn load(path: &Path) -> CalcResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| CalcError::file_error("read", path.display().to_string(), e.to_string()))?;
        Self::from_toml_str(&text)
    }

    /// The catalog compiled into the library.
    pub fn builtin() -> &'static BlockCatalog {
        &BUILTIN
    }

    /// Look up a block type by exact name.
    pub fn get(&self, name: &str) -> Option<&BlockType> {
        self.blocks.iter().find(|b| b.name == name)
    }

    /// Block names in selection order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().map(|b| b.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlockType> {
        self.blocks.iter()
    }

    /// The default selection (first entry).
    pub fn first(&self) -> &BlockType {
        &self.blocks[0]
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Install a process-wide catalog. Fails if a catalog is already in use.
pub fn install_catalog(catalog: BlockCatalog) -> CalcResult<()> {
    let count = catalog.len();
    INSTALLED.set(catalog).map_err(|_| CalcError::Internal {
        message: "Block catalog already initialised".to_string(),
    })?;
    info!(blocks = count, "installed custom block catalog");
    Ok(())
}

/// The active catalog: the installed one, or the built-in catalog.
pub fn catalog() -> &'static BlockCatalog {
    INSTALLED.get_or_init(|| BUILTIN.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_parses() {
        let catalog = BlockCatalog::builtin();
        assert_eq!(catalog.len(), 10);
        assert_eq!(catalog.first().name, "40 x 20 x 20 cm (hollow)");
        assert_eq!(catalog.first().units_per_pallet, 108);
        assert!(catalog.iter().all(|b| b.units_per_pallet >= 1));
    }

    #[test]
    fn test_lookup_by_name() {
        let catalog = BlockCatalog::builtin();
        let aac = catalog.get("AAC 60 x 25 x 20 cm").unwrap();
        assert!((aac.face_area_m2() - 0.15).abs() < 1e-12);
        assert_eq!(aac.default_cost, 1.90);
        assert!(catalog.get("Glass block").is_none());
    }

    #[test]
    fn test_names_keep_file_order() {
        let names: Vec<_> = BlockCatalog::builtin().names().collect();
        assert_eq!(names[1], "40 x 20 x 15 cm (hollow)");
        assert_eq!(names[9], "AAC 60 x 25 x 20 cm");
    }

    #[test]
    fn test_rejects_zero_pallet() {
        let text = r#"
            [[block]]
            name = "Bad"
            length_m = 0.4
            height_m = 0.2
            thickness_m = 0.2
            units_per_pallet = 0
            default_cost = 1.0
        "#;
        let err = BlockCatalog::from_toml_str(text).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_rejects_duplicates_and_empty() {
        let block = BlockCatalog::builtin().first().clone();
        assert!(BlockCatalog::new(vec![block.clone(), block]).is_err());
        assert!(BlockCatalog::new(Vec::new()).is_err());
        assert!(BlockCatalog::from_toml_str("").is_err());
    }
}

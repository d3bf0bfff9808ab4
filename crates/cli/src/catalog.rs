//! Canonical catalog file loading and identifier write-back.
//!
//! The catalog is a JSON array of canonical rows, one per declared size.
//! Rows are filtered by the selection flag and folded into
//! [`SourceItemGroup`]s here; the engine never sees raw rows. After an
//! apply run the created outlet ids are appended to a write-back file next
//! to the catalog, so later runs (and the fix-prices mode) can find the
//! outlets without a title search.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use outlet_sync_core::{Price, SourceItemGroup, VariantDeclaration, is_truthy_flag};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("cannot read catalog file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("catalog file {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot write write-back file {path}: {source}")]
    WriteBack {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One canonical catalog row. Prices stay free text here, spreadsheet
/// exports write anything from `64.95` to `"€ 64,95"`.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogRow {
    pub sku: String,
    /// Source product title used for the remote lookups.
    #[serde(default)]
    pub title: String,
    /// Option value for the size option.
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub quantity: i64,
    /// Selection flag; the sheet mixes booleans, numbers and strings.
    #[serde(default)]
    pub online: Value,
    #[serde(default)]
    pub full_price: Option<String>,
    #[serde(default)]
    pub discounted_price: Option<String>,
    /// Outlet id written back by an earlier run.
    #[serde(default)]
    pub product_id: Option<String>,
    /// 1-based spreadsheet row; defaults to position plus a header row.
    #[serde(default)]
    pub row: Option<u32>,
}

/// Load the catalog file and fold its selected rows into groups.
pub fn load_groups(path: &Path) -> Result<Vec<SourceItemGroup>, CatalogError> {
    let raw = fs::read_to_string(path).map_err(|source| CatalogError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let rows: Vec<CatalogRow> =
        serde_json::from_str(&raw).map_err(|source| CatalogError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(group_rows(rows))
}

/// Fold selected rows (truthy flag, quantity > 0) into one group per SKU,
/// preserving first-seen order.
#[must_use]
pub fn group_rows(rows: Vec<CatalogRow>) -> Vec<SourceItemGroup> {
    let mut groups: Vec<SourceItemGroup> = Vec::new();
    for (position, row) in rows.into_iter().enumerate() {
        if !is_truthy_flag(&row.online) || row.quantity <= 0 {
            continue;
        }
        if row.sku.trim().is_empty() {
            tracing::warn!(position, "selected row without a SKU, ignored");
            continue;
        }

        // first data row of a sheet with a header sits at row 2
        let sheet_row = row
            .row
            .unwrap_or_else(|| u32::try_from(position).unwrap_or(u32::MAX).saturating_add(2));
        let declaration = VariantDeclaration {
            option_value: row.size,
            quantity: row.quantity,
            full_price: row.full_price.as_deref().and_then(Price::parse_lenient),
            discounted_price: row.discounted_price.as_deref().and_then(Price::parse_lenient),
            row: sheet_row,
        };

        match groups.iter_mut().find(|group| group.sku == row.sku) {
            Some(group) => {
                if group.title.is_empty() && !row.title.is_empty() {
                    group.title = row.title;
                }
                if group.recorded_product_id.is_none() {
                    group.recorded_product_id = row.product_id;
                }
                group.declarations.push(declaration);
            }
            None => groups.push(SourceItemGroup {
                sku: row.sku,
                title: row.title,
                recorded_product_id: row.product_id,
                declarations: vec![declaration],
            }),
        }
    }
    groups
}

/// One created outlet, recorded for later runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteBackEntry {
    pub sku: String,
    /// Outlet product gid.
    pub outlet_id: String,
    /// Spreadsheet rows the id belongs to.
    pub rows: Vec<u32>,
}

/// Write-back file sitting next to the catalog.
#[must_use]
pub fn write_back_path(catalog: &Path) -> PathBuf {
    catalog.with_extension("writeback.json")
}

/// Append entries to the write-back file, keeping what earlier runs wrote.
pub fn append_write_back(
    catalog: &Path,
    entries: &[WriteBackEntry],
) -> Result<PathBuf, CatalogError> {
    let path = write_back_path(catalog);
    let mut all: Vec<WriteBackEntry> = match fs::read_to_string(&path) {
        Ok(raw) => serde_json::from_str(&raw).map_err(|source| CatalogError::Parse {
            path: path.clone(),
            source,
        })?,
        Err(_) => Vec::new(),
    };
    all.extend(entries.iter().cloned());
    let raw = serde_json::to_string_pretty(&all).map_err(|source| CatalogError::Parse {
        path: path.clone(),
        source,
    })?;
    fs::write(&path, raw).map_err(|source| CatalogError::WriteBack {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

// 📚 Master Catalogue - Read-only item data loaded once at startup
//
// Source: item_list.csv exported from the store's back office
//   Item Code, Brand, Description, Price[, Sub Department]
//
// Rows are validated on load (not trusted at use time). Bad rows are
// skipped and reported, never half-loaded.

use crate::barcode::{CanonicalCode, CatalogueLookup, CODE_LEN};
use crate::price::{Price, PriceError};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

// ============================================================================
// ENTRY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogueEntry {
    pub code: CanonicalCode,
    pub brand: String,
    pub description: String,
    pub price: Price,
    #[serde(default)]
    pub subdept: String,
}

/// One CSV row as exported, before validation.
#[derive(Debug, Deserialize)]
struct CatalogueRow {
    #[serde(rename = "Item Code", default)]
    item_code: String,

    #[serde(rename = "Brand", default)]
    brand: String,

    #[serde(rename = "Description", default)]
    description: String,

    #[serde(rename = "Price", default)]
    price: String,

    #[serde(rename = "Sub Department", alias = "Subdept", alias = "SubDept", default)]
    subdept: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogueError {
    #[error("missing item code")]
    MissingCode,

    #[error("item code {0:?} is not numeric")]
    NonNumericCode(String),

    #[error("item code {0:?} is longer than 13 digits")]
    CodeTooLong(String),

    #[error("bad price for {code}: {source}")]
    BadPrice {
        code: String,
        #[source]
        source: PriceError,
    },
}

impl CatalogueRow {
    fn validate(self) -> Result<CatalogueEntry, CatalogueError> {
        let code = self.item_code.trim();
        if code.is_empty() {
            return Err(CatalogueError::MissingCode);
        }
        if !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CatalogueError::NonNumericCode(code.to_string()));
        }
        if code.len() > CODE_LEN {
            return Err(CatalogueError::CodeTooLong(code.to_string()));
        }

        let price = Price::parse(&self.price).map_err(|source| CatalogueError::BadPrice {
            code: code.to_string(),
            source,
        })?;

        // Back-office exports drop leading zeros; keys are always 13 digits
        let code = CanonicalCode::new(format!("{:0>width$}", code, width = CODE_LEN))
            .map_err(|_| CatalogueError::NonNumericCode(code.to_string()))?;

        Ok(CatalogueEntry {
            code,
            brand: self.brand.trim().to_string(),
            description: self.description.trim().to_string(),
            price,
            subdept: self.subdept.trim().to_string(),
        })
    }
}

// ============================================================================
// LOAD REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    /// 1-based line in the CSV file (header = line 1)
    pub line: u64,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub duplicates: usize,
    pub rejected: Vec<RejectedRow>,
}

// ============================================================================
// CATALOGUE
// ============================================================================

/// Immutable lookup built once and shared by reference (or `Arc`).
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    items: BTreeMap<CanonicalCode, CatalogueEntry>,
}

impl Catalogue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = CatalogueEntry>) -> Self {
        Catalogue {
            items: entries.into_iter().map(|e| (e.code.clone(), e)).collect(),
        }
    }

    /// Load from the item CSV. The file must exist and have a header row.
    pub fn from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<(Self, LoadReport)> {
        let file = std::fs::File::open(path.as_ref())
            .with_context(|| format!("Failed to open item list: {:?}", path.as_ref()))?;
        Self::from_reader(file)
            .with_context(|| format!("Failed to read item list: {:?}", path.as_ref()))
    }

    /// Parse catalogue CSV from any reader.
    pub fn from_reader<R: Read>(reader: R) -> anyhow::Result<(Self, LoadReport)> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .flexible(true)
            .from_reader(reader);

        let mut items = BTreeMap::new();
        let mut report = LoadReport::default();

        let headers = rdr
            .headers()
            .context("Failed to read catalogue header row")?
            .clone();

        for result in rdr.records() {
            let record = result.context("Failed to read catalogue CSV")?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            let row: CatalogueRow = match record.deserialize(Some(&headers)) {
                Ok(row) => row,
                Err(e) => {
                    tracing::warn!(line, error = %e, "skipping unreadable catalogue row");
                    report.rejected.push(RejectedRow {
                        line,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            // Blank lines in spreadsheets come through as all-empty records
            if row.item_code.trim().is_empty()
                && row.brand.trim().is_empty()
                && row.description.trim().is_empty()
            {
                continue;
            }

            match row.validate() {
                Ok(entry) => {
                    if items.insert(entry.code.clone(), entry).is_some() {
                        report.duplicates += 1;
                    }
                }
                Err(e) => {
                    tracing::warn!(line, error = %e, "skipping catalogue row");
                    report.rejected.push(RejectedRow {
                        line,
                        reason: e.to_string(),
                    });
                }
            }
        }

        report.loaded = items.len();
        tracing::info!(
            loaded = report.loaded,
            duplicates = report.duplicates,
            rejected = report.rejected.len(),
            "catalogue loaded"
        );

        Ok((Catalogue { items }, report))
    }

    pub fn get(&self, code: &str) -> Option<&CatalogueEntry> {
        self.items.get(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.items.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All entries, ordered by code.
    pub fn iter(&self) -> impl Iterator<Item = &CatalogueEntry> {
        self.items.values()
    }
}

impl CatalogueLookup for Catalogue {
    fn lookup(&self, code: &CanonicalCode) -> Option<CatalogueEntry> {
        self.items.get(code).cloned()
    }
}

// ============================================================================
// TESTS
// ============================================================================

// Inventory Counts - Core Library
// Exposes all modules for use in the CLI, the TUI, the API server and tests

pub mod price;
pub mod barcode;     // Canonical codes, scale labels, resolver
pub mod catalogue;   // Master item list (read-only after load)
pub mod inventory;   // Count lists + merge / separate-line policy
pub mod db;          // SQLite list store + audit events
pub mod export;      // CSV export
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use price::{Price, PriceError, format_cents};
pub use barcode::{
    CanonicalCode, CodeShape, BarcodeError, ScaleDecodeResult, ResolvedItem, CatalogueLookup,
    canonicalize, decode_scale_label, resolve, strip_digits,
};
pub use catalogue::{Catalogue, CatalogueEntry, CatalogueError, LoadReport};
pub use inventory::{
    InventoryList, InventoryError, LineItem, ManualDetails, ScanOutcome, scale_storage_key, MAX_QTY,
};
pub use db::{
    Event, ItemLookup, ListSummary, StoreError,
    open_database, setup_database, create_list, load_list, load_all_lists, list_names, list_summaries,
    delete_list, delete_all_lists, record_scan, adjust_line, lookup_for_list,
    insert_event, get_events_for_entity,
};
pub use export::{write_list_csv, write_all_lists_csv, list_csv_string, all_lists_csv_string};
pub use config::{Config, ConfigError, LogFormat};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

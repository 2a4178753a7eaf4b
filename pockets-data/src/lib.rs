pub mod export;
pub mod import;
pub mod slabs;

pub use export::{
    CSV_HEADER, ExportBundle, ExportError, export_file_name, transactions_to_csv,
    write_transactions_csv,
};
pub use import::{ImportError, load_from_file, load_from_str};
pub use slabs::{SlabLoadError, SlabRecord, SlabTableLoader};

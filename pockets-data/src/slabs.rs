//! Tax slab tables from CSV.
//!
//! ```csv
//! regime,min,max,rate
//! old,0,250000,0
//! old,250000,500000,0.05
//! old,500000,1000000,0.20
//! old,1000000,,0.30
//! new,0,300000,0
//! ...
//! ```
//!
//! `regime` is `old` or `new` (case-insensitive), `max` is left empty for the
//! unbounded top slab and `rate` is a fraction. Rows of one regime must be
//! listed in ascending order; regimes may be interleaved.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use pockets_core::{Regime, SlabTableError, TaxRegimeTable, TaxSlab};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SlabLoadError {
    #[error("CSV parse error: {0}")]
    Parse(#[from] csv::Error),

    #[error("invalid {field} '{value}' on row {row}")]
    InvalidNumber {
        field: &'static str,
        value: String,
        row: usize,
    },

    #[error("unrecognised regime '{regime}' on row {row}")]
    InvalidRegime { regime: String, row: usize },

    #[error("invalid slab table: {0}")]
    Table(#[from] SlabTableError),

    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlabRecord {
    pub regime: String,
    pub min: Decimal,
    pub max: Option<Decimal>,
    pub rate: Decimal,
}

/// One CSV row as text; numbers are parsed with `Decimal::from_str` so
/// they never pass through a float.
#[derive(Debug, Deserialize)]
struct RawSlabRow {
    regime: String,
    min: String,
    max: String,
    rate: String,
}

impl RawSlabRow {
    fn into_record(self, row: usize) -> Result<SlabRecord, SlabLoadError> {
        let number = |field: &'static str, value: &str| {
            Decimal::from_str(value).map_err(|_| SlabLoadError::InvalidNumber {
                field,
                value: value.to_string(),
                row,
            })
        };

        let max = if self.max.is_empty() {
            None
        } else {
            Some(number("max", &self.max)?)
        };
        Ok(SlabRecord {
            min: number("min", &self.min)?,
            max,
            rate: number("rate", &self.rate)?,
            regime: self.regime,
        })
    }
}

pub struct SlabTableLoader;

impl SlabTableLoader {
    /// Parse raw records in file order.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<SlabRecord>, SlabLoadError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = Vec::new();
        for (idx, result) in csv_reader.deserialize().enumerate() {
            let raw: RawSlabRow = result?;
            records.push(raw.into_record(idx + 1)?);
        }

        Ok(records)
    }

    /// Build a validated table from parsed records.
    pub fn build(
        records: &[SlabRecord],
        cess_rate: Decimal,
    ) -> Result<TaxRegimeTable, SlabLoadError> {
        let mut old = Vec::new();
        let mut new = Vec::new();

        for (idx, record) in records.iter().enumerate() {
            let regime =
                Regime::parse(&record.regime).ok_or_else(|| SlabLoadError::InvalidRegime {
                    regime: record.regime.clone(),
                    row: idx + 1,
                })?;
            let slab = TaxSlab::new(record.min, record.max, record.rate);
            match regime {
                Regime::Old => old.push(slab),
                Regime::New => new.push(slab),
            }
        }

        debug!(old = old.len(), new = new.len(), %cess_rate, "building slab table");
        Ok(TaxRegimeTable::new(old, new, cess_rate)?)
    }

    pub fn load<R: Read>(
        reader: R,
        cess_rate: Decimal,
    ) -> Result<TaxRegimeTable, SlabLoadError> {
        let records = Self::parse(reader)?;
        Self::build(&records, cess_rate)
    }

    pub fn load_from_file(
        path: &Path,
        cess_rate: Decimal,
    ) -> Result<TaxRegimeTable, SlabLoadError> {
        let file = std::fs::File::open(path).map_err(|source| SlabLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::load(file, cess_rate)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const HEADER: &str = "regime,min,max,rate\n";

    fn csv(rows: &str) -> String {
        format!("{HEADER}{rows}")
    }

    #[test]
    fn test_parse_single_record() {
        let records = SlabTableLoader::parse(csv("old,0,250000,0\n").as_bytes())
            .expect("Failed to parse CSV");

        assert_eq!(
            records,
            vec![SlabRecord {
                regime: "old".to_string(),
                min: dec!(0),
                max: Some(dec!(250000)),
                rate: dec!(0),
            }]
        );
    }

    #[test]
    fn test_parse_empty_max_is_unbounded() {
        let records = SlabTableLoader::parse(csv("new, 1500000 , , 0.30\n").as_bytes())
            .expect("Failed to parse CSV");

        assert_eq!(records[0].max, None);
        assert_eq!(records[0].min, dec!(1500000));
        assert_eq!(records[0].rate, dec!(0.30));
    }

    #[test]
    fn test_parse_bad_decimal() {
        let err = SlabTableLoader::parse(csv("old,zero,250000,0\n").as_bytes())
            .expect_err("Should fail for invalid decimal");

        match err {
            SlabLoadError::InvalidNumber { field, value, row } => {
                assert_eq!(field, "min");
                assert_eq!(value, "zero");
                assert_eq!(row, 1);
            }
            other => panic!("expected InvalidNumber, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_keeps_exact_decimals() {
        let records =
            SlabTableLoader::parse(csv("old,250000.50,12345678901234.123456,0.125
").as_bytes())
                .expect("Failed to parse CSV");

        assert_eq!(records[0].min.to_string(), "250000.50");
        assert_eq!(records[0].max.map(|m| m.to_string()), Some("12345678901234.123456".to_string()));
        assert_eq!(records[0].rate.to_string(), "0.125");
    }

    #[test]
    fn test_build_interleaved_regimes() {
        let data = csv(
            "old,0,250000,0\n\
             new,0,300000,0\n\
             old,250000,,0.10\n\
             new,300000,,0.05\n",
        );

        let table = SlabTableLoader::load(data.as_bytes(), dec!(0.04)).expect("Should load");

        assert_eq!(table.slabs(Regime::Old).len(), 2);
        assert_eq!(table.slabs(Regime::New).len(), 2);
        assert_eq!(table.slabs(Regime::Old)[1].rate, dec!(0.10));
        assert_eq!(table.cess_rate(), dec!(0.04));
    }

    #[test]
    fn test_build_rejects_unknown_regime() {
        let data = csv("old,0,,0\nmiddle,0,,0\n");

        let err = SlabTableLoader::load(data.as_bytes(), dec!(0.04)).expect_err("Should fail");

        match err {
            SlabLoadError::InvalidRegime { regime, row } => {
                assert_eq!(regime, "middle");
                assert_eq!(row, 2);
            }
            other => panic!("expected InvalidRegime, got {other:?}"),
        }
    }

    #[test]
    fn test_build_rejects_gap() {
        let data = csv(
            "old,0,250000,0\n\
             old,300000,,0.05\n\
             new,0,,0\n",
        );

        let err = SlabTableLoader::load(data.as_bytes(), dec!(0.04)).expect_err("Should fail");

        assert!(
            matches!(
                err,
                SlabLoadError::Table(SlabTableError::NotContiguous { .. })
            ),
            "{err:?}"
        );
    }

    #[test]
    fn test_build_rejects_missing_regime() {
        let data = csv("old,0,,0\n");

        let err = SlabTableLoader::load(data.as_bytes(), dec!(0.04)).expect_err("Should fail");

        assert!(
            matches!(err, SlabLoadError::Table(SlabTableError::Empty(Regime::New))),
            "{err:?}"
        );
    }

    #[test]
    fn test_load_from_missing_file() {
        let err = SlabTableLoader::load_from_file(Path::new("does/not/exist.csv"), dec!(0.04))
            .expect_err("Should fail");

        assert!(matches!(err, SlabLoadError::Io { .. }), "{err:?}");
        assert!(err.to_string().contains("does/not/exist.csv"));
    }
}

//! Slab (bracket) definitions for both tax regimes.
//!
//! Bracket values live here and nowhere else; the calculator only walks the
//! table it is given. Swapping in a new fiscal year means building a new
//! [`TaxRegimeTable`] (see `pockets-data` for the CSV loader).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Regime;

/// A contiguous income range taxed at one marginal rate.
///
/// `max == None` marks the terminal, unbounded slab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxSlab {
    pub min: Decimal,
    pub max: Option<Decimal>,
    pub rate: Decimal,
}

impl TaxSlab {
    pub fn new(min: Decimal, max: Option<Decimal>, rate: Decimal) -> Self {
        Self { min, max, rate }
    }

    /// Portion of `income` that falls inside `[min, max)`.
    pub fn portion_of(&self, income: Decimal) -> Decimal {
        if income <= self.min {
            return Decimal::ZERO;
        }
        let upper = match self.max {
            Some(max) if income > max => max,
            _ => income,
        };
        upper - self.min
    }
}

/// Reasons a slab table is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlabTableError {
    #[error("{0} regime has no slabs")]
    Empty(Regime),

    #[error("{regime} regime must start at 0, first slab starts at {min}")]
    NotStartingAtZero { regime: Regime, min: Decimal },

    #[error("{regime} regime slab {index} starts at {min} but previous slab ends at {previous_max}")]
    NotContiguous {
        regime: Regime,
        index: usize,
        previous_max: Decimal,
        min: Decimal,
    },

    #[error("{regime} regime slab {index} has an empty or inverted range")]
    InvertedRange { regime: Regime, index: usize },

    #[error("{regime} regime slab {index} lowers the rate from {previous_rate} to {rate}")]
    DecreasingRate {
        regime: Regime,
        index: usize,
        previous_rate: Decimal,
        rate: Decimal,
    },

    #[error("{regime} regime slab {index} rate {rate} is outside 0..=1")]
    RateOutOfRange {
        regime: Regime,
        index: usize,
        rate: Decimal,
    },

    #[error("{regime} regime has an unbounded slab before the last position ({index})")]
    UnboundedNotTerminal { regime: Regime, index: usize },

    #[error("{0} regime has no terminal unbounded slab")]
    MissingUnbounded(Regime),

    #[error("cess rate {0} is outside 0..=1")]
    CessOutOfRange(Decimal),
}

/// Ordered slabs for both regimes plus the flat cess applied on top.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRegimeTable {
    old: Vec<TaxSlab>,
    new: Vec<TaxSlab>,
    cess_rate: Decimal,
}

impl TaxRegimeTable {
    /// Build a table and check every invariant.
    pub fn new(
        old: Vec<TaxSlab>,
        new: Vec<TaxSlab>,
        cess_rate: Decimal,
    ) -> Result<Self, SlabTableError> {
        let table = Self {
            old,
            new,
            cess_rate,
        };
        table.validate()?;
        Ok(table)
    }

    /// The built-in table: old and new regime slabs with a 4% cess.
    pub fn builtin() -> Self {
        let slab = |min: i64, max: Option<i64>, rate_pct: i64| {
            TaxSlab::new(
                Decimal::from(min),
                max.map(Decimal::from),
                Decimal::new(rate_pct, 2),
            )
        };

        Self {
            old: vec![
                slab(0, Some(250_000), 0),
                slab(250_000, Some(500_000), 5),
                slab(500_000, Some(1_000_000), 20),
                slab(1_000_000, None, 30),
            ],
            new: vec![
                slab(0, Some(300_000), 0),
                slab(300_000, Some(600_000), 5),
                slab(600_000, Some(900_000), 10),
                slab(900_000, Some(1_200_000), 15),
                slab(1_200_000, Some(1_500_000), 20),
                slab(1_500_000, None, 30),
            ],
            cess_rate: Decimal::new(4, 2),
        }
    }

    pub fn slabs(&self, regime: Regime) -> &[TaxSlab] {
        match regime {
            Regime::Old => &self.old,
            Regime::New => &self.new,
        }
    }

    pub fn cess_rate(&self) -> Decimal {
        self.cess_rate
    }

    /// Check contiguity, coverage of `[0, ∞)` and non-decreasing rates.
    pub fn validate(&self) -> Result<(), SlabTableError> {
        if self.cess_rate < Decimal::ZERO || self.cess_rate > Decimal::ONE {
            return Err(SlabTableError::CessOutOfRange(self.cess_rate));
        }
        for regime in Regime::all() {
            validate_slabs(*regime, self.slabs(*regime))?;
        }
        Ok(())
    }
}

impl Default for TaxRegimeTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn validate_slabs(
    regime: Regime,
    slabs: &[TaxSlab],
) -> Result<(), SlabTableError> {
    let first = slabs.first().ok_or(SlabTableError::Empty(regime))?;
    if first.min != Decimal::ZERO {
        return Err(SlabTableError::NotStartingAtZero {
            regime,
            min: first.min,
        });
    }

    let last_index = slabs.len() - 1;
    for (index, slab) in slabs.iter().enumerate() {
        if slab.rate < Decimal::ZERO || slab.rate > Decimal::ONE {
            return Err(SlabTableError::RateOutOfRange {
                regime,
                index,
                rate: slab.rate,
            });
        }

        match slab.max {
            Some(max) if max <= slab.min => {
                return Err(SlabTableError::InvertedRange { regime, index });
            }
            None if index != last_index => {
                return Err(SlabTableError::UnboundedNotTerminal { regime, index });
            }
            _ => {}
        }

        if index > 0 {
            let previous = &slabs[index - 1];
            // previous.max is Some here, an earlier None would have failed above
            let previous_max = previous.max.unwrap_or(Decimal::MAX);
            if previous_max != slab.min {
                return Err(SlabTableError::NotContiguous {
                    regime,
                    index,
                    previous_max,
                    min: slab.min,
                });
            }
            if slab.rate < previous.rate {
                return Err(SlabTableError::DecreasingRate {
                    regime,
                    index,
                    previous_rate: previous.rate,
                    rate: slab.rate,
                });
            }
        }
    }

    if slabs[last_index].max.is_some() {
        return Err(SlabTableError::MissingUnbounded(regime));
    }

    Ok(())
}

// src/eval/types.rs
// Core types for the evaluation engine

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// Validation and degenerate-input failures surfaced by `evaluate`
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Ground-truth or mask shape differs from the prediction shape
    #[error("{input} shape {actual:?} does not match prediction shape {expected:?}")]
    ShapeMismatch {
        input: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// Nested-array construction with uneven row lengths
    #[error("matrix row {row} has {got} periods, expected {expected}")]
    RaggedMatrix {
        row: usize,
        expected: usize,
        got: usize,
    },

    /// Ticker list length differs from the asset count
    #[error("ticker list has {got} entries for {expected} assets")]
    TickerCountMismatch { expected: usize, got: usize },

    /// The top-k specification is empty
    #[error("top-k specification is empty")]
    EmptyTopK,

    /// A requested k is below 1
    #[error("top-k entries must be at least 1, got {0}")]
    InvalidTopK(usize),

    /// A normalization denominator is zero
    #[error("degenerate input: {0}")]
    DegenerateInput(String),
}

// ============================================================================
// Matrix
// ============================================================================

/// Dense asset-by-period matrix (row-major, one row per asset)
///
/// Deserializes from nested JSON arrays; ragged input is rejected.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>")]
pub struct Matrix {
    data: Vec<f64>,
    assets: usize,
    periods: usize,
}

impl Matrix {
    /// Build from per-asset rows; all rows must share one length
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, EvalError> {
        let assets = rows.len();
        let periods = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(assets * periods);

        for (row, values) in rows.iter().enumerate() {
            if values.len() != periods {
                return Err(EvalError::RaggedMatrix {
                    row,
                    expected: periods,
                    got: values.len(),
                });
            }
            data.extend_from_slice(values);
        }

        Ok(Self {
            data,
            assets,
            periods,
        })
    }

    /// All-zero matrix of the given shape
    pub fn zeros(assets: usize, periods: usize) -> Self {
        Self {
            data: vec![0.0; assets * periods],
            assets,
            periods,
        }
    }

    pub fn assets(&self) -> usize {
        self.assets
    }

    pub fn periods(&self) -> usize {
        self.periods
    }

    /// (assets, periods)
    pub fn shape(&self) -> (usize, usize) {
        (self.assets, self.periods)
    }

    #[inline]
    pub fn get(&self, asset: usize, period: usize) -> f64 {
        self.data[asset * self.periods + period]
    }

    #[inline]
    pub fn set(&mut self, asset: usize, period: usize, value: f64) {
        self.data[asset * self.periods + period] = value;
    }

    /// Copy of one period's values across all assets
    pub fn column(&self, period: usize) -> Vec<f64> {
        (0..self.assets).map(|asset| self.get(asset, period)).collect()
    }
}

impl TryFrom<Vec<Vec<f64>>> for Matrix {
    type Error = EvalError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self, Self::Error> {
        Self::from_rows(&rows)
    }
}

// ============================================================================
// Options
// ============================================================================

/// Configuration for one evaluation call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EvalOptions {
    /// Display identifiers, one per asset; `Stock_<index>` labels when absent
    pub tickers: Option<Vec<String>>,
    /// Emit the per-day selection report
    pub report: bool,
    /// Strategy sizes to evaluate; each k picks the k highest-ranked valid assets
    pub top_k: Vec<usize>,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            tickers: None,
            report: false,
            top_k: vec![1],
        }
    }
}

// ============================================================================
// API Request Types
// ============================================================================

/// Request to evaluate a prediction matrix, as accepted by the HTTP and WASM surfaces
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvalRequest {
    pub prediction: Matrix,
    pub ground_truth: Matrix,
    pub mask: Matrix,
    #[serde(default)]
    pub tickers: Option<Vec<String>>,
    #[serde(default)]
    pub report: bool,
    #[serde(default = "default_top_k")]
    pub top_k: Vec<usize>,
}

fn default_top_k() -> Vec<usize> {
    vec![1]
}

impl EvalRequest {
    pub fn options(&self) -> EvalOptions {
        EvalOptions {
            tickers: self.tickers.clone(),
            report: self.report,
            top_k: self.top_k.clone(),
        }
    }
}

// ============================================================================
// Selection Log
// ============================================================================

/// One selected asset with its predicted and realized values
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pick {
    pub asset: usize,
    pub ticker: String,
    pub predicted: f64,
    pub actual: f64,
}

/// Per-period selections, one entry per requested k
///
/// Picks are stored in descending predicted order (the walk order), so the
/// log and any rendering of it are deterministic.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySelection {
    pub day: usize,
    pub top: BTreeMap<usize, Vec<Pick>>,
}

// ============================================================================
// Results
// ============================================================================

/// Aggregated evaluation metrics
///
/// `backtest` holds the final additive portfolio value per k: accrual starts
/// at 1.0 and adds each period's equal-weight return, so the value is
/// 1.0 + total return, not a compounded equity.
#[derive(Debug, Clone, PartialEq)]
pub struct Performance {
    pub mse: f64,
    /// Mean reciprocal rank of the top-1 pick; 0.0 when k=1 was not requested
    pub mrrt: f64,
    pub backtest: BTreeMap<usize, f64>,
}

impl Performance {
    /// Total return of the top-k strategy (final value minus the 1.0 baseline)
    pub fn total_return(&self, k: usize) -> Option<f64> {
        self.backtest.get(&k).map(|value| value - 1.0)
    }
}

// Flatten per-k values into `btl<k>` keys: {"mse":..,"mrrt":..,"btl1":..,"btl5":..}
impl Serialize for Performance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2 + self.backtest.len()))?;
        map.serialize_entry("mse", &self.mse)?;
        map.serialize_entry("mrrt", &self.mrrt)?;
        for (k, value) in &self.backtest {
            map.serialize_entry(&format!("btl{}", k), value)?;
        }
        map.end()
    }
}

/// Full result of one evaluation call
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub performance: Performance,
    pub days: Vec<DaySelection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<String>,
}

//! # Signal Eval
//!
//! Evaluation engine for cross-sectional return-prediction models.
//!
//! ## Features
//! - Mask-weighted regression error over the full prediction matrix
//! - Top-1 mean reciprocal rank against the realized ranking
//! - Additive equal-weight top-K backtest, any number of K's per run
//! - Optional per-day selection report
//! - Compiles to native and WASM
//!
//! ## Example
//! ```
//! use signal_eval::{evaluate, EvalOptions, Matrix};
//!
//! let prediction = Matrix::from_rows(&[vec![0.5], vec![0.9], vec![0.1]]).unwrap();
//! let ground_truth = Matrix::from_rows(&[vec![0.2], vec![0.3], vec![-0.1]]).unwrap();
//! let mask = Matrix::from_rows(&[vec![1.0], vec![1.0], vec![1.0]]).unwrap();
//!
//! let result = evaluate(&prediction, &ground_truth, &mask, &EvalOptions::default()).unwrap();
//! assert!((result.performance.mrrt - 1.0).abs() < 1e-12);
//! assert!((result.performance.backtest[&1] - 1.3).abs() < 1e-12);
//! ```

pub mod common;
pub mod eval;

// Re-export the evaluation surface at crate root
pub use eval::{
    evaluate, render_report, DaySelection, EvalError, EvalOptions, EvalRequest, Evaluation,
    Matrix, Performance, Pick,
};

#[cfg(feature = "wasm")]
use wasm_bindgen::prelude::*;

/// WASM bindings for browser/Node.js use
#[cfg(feature = "wasm")]
#[wasm_bindgen]
pub struct Evaluator;

#[cfg(feature = "wasm")]
#[wasm_bindgen]
impl Evaluator {
    /// Evaluate a JSON request (same schema as the HTTP endpoint)
    ///
    /// Returns the evaluation as JSON, or an `{"error": ...}` object when the
    /// request fails to parse or validate.
    #[wasm_bindgen]
    pub fn evaluate_json(request: &str) -> String {
        let request: EvalRequest = match serde_json::from_str(request) {
            Ok(request) => request,
            Err(e) => return serde_json::json!({ "error": e.to_string() }).to_string(),
        };

        match evaluate(
            &request.prediction,
            &request.ground_truth,
            &request.mask,
            &request.options(),
        ) {
            Ok(result) => serde_json::to_string(&result)
                .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }).to_string()),
            Err(e) => serde_json::json!({ "error": e.to_string() }).to_string(),
        }
    }
}

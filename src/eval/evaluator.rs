// src/eval/evaluator.rs
// Main evaluation pipeline - validation, masked MSE, per-period accrual

use std::collections::BTreeMap;

use crate::common::rank_descending;
use crate::eval::ranking::{reciprocal_rank_position, select_top_k};
use crate::eval::report::render_report;
use crate::eval::types::{
    DaySelection, EvalError, EvalOptions, Evaluation, Matrix, Performance, Pick,
};

/// Display label for an asset index
fn ticker_label(tickers: Option<&[String]>, asset: usize) -> String {
    match tickers {
        Some(tickers) => tickers[asset].clone(),
        None => format!("Stock_{}", asset),
    }
}

/// Validate the requested top-k list and collapse duplicates
///
/// First-occurrence order is preserved; a repeated k must not accrue its
/// backtest twice.
fn normalize_top_k(top_k: &[usize]) -> Result<Vec<usize>, EvalError> {
    if top_k.is_empty() {
        return Err(EvalError::EmptyTopK);
    }

    let mut ks: Vec<usize> = Vec::with_capacity(top_k.len());
    for &k in top_k {
        if k == 0 {
            return Err(EvalError::InvalidTopK(k));
        }
        if !ks.contains(&k) {
            ks.push(k);
        }
    }
    Ok(ks)
}

/// Mask-weighted mean squared error over the entire matrix
///
/// The mask is a multiplicative weight applied before squaring; masked-out
/// entries are weighted down, not filtered out.
fn masked_mse(prediction: &Matrix, ground_truth: &Matrix, mask: &Matrix) -> Result<f64, EvalError> {
    let (assets, periods) = prediction.shape();
    let mut squared_sum = 0.0;
    let mut weight_sum = 0.0;

    for asset in 0..assets {
        for period in 0..periods {
            let diff = (prediction.get(asset, period) - ground_truth.get(asset, period))
                * mask.get(asset, period);
            squared_sum += diff * diff;
            weight_sum += mask.get(asset, period);
        }
    }

    if weight_sum == 0.0 {
        return Err(EvalError::DegenerateInput("mask weight sum is zero".to_string()));
    }
    Ok(squared_sum / weight_sum)
}

/// Evaluate a prediction matrix against realized outcomes
///
/// Computes the mask-weighted MSE, an additive equal-weight top-k backtest
/// per requested k, and (when k=1 is requested) the mean reciprocal rank of
/// the top pick within the true ranking. Periods are processed in increasing
/// order; all accumulators are local to the call, so independent evaluations
/// can run concurrently.
///
/// The backtest adds each period's `sum(selected realized returns) / k` to a
/// running value starting at 1.0. The division uses the nominal k even when
/// fewer than k valid assets were available that period.
///
/// When `options.report` is set, the rendered report is written to stdout
/// and also carried in the returned `Evaluation`.
pub fn evaluate(
    prediction: &Matrix,
    ground_truth: &Matrix,
    mask: &Matrix,
    options: &EvalOptions,
) -> Result<Evaluation, EvalError> {
    let shape = prediction.shape();
    if ground_truth.shape() != shape {
        return Err(EvalError::ShapeMismatch {
            input: "ground truth",
            expected: shape,
            actual: ground_truth.shape(),
        });
    }
    if mask.shape() != shape {
        return Err(EvalError::ShapeMismatch {
            input: "mask",
            expected: shape,
            actual: mask.shape(),
        });
    }
    if let Some(tickers) = options.tickers.as_deref() {
        if tickers.len() != shape.0 {
            return Err(EvalError::TickerCountMismatch {
                expected: shape.0,
                got: tickers.len(),
            });
        }
    }

    let ks = normalize_top_k(&options.top_k)?;
    let top1_slot = ks.iter().position(|&k| k == 1);

    let mse = masked_mse(prediction, ground_truth, mask)?;

    let periods = shape.1;
    let mut bt_values: Vec<f64> = vec![1.0; ks.len()];
    let mut mrr_sum = 0.0;
    let mut miss_days = 0usize;
    let mut days: Vec<DaySelection> = Vec::with_capacity(periods);

    for period in 0..periods {
        let pred_col = prediction.column(period);
        let truth_col = ground_truth.column(period);
        let mask_col = mask.column(period);

        let order = rank_descending(&pred_col);
        let selections = select_top_k(&order, &mask_col, &ks);

        let mut top = BTreeMap::new();
        for (slot, (&k, selection)) in ks.iter().zip(&selections).enumerate() {
            let picks: Vec<Pick> = selection
                .iter()
                .map(|&asset| Pick {
                    asset,
                    ticker: ticker_label(options.tickers.as_deref(), asset),
                    predicted: pred_col[asset],
                    actual: truth_col[asset],
                })
                .collect();
            top.insert(k, picks);

            let realized: f64 = selection.iter().map(|&asset| truth_col[asset]).sum();
            bt_values[slot] += realized / k as f64;
        }

        if let Some(slot) = top1_slot {
            let truth_order = rank_descending(&truth_col);
            match reciprocal_rank_position(&truth_order, &mask_col, &selections[slot]) {
                Some(position) => mrr_sum += 1.0 / position as f64,
                None => miss_days += 1,
            }
        }

        days.push(DaySelection { day: period, top });
    }

    let mrrt = if top1_slot.is_some() {
        let scored_days = periods - miss_days;
        if scored_days == 0 {
            return Err(EvalError::DegenerateInput(
                "every period is a miss day for MRR".to_string(),
            ));
        }
        mrr_sum / scored_days as f64
    } else {
        0.0
    };

    let performance = Performance {
        mse,
        mrrt,
        backtest: ks.iter().copied().zip(bt_values).collect(),
    };

    let report = if options.report {
        let text = render_report(&performance, &days, &ks);
        println!("{}", text);
        Some(text)
    } else {
        None
    };

    Ok(Evaluation {
        performance,
        days,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ones(assets: usize, periods: usize) -> Matrix {
        Matrix::from_rows(&vec![vec![1.0; periods]; assets]).unwrap()
    }

    #[test]
    fn test_normalize_top_k_collapses_duplicates() {
        assert_eq!(normalize_top_k(&[5, 1, 5, 1]).unwrap(), vec![5, 1]);
    }

    #[test]
    fn test_normalize_top_k_rejects_empty_and_zero() {
        assert_eq!(normalize_top_k(&[]).unwrap_err(), EvalError::EmptyTopK);
        assert_eq!(normalize_top_k(&[1, 0]).unwrap_err(), EvalError::InvalidTopK(0));
    }

    #[test]
    fn test_ticker_label_fallback() {
        let tickers = vec!["AAPL".to_string()];
        assert_eq!(ticker_label(Some(&tickers), 0), "AAPL");
        assert_eq!(ticker_label(None, 3), "Stock_3");
    }

    #[test]
    fn test_masked_mse_weights_entries() {
        let prediction = Matrix::from_rows(&[vec![0.5], vec![0.9], vec![0.1]]).unwrap();
        let truth = Matrix::from_rows(&[vec![0.2], vec![0.3], vec![-0.1]]).unwrap();

        let full = masked_mse(&prediction, &truth, &ones(3, 1)).unwrap();
        assert!((full - 0.49 / 3.0).abs() < 1e-12);

        // Masking asset 0 removes its term and shrinks the denominator to 2
        let mask = Matrix::from_rows(&[vec![0.0], vec![1.0], vec![1.0]]).unwrap();
        let partial = masked_mse(&prediction, &truth, &mask).unwrap();
        assert!((partial - 0.40 / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_masked_mse_zero_weight_is_degenerate() {
        let zeros = Matrix::zeros(2, 2);
        let err = masked_mse(&ones(2, 2), &ones(2, 2), &zeros).unwrap_err();
        assert!(matches!(err, EvalError::DegenerateInput(_)));
    }

    #[test]
    fn test_shape_mismatch_reports_both_shapes() {
        let err = evaluate(&ones(3, 2), &ones(3, 1), &ones(3, 2), &EvalOptions::default())
            .unwrap_err();
        assert_eq!(
            err,
            EvalError::ShapeMismatch {
                input: "ground truth",
                expected: (3, 2),
                actual: (3, 1),
            }
        );

        let err = evaluate(&ones(3, 2), &ones(3, 2), &ones(2, 2), &EvalOptions::default())
            .unwrap_err();
        assert_eq!(
            err,
            EvalError::ShapeMismatch {
                input: "mask",
                expected: (3, 2),
                actual: (2, 2),
            }
        );
    }

    #[test]
    fn test_ticker_count_mismatch() {
        let options = EvalOptions {
            tickers: Some(vec!["AAPL".to_string()]),
            ..EvalOptions::default()
        };
        let err = evaluate(&ones(2, 1), &ones(2, 1), &ones(2, 1), &options).unwrap_err();
        assert_eq!(err, EvalError::TickerCountMismatch { expected: 2, got: 1 });
    }

    #[test]
    fn test_all_miss_days_is_degenerate() {
        // Mask weights below the validity threshold keep the MSE denominator
        // nonzero while leaving every period without a valid asset
        let mask = Matrix::from_rows(&[vec![0.3], vec![0.3]]).unwrap();
        let err = evaluate(&ones(2, 1), &ones(2, 1), &mask, &EvalOptions::default()).unwrap_err();
        assert!(matches!(err, EvalError::DegenerateInput(_)));
    }

    #[test]
    fn test_mrrt_zero_when_top1_not_requested() {
        let options = EvalOptions {
            top_k: vec![2],
            ..EvalOptions::default()
        };
        let result = evaluate(&ones(3, 1), &ones(3, 1), &ones(3, 1), &options).unwrap();
        assert_eq!(result.performance.mrrt, 0.0);
    }
}

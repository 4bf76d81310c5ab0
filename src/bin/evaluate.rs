//! Prediction evaluation CLI
//!
//! Reads a long-format parquet file of model output - one row per
//! (Date, ticker) with `prediction` and `actual` columns - aligns it onto an
//! asset-by-period grid, and evaluates the model.
//!
//! Usage: evaluate <predictions.parquet> [k1,k2,...] [--report]

use arrow::array::{Array, Float64Array, StringArray, TimestampNanosecondArray};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::path::PathBuf;
use std::time::Instant;

use signal_eval::{evaluate, EvalOptions, Matrix};

struct PredictionRow {
    date: String,
    ticker: String,
    prediction: f64,
    actual: f64,
}

/// Date column as YYYY-MM-DD strings, accepting UTF-8 or timestamp encodings
fn date_strings(batch: &RecordBatch) -> Option<Vec<String>> {
    let col = batch.column_by_name("Date")?;

    if let Some(arr) = col.as_any().downcast_ref::<StringArray>() {
        return Some((0..arr.len()).map(|i| arr.value(i).to_string()).collect());
    }

    let arr = col.as_any().downcast_ref::<TimestampNanosecondArray>()?;
    let mut dates = Vec::with_capacity(arr.len());
    for i in 0..arr.len() {
        let ts_secs = arr.value(i) / 1_000_000_000;
        let date = chrono::DateTime::from_timestamp(ts_secs, 0)
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        dates.push(date);
    }
    Some(dates)
}

fn read_rows(path: &PathBuf) -> Option<Vec<PredictionRow>> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Failed to open {}: {}", path.display(), e);
            return None;
        }
    };

    let builder = match ParquetRecordBatchReaderBuilder::try_new(file) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Failed to read {}: {}", path.display(), e);
            return None;
        }
    };

    let reader = builder.build().ok()?;

    let mut rows = Vec::new();
    for batch in reader {
        let batch = batch.ok()?;

        let dates = date_strings(&batch)?;
        let tickers = batch
            .column_by_name("ticker")?
            .as_any()
            .downcast_ref::<StringArray>()?;
        let predictions = batch
            .column_by_name("prediction")?
            .as_any()
            .downcast_ref::<Float64Array>()?;
        let actuals = batch
            .column_by_name("actual")?
            .as_any()
            .downcast_ref::<Float64Array>()?;

        for i in 0..batch.num_rows() {
            rows.push(PredictionRow {
                date: dates.get(i).cloned().unwrap_or_default(),
                ticker: tickers.value(i).to_string(),
                prediction: if predictions.is_null(i) { f64::NAN } else { predictions.value(i) },
                actual: if actuals.is_null(i) { f64::NAN } else { actuals.value(i) },
            });
        }
    }

    Some(rows)
}

/// Align long-format rows onto the (asset x period) grid
///
/// Dates and tickers are sorted; entries that are missing or non-finite get
/// mask 0 and stay out of ranking and selection.
fn build_matrices(rows: &[PredictionRow]) -> (Vec<String>, Vec<String>, Matrix, Matrix, Matrix) {
    let dates: Vec<String> = rows
        .iter()
        .map(|row| row.date.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let tickers: Vec<String> = rows
        .iter()
        .map(|row| row.ticker.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let date_index: BTreeMap<&str, usize> = dates
        .iter()
        .enumerate()
        .map(|(i, d)| (d.as_str(), i))
        .collect();
    let ticker_index: BTreeMap<&str, usize> = tickers
        .iter()
        .enumerate()
        .map(|(i, t)| (t.as_str(), i))
        .collect();

    let mut prediction = Matrix::zeros(tickers.len(), dates.len());
    let mut actual = Matrix::zeros(tickers.len(), dates.len());
    let mut mask = Matrix::zeros(tickers.len(), dates.len());

    for row in rows {
        let asset = ticker_index[row.ticker.as_str()];
        let period = date_index[row.date.as_str()];
        if row.prediction.is_finite() && row.actual.is_finite() {
            prediction.set(asset, period, row.prediction);
            actual.set(asset, period, row.actual);
            mask.set(asset, period, 1.0);
        }
    }

    (dates, tickers, prediction, actual, mask)
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: evaluate <predictions.parquet> [k1,k2,...] [--report]");
        std::process::exit(1);
    }

    let path = PathBuf::from(&args[1]);
    let report = args.iter().any(|a| a == "--report");
    let top_k: Vec<usize> = args
        .get(2)
        .filter(|a| a.as_str() != "--report")
        .map(|s| s.split(',').filter_map(|k| k.parse().ok()).collect())
        .unwrap_or_else(|| vec![1]);

    let start = Instant::now();

    let rows = match read_rows(&path) {
        Some(rows) if !rows.is_empty() => rows,
        _ => {
            eprintln!("No prediction rows found in {}", path.display());
            std::process::exit(1);
        }
    };

    let (dates, tickers, prediction, actual, mask) = build_matrices(&rows);
    eprintln!("[LOAD] Aligned {} tickers over {} periods", tickers.len(), dates.len());

    let options = EvalOptions {
        tickers: Some(tickers),
        report,
        top_k,
    };

    match evaluate(&prediction, &actual, &mask, &options) {
        Ok(result) => {
            let elapsed = start.elapsed();

            println!("{}", serde_json::to_string_pretty(&result.performance).unwrap());

            eprintln!("\n───────────────────────────────");
            eprintln!("Rows:    {}", rows.len());
            eprintln!("Periods: {}", dates.len());
            eprintln!("Time:    {:.2}ms", elapsed.as_secs_f64() * 1000.0);
            eprintln!("───────────────────────────────");
        }
        Err(e) => {
            eprintln!("Evaluation failed: {}", e);
            std::process::exit(1);
        }
    }
}

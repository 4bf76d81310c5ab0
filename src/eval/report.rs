// src/eval/report.rs
// Textual report of per-day selections and summary metrics

use crate::eval::types::{DaySelection, Performance};

/// Render the per-day selection tables and the summary block
///
/// Pure projection of already-computed results; the caller decides where the
/// text goes. Sections follow the requested k order and rows follow the walk
/// order, so the output is deterministic.
pub fn render_report(performance: &Performance, days: &[DaySelection], ks: &[usize]) -> String {
    let mut out = String::new();

    out.push_str("\n================== Stock Selection Results ==================\n");
    for &k in ks {
        out.push_str(&format!("\nTop {} Selection:\n", k));
        out.push_str(&format!(
            "Day | {:<30} | {:<30} | {:<30}\n",
            "Stocks", "Predicted Returns", "Actual Returns"
        ));
        out.push_str(&"-".repeat(100));
        out.push('\n');

        for day in days {
            let picks = day.top.get(&k).map(Vec::as_slice).unwrap_or(&[]);
            let stocks = picks
                .iter()
                .map(|pick| pick.ticker.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            let predicted = join_values(picks.iter().map(|pick| pick.predicted));
            let actual = join_values(picks.iter().map(|pick| pick.actual));

            out.push_str(&format!(
                "Day {:3} | {:<30} | {:<30} | {:<30}\n",
                day.day, stocks, predicted, actual
            ));
        }
    }

    out.push_str("\n================== Evaluation Results ==================\n");
    out.push_str(&format!("MSE: {:.6}\n", performance.mse));
    if ks.contains(&1) {
        out.push_str(&format!("MRRT: {:.6}\n", performance.mrrt));
    }
    for &k in ks {
        if let Some(total) = performance.total_return(k) {
            out.push_str(&format!("Total Return (Top{}): {:.4}\n", k, total));
        }
    }

    out
}

fn join_values(values: impl Iterator<Item = f64>) -> String {
    values
        .map(|value| format!("{:.4}", value))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::types::Pick;
    use std::collections::BTreeMap;

    fn sample_days() -> Vec<DaySelection> {
        let mut top = BTreeMap::new();
        top.insert(
            1,
            vec![Pick {
                asset: 1,
                ticker: "MSFT".to_string(),
                predicted: 0.9,
                actual: 0.3,
            }],
        );
        top.insert(
            2,
            vec![
                Pick {
                    asset: 1,
                    ticker: "MSFT".to_string(),
                    predicted: 0.9,
                    actual: 0.3,
                },
                Pick {
                    asset: 0,
                    ticker: "AAPL".to_string(),
                    predicted: 0.5,
                    actual: 0.2,
                },
            ],
        );
        vec![DaySelection { day: 0, top }]
    }

    fn sample_performance() -> Performance {
        Performance {
            mse: 0.163333,
            mrrt: 1.0,
            backtest: [(1, 1.3), (2, 1.25)].into_iter().collect(),
        }
    }

    #[test]
    fn test_report_sections() {
        let report = render_report(&sample_performance(), &sample_days(), &[1, 2]);
        assert!(report.contains("Stock Selection Results"));
        assert!(report.contains("Top 1 Selection:"));
        assert!(report.contains("Top 2 Selection:"));
        assert!(report.contains("Evaluation Results"));
        assert!(report.contains("MSE: 0.163333"));
        assert!(report.contains("MRRT: 1.000000"));
        assert!(report.contains("Total Return (Top1): 0.3000"));
        assert!(report.contains("Total Return (Top2): 0.2500"));
    }

    #[test]
    fn test_report_rows_keep_walk_order() {
        let report = render_report(&sample_performance(), &sample_days(), &[2]);
        assert!(report.contains("MSFT, AAPL"));
        assert!(report.contains("0.9000, 0.5000"));
        assert!(report.contains("0.3000, 0.2000"));
    }

    #[test]
    fn test_report_omits_mrrt_without_top1() {
        let performance = Performance {
            mse: 0.1,
            mrrt: 0.0,
            backtest: [(2, 1.25)].into_iter().collect(),
        };
        let report = render_report(&performance, &sample_days(), &[2]);
        assert!(!report.contains("MRRT"));
    }

    #[test]
    fn test_report_is_deterministic() {
        let a = render_report(&sample_performance(), &sample_days(), &[1, 2]);
        let b = render_report(&sample_performance(), &sample_days(), &[1, 2]);
        assert_eq!(a, b);
    }
}

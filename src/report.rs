pub mod terminal;

use crate::interpret::narrative::narrative;
use crate::model::SeriesFlavor;
use crate::pipeline::Analysis;

/// Sink for finished analyses.
pub trait ReportSink: Send + Sync {
    fn publish(&self, analysis: &Analysis);
}

/// Plain-text report: header, Fibonacci table, interpretation, last update.
pub fn render(analysis: &Analysis) -> Vec<String> {
    let series = &analysis.series;
    let flavor = match series.flavor() {
        SeriesFlavor::Ohlcv => "OHLCV",
        SeriesFlavor::CloseOnly => "close-only",
    };

    let mut lines = vec![format!(
        "{} technical analysis ({} samples, {flavor})",
        series.identifier(),
        series.len()
    )];

    let levels = &analysis.levels;
    lines.push(format!(
        "Fibonacci retracement levels (high {:.4}, low {:.4}):",
        levels.high(),
        levels.low()
    ));
    for level in levels.levels() {
        lines.push(format!("  {:>6}  {:.4}", level.label, level.price));
    }

    lines.push("Interpretation:".to_string());
    lines.extend(narrative(&analysis.interpretation).into_iter().map(|l| format!("  - {l}")));

    lines.push(format!(
        "Last update: {}",
        analysis.interpretation.timestamp.format("%Y-%m-%d %H:%M:%S")
    ));
    lines
}

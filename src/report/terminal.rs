use crate::pipeline::Analysis;
use crate::report::{ReportSink, render};

pub struct TerminalReport;

impl ReportSink for TerminalReport {
    fn publish(&self, analysis: &Analysis) {
        let result = &analysis.interpretation;
        tracing::info!(
            identifier = %analysis.series.identifier(),
            price = result.price,
            rsi = ?result.rsi,
            crossover = ?result.crossover,
            outlook = ?result.outlook,
            "analysis complete"
        );

        for line in render(analysis) {
            println!("{line}");
        }
    }
}

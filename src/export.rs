use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use error_stack::{Report, ResultExt};

use crate::error::ExportError;
use crate::indicator::IndicatorSet;
use crate::model::PriceSeries;

const HEADER: &str = "timestamp,open,high,low,close,volume,sma_short,sma_long,rsi,macd,\
macd_signal,macd_histogram,bb_mid,bb_upper,bb_lower";

/// Write the joined series and indicator columns as CSV.
///
/// Undefined values become empty fields; timestamps are RFC 3339.
pub fn write_csv<W: Write>(
    mut writer: W,
    series: &PriceSeries,
    indicators: &IndicatorSet,
) -> Result<(), Report<ExportError>> {
    writeln!(writer, "{HEADER}").change_context(ExportError::Write)?;

    for (i, sample) in series.samples().iter().enumerate() {
        let row = indicators.snapshot(i).unwrap_or_default();
        let fields = [
            sample.open,
            sample.high,
            sample.low,
            Some(sample.close),
            sample.volume,
            row.sma_short,
            row.sma_long,
            row.rsi,
            row.macd,
            row.macd_signal,
            row.macd_histogram,
            row.bb_mid,
            row.bb_upper,
            row.bb_lower,
        ];
        let values: Vec<String> = fields
            .iter()
            .map(|v| v.map(|x| x.to_string()).unwrap_or_default())
            .collect();
        writeln!(writer, "{},{}", sample.timestamp.to_rfc3339(), values.join(","))
            .change_context(ExportError::Write)
            .attach_with(|| format!("row: {i}"))?;
    }

    writer.flush().change_context(ExportError::Write)
}

pub fn export_to_path(
    path: &Path,
    series: &PriceSeries,
    indicators: &IndicatorSet,
) -> Result<(), Report<ExportError>> {
    let file = File::create(path)
        .change_context(ExportError::Write)
        .attach_with(|| format!("path: {}", path.display()))?;
    write_csv(BufWriter::new(file), series, indicators)
}

use error_stack::{Report, ResultExt, bail};
use tracing::{info, warn};

use crate::config::{IndicatorsConfig, InterpretationConfig};
use crate::error::PipelineError;
use crate::indicator::fibonacci::{Fibonacci, FibonacciLevels};
use crate::indicator::{self, IndicatorSet};
use crate::interpret::{InterpretationResult, interpret};
use crate::model::{PriceSeries, SeriesQuery};
use crate::source::PriceSource;

/// Everything one pass produces, handed to the presentation layer.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub series: PriceSeries,
    pub indicators: IndicatorSet,
    pub levels: FibonacciLevels,
    pub interpretation: InterpretationResult,
}

/// Fetch one series and analyze it. Nothing is retried.
pub async fn run(
    source: &dyn PriceSource,
    query: &SeriesQuery,
    indicators: &IndicatorsConfig,
    thresholds: &InterpretationConfig,
) -> Result<Analysis, Report<PipelineError>> {
    info!(
        source = %source.kind(),
        identifier = %query.identifier,
        window = %query.window,
        "fetching price history"
    );

    let series = source
        .fetch(query)
        .await
        .change_context(PipelineError::FetchFailure)
        .attach_with(|| format!("identifier: {}", query.identifier))?;

    analyze(series, indicators, thresholds)
}

/// Compute indicators, Fibonacci levels and the interpretation for `series`.
///
/// An empty series stops here, before any indicator runs.
pub fn analyze(
    series: PriceSeries,
    indicators: &IndicatorsConfig,
    thresholds: &InterpretationConfig,
) -> Result<Analysis, Report<PipelineError>> {
    let Some(latest) = series.latest().cloned() else {
        bail!(PipelineError::EmptySeries);
    };

    if series.len() < indicators.sma_long {
        warn!(
            identifier = %series.identifier(),
            samples = series.len(),
            sma_long = indicators.sma_long,
            "history shorter than long moving average window"
        );
    }

    let set = indicator::compute(&series, indicators).change_context(PipelineError::Indicator)?;
    let levels = Fibonacci::new(&indicators.fibonacci_ratios)
        .change_context(PipelineError::Indicator)?
        .levels(&series.closes())
        .ok_or_else(|| {
            Report::new(PipelineError::Indicator).attach("close range is not finite")
        })?;

    let snapshot = set.latest().unwrap_or_default();
    let interpretation = interpret(
        &snapshot,
        latest.close,
        latest.timestamp,
        &levels,
        thresholds,
    );

    Ok(Analysis {
        series,
        indicators: set,
        levels,
        interpretation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpret::{Crossover, FibBracket, Outlook, RsiZone};
    use crate::model::Interval;
    use crate::model::fixtures::series_from_closes;
    use crate::source::stub::{FailingSource, StubSource};

    fn query() -> SeriesQuery {
        SeriesQuery::candles("TEST", Interval::Day1, 100)
    }

    #[tokio::test]
    async fn empty_fetch_is_empty_series() {
        let source = StubSource::new(series_from_closes(&[]));
        let err = run(
            &source,
            &query(),
            &IndicatorsConfig::default(),
            &InterpretationConfig::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err.current_context(), PipelineError::EmptySeries));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn failed_fetch_is_fetch_failure() {
        let err = run(
            &FailingSource,
            &query(),
            &IndicatorsConfig::default(),
            &InterpretationConfig::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err.current_context(), PipelineError::FetchFailure));
    }

    #[tokio::test]
    async fn ten_to_twenty_end_to_end() {
        let closes: Vec<f64> = (10..=20).map(f64::from).collect();
        let source = StubSource::new(series_from_closes(&closes));
        let config = IndicatorsConfig {
            sma_short: 5,
            sma_long: 10,
            rsi_period: 5,
            ..IndicatorsConfig::default()
        };
        let analysis = run(&source, &query(), &config, &InterpretationConfig::default())
            .await
            .unwrap();

        let last = analysis.indicators.latest().unwrap();
        assert!((last.sma_short.unwrap() - 18.0).abs() < 1e-9);
        assert_eq!(analysis.levels.level("50.0%").unwrap().price, 15.0);

        let result = &analysis.interpretation;
        assert_eq!(result.price, 20.0);
        assert_eq!(result.rsi, Some(100.0));
        assert_eq!(result.rsi_zone, Some(RsiZone::Overbought));
        assert_eq!(result.crossover, Some(Crossover::Bullish));
        assert_eq!(result.nearest_level.as_ref().unwrap().label, "0.0%");
        assert!(matches!(result.bracket, FibBracket::NewHigh { .. }));
        // Overbought blocks the upside template.
        assert_eq!(result.outlook, Outlook::AwaitConfirmation);
    }

    #[test]
    fn rising_series_never_oversold() {
        let closes: Vec<f64> = (1..=300).map(|i| 100.0 + i as f64 * 0.5).collect();
        let analysis = analyze(
            series_from_closes(&closes),
            &IndicatorsConfig::default(),
            &InterpretationConfig::default(),
        )
        .unwrap();
        for rsi in analysis.indicators.rsi.iter().flatten() {
            assert_eq!(*rsi, 100.0);
        }
        assert_eq!(analysis.interpretation.rsi_zone, Some(RsiZone::Overbought));
    }

    #[test]
    fn constant_series_reads_neutral() {
        let analysis = analyze(
            series_from_closes(&[5.0; 220]),
            &IndicatorsConfig::default(),
            &InterpretationConfig::default(),
        )
        .unwrap();
        let result = &analysis.interpretation;
        assert_eq!(result.rsi_zone, Some(RsiZone::Neutral));
        assert_eq!(result.crossover, Some(Crossover::Neutral));
        assert_eq!(result.bracket, FibBracket::Flat);
        assert_eq!(result.outlook, Outlook::AwaitConfirmation);
    }

    #[test]
    fn non_finite_closes_are_indicator_errors() {
        let err = analyze(
            series_from_closes(&[f64::NAN, f64::NAN]),
            &IndicatorsConfig::default(),
            &InterpretationConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err.current_context(), PipelineError::Indicator));
    }

    #[test]
    fn invalid_ratios_are_indicator_errors() {
        let config = IndicatorsConfig {
            fibonacci_ratios: vec![2.0],
            ..IndicatorsConfig::default()
        };
        let err = analyze(
            series_from_closes(&[1.0, 2.0]),
            &config,
            &InterpretationConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err.current_context(), PipelineError::Indicator));
    }
}

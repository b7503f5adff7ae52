use derive_more::{Display, Error};

use crate::model::SourceKind;

#[derive(Debug, Display, Error)]
pub enum ConfigError {
    #[display("failed to read config file")]
    ReadFile,
    #[display("failed to parse config: {reason}")]
    Parse { reason: String },
    #[display("invalid config: {field}")]
    Validation { field: String },
}

/// A failed fetch. Every variant aborts the analysis before any indicator runs.
#[derive(Debug, Display, Error)]
pub enum SourceError {
    #[display("request to {provider} failed")]
    Request { provider: SourceKind },
    #[display("failed to parse response from {provider}")]
    ResponseParse { provider: SourceKind },
    #[display("{provider} returned error code {code}")]
    Api { provider: SourceKind, code: i64 },
    #[display("{provider} does not know \"{identifier}\"")]
    UnknownSymbol {
        provider: SourceKind,
        identifier: String,
    },
    #[display("{provider} does not support this history window")]
    UnsupportedWindow { provider: SourceKind },
    #[display("{provider} returned an inconsistent series")]
    InvalidSeries { provider: SourceKind },
}

#[derive(Debug, Display, Error)]
pub enum SeriesError {
    #[display("timestamps not strictly increasing at index {index}")]
    NotIncreasing { index: usize },
}

#[derive(Debug, Display, Error)]
pub enum IndicatorError {
    #[display("invalid parameter: {name}")]
    InvalidParameter { name: String },
}

#[derive(Debug, Display, Error)]
pub enum PipelineError {
    #[display("failed to fetch price history")]
    FetchFailure,
    #[display("price history is empty")]
    EmptySeries,
    #[display("indicator computation failed")]
    Indicator,
}

#[derive(Debug, Display, Error)]
pub enum ExportError {
    #[display("failed to write export")]
    Write,
}

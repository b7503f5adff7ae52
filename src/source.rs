pub mod binance;
pub mod coingecko;
pub mod memo;

use error_stack::Report;
use futures::future::BoxFuture;

use crate::error::SourceError;
use crate::model::{PriceSeries, SeriesQuery, SourceKind};

/// Abstraction over a provider of price history.
///
/// Uses `BoxFuture` (from `futures` crate) instead of `async fn` in trait
/// to keep the trait object-safe (`dyn PriceSource`).
pub trait PriceSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Fetch the series described by `query`, oldest sample first.
    fn fetch(&self, query: &SeriesQuery) -> BoxFuture<'_, Result<PriceSeries, Report<SourceError>>>;
}

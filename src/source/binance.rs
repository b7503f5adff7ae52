use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use error_stack::{Report, ResultExt};
use futures::future::BoxFuture;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::info;

use crate::error::SourceError;
use crate::model::{PriceSample, PriceSeries, SeriesQuery, SourceKind, Window};
use crate::source::PriceSource;

const BINANCE_BASE_URL: &str = "https://api.binance.com";
const MAX_CANDLES_PER_REQUEST: usize = 1000;
/// Binance error code for an unknown trading pair.
const INVALID_SYMBOL_CODE: i64 = -1121;

pub struct BinanceSource {
    client: reqwest::Client,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl BinanceSource {
    pub fn new(timeout: Duration) -> Result<Self, Report<SourceError>> {
        // Kline endpoint weight is 2 of 6000/min; 20 req/s leaves ample margin.
        let quota = Quota::per_second(nonzero!(20u32));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .change_context(SourceError::Request {
                provider: SourceKind::Binance,
            })?;
        Ok(Self {
            client,
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }
}

impl PriceSource for BinanceSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Binance
    }

    fn fetch(&self, query: &SeriesQuery) -> BoxFuture<'_, Result<PriceSeries, Report<SourceError>>> {
        let query = query.clone();
        Box::pin(async move {
            let Window::Candles { interval, limit } = query.window else {
                return Err(Report::new(SourceError::UnsupportedWindow {
                    provider: SourceKind::Binance,
                })
                .attach(format!("window: {}", query.window)));
            };

            // Wait for rate limiter before making the request
            self.rate_limiter.until_ready().await;

            let url = format!("{}/api/v3/klines", BINANCE_BASE_URL);
            let symbol = query.identifier.to_uppercase();
            let limit_str = limit.min(MAX_CANDLES_PER_REQUEST).to_string();
            let params = [
                ("symbol", symbol.as_str()),
                ("interval", interval.binance_interval()),
                ("limit", limit_str.as_str()),
            ];

            let response = self
                .client
                .get(&url)
                .query(&params)
                .send()
                .await
                .change_context(SourceError::Request {
                    provider: SourceKind::Binance,
                })?;

            let status = response.status();
            let body = response.text().await.change_context(SourceError::Request {
                provider: SourceKind::Binance,
            })?;

            let series = decode_klines(status, &body, &symbol)?;

            info!(
                symbol = %symbol,
                interval = %interval,
                fetched = series.len(),
                "binance kline fetch complete"
            );

            Ok(series)
        })
    }
}

/// Turn a raw `/api/v3/klines` response into a series.
///
/// Binance reports failures as `{"code": .., "msg": ..}`, usually with a 4xx
/// status; that object is surfaced as an API error rather than a parse error.
fn decode_klines(
    status: StatusCode,
    body: &str,
    symbol: &str,
) -> Result<PriceSeries, Report<SourceError>> {
    let payload = serde_json::from_str::<KlinesPayload>(body);

    let rows = match payload {
        Ok(KlinesPayload::Error(err)) if err.code == INVALID_SYMBOL_CODE => {
            return Err(Report::new(SourceError::UnknownSymbol {
                provider: SourceKind::Binance,
                identifier: symbol.to_owned(),
            })
            .attach(err.msg));
        }
        Ok(KlinesPayload::Error(err)) => {
            return Err(Report::new(SourceError::Api {
                provider: SourceKind::Binance,
                code: err.code,
            })
            .attach(err.msg));
        }
        Ok(KlinesPayload::Rows(rows)) if status.is_success() => rows,
        Ok(KlinesPayload::Rows(_)) | Err(_) if !status.is_success() => {
            return Err(Report::new(SourceError::Request {
                provider: SourceKind::Binance,
            })
            .attach(format!("HTTP status: {status}")));
        }
        Ok(KlinesPayload::Rows(rows)) => rows,
        Err(e) => {
            return Err(Report::new(e).change_context(SourceError::ResponseParse {
                provider: SourceKind::Binance,
            }));
        }
    };

    let samples = rows
        .into_iter()
        .map(BinanceKlineRow::into_sample)
        .collect::<Result<Vec<_>, _>>()?;

    PriceSeries::new(symbol, samples).change_context(SourceError::InvalidSeries {
        provider: SourceKind::Binance,
    })
}

// ── REST response types ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum KlinesPayload {
    Rows(Vec<BinanceKlineRow>),
    Error(BinanceApiError),
}

#[derive(Debug, Deserialize)]
struct BinanceApiError {
    code: i64,
    msg: String,
}

/// Binance kline row: 12-element array
/// [open_time, open, high, low, close, volume, close_time, ...]
#[derive(Debug, Deserialize)]
struct BinanceKlineRow(
    i64,                        // 0: open_time (ms)
    String,                     // 1: open
    String,                     // 2: high
    String,                     // 3: low
    String,                     // 4: close
    String,                     // 5: volume
    #[allow(dead_code)] i64,    // 6: close_time
    #[allow(dead_code)] String, // 7: quote asset volume
    #[allow(dead_code)] i64,    // 8: number of trades
    #[allow(dead_code)] String, // 9: taker buy base volume
    #[allow(dead_code)] String, // 10: taker buy quote volume
    #[allow(dead_code)] String, // 11: ignore
);

impl BinanceKlineRow {
    fn into_sample(self) -> Result<PriceSample, Report<SourceError>> {
        let parse_f64 = |s: &str| -> Result<f64, Report<SourceError>> {
            let value = s
                .parse::<f64>()
                .change_context(SourceError::ResponseParse {
                    provider: SourceKind::Binance,
                })
                .attach_with(|| format!("value: {s:?}"))?;
            // `parse` accepts "NaN" and "inf"
            if !value.is_finite() {
                return Err(Report::new(SourceError::ResponseParse {
                    provider: SourceKind::Binance,
                })
                .attach(format!("non-finite value: {s:?}")));
            }
            Ok(value)
        };

        let timestamp = DateTime::from_timestamp_millis(self.0).ok_or_else(|| {
            Report::new(SourceError::ResponseParse {
                provider: SourceKind::Binance,
            })
            .attach(format!("open_time out of range: {}", self.0))
        })?;

        Ok(PriceSample::ohlcv(
            timestamp,
            parse_f64(&self.1)?,
            parse_f64(&self.2)?,
            parse_f64(&self.3)?,
            parse_f64(&self.4)?,
            parse_f64(&self.5)?,
        ))
    }
}

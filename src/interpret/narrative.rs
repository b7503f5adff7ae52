use crate::indicator::fibonacci::FibLevel;
use crate::interpret::{
    BandPosition, Crossover, FibBracket, InterpretationResult, MaTrend, Outlook, RsiZone,
};

/// Human-readable lines for an interpretation. Template text, not advice.
pub fn narrative(result: &InterpretationResult) -> Vec<String> {
    let mut lines = vec![format!("Current price: {:.4}", result.price)];

    lines.push(match (result.rsi, result.rsi_zone) {
        (Some(rsi), Some(zone)) => format!("RSI: {rsi:.2} -> {}", rsi_phrase(zone)),
        _ => "RSI: not enough history".to_string(),
    });

    lines.push(match (result.macd, result.macd_signal, result.crossover) {
        (Some(macd), Some(signal), Some(cross)) => format!(
            "MACD vs signal: {macd:.4} / {signal:.4} -> {}",
            crossover_phrase(cross)
        ),
        _ => "MACD: not enough history".to_string(),
    });

    if let Some(trend) = result.ma_trend {
        lines.push(format!("Moving averages: {}", trend_phrase(trend)));
    }

    if let Some(band) = result.band_position {
        lines.push(format!("Bollinger Bands: {}", band_phrase(band)));
    }

    if let Some(level) = &result.nearest_level {
        lines.push(format!("Nearest Fibonacci level: {}", describe(level)));
    }

    lines.push(bracket_line(&result.bracket));
    lines.push(outlook_line(result.outlook).to_string());
    lines
}

fn describe(level: &FibLevel) -> String {
    format!("{} at {:.4}", level.label, level.price)
}

fn rsi_phrase(zone: RsiZone) -> &'static str {
    match zone {
        RsiZone::Overbought => "overbought",
        RsiZone::Oversold => "oversold",
        RsiZone::Neutral => "neutral",
    }
}

fn crossover_phrase(cross: Crossover) -> &'static str {
    match cross {
        Crossover::Bullish => "bullish crossover",
        Crossover::Bearish => "bearish crossover",
        Crossover::Neutral => "no crossover (lines equal)",
    }
}

fn trend_phrase(trend: MaTrend) -> &'static str {
    match trend {
        MaTrend::Bullish => "short above long, bullish bias",
        MaTrend::Bearish => "short below long, bearish bias",
        MaTrend::Consolidation => "short equals long, consolidation",
    }
}

fn band_phrase(band: BandPosition) -> &'static str {
    match band {
        BandPosition::AboveUpper => "price above the upper band",
        BandPosition::Inside => "price inside the bands",
        BandPosition::BelowLower => "price below the lower band",
    }
}

fn bracket_line(bracket: &FibBracket) -> String {
    match bracket {
        FibBracket::Between {
            support,
            resistance,
        } => format!(
            "Fibonacci support: {} / resistance: {}",
            describe(support),
            describe(resistance)
        ),
        FibBracket::NewHigh { support } => match support {
            Some(level) => format!(
                "New high: no Fibonacci resistance above, support {}",
                describe(level)
            ),
            None => "New high: no Fibonacci levels below or above".to_string(),
        },
        FibBracket::NewLow { resistance } => match resistance {
            Some(level) => format!(
                "New low: no Fibonacci support below, resistance {}",
                describe(level)
            ),
            None => "New low: no Fibonacci levels below or above".to_string(),
        },
        FibBracket::Flat => "Fibonacci levels collapsed: price range is flat".to_string(),
    }
}

fn outlook_line(outlook: Outlook) -> &'static str {
    match outlook {
        Outlook::UpsideContinuation => {
            "Outlook: RSI has room, MACD is bullish and price holds above the short MA; \
             upside continuation is plausible (advisory only)"
        }
        Outlook::AwaitConfirmation => {
            "Outlook: signals are mixed; await confirmation (advisory only)"
        }
    }
}

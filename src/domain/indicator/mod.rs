//! Technical indicator engine.
//!
//! Each submodule computes one family of indicators over a bar slice.
//! [`compute_indicators`] assembles all of them into an [`IndicatorTable`]
//! with the canonical column names listed in [`available_columns`].

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod heikin_ashi;
pub mod macd;
pub mod roc;
pub mod rolling;
pub mod rsi;
pub mod stochastic;
pub mod volume;

use crate::domain::error::SignalError;
use crate::domain::ohlcv::{Bar, validate_bars};
use crate::domain::table::IndicatorTable;

/// One value per bar; `None` while the indicator is warming up.
pub type Series = Vec<Option<f64>>;

pub const SMA_WINDOWS: [usize; 5] = [5, 9, 20, 50, 200];

pub const RAW_COLUMNS: [&str; 5] = ["OPEN", "HIGH", "LOW", "CLOSE", "VOLUME"];

const DERIVED_COLUMNS: [&str; 21] = [
    "RSI",
    "MACD",
    "SIGNAL_LINE",
    "MACD_HIST",
    "BB_UPPER",
    "BB_MIDDLE",
    "BB_LOWER",
    "BB_WIDTH",
    "STOCH_K",
    "STOCH_D",
    "STOCH_CROSS",
    "ATR",
    "PLUS_DI",
    "MINUS_DI",
    "ADX",
    "HA_OPEN",
    "HA_HIGH",
    "HA_LOW",
    "HA_CLOSE",
    "VOLUME_SMA",
    "VOLUME_RATIO",
];

pub const CHANGE_PCT: &str = "CHANGE_PCT";

/// Operator keywords accepted in conditions.
pub const OPERATORS: [&str; 7] = [">", "<", ">=", "<=", "==", "crosses_above", "crosses_below"];

pub fn ema_column(span: usize) -> String {
    format!("EMA_{span}")
}

pub fn sma_column(window: usize) -> String {
    format!("SMA_{window}")
}

/// Every column [`compute_indicators`] produces, in catalogue order.
pub fn available_columns() -> Vec<String> {
    let mut names: Vec<String> = RAW_COLUMNS.iter().map(|s| s.to_string()).collect();
    names.extend(ema::EMA_SPANS.iter().map(|&s| ema_column(s)));
    names.extend(SMA_WINDOWS.iter().map(|&w| sma_column(w)));
    names.extend(DERIVED_COLUMNS.iter().map(|s| s.to_string()));
    names.push(CHANGE_PCT.to_string());
    names
}

/// Compute every indicator column for one timeframe's bars.
///
/// Columns are filled forward then backward once all are computed, so a
/// row only ever reads values derived from bars at or before it, except for
/// the leading warmup rows which take the first defined value.
pub fn compute_indicators(bars: &[Bar], timeframe: u32) -> Result<IndicatorTable, SignalError> {
    if bars.is_empty() {
        return Err(SignalError::InsufficientData {
            bars: 0,
            minimum: 1,
        });
    }
    validate_bars(bars)?;

    let opens: Vec<f64> = bars.iter().map(|b| b.open).collect();
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();

    let mut table = IndicatorTable::new(timeframe, bars.to_vec());
    table.insert_dense("OPEN", opens);
    table.insert_dense("HIGH", highs);
    table.insert_dense("LOW", lows);
    table.insert_dense("CLOSE", closes.clone());
    table.insert_dense("VOLUME", volumes.clone());

    for span in ema::EMA_SPANS {
        table.insert_dense(ema_column(span), ema::calculate_ema(&closes, span));
    }
    for window in SMA_WINDOWS {
        table.insert_column(sma_column(window), rolling::sma(&closes, window));
    }

    table.insert_column("RSI", rsi::calculate_rsi(&closes, rsi::RSI_PERIOD));

    let m = macd::calculate_macd(&closes, macd::MACD_FAST, macd::MACD_SLOW, macd::MACD_SIGNAL);
    table.insert_dense("MACD", m.line);
    table.insert_dense("SIGNAL_LINE", m.signal);
    table.insert_dense("MACD_HIST", m.histogram);

    let bb = bollinger::calculate_bollinger(
        &closes,
        bollinger::BOLLINGER_PERIOD,
        bollinger::BOLLINGER_MULT,
    );
    table.insert_column("BB_UPPER", bb.upper);
    table.insert_column("BB_MIDDLE", bb.middle);
    table.insert_column("BB_LOWER", bb.lower);
    table.insert_column("BB_WIDTH", bb.width);

    let st = stochastic::calculate_stochastic(
        bars,
        stochastic::STOCH_K_PERIOD,
        stochastic::STOCH_D_PERIOD,
    );
    table.insert_column("STOCH_K", st.k);
    table.insert_column("STOCH_D", st.d);
    table.insert_column("STOCH_CROSS", st.cross);

    let atr = atr::calculate_atr(bars, atr::ATR_PERIOD);
    let dmi = adx::calculate_adx(bars, &atr, adx::ADX_PERIOD);
    table.insert_column("ATR", atr);
    table.insert_column("PLUS_DI", dmi.plus_di);
    table.insert_column("MINUS_DI", dmi.minus_di);
    table.insert_column("ADX", dmi.adx);

    let ha = heikin_ashi::calculate_heikin_ashi(bars);
    table.insert_dense("HA_OPEN", ha.open);
    table.insert_dense("HA_HIGH", ha.high);
    table.insert_dense("HA_LOW", ha.low);
    table.insert_dense("HA_CLOSE", ha.close);

    let vol = volume::calculate_volume(&volumes, volume::VOLUME_PERIOD);
    table.insert_column("VOLUME_SMA", vol.sma);
    table.insert_column("VOLUME_RATIO", vol.ratio);

    table.insert_column(CHANGE_PCT, roc::calculate_roc(&closes, 1));

    table.fill_gaps();
    Ok(table)
}

//! Confluence of per-timeframe verdicts into row-wise signals.

use crate::domain::rule_eval::TimeframeVerdict;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    /// Numeric encoding used when a signal is stored as a table column.
    pub fn as_code(self) -> f64 {
        match self {
            Signal::Buy => 1.0,
            Signal::Sell => -1.0,
            Signal::Hold => 0.0,
        }
    }

    pub fn from_code(code: Option<f64>) -> Signal {
        match code {
            Some(v) if v == 1.0 => Signal::Buy,
            Some(v) if v == -1.0 => Signal::Sell,
            _ => Signal::Hold,
        }
    }

    pub fn is_actionable(self) -> bool {
        self != Signal::Hold
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::Hold => "HOLD",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// BUY wins over SELL when both hold on the same row.
pub fn signal_at(buy: bool, sell: bool) -> Signal {
    if buy {
        Signal::Buy
    } else if sell {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

/// Signals of a single timeframe's verdicts.
pub fn per_timeframe_signal(verdict: &TimeframeVerdict) -> Vec<Signal> {
    verdict
        .buy
        .iter()
        .zip(&verdict.sell)
        .map(|(b, s)| signal_at(*b, *s))
        .collect()
}

/// Row-wise confluence: BUY when every timeframe's buy verdict holds, else
/// SELL when every sell verdict holds, else HOLD. With no timeframes every
/// row is HOLD.
pub fn confluence(verdicts: &[TimeframeVerdict], len: usize) -> Vec<Signal> {
    if verdicts.is_empty() {
        return vec![Signal::Hold; len];
    }
    (0..len)
        .map(|i| {
            let buy = verdicts.iter().all(|v| v.buy.get(i).copied().unwrap_or(false));
            let sell = verdicts.iter().all(|v| v.sell.get(i).copied().unwrap_or(false));
            signal_at(buy, sell)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(timeframe: u32, buy: &[bool], sell: &[bool]) -> TimeframeVerdict {
        TimeframeVerdict {
            timeframe,
            buy: buy.to_vec(),
            sell: sell.to_vec(),
        }
    }

    #[test]
    fn unanimous_buy() {
        let v = [
            verdict(3, &[true, true], &[false, false]),
            verdict(15, &[true, false], &[false, false]),
        ];
        assert_eq!(confluence(&v, 2), vec![Signal::Buy, Signal::Hold]);
    }

    #[test]
    fn unanimous_sell() {
        let v = [
            verdict(3, &[false], &[true]),
            verdict(15, &[false], &[true]),
        ];
        assert_eq!(confluence(&v, 1), vec![Signal::Sell]);
    }

    #[test]
    fn buy_takes_precedence() {
        let v = [verdict(3, &[true], &[true])];
        assert_eq!(confluence(&v, 1), vec![Signal::Buy]);
        assert_eq!(per_timeframe_signal(&v[0]), vec![Signal::Buy]);
    }

    #[test]
    fn no_timeframes_is_hold() {
        assert_eq!(confluence(&[], 3), vec![Signal::Hold; 3]);
    }

    #[test]
    fn code_round_trip() {
        for s in [Signal::Buy, Signal::Sell, Signal::Hold] {
            assert_eq!(Signal::from_code(Some(s.as_code())), s);
        }
        assert_eq!(Signal::from_code(None), Signal::Hold);
    }

    #[test]
    fn serde_uppercase() {
        assert_eq!(serde_json::to_string(&Signal::Buy).unwrap(), "\"BUY\"");
        let s: Signal = serde_json::from_str("\"SELL\"").unwrap();
        assert_eq!(s, Signal::Sell);
    }
}

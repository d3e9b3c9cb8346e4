//! Symbol universes for scanning.
//!
//! Parses symbol lists from configuration and splits a universe into the
//! fixed-size batches a scan cycle evaluates concurrently.

use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Universe {
    pub symbols: Vec<String>,
}

impl Universe {
    pub fn new(symbols: Vec<String>) -> Self {
        Self { symbols }
    }

    pub fn count(&self) -> usize {
        self.symbols.len()
    }

    /// Consecutive batches of at most `size` symbols. A zero size yields one
    /// batch holding everything.
    pub fn batches(&self, size: usize) -> Vec<Vec<String>> {
        if self.symbols.is_empty() {
            return Vec::new();
        }
        let size = if size == 0 { self.symbols.len() } else { size };
        self.symbols.chunks(size).map(<[String]>::to_vec).collect()
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),
}

pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_symbols_basic() {
        let result = parse_symbols("RELIANCE.NS,TCS.NS,NIFTY").unwrap();
        assert_eq!(result, vec!["RELIANCE.NS", "TCS.NS", "NIFTY"]);
    }

    #[test]
    fn test_parse_symbols_with_whitespace() {
        let result = parse_symbols("  INFY.NS , NIFTY ,BANKNIFTY").unwrap();
        assert_eq!(result, vec!["INFY.NS", "NIFTY", "BANKNIFTY"]);
    }

    #[test]
    fn test_parse_symbols_uppercase() {
        let result = parse_symbols("tcs.ns,nifty").unwrap();
        assert_eq!(result, vec!["TCS.NS", "NIFTY"]);
    }

    #[test]
    fn test_parse_symbols_empty_token() {
        let result = parse_symbols("TCS.NS,,NIFTY");
        assert!(matches!(result, Err(UniverseError::EmptyToken)));
    }

    #[test]
    fn test_parse_symbols_duplicate() {
        let result = parse_symbols("NIFTY,TCS.NS,nifty");
        assert!(matches!(result, Err(UniverseError::DuplicateSymbol(s)) if s == "NIFTY"));
    }

    #[test]
    fn test_batches() {
        let universe = Universe::new((0..45).map(|i| format!("S{i}")).collect());
        let batches = universe.batches(20);
        assert_eq!(
            batches.iter().map(Vec::len).collect::<Vec<_>>(),
            vec![20, 20, 5]
        );
        assert_eq!(batches[2][0], "S40");
    }

    #[test]
    fn test_batches_empty_and_zero() {
        assert!(Universe::new(Vec::new()).batches(20).is_empty());
        let universe = Universe::new(vec!["A".into(), "B".into()]);
        assert_eq!(universe.batches(0).len(), 1);
        assert_eq!(universe.count(), 2);
    }
}

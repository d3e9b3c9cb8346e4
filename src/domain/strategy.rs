//! Named rule sets.

use crate::domain::error::SignalError;
use crate::domain::rule::{RuleSet, RuleSetWire};

pub const DEFAULT_STRATEGY_NAME: &str = "Custom Strategy";

#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    pub name: String,
    pub rules: RuleSet,
}

impl Strategy {
    pub fn new(name: impl Into<String>, rules: RuleSet) -> Self {
        Self {
            name: name.into(),
            rules,
        }
    }

    pub fn from_wire(wire: RuleSetWire) -> Result<Self, SignalError> {
        let name = wire
            .name
            .clone()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| DEFAULT_STRATEGY_NAME.to_string());
        Ok(Self {
            name,
            rules: RuleSet::try_from(wire)?,
        })
    }

    pub fn from_json(input: &str) -> Result<Self, SignalError> {
        let wire: RuleSetWire =
            serde_json::from_str(input).map_err(|e| SignalError::MisconfiguredRule {
                reason: format!("strategy: {e}"),
            })?;
        Self::from_wire(wire)
    }
}

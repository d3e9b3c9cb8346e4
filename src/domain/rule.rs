//! Condition and rule-set data structures.
//!
//! A [`Condition`] compares one indicator column against a literal or another
//! column, optionally on a specific timeframe. A [`RuleSet`] groups buy and
//! sell conditions. Rule sets arrive as JSON (see [`RuleSetWire`]) or, one
//! condition at a time, in the textual form handled by
//! [`crate::domain::rule_parser`].

use crate::domain::error::SignalError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Greater,
    Less,
    GreaterEq,
    LessEq,
    Equal,
    CrossesAbove,
    CrossesBelow,
}

impl Operator {
    pub const ALL: [Operator; 7] = [
        Operator::Greater,
        Operator::Less,
        Operator::GreaterEq,
        Operator::LessEq,
        Operator::Equal,
        Operator::CrossesAbove,
        Operator::CrossesBelow,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Greater => ">",
            Operator::Less => "<",
            Operator::GreaterEq => ">=",
            Operator::LessEq => "<=",
            Operator::Equal => "==",
            Operator::CrossesAbove => "crosses_above",
            Operator::CrossesBelow => "crosses_below",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::ALL
            .into_iter()
            .find(|op| op.as_str() == s.trim())
            .ok_or_else(|| SignalError::MisconfiguredRule {
                reason: format!("unknown operator '{s}'"),
            })
    }
}

/// Right-hand side of a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Comparand {
    Literal(f64),
    Column(String),
}

impl fmt::Display for Comparand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparand::Literal(v) => write!(f, "{v}"),
            Comparand::Column(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub indicator: String,
    pub operator: Operator,
    pub comparand: Comparand,
    /// Timeframe in minutes; `None` means the base timeframe.
    pub timeframe: Option<u32>,
}

impl Condition {
    pub fn new(indicator: &str, operator: Operator, comparand: Comparand) -> Self {
        Self {
            indicator: indicator.to_string(),
            operator,
            comparand,
            timeframe: None,
        }
    }

    pub fn on(mut self, timeframe: u32) -> Self {
        self.timeframe = Some(timeframe);
        self
    }

    pub fn timeframe_or(&self, base: u32) -> u32 {
        self.timeframe.unwrap_or(base)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.indicator, self.operator, self.comparand)?;
        if let Some(tf) = self.timeframe {
            write!(f, " @ {tf}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    pub buy: Vec<Condition>,
    pub sell: Vec<Condition>,
}

impl RuleSet {
    pub fn all_conditions(&self) -> impl Iterator<Item = &Condition> {
        self.buy.iter().chain(&self.sell)
    }

    pub fn is_empty(&self) -> bool {
        self.buy.is_empty() && self.sell.is_empty()
    }

    /// Whether any condition names an explicit timeframe.
    pub fn has_explicit_timeframe(&self) -> bool {
        self.all_conditions().any(|c| c.timeframe.is_some())
    }

    /// The base timeframe plus every timeframe a condition names.
    pub fn timeframes(&self, base: u32) -> BTreeSet<u32> {
        let mut set: BTreeSet<u32> = self.all_conditions().filter_map(|c| c.timeframe).collect();
        set.insert(base);
        set
    }

    /// Timeframes that carry at least one condition, unassigned ones counting as `base`.
    pub fn configured_timeframes(&self, base: u32) -> BTreeSet<u32> {
        self.all_conditions().map(|c| c.timeframe_or(base)).collect()
    }

    pub fn from_json(input: &str) -> Result<Self, SignalError> {
        let wire: RuleSetWire =
            serde_json::from_str(input).map_err(|e| SignalError::MisconfiguredRule {
                reason: format!("rule set: {e}"),
            })?;
        RuleSet::try_from(wire)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueWire {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionWire {
    pub indicator: String,
    pub operator: String,
    pub value: ValueWire,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeframe: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSetWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub buy_rules: Vec<ConditionWire>,
    #[serde(default)]
    pub sell_rules: Vec<ConditionWire>,
}

impl TryFrom<ConditionWire> for Condition {
    type Error = SignalError;

    fn try_from(wire: ConditionWire) -> Result<Self, Self::Error> {
        let indicator = wire.indicator.trim().to_string();
        if indicator.is_empty() {
            return Err(SignalError::MisconfiguredRule {
                reason: "condition has an empty indicator".to_string(),
            });
        }
        let comparand = match wire.value {
            ValueWire::Number(v) => Comparand::Literal(v),
            ValueWire::Text(name) => Comparand::Column(name.trim().to_string()),
        };
        if wire.timeframe == Some(0) {
            return Err(SignalError::MisconfiguredRule {
                reason: format!("condition on {indicator} has a zero timeframe"),
            });
        }
        Ok(Condition {
            indicator,
            operator: wire.operator.parse()?,
            comparand,
            timeframe: wire.timeframe,
        })
    }
}

impl From<&Condition> for ConditionWire {
    fn from(condition: &Condition) -> Self {
        ConditionWire {
            indicator: condition.indicator.clone(),
            operator: condition.operator.to_string(),
            value: match &condition.comparand {
                Comparand::Literal(v) => ValueWire::Number(*v),
                Comparand::Column(name) => ValueWire::Text(name.clone()),
            },
            timeframe: condition.timeframe,
        }
    }
}

impl TryFrom<RuleSetWire> for RuleSet {
    type Error = SignalError;

    fn try_from(wire: RuleSetWire) -> Result<Self, Self::Error> {
        let convert = |list: Vec<ConditionWire>| {
            list.into_iter()
                .map(Condition::try_from)
                .collect::<Result<Vec<_>, _>>()
        };
        Ok(RuleSet {
            buy: convert(wire.buy_rules)?,
            sell: convert(wire.sell_rules)?,
        })
    }
}

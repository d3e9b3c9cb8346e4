//! Textual condition parser.
//!
//! Grammar:
//!
//! ```text
//! condition  := IDENT operator comparand [ '@' INTEGER ]
//! operator   := '>=' | '<=' | '==' | '>' | '<' | 'crosses_above' | 'crosses_below'
//! comparand  := NUMBER | IDENT
//! ```
//!
//! Errors carry the character offset of the offending token.

use crate::domain::error::ParseError;
use crate::domain::rule::{Comparand, Condition, Operator};
use std::str::FromStr;

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn peek_word(&self) -> String {
        let word: String = self
            .remaining()
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '_')
            .collect();
        if word.is_empty() {
            self.peek()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "end of input".to_string())
        } else {
            word
        }
    }

    fn parse_identifier(&mut self, what: &str) -> Result<String, ParseError> {
        self.skip_whitespace();
        match self.peek() {
            Some(ch) if ch.is_alphabetic() || ch == '_' => {}
            _ => {
                return Err(ParseError {
                    message: format!("expected {what}, found '{}'", self.peek_word()),
                    position: self.pos,
                });
            }
        }
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }
        Ok(self.input[start..self.pos].to_string())
    }

    fn parse_operator(&mut self) -> Result<Operator, ParseError> {
        self.skip_whitespace();
        // longest match first so ">=" is not read as ">"
        const SPELLINGS: [(&str, Operator); 7] = [
            ("crosses_above", Operator::CrossesAbove),
            ("crosses_below", Operator::CrossesBelow),
            (">=", Operator::GreaterEq),
            ("<=", Operator::LessEq),
            ("==", Operator::Equal),
            (">", Operator::Greater),
            ("<", Operator::Less),
        ];
        for (text, op) in SPELLINGS {
            if self.remaining().starts_with(text) {
                self.pos += text.len();
                return Ok(op);
            }
        }
        Err(ParseError {
            message: format!("expected operator, found '{}'", self.peek_word()),
            position: self.pos,
        })
    }

    fn parse_number(&mut self) -> Result<f64, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        let mut has_dot = false;
        let mut digits = 0;

        if matches!(self.peek(), Some('-') | Some('+')) {
            self.advance();
        }

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                digits += 1;
                self.advance();
            } else if ch == '.' && !has_dot {
                has_dot = true;
                self.advance();
            } else {
                break;
            }
        }

        if digits == 0 {
            return Err(ParseError {
                message: "expected number".to_string(),
                position: start,
            });
        }

        let num_str = &self.input[start..self.pos];
        num_str.parse::<f64>().map_err(|_| ParseError {
            message: format!("invalid number: {num_str}"),
            position: start,
        })
    }

    fn parse_timeframe(&mut self) -> Result<u32, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }
        let digits = &self.input[start..self.pos];
        if digits.is_empty() {
            return Err(ParseError {
                message: format!("expected timeframe minutes, found '{}'", self.peek_word()),
                position: start,
            });
        }
        match digits.parse::<u32>() {
            Ok(0) => Err(ParseError {
                message: "timeframe must be positive".to_string(),
                position: start,
            }),
            Ok(n) => Ok(n),
            Err(_) => Err(ParseError {
                message: format!("invalid timeframe: {digits}"),
                position: start,
            }),
        }
    }

    fn parse_comparand(&mut self) -> Result<Comparand, ParseError> {
        self.skip_whitespace();
        match self.peek() {
            Some(ch) if ch.is_ascii_digit() || ch == '-' || ch == '+' || ch == '.' => {
                Ok(Comparand::Literal(self.parse_number()?))
            }
            Some(ch) if ch.is_alphabetic() || ch == '_' => {
                Ok(Comparand::Column(self.parse_identifier("column")?))
            }
            _ => Err(ParseError {
                message: format!(
                    "expected number or column name, found '{}'",
                    self.peek_word()
                ),
                position: self.pos,
            }),
        }
    }

    fn parse_condition(&mut self) -> Result<Condition, ParseError> {
        let indicator = self.parse_identifier("indicator name")?;
        let operator = self.parse_operator()?;
        let comparand = self.parse_comparand()?;

        self.skip_whitespace();
        let timeframe = if self.peek() == Some('@') {
            self.advance();
            Some(self.parse_timeframe()?)
        } else {
            None
        };

        Ok(Condition {
            indicator,
            operator,
            comparand,
            timeframe,
        })
    }
}

pub fn parse_condition(input: &str) -> Result<Condition, ParseError> {
    let mut parser = Parser::new(input);
    parser.skip_whitespace();
    if parser.peek().is_none() {
        return Err(ParseError {
            message: "empty input".to_string(),
            position: 0,
        });
    }

    let condition = parser.parse_condition()?;

    parser.skip_whitespace();
    if parser.pos < input.len() {
        return Err(ParseError {
            message: format!("unexpected trailing input: '{}'", parser.remaining()),
            position: parser.pos,
        });
    }

    Ok(condition)
}

impl FromStr for Condition {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_condition(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_literal_comparison() {
        let c = parse_condition("RSI > 60").unwrap();
        assert_eq!(c.indicator, "RSI");
        assert_eq!(c.operator, Operator::Greater);
        assert_eq!(c.comparand, Comparand::Literal(60.0));
        assert_eq!(c.timeframe, None);
    }

    #[test]
    fn parse_column_crossover_with_timeframe() {
        let c = parse_condition("EMA_5 crosses_above EMA_9 @ 3").unwrap();
        assert_eq!(c.operator, Operator::CrossesAbove);
        assert_eq!(c.comparand, Comparand::Column("EMA_9".into()));
        assert_eq!(c.timeframe, Some(3));
    }

    #[test]
    fn parse_two_char_operators() {
        assert_eq!(parse_condition("A >= 1").unwrap().operator, Operator::GreaterEq);
        assert_eq!(parse_condition("A <= 1").unwrap().operator, Operator::LessEq);
        assert_eq!(parse_condition("A == 1").unwrap().operator, Operator::Equal);
        assert_eq!(parse_condition("A<1").unwrap().operator, Operator::Less);
    }

    #[test]
    fn parse_negative_and_float() {
        let c = parse_condition("STOCH_CROSS == -1").unwrap();
        assert_eq!(c.comparand, Comparand::Literal(-1.0));
        let c = parse_condition("MACD_HIST > 0.25").unwrap();
        assert_eq!(c.comparand, Comparand::Literal(0.25));
    }

    #[test]
    fn parse_whitespace_handling() {
        let c = parse_condition("  CLOSE   <   EMA_200   @15  ").unwrap();
        assert_eq!(c.indicator, "CLOSE");
        assert_eq!(c.timeframe, Some(15));
    }

    #[test]
    fn error_unknown_operator() {
        let err = parse_condition("RSI above 60").unwrap_err();
        assert_eq!(err.position, 4);
        assert!(err.message.contains("expected operator"));
    }

    #[test]
    fn error_missing_comparand() {
        let err = parse_condition("RSI >").unwrap_err();
        assert_eq!(err.position, 5);
    }

    #[test]
    fn error_zero_timeframe() {
        let err = parse_condition("RSI > 1 @ 0").unwrap_err();
        assert!(err.message.contains("positive"));
    }

    #[test]
    fn error_trailing_input() {
        let err = parse_condition("RSI > 1 extra").unwrap_err();
        assert_eq!(err.position, 8);
    }

    #[test]
    fn error_empty_input() {
        let err = parse_condition("   ").unwrap_err();
        assert_eq!(err.message, "empty input");
    }

    #[test]
    fn error_display_with_context() {
        let input = "RSI ? 60";
        let err = parse_condition(input).unwrap_err();
        let display = err.display_with_context(input);
        assert!(display.contains("    ^"));
    }

    #[test]
    fn from_str_matches_display() {
        let c: Condition = "HA_CLOSE > HA_OPEN @ 3".parse().unwrap();
        assert_eq!(c.to_string(), "HA_CLOSE > HA_OPEN @ 3");
    }
}

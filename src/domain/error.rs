//! Domain error types.

/// A parse error with position information for textual conditions.
#[derive(Debug, Clone, thiserror::Error)]
#[error("parse error at position {position}: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    /// Format the error with a caret pointing at the error position in the input.
    pub fn display_with_context(&self, input: &str) -> String {
        let caret = " ".repeat(self.position) + "^";
        format!(
            "{input}\n{caret}\n{err}",
            input = input,
            caret = caret,
            err = self
        )
    }
}

/// Top-level error type for mtfscan.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("malformed input: {reason}")]
    MalformedInput { reason: String },

    #[error("insufficient data: have {bars} bars, need {minimum}")]
    InsufficientData { bars: usize, minimum: usize },

    #[error("unknown indicator {name}; available columns: {}", available.join(", "))]
    UnknownIndicator { name: String, available: Vec<String> },

    #[error("misconfigured rule: {reason}")]
    MisconfiguredRule { reason: String },

    #[error("no data: {reason}")]
    NoData { reason: String },

    #[error("evaluation failed for {symbol}: {source}")]
    SymbolEvaluation {
        symbol: String,
        #[source]
        source: Box<SignalError>,
    },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    RuleParse(#[from] ParseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SignalError {
    /// Stable label for the error's taxonomy kind.
    pub fn kind(&self) -> &'static str {
        match self {
            SignalError::MalformedInput { .. } => "MalformedInput",
            SignalError::InsufficientData { .. } => "InsufficientData",
            SignalError::UnknownIndicator { .. } => "UnknownIndicator",
            SignalError::MisconfiguredRule { .. } | SignalError::RuleParse(_) => {
                "MisconfiguredRule"
            }
            SignalError::NoData { .. } => "NoData",
            SignalError::SymbolEvaluation { .. } => "SymbolEvaluationFailure",
            SignalError::DataSource { .. } => "DataSource",
            SignalError::ConfigParse { .. } | SignalError::ConfigInvalid { .. } => "Config",
            SignalError::Io(_) => "Io",
        }
    }

    pub fn for_symbol(self, symbol: &str) -> SignalError {
        match self {
            already @ SignalError::SymbolEvaluation { .. } => already,
            other => SignalError::SymbolEvaluation {
                symbol: symbol.to_string(),
                source: Box::new(other),
            },
        }
    }
}

impl From<&SignalError> for std::process::ExitCode {
    fn from(err: &SignalError) -> Self {
        let code: u8 = match err {
            SignalError::Io(_) => 1,
            SignalError::ConfigParse { .. } | SignalError::ConfigInvalid { .. } => 2,
            SignalError::DataSource { .. } => 3,
            SignalError::RuleParse(_)
            | SignalError::MisconfiguredRule { .. }
            | SignalError::UnknownIndicator { .. } => 4,
            SignalError::MalformedInput { .. }
            | SignalError::InsufficientData { .. }
            | SignalError::NoData { .. }
            | SignalError::SymbolEvaluation { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

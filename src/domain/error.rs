//! Domain error types.

/// A clause translation error with position information.
///
/// The position is a character offset into the clause text, pointing at the
/// literal token that made the clause non-Horn-convertible.
#[derive(Debug, Clone, thiserror::Error)]
#[error("clause error at position {position}: {message}")]
pub struct ClauseError {
    pub message: String,
    pub position: usize,
}

impl ClauseError {
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

/// Top-level error type for ruletrader.
#[derive(Debug, thiserror::Error)]
pub enum RuletraderError {
    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Clause(#[from] ClauseError),

    #[error("rules file error in {file}: {reason}")]
    RulesParse { file: String, reason: String },

    #[error("invalid rule: {reason}")]
    RuleInvalid { reason: String },

    #[error("insufficient data: have {bars} bars, need {minimum}")]
    InsufficientData { bars: usize, minimum: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&RuletraderError> for std::process::ExitCode {
    fn from(err: &RuletraderError) -> Self {
        let code: u8 = match err {
            RuletraderError::Io(_) => 1,
            RuletraderError::ConfigParse { .. }
            | RuletraderError::ConfigMissing { .. }
            | RuletraderError::ConfigInvalid { .. } => 2,
            RuletraderError::Clause(_)
            | RuletraderError::RulesParse { .. }
            | RuletraderError::RuleInvalid { .. } => 3,
            RuletraderError::Data { .. } | RuletraderError::InsufficientData { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}

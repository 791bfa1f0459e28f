use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("No environment selected. Select or configure an environment first.")]
    Configuration,
    #[error("Variables are not valid JSON: {0}")]
    VariablesParse(String),
    #[error("Invalid endpoint URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("HTTP error! status: {status}, message: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("Request failed: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    VariablesParse,
    Transport,
}

impl ExecutionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExecutionError::Configuration => ErrorKind::Configuration,
            ExecutionError::VariablesParse(_) => ErrorKind::VariablesParse,
            ExecutionError::InvalidUrl { .. }
            | ExecutionError::HttpStatus { .. }
            | ExecutionError::Network(_) => ErrorKind::Transport,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Configuration | ErrorKind::VariablesParse
        )
    }
}

#[cfg(feature = "cli")]
impl From<reqwest::Error> for ExecutionError {
    fn from(err: reqwest::Error) -> Self {
        ExecutionError::Network(error_chain(&err))
    }
}

#[cfg(feature = "cli")]
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

use std::fmt;

/// Generation-time failures. Both variants abort generation and surface to
/// the build; nothing here is ever deferred to runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenError {
    /// The header could not be parsed under the given flags, or a wrapped
    /// declaration uses a construct the emitter cannot represent.
    Parse {
        file: String,
        line: u64,
        message: String,
    },
    /// The manifest is structurally invalid or references a symbol the
    /// header does not declare.
    Manifest {
        symbol: Option<String>,
        message: String,
    },
}

impl GenError {
    pub fn parse(file: impl Into<String>, line: u64, message: impl Into<String>) -> Self {
        GenError::Parse {
            file: file.into(),
            line,
            message: message.into(),
        }
    }

    pub fn manifest(symbol: impl Into<String>, message: impl Into<String>) -> Self {
        GenError::Manifest {
            symbol: Some(symbol.into()),
            message: message.into(),
        }
    }

    pub fn manifest_schema(message: impl Into<String>) -> Self {
        GenError::Manifest {
            symbol: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for GenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenError::Parse {
                file,
                line,
                message,
            } => write!(f, "parse error at {file}:{line}: {message}"),
            GenError::Manifest {
                symbol: Some(symbol),
                message,
            } => write!(f, "manifest error for symbol `{symbol}`: {message}"),
            GenError::Manifest {
                symbol: None,
                message,
            } => write!(f, "manifest error: {message}"),
        }
    }
}

impl std::error::Error for GenError {}

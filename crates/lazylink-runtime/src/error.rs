use std::fmt;

/// Runtime resolution failures. Cloneable so a failed resolution can be
/// cached in its binding cell and replayed consistently to every caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No candidate soname could be opened by the system dynamic loader.
    LibraryNotFound {
        library: String,
        candidates: Vec<String>,
    },
    /// The library opened but does not export the symbol (e.g. an older
    /// vendor release).
    SymbolNotFound { library: String, symbol: String },
    /// Every declared alternative name for the symbol failed to resolve.
    AliasExhausted {
        library: String,
        symbol: String,
        tried: Vec<String>,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::LibraryNotFound {
                library,
                candidates,
            } => write!(
                f,
                "shared library `{library}` could not be opened (tried {candidates:?})"
            ),
            Error::SymbolNotFound { library, symbol } => {
                write!(f, "library `{library}` does not export symbol `{symbol}`")
            }
            Error::AliasExhausted {
                library,
                symbol,
                tried,
            } => write!(
                f,
                "no alternative name for `{symbol}` resolved in library `{library}` (tried {tried:?})"
            ),
        }
    }
}

impl std::error::Error for Error {}

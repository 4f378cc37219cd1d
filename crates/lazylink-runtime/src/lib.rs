//! Runtime half of the lazy dynamic-loading stubs.
//!
//! Generated stub modules bind a vendor shared library through one
//! [`LazyLibrary`] plus one [`SymbolCell`] per wrapped symbol: the library is
//! opened on first use by a fixed-priority candidate soname list, each symbol
//! resolves once (trying its version aliases in declared order), and every
//! outcome is cached for process lifetime. The handle is never closed, so no
//! cached function pointer can dangle.
//!
//! Nothing here is specific to generated code; tests construct their own
//! loaders against test-double libraries.

mod cell;
mod error;
mod library;

pub use cell::{RawFn, SymbolCell};
pub use error::Error;
pub use library::LazyLibrary;

// Generated modules hold their `LazyLibrary` in a `Lazy` static; re-exported
// so they depend on this crate alone.
pub use once_cell::sync::Lazy;

/// Reported linkage failure for a proxy whose symbol never resolved.
///
/// Mandatory proxies land here when the library or symbol is absent;
/// best-effort proxies land here when the caller skipped the availability
/// query. Either way the failure names the library and symbol instead of
/// jumping through a null pointer.
pub fn unresolved_call(symbol: &str, err: &Error) -> ! {
    panic!("linkage error: cannot call `{symbol}`: {err}");
}

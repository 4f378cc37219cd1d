use std::ffi::c_void;

use once_cell::sync::OnceCell;

use crate::error::Error;
use crate::library::LazyLibrary;

/// A resolved symbol address. Generated proxies transmute this to their
/// concrete function-pointer type before calling through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFn(*const c_void);

// SAFETY: the address of an exported function in a library whose handle is
// never closed is process-global immutable data.
unsafe impl Send for RawFn {}
unsafe impl Sync for RawFn {}

impl RawFn {
    pub(crate) fn new(ptr: *mut c_void) -> Self {
        RawFn(ptr as *const c_void)
    }

    pub fn addr(&self) -> *const c_void {
        self.0
    }
}

/// Per-symbol binding slot: the lookup runs at most once per process and its
/// outcome — success or failure — is cached. A failed best-effort symbol
/// therefore never poisons its neighbors, and repeated calls on an
/// unavailable symbol replay the same error without touching the loader.
pub struct SymbolCell {
    slot: OnceCell<Result<RawFn, Error>>,
}

impl SymbolCell {
    pub const fn new() -> Self {
        SymbolCell {
            slot: OnceCell::new(),
        }
    }

    /// Resolve through `lib`, trying `names` in declared order. Concurrent
    /// first calls perform the underlying lookup exactly once.
    pub fn resolve(&self, lib: &LazyLibrary, names: &[&str]) -> Result<RawFn, Error> {
        self.slot.get_or_init(|| lib.resolve(names)).clone()
    }

    /// True when a lookup already ran and bound an address.
    pub fn is_resolved(&self) -> bool {
        matches!(self.slot.get(), Some(Ok(_)))
    }
}

impl Default for SymbolCell {
    fn default() -> Self {
        Self::new()
    }
}

use std::ffi::CString;
use std::mem::ManuallyDrop;

use libloading::Library;
use once_cell::sync::OnceCell;
use tracing::debug;

use crate::cell::RawFn;
use crate::error::Error;

/// One lazily-opened shared library.
///
/// The underlying open happens at most once per instance, on the first
/// `ensure_loaded`/`resolve` call; every thread then observes the same
/// outcome. The handle is deliberately never closed for the lifetime of the
/// loader, so function pointers resolved through it cannot dangle. The
/// generated stub modules hold one `LazyLibrary` in a static; tests can
/// construct independent instances against test-double libraries.
pub struct LazyLibrary {
    name: String,
    candidates: Vec<String>,
    handle: OnceCell<Option<ManuallyDrop<Library>>>,
}

impl LazyLibrary {
    pub fn new(name: &str, candidates: &[&str]) -> Self {
        LazyLibrary {
            name: name.to_string(),
            candidates: candidates.iter().map(|c| c.to_string()).collect(),
            handle: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Try the candidate sonames in priority order through the operating
    /// system's standard loader search path. Idempotent; the open is
    /// attempted exactly once no matter how many threads race here.
    pub fn ensure_loaded(&self) -> bool {
        self.handle().is_some()
    }

    fn handle(&self) -> Option<&ManuallyDrop<Library>> {
        self.handle
            .get_or_init(|| {
                for cand in &self.candidates {
                    match unsafe { Library::new(cand) } {
                        Ok(lib) => {
                            debug!(library = %self.name, soname = %cand, "opened shared library");
                            return Some(ManuallyDrop::new(lib));
                        }
                        Err(err) => {
                            debug!(library = %self.name, soname = %cand, %err, "candidate not loadable");
                        }
                    }
                }
                None
            })
            .as_ref()
    }

    /// True when an open already happened and succeeded; never triggers one.
    pub fn is_loaded(&self) -> bool {
        matches!(self.handle.get(), Some(Some(_)))
    }

    /// Look one symbol up, trying the declared names in order and binding
    /// the first that resolves. Reports failure only when every alternative
    /// failed.
    pub fn resolve(&self, names: &[&str]) -> Result<RawFn, Error> {
        assert!(!names.is_empty(), "resolution order must name at least one symbol");

        let Some(lib) = self.handle() else {
            return Err(Error::LibraryNotFound {
                library: self.name.clone(),
                candidates: self.candidates.clone(),
            });
        };

        for name in names {
            let Ok(cname) = CString::new(*name) else {
                continue;
            };
            match unsafe { lib.get::<*mut std::ffi::c_void>(cname.as_bytes_with_nul()) } {
                Ok(sym) => {
                    debug!(library = %self.name, symbol = %name, "resolved symbol");
                    return Ok(RawFn::new(*sym));
                }
                Err(_) => continue,
            }
        }

        Err(if names.len() == 1 {
            Error::SymbolNotFound {
                library: self.name.clone(),
                symbol: names[0].to_string(),
            }
        } else {
            Error::AliasExhausted {
                library: self.name.clone(),
                symbol: names[0].to_string(),
                tried: names.iter().map(|n| n.to_string()).collect(),
            }
        })
    }
}

//! Build-time generator for lazy dynamic-loading stubs.
//!
//! Turns a vendor shared library's public C header plus a declarative
//! manifest into a Rust module in which every wrapped symbol is a proxy that
//! resolves the real function on first call through `lazylink-runtime`. The
//! vendor library — or individual symbols of it — may be absent at process
//! runtime without breaking the build or the process.

pub mod c;
pub mod emit;
mod error;
pub mod ir;
pub mod manifest;
mod util;

use std::path::{Path, PathBuf};

pub use error::GenError;

/// One-shot generation entry point: parse the header, cross-reference the
/// manifest, emit the stub module. Returns the generated source text.
pub fn generate(
    prefix: &str,
    manifest_path: &Path,
    header_path: &Path,
    include_dirs: &[PathBuf],
) -> Result<String, GenError> {
    let manifest = manifest::load_manifest(manifest_path)?;
    let decls = c::parse_header(header_path, include_dirs)?;
    let units = manifest::resolve(&manifest, &decls)?;

    let header_bytes = std::fs::read(header_path).map_err(|e| {
        GenError::parse(
            header_path.display().to_string(),
            0,
            format!("read header: {e}"),
        )
    })?;

    let module = ir::StubModule {
        prefix: prefix.to_string(),
        library: manifest.library.clone(),
        header_path: header_path.display().to_string(),
        header_sha256: util::sha256_hex(&header_bytes),
        units,
    };
    emit::emit_module(&module)
}

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::GenError;
use crate::ir::{LibrarySpec, SymbolDecl, WrapUnit};

pub const MANIFEST_SCHEMA_VERSION: &str = "lazylink.manifest@0.1.0";

/// Declarative per-library manifest: which header symbols get stubbed, with
/// what version aliases, and which ones the runtime may tolerate missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub schema_version: String,
    pub library: LibrarySpec,
    pub functions: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    /// Alternate exported names across vendor major versions, in resolution
    /// order. Preserved verbatim into the generated module.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    /// Absence of this symbol is tolerated at runtime; callers must check
    /// the generated availability query before use.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub best_effort: bool,
}

pub fn load_manifest(path: &Path) -> Result<Manifest, GenError> {
    let bytes = std::fs::read(path).map_err(|e| {
        GenError::manifest_schema(format!("read manifest {}: {e}", path.display()))
    })?;
    let m: Manifest = serde_json::from_slice(&bytes).map_err(|e| {
        GenError::manifest_schema(format!("parse manifest JSON {}: {e}", path.display()))
    })?;
    if m.schema_version.trim() != MANIFEST_SCHEMA_VERSION {
        return Err(GenError::manifest_schema(format!(
            "manifest schema_version mismatch: expected {MANIFEST_SCHEMA_VERSION} got {:?}",
            m.schema_version
        )));
    }
    if m.library.name.is_empty() {
        return Err(GenError::manifest_schema("library.name is empty"));
    }
    if m.library.candidates.is_empty() {
        return Err(GenError::manifest_schema(format!(
            "library {:?} has no candidate sonames",
            m.library.name
        )));
    }
    Ok(m)
}

/// Cross-reference the manifest against the parsed symbol table. Every check
/// here is a build-time check; nothing is deferred to runtime.
pub fn resolve(manifest: &Manifest, decls: &[SymbolDecl]) -> Result<Vec<WrapUnit>, GenError> {
    let by_name: BTreeMap<&str, &SymbolDecl> = decls
        .iter()
        .map(|d| (d.name.as_str(), d))
        .collect();

    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut units: Vec<WrapUnit> = Vec::with_capacity(manifest.functions.len());
    for entry in &manifest.functions {
        if !seen.insert(entry.name.as_str()) {
            return Err(GenError::manifest(
                entry.name.clone(),
                "listed more than once in manifest",
            ));
        }
        let Some(decl) = by_name.get(entry.name.as_str()) else {
            return Err(GenError::manifest(
                entry.name.clone(),
                "not declared in header",
            ));
        };
        if decl.variadic {
            return Err(GenError::manifest(
                entry.name.clone(),
                "declared variadic; variadic functions cannot be proxied",
            ));
        }
        units.push(WrapUnit {
            decl: (*decl).clone(),
            aliases: entry.aliases.clone(),
            best_effort: entry.best_effort,
        });
    }
    Ok(units)
}

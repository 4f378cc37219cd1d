mod extract;
pub mod lower;
mod parse;

use std::path::{Path, PathBuf};

use crate::error::GenError;
use crate::ir::SymbolDecl;

/// Parse the vendor header into the ordered symbol table: every top-level
/// C-linkage function declaration visible under the taken preprocessor
/// branches, with canonical types.
pub fn parse_header(header: &Path, include_dirs: &[PathBuf]) -> Result<Vec<SymbolDecl>, GenError> {
    let tu = parse::parse_translation_unit(header, include_dirs)?;
    extract::extract_symbols(header, &tu)
}

use serde::{Deserialize, Serialize};

/// Calling convention recorded from the declaration's canonical type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallConv {
    C,
    Stdcall,
}

impl CallConv {
    pub fn rust_abi(self) -> &'static str {
        match self {
            CallConv::C => "C",
            CallConv::Stdcall => "stdcall",
        }
    }
}

/// One declared parameter, with its type in clang's canonical desugared
/// spelling (typedefs already resolved).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CParamDecl {
    pub name: String,
    pub ty: String,
}

/// A top-level C-linkage function declaration extracted from the header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolDecl {
    pub name: String,
    /// Return type in canonical desugared spelling.
    pub ret_ty: String,
    pub params: Vec<CParamDecl>,
    pub conv: CallConv,
    pub variadic: bool,
    pub file: String,
    pub line: u64,
}

/// The shared library the stub module binds to: a logical name plus the
/// ordered candidate sonames tried at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibrarySpec {
    pub name: String,
    pub candidates: Vec<String>,
}

/// A manifest entry paired with its matching declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrapUnit {
    pub decl: SymbolDecl,
    /// Alias list exactly as written in the manifest.
    pub aliases: Vec<String>,
    pub best_effort: bool,
}

impl WrapUnit {
    /// Runtime resolution order: the primary name first, then aliases as
    /// declared. An alias list that already contains the primary name is
    /// taken verbatim as the complete order.
    pub fn resolution_order(&self) -> Vec<String> {
        if self.aliases.iter().any(|a| *a == self.decl.name) {
            return self.aliases.clone();
        }
        let mut names = Vec::with_capacity(self.aliases.len() + 1);
        names.push(self.decl.name.clone());
        names.extend(self.aliases.iter().cloned());
        names
    }
}

/// Everything the emitter needs for one library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StubModule {
    /// Namespacing prefix for the binding scaffolding and query functions.
    pub prefix: String,
    pub library: LibrarySpec,
    pub header_path: String,
    pub header_sha256: String,
    pub units: Vec<WrapUnit>,
}

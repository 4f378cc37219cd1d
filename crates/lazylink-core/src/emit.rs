//! Deterministic emission of the generated stub module.
//!
//! Identical inputs always produce byte-identical output, so the build can
//! detect no-op regenerations by comparing file contents.

use std::fmt::Write as _;

use crate::c::lower::{parse_ctype, rust_param_type, rust_ret_type, sanitize_ident};
use crate::error::GenError;
use crate::ir::{StubModule, WrapUnit};

pub fn emit_module(m: &StubModule) -> Result<String, GenError> {
    if !is_ident(&m.prefix) {
        return Err(GenError::manifest_schema(format!(
            "prefix {:?} is not a valid identifier",
            m.prefix
        )));
    }

    let lib_static = format!("{}_LIB", m.prefix.to_uppercase());
    let mut out = String::new();

    let _ = writeln!(out, "// Generated by lazylink. Do not edit.");
    let _ = writeln!(out, "//");
    let _ = writeln!(out, "// library: {}", m.library.name);
    let _ = writeln!(out, "// header: {}", m.header_path);
    let _ = writeln!(out, "// header sha256: {}", m.header_sha256);
    out.push('\n');
    out.push_str("#![allow(non_snake_case)]\n");
    out.push_str("#![allow(non_upper_case_globals)]\n");
    out.push_str("#![allow(clippy::missing_safety_doc)]\n");
    out.push('\n');
    if m.units.is_empty() {
        out.push_str("use lazylink_runtime::{Lazy, LazyLibrary};\n");
    } else {
        out.push_str("use lazylink_runtime::{Lazy, LazyLibrary, SymbolCell};\n");
    }
    out.push('\n');

    let _ = writeln!(out, "static {lib_static}: Lazy<LazyLibrary> = Lazy::new(|| {{");
    let _ = writeln!(out, "    LazyLibrary::new(");
    let _ = writeln!(out, "        {:?},", m.library.name);
    let _ = writeln!(out, "        &[");
    for cand in &m.library.candidates {
        let _ = writeln!(out, "            {cand:?},");
    }
    let _ = writeln!(out, "        ],");
    let _ = writeln!(out, "    )");
    let _ = writeln!(out, "}});");
    out.push('\n');

    let _ = writeln!(
        out,
        "/// True when one of the `{}` shared library candidates could be opened.",
        m.library.name
    );
    let _ = writeln!(out, "pub fn {}_available() -> bool {{", m.prefix);
    let _ = writeln!(out, "    {lib_static}.ensure_loaded()");
    let _ = writeln!(out, "}}");

    for unit in &m.units {
        out.push('\n');
        emit_unit(&mut out, m, &lib_static, unit)?;
    }

    Ok(out)
}

fn emit_unit(
    out: &mut String,
    m: &StubModule,
    lib_static: &str,
    unit: &WrapUnit,
) -> Result<(), GenError> {
    let decl = &unit.decl;
    let name = &decl.name;
    let pfn_ty = format!("Pfn{}", upper_first(name));
    let abi = decl.conv.rust_abi();

    let mut params: Vec<(String, String)> = Vec::with_capacity(decl.params.len());
    for p in &decl.params {
        let ty = parse_ctype(&p.ty)
            .and_then(|t| rust_param_type(&t))
            .map_err(|msg| lower_error(decl, &p.ty, &msg))?;
        params.push((sanitize_ident(&p.name), ty));
    }
    let ret = parse_ctype(&decl.ret_ty)
        .and_then(|t| rust_ret_type(&t))
        .map_err(|msg| lower_error(decl, &decl.ret_ty, &msg))?;

    let arg_list = params
        .iter()
        .map(|(n, t)| format!("{n}: {t}"))
        .collect::<Vec<_>>()
        .join(", ");
    let fwd_list = params
        .iter()
        .map(|(n, _)| n.clone())
        .collect::<Vec<_>>()
        .join(", ");
    let ret_suffix = match &ret {
        Some(ty) => format!(" -> {ty}"),
        None => String::new(),
    };

    let _ = writeln!(
        out,
        "pub type {pfn_ty} = unsafe extern {abi:?} fn({arg_list}){ret_suffix};"
    );
    out.push('\n');

    let _ = write!(out, "const NAMES_{name}: &[&str] = &[");
    for (i, alias) in unit.resolution_order().iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{alias:?}");
    }
    out.push_str("];\n");
    out.push('\n');

    let _ = writeln!(out, "static PFN_{name}: SymbolCell = SymbolCell::new();");
    out.push('\n');

    if unit.best_effort {
        let _ = writeln!(
            out,
            "/// True when the optional `{name}` symbol is present in the opened library."
        );
        let _ = writeln!(out, "pub fn {}_has_{name}() -> bool {{", m.prefix);
        let _ = writeln!(
            out,
            "    PFN_{name}.resolve(&{lib_static}, NAMES_{name}).is_ok()"
        );
        let _ = writeln!(out, "}}");
        out.push('\n');
    }

    let _ = writeln!(out, "/// Proxy for `{name}`; resolves on first call.");
    let _ = writeln!(out, "pub unsafe fn {name}({arg_list}){ret_suffix} {{");
    let _ = writeln!(
        out,
        "    match PFN_{name}.resolve(&{lib_static}, NAMES_{name}) {{"
    );
    let _ = writeln!(out, "        Ok(pfn) => {{");
    let _ = writeln!(
        out,
        "            let call: {pfn_ty} = ::std::mem::transmute(pfn.addr());"
    );
    let _ = writeln!(out, "            call({fwd_list})");
    let _ = writeln!(out, "        }}");
    let _ = writeln!(
        out,
        "        Err(err) => ::lazylink_runtime::unresolved_call({name:?}, &err),"
    );
    let _ = writeln!(out, "    }}");
    let _ = writeln!(out, "}}");
    Ok(())
}

fn lower_error(decl: &crate::ir::SymbolDecl, spelling: &str, msg: &str) -> GenError {
    GenError::parse(
        decl.file.clone(),
        decl.line,
        format!("in `{}`, type `{spelling}`: {msg}", decl.name),
    )
}

fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first == '_' || first.is_ascii_alphabetic()) {
        return false;
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

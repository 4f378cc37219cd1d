use std::collections::BTreeSet;
use std::path::Path;

use serde_json::Value;

use crate::error::GenError;
use crate::ir::{CParamDecl, CallConv, SymbolDecl};

/// Walk the translation unit's top-level declarations, in source order, and
/// collect every external-linkage C function declaration.
///
/// `static` and `inline` functions never become exported symbols and are
/// skipped, as are clang's implicit builtin declarations. A name redeclared
/// later in the header keeps its first declaration.
pub fn extract_symbols(header: &Path, tu: &Value) -> Result<Vec<SymbolDecl>, GenError> {
    let header_name = header.display().to_string();
    let mut out: Vec<SymbolDecl> = Vec::new();
    let mut seen: BTreeSet<String> = BTreeSet::new();

    // clang's JSON dump only mentions `loc.file`/`loc.line` when they change
    // from the previous node, so carry them across siblings.
    let mut cur_file = header_name.clone();
    let mut cur_line: u64 = 0;

    let Some(decls) = tu.get("inner").and_then(|v| v.as_array()) else {
        return Ok(out);
    };

    for node in decls {
        if let Some(loc) = node.get("loc") {
            if let Some(file) = loc.get("file").and_then(|v| v.as_str()) {
                cur_file = file.to_string();
            }
            if let Some(line) = loc.get("line").and_then(|v| v.as_u64()) {
                cur_line = line;
            }
        }

        if node_kind(node) != Some("FunctionDecl") {
            continue;
        }
        if node
            .get("isImplicit")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
        {
            continue;
        }
        let storage = node
            .get("storageClass")
            .and_then(|v| v.as_str())
            .unwrap_or("");
        if storage == "static" {
            continue;
        }
        if node.get("inline").and_then(|v| v.as_bool()).unwrap_or(false) {
            continue;
        }

        let Some(name) = node.get("name").and_then(|v| v.as_str()) else {
            continue;
        };
        if !seen.insert(name.to_string()) {
            continue;
        }

        out.push(extract_decl(node, name, &cur_file, cur_line)?);
    }

    Ok(out)
}

fn extract_decl(
    node: &Value,
    name: &str,
    file: &str,
    line: u64,
) -> Result<SymbolDecl, GenError> {
    let ty = node
        .get("type")
        .and_then(|t| {
            t.get("desugaredQualType")
                .or_else(|| t.get("qualType"))
                .and_then(|v| v.as_str())
        })
        .ok_or_else(|| {
            GenError::parse(file, line, format!("function `{name}` has no type spelling"))
        })?;

    let (ty, conv) = split_calling_convention(ty);
    let ret_ty = ty
        .split_once('(')
        .map(|(ret, _)| ret.trim().to_string())
        .unwrap_or_else(|| ty.trim().to_string());

    let variadic = node
        .get("variadic")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    let mut params: Vec<CParamDecl> = Vec::new();
    if let Some(inner) = node.get("inner").and_then(|v| v.as_array()) {
        for ch in inner {
            if node_kind(ch) != Some("ParmVarDecl") {
                continue;
            }
            params.push(extract_param(ch, params.len(), name, file, line)?);
        }
    }

    Ok(SymbolDecl {
        name: name.to_string(),
        ret_ty,
        params,
        conv,
        variadic,
        file: file.to_string(),
        line,
    })
}

fn extract_param(
    node: &Value,
    index: usize,
    func: &str,
    file: &str,
    line: u64,
) -> Result<CParamDecl, GenError> {
    // Parameter names are optional in declarations; synthesize positional
    // names so the proxy signature always has one.
    let name = node
        .get("name")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("arg{index}"));

    let ty = node
        .get("type")
        .and_then(|t| {
            t.get("desugaredQualType")
                .or_else(|| t.get("qualType"))
                .and_then(|v| v.as_str())
        })
        .ok_or_else(|| {
            GenError::parse(
                file,
                line,
                format!("parameter {index} of `{func}` has no type spelling"),
            )
        })?;

    Ok(CParamDecl {
        name,
        ty: ty.to_string(),
    })
}

/// Strip `__attribute__((...))` suffixes from a canonical function type
/// spelling and report the calling convention they carried.
fn split_calling_convention(ty: &str) -> (String, CallConv) {
    let mut conv = CallConv::C;
    let mut out = String::with_capacity(ty.len());
    let mut rest = ty;
    while let Some(idx) = rest.find("__attribute__((") {
        out.push_str(&rest[..idx]);
        let tail = &rest[idx..];
        let Some(end) = tail.find("))") else {
            rest = "";
            break;
        };
        if tail[..end].contains("stdcall") {
            conv = CallConv::Stdcall;
        }
        rest = &tail[end + 2..];
    }
    out.push_str(rest);
    (out.trim().to_string(), conv)
}

fn node_kind(node: &Value) -> Option<&str> {
    node.get("kind").and_then(|v| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tu(decls: Vec<Value>) -> Value {
        json!({ "kind": "TranslationUnitDecl", "inner": decls })
    }

    fn fn_decl(name: &str, ty: &str, params: Vec<Value>) -> Value {
        json!({
            "kind": "FunctionDecl",
            "name": name,
            "loc": { "file": "codec.h", "line": 10 },
            "type": { "qualType": ty },
            "inner": params,
        })
    }

    fn param(name: &str, ty: &str) -> Value {
        json!({ "kind": "ParmVarDecl", "name": name, "type": { "qualType": ty } })
    }

    #[test]
    fn extracts_ordered_externs_and_skips_static_inline() {
        let tree = tu(vec![
            fn_decl("codecCreate", "int (void **)", vec![param("handle", "void **")]),
            json!({
                "kind": "FunctionDecl",
                "name": "codec_helper",
                "storageClass": "static",
                "inline": true,
                "type": { "qualType": "int (int)" },
            }),
            fn_decl("codecDestroy", "int (void *)", vec![param("handle", "void *")]),
        ]);
        let syms = extract_symbols(Path::new("codec.h"), &tree).unwrap();
        let names: Vec<&str> = syms.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["codecCreate", "codecDestroy"]);
        assert_eq!(syms[0].ret_ty, "int");
        assert_eq!(syms[0].params[0].ty, "void **");
    }

    #[test]
    fn first_declaration_wins() {
        let tree = tu(vec![
            fn_decl("codecCreate", "int (void **)", vec![param("h", "void **")]),
            fn_decl("codecCreate", "int (void **)", vec![]),
        ]);
        let syms = extract_symbols(Path::new("codec.h"), &tree).unwrap();
        assert_eq!(syms.len(), 1);
        assert_eq!(syms[0].params.len(), 1);
    }

    #[test]
    fn implicit_builtins_are_skipped() {
        let tree = tu(vec![json!({
            "kind": "FunctionDecl",
            "name": "__builtin_memcpy",
            "isImplicit": true,
            "type": { "qualType": "void *(void *, const void *, unsigned long)" },
        })]);
        let syms = extract_symbols(Path::new("codec.h"), &tree).unwrap();
        assert!(syms.is_empty());
    }

    #[test]
    fn stdcall_attribute_is_recorded_and_stripped() {
        let (ty, conv) = split_calling_convention("int (int) __attribute__((stdcall))");
        assert_eq!(ty, "int (int)");
        assert_eq!(conv, CallConv::Stdcall);
    }

    #[test]
    fn variadic_flag_is_recorded() {
        let tree = tu(vec![json!({
            "kind": "FunctionDecl",
            "name": "codecLog",
            "variadic": true,
            "loc": { "file": "codec.h", "line": 3 },
            "type": { "qualType": "int (const char *, ...)" },
            "inner": [param("fmt", "const char *")],
        })]);
        let syms = extract_symbols(Path::new("codec.h"), &tree).unwrap();
        assert!(syms[0].variadic);
    }
}

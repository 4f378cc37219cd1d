//! Lowering of clang's canonical C type spellings to `std::ffi` Rust types.
//!
//! The front-end hands us desugared spellings (`unsigned long`, `const char
//! *`, `struct nvjpegHandle **`, `enum nvjpegStatus`), so no typedef lookup
//! happens here; this is a pure spelling-to-type function.

/// Canonical C type, after typedef resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CType {
    Void,
    Bool,
    Char,
    SChar,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    LongLong,
    ULongLong,
    Float,
    Double,
    Enum(String),
    Struct(String),
    Union(String),
    Pointer { is_const: bool, pointee: Box<CType> },
    /// Any function-pointer spelling; lowered as an opaque code pointer.
    FnPtr,
}

/// Parse a canonical spelling into a `CType`.
pub fn parse_ctype(spelling: &str) -> Result<CType, String> {
    let s = spelling.trim();
    if s.is_empty() {
        return Err("empty type spelling".to_string());
    }
    if s.contains("(*") {
        return Ok(CType::FnPtr);
    }
    if s.contains('[') {
        return Err(format!("array type `{s}` is not supported here"));
    }

    // Qualifiers written after the `*` bind to the pointer itself and are
    // ABI-irrelevant for the proxy signature.
    let s = strip_trailing_qualifiers(s);

    if let Some(prefix) = s.strip_suffix('*') {
        let prefix = prefix.trim_end();
        let is_const = leading_const(prefix) && !prefix.trim_end().ends_with('*');
        let pointee = parse_ctype(prefix)?;
        return Ok(CType::Pointer {
            is_const,
            pointee: Box::new(pointee),
        });
    }

    parse_base(&normalize_tokens(s))
}

fn strip_trailing_qualifiers(mut s: &str) -> &str {
    loop {
        s = s.trim_end();
        let mut stripped = false;
        for q in ["const", "volatile", "restrict", "__restrict", "__restrict__"] {
            if let Some(rest) = s.strip_suffix(q) {
                if rest.ends_with(['*', ' ']) {
                    s = rest;
                    stripped = true;
                    break;
                }
            }
        }
        if !stripped {
            return s;
        }
    }
}

fn leading_const(s: &str) -> bool {
    s.split_whitespace().any(|t| t == "const")
}

fn normalize_tokens(s: &str) -> Vec<&str> {
    s.split_whitespace()
        .filter(|t| {
            !matches!(
                *t,
                "const" | "volatile" | "restrict" | "__restrict" | "__restrict__"
            )
        })
        .collect()
}

fn parse_base(tokens: &[&str]) -> Result<CType, String> {
    match tokens {
        ["void"] => return Ok(CType::Void),
        ["_Bool"] | ["bool"] => return Ok(CType::Bool),
        ["float"] => return Ok(CType::Float),
        ["double"] => return Ok(CType::Double),
        ["enum", rest @ ..] if !rest.is_empty() => {
            return Ok(CType::Enum(rest.join(" ")));
        }
        ["struct", rest @ ..] if !rest.is_empty() => {
            return Ok(CType::Struct(rest.join(" ")));
        }
        ["union", rest @ ..] if !rest.is_empty() => {
            return Ok(CType::Union(rest.join(" ")));
        }
        _ => {}
    }

    // Integer spellings: any order of signedness / width / `int` keywords.
    let mut signed = None;
    let mut longs = 0u8;
    let mut short = false;
    let mut base_char = false;
    let mut base_int = false;
    for t in tokens {
        match *t {
            "signed" => signed = Some(true),
            "unsigned" => signed = Some(false),
            "long" => longs += 1,
            "short" => short = true,
            "char" => base_char = true,
            "int" => base_int = true,
            other => return Err(format!("unsupported type spelling `{other}`")),
        }
    }
    if tokens.is_empty() {
        return Err("empty type spelling".to_string());
    }

    let unsigned = signed == Some(false);
    if base_char {
        if longs > 0 || short {
            return Err("invalid char spelling".to_string());
        }
        return Ok(match signed {
            None => CType::Char,
            Some(true) => CType::SChar,
            Some(false) => CType::UChar,
        });
    }
    if short {
        if longs > 0 {
            return Err("invalid short spelling".to_string());
        }
        return Ok(if unsigned { CType::UShort } else { CType::Short });
    }
    match longs {
        0 if base_int || signed.is_some() => Ok(if unsigned { CType::UInt } else { CType::Int }),
        1 => Ok(if unsigned { CType::ULong } else { CType::Long }),
        2 => Ok(if unsigned {
            CType::ULongLong
        } else {
            CType::LongLong
        }),
        _ => Err(format!("unsupported type spelling `{}`", tokens.join(" "))),
    }
}

/// Render the Rust type used for a parameter of this C type.
pub fn rust_param_type(ty: &CType) -> Result<String, String> {
    match ty {
        CType::Void => Err("`void` is not a valid parameter type".to_string()),
        CType::Struct(name) => Err(format!(
            "struct `{name}` is passed by value; only pointers to structs are supported"
        )),
        CType::Union(name) => Err(format!(
            "union `{name}` is passed by value; only pointers to unions are supported"
        )),
        other => rust_value_type(other),
    }
}

/// Render the Rust return type, or `None` for `void`.
pub fn rust_ret_type(ty: &CType) -> Result<Option<String>, String> {
    match ty {
        CType::Void => Ok(None),
        CType::Struct(name) => Err(format!(
            "struct `{name}` is returned by value; only pointers to structs are supported"
        )),
        CType::Union(name) => Err(format!(
            "union `{name}` is returned by value; only pointers to unions are supported"
        )),
        other => rust_value_type(other).map(Some),
    }
}

fn rust_value_type(ty: &CType) -> Result<String, String> {
    Ok(match ty {
        CType::Void | CType::Struct(_) | CType::Union(_) => unreachable!("checked by callers"),
        CType::Bool => "bool".to_string(),
        CType::Char => "::std::ffi::c_char".to_string(),
        CType::SChar => "::std::ffi::c_schar".to_string(),
        CType::UChar => "::std::ffi::c_uchar".to_string(),
        CType::Short => "::std::ffi::c_short".to_string(),
        CType::UShort => "::std::ffi::c_ushort".to_string(),
        CType::Int => "::std::ffi::c_int".to_string(),
        CType::UInt => "::std::ffi::c_uint".to_string(),
        CType::Long => "::std::ffi::c_long".to_string(),
        CType::ULong => "::std::ffi::c_ulong".to_string(),
        CType::LongLong => "::std::ffi::c_longlong".to_string(),
        CType::ULongLong => "::std::ffi::c_ulonglong".to_string(),
        CType::Float => "f32".to_string(),
        CType::Double => "f64".to_string(),
        // C enums in the headers in scope are int-sized.
        CType::Enum(_) => "::std::ffi::c_int".to_string(),
        CType::FnPtr => "*const ::std::ffi::c_void".to_string(),
        CType::Pointer { is_const, pointee } => {
            let inner = match pointee.as_ref() {
                // Opaque behind a pointer: handles, buffers the generated
                // code never dereferences.
                CType::Void | CType::Struct(_) | CType::Union(_) | CType::FnPtr => {
                    "::std::ffi::c_void".to_string()
                }
                other => rust_value_type(other)?,
            };
            if *is_const {
                format!("*const {inner}")
            } else {
                format!("*mut {inner}")
            }
        }
    })
}

/// Parameter names that collide with Rust keywords get a trailing underscore.
pub fn sanitize_ident(name: &str) -> String {
    const KEYWORDS: &[&str] = &[
        "as", "async", "await", "box", "break", "const", "continue", "crate", "dyn", "else",
        "enum", "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod",
        "move", "mut", "priv", "pub", "ref", "return", "self", "static", "struct", "super",
        "trait", "true", "try", "type", "unsafe", "use", "where", "while", "yield",
    ];
    if KEYWORDS.contains(&name) {
        format!("{name}_")
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lower(spelling: &str) -> String {
        rust_param_type(&parse_ctype(spelling).unwrap()).unwrap()
    }

    #[test]
    fn scalar_spellings() {
        assert_eq!(lower("int"), "::std::ffi::c_int");
        assert_eq!(lower("unsigned int"), "::std::ffi::c_uint");
        assert_eq!(lower("unsigned long"), "::std::ffi::c_ulong");
        assert_eq!(lower("long long int"), "::std::ffi::c_longlong");
        assert_eq!(lower("unsigned char"), "::std::ffi::c_uchar");
        assert_eq!(lower("signed char"), "::std::ffi::c_schar");
        assert_eq!(lower("_Bool"), "bool");
        assert_eq!(lower("double"), "f64");
    }

    #[test]
    fn pointer_spellings() {
        assert_eq!(lower("const char *"), "*const ::std::ffi::c_char");
        assert_eq!(lower("void *"), "*mut ::std::ffi::c_void");
        assert_eq!(lower("void **"), "*mut *mut ::std::ffi::c_void");
        assert_eq!(
            lower("struct nvjpegHandle **"),
            "*mut *mut ::std::ffi::c_void"
        );
        assert_eq!(
            lower("const struct nvjpegImage *"),
            "*const ::std::ffi::c_void"
        );
        assert_eq!(lower("const char *restrict"), "*const ::std::ffi::c_char");
        assert_eq!(lower("unsigned int *"), "*mut ::std::ffi::c_uint");
    }

    #[test]
    fn enums_lower_to_c_int() {
        assert_eq!(lower("enum nvjpegStatus"), "::std::ffi::c_int");
    }

    #[test]
    fn function_pointers_are_opaque() {
        assert_eq!(
            lower("int (*)(void *, unsigned long)"),
            "*const ::std::ffi::c_void"
        );
    }

    #[test]
    fn by_value_struct_is_rejected() {
        let ty = parse_ctype("struct nvjpegImage").unwrap();
        let err = rust_param_type(&ty).unwrap_err();
        assert!(err.contains("nvjpegImage"), "{err}");
    }

    #[test]
    fn void_return_is_elided() {
        assert_eq!(rust_ret_type(&parse_ctype("void").unwrap()).unwrap(), None);
        assert_eq!(
            rust_ret_type(&parse_ctype("int").unwrap()).unwrap(),
            Some("::std::ffi::c_int".to_string())
        );
    }

    #[test]
    fn keyword_params_are_sanitized() {
        assert_eq!(sanitize_ident("type"), "type_");
        assert_eq!(sanitize_ident("handle"), "handle");
    }
}

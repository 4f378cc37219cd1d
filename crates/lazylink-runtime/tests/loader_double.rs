//! Loader behavior against a real shared library, compiled on the fly.
//!
//! Skips (with a note on stderr) when no C compiler is on PATH. Unix-only:
//! the fixture is built with `cc -shared -fPIC`.

#![cfg(unix)]

use std::ffi::c_int;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Barrier};

use lazylink_runtime::{Error, LazyLibrary, SymbolCell};

const DOUBLE_SRC: &str = r#"
int dbl_magic(void) { return 1337; }
int dbl_add(int a, int b) { return a + b; }
int dbl_scale_v2(int x) { return x * 2; }
"#;

fn cc() -> String {
    std::env::var("CC").unwrap_or_else(|_| "cc".to_string())
}

fn have_cc() -> bool {
    Command::new(cc())
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn build_double(dir: &Path) -> PathBuf {
    let src = dir.join("double.c");
    std::fs::write(&src, DOUBLE_SRC).expect("write double.c");
    let out = dir.join("libdbl_double.so");
    let status = Command::new(cc())
        .arg("-shared")
        .arg("-fPIC")
        .arg("-o")
        .arg(&out)
        .arg(&src)
        .status()
        .expect("cc invocation ok");
    assert!(status.success(), "cc failed building test double");
    out
}

fn double_library(dir: &Path) -> LazyLibrary {
    let path = build_double(dir);
    LazyLibrary::new("dbl", &[path.to_str().expect("utf-8 path")])
}

type FnNoArg = unsafe extern "C" fn() -> c_int;
type FnAdd = unsafe extern "C" fn(c_int, c_int) -> c_int;
type FnScale = unsafe extern "C" fn(c_int) -> c_int;

#[test]
fn mandatory_symbols_forward_calls_unchanged() {
    if !have_cc() {
        eprintln!("skipping: cc not found on PATH");
        return;
    }
    let tmp = tempfile::tempdir().expect("tempdir");
    let lib = double_library(tmp.path());
    assert!(lib.ensure_loaded());

    let magic = lib.resolve(&["dbl_magic"]).expect("resolve dbl_magic");
    let magic: FnNoArg = unsafe { std::mem::transmute(magic.addr()) };
    assert_eq!(unsafe { magic() }, 1337);

    let add = lib.resolve(&["dbl_add"]).expect("resolve dbl_add");
    let add: FnAdd = unsafe { std::mem::transmute(add.addr()) };
    assert_eq!(unsafe { add(19, 23) }, 42);
}

#[test]
fn missing_symbol_does_not_poison_the_rest() {
    if !have_cc() {
        eprintln!("skipping: cc not found on PATH");
        return;
    }
    let tmp = tempfile::tempdir().expect("tempdir");
    let lib = double_library(tmp.path());

    let absent = SymbolCell::new();
    let err = absent.resolve(&lib, &["dbl_absent"]).unwrap_err();
    assert_eq!(
        err,
        Error::SymbolNotFound {
            library: "dbl".to_string(),
            symbol: "dbl_absent".to_string(),
        }
    );
    assert!(!absent.is_resolved());

    // Neighbors keep resolving and operating normally.
    let add = SymbolCell::new();
    let raw = add.resolve(&lib, &["dbl_add"]).expect("resolve dbl_add");
    assert!(add.is_resolved());
    let add: FnAdd = unsafe { std::mem::transmute(raw.addr()) };
    assert_eq!(unsafe { add(2, 2) }, 4);
}

#[test]
fn aliases_resolve_in_declared_order() {
    if !have_cc() {
        eprintln!("skipping: cc not found on PATH");
        return;
    }
    let tmp = tempfile::tempdir().expect("tempdir");
    let lib = double_library(tmp.path());

    // The primary name is gone from this vendor version; the alias binds.
    let raw = lib
        .resolve(&["dbl_scale", "dbl_scale_v2"])
        .expect("alias fallback");
    let scale: FnScale = unsafe { std::mem::transmute(raw.addr()) };
    assert_eq!(unsafe { scale(21) }, 42);

    let err = lib
        .resolve(&["dbl_scale", "dbl_scale_v3"])
        .unwrap_err();
    assert_eq!(
        err,
        Error::AliasExhausted {
            library: "dbl".to_string(),
            symbol: "dbl_scale".to_string(),
            tried: vec!["dbl_scale".to_string(), "dbl_scale_v3".to_string()],
        }
    );
}

#[test]
fn absent_library_reports_unavailable_without_crashing() {
    let lib = LazyLibrary::new("ghost", &["libno_such_vendor_lib.so.4", "libno_such_vendor_lib.so"]);
    assert!(!lib.ensure_loaded());
    assert!(!lib.ensure_loaded());

    let cell = SymbolCell::new();
    match cell.resolve(&lib, &["ghostCreate"]).unwrap_err() {
        Error::LibraryNotFound { library, candidates } => {
            assert_eq!(library, "ghost");
            assert_eq!(candidates.len(), 2);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn concurrent_first_calls_observe_one_consistent_binding() {
    if !have_cc() {
        eprintln!("skipping: cc not found on PATH");
        return;
    }
    let tmp = tempfile::tempdir().expect("tempdir");
    let lib = Arc::new(double_library(tmp.path()));
    let cell = Arc::new(SymbolCell::new());
    let barrier = Arc::new(Barrier::new(16));

    let mut handles = Vec::new();
    for _ in 0..16 {
        let lib = Arc::clone(&lib);
        let cell = Arc::clone(&cell);
        let barrier = Arc::clone(&barrier);
        handles.push(std::thread::spawn(move || {
            barrier.wait();
            let raw = cell.resolve(&lib, &["dbl_magic"]).expect("resolve");
            let magic: FnNoArg = unsafe { std::mem::transmute(raw.addr()) };
            (raw.addr() as usize, unsafe { magic() })
        }));
    }

    let results: Vec<(usize, c_int)> = handles
        .into_iter()
        .map(|h| h.join().expect("thread"))
        .collect();
    let first_addr = results[0].0;
    for (addr, value) in results {
        assert_eq!(addr, first_addr, "all threads must observe one binding");
        assert_eq!(value, 1337);
    }
}

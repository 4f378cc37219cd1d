use std::path::Path;
use std::process::Command;

use serde_json::Value;

use crate::error::GenError;

/// Run clang's front-end over the header and decode the JSON AST dump.
///
/// Conditional-compilation branches are evaluated by clang itself, so the
/// returned tree only contains declarations from the actually-taken branches.
pub fn parse_translation_unit(
    header: &Path,
    include_dirs: &[std::path::PathBuf],
) -> Result<Value, GenError> {
    let mut cmd = Command::new("clang");
    cmd.arg("-Xclang")
        .arg("-ast-dump=json")
        .arg("-fsyntax-only")
        .arg("-fno-color-diagnostics")
        .arg("-x")
        .arg("c")
        .arg("-std=c11");
    for dir in include_dirs {
        cmd.arg("-I").arg(dir);
    }
    cmd.arg(header);

    let out = cmd.output().map_err(|e| {
        GenError::parse(
            header.display().to_string(),
            0,
            format!("failed to run clang: {e}"),
        )
    })?;

    if !out.status.success() {
        let stderr = String::from_utf8_lossy(&out.stderr);
        return Err(diagnostic_from_clang_stderr(header, &stderr));
    }

    serde_json::from_slice(&out.stdout).map_err(|e| {
        GenError::parse(
            header.display().to_string(),
            0,
            format!("failed to decode clang AST JSON: {e}"),
        )
    })
}

/// Map clang's `file:line:col: error: message` diagnostics back to a typed
/// parse error. Falls back to the raw stderr when no diagnostic line parses.
fn diagnostic_from_clang_stderr(header: &Path, stderr: &str) -> GenError {
    for line in stderr.lines() {
        let Some(idx) = line.find(": error:") else {
            continue;
        };
        let (loc, rest) = line.split_at(idx);
        let message = rest.trim_start_matches(": error:").trim().to_string();

        let mut parts = loc.rsplitn(3, ':');
        let _col = parts.next();
        let lno = parts.next().and_then(|s| s.parse::<u64>().ok());
        let file = parts.next();
        if let (Some(file), Some(lno)) = (file, lno) {
            return GenError::parse(file, lno, message);
        }
    }
    GenError::parse(
        header.display().to_string(),
        0,
        format!("clang parse failed:\n{}", stderr.trim_end()),
    )
}

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "lazylink")]
#[command(about = "Generate lazy dynamic-loading stubs from C headers.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate the stub module for one library.
    Generate {
        /// Namespacing prefix for the generated scaffolding.
        #[arg(long)]
        prefix: String,
        #[arg(long)]
        manifest: PathBuf,
        #[arg(long)]
        header: PathBuf,
        /// Include search directory, in priority order (repeatable).
        #[arg(short = 'I', long = "include-dir")]
        include_dirs: Vec<PathBuf>,
        /// Output path for the generated Rust module.
        #[arg(long)]
        out: PathBuf,
        /// If set, fail if output differs; do not write.
        #[arg(long, default_value_t = false)]
        check: bool,
    },
    /// Generate several stub modules from a build manifest.
    Batch {
        #[arg(long)]
        manifest: PathBuf,
        /// If set, fail if any output differs; do not write.
        #[arg(long, default_value_t = false)]
        check: bool,
    },
}

fn main() -> Result<()> {
    try_main().map_err(|err| {
        eprintln!("{err:#}");
        err
    })
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Generate {
            prefix,
            manifest,
            header,
            include_dirs,
            out,
            check,
        } => run_generate(&prefix, &manifest, &header, &include_dirs, &out, check),
        Command::Batch { manifest, check } => run_batch(&manifest, check),
    }
}

fn run_generate(
    prefix: &str,
    manifest: &Path,
    header: &Path,
    include_dirs: &[PathBuf],
    out: &Path,
    check: bool,
) -> Result<()> {
    let src = lazylink_core::generate(prefix, manifest, header, include_dirs)?;
    write_stub(out, &src, check)?;
    println!("{}", out.display());
    Ok(())
}

const BATCH_SCHEMA_VERSION: &str = "lazylink.batch@0.1.0";

#[derive(Debug, serde::Deserialize)]
struct BatchManifest {
    schema_version: String,
    stubs: Vec<BatchEntry>,
}

#[derive(Debug, serde::Deserialize)]
struct BatchEntry {
    prefix: String,
    manifest: String,
    header: String,
    #[serde(default)]
    include_dirs: Vec<String>,
    out: String,
}

fn run_batch(manifest_path: &Path, check: bool) -> Result<()> {
    let bytes = std::fs::read(manifest_path)
        .with_context(|| format!("read batch manifest: {}", manifest_path.display()))?;
    let m: BatchManifest = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse batch manifest JSON: {}", manifest_path.display()))?;
    if m.schema_version.trim() != BATCH_SCHEMA_VERSION {
        anyhow::bail!(
            "batch manifest schema_version mismatch: expected {BATCH_SCHEMA_VERSION} got {:?}",
            m.schema_version
        );
    }

    for (idx, e) in m.stubs.iter().enumerate() {
        let include_dirs: Vec<PathBuf> = e.include_dirs.iter().map(PathBuf::from).collect();
        run_generate(
            &e.prefix,
            Path::new(&e.manifest),
            Path::new(&e.header),
            &include_dirs,
            Path::new(&e.out),
            check,
        )
        .with_context(|| format!("batch entry[{idx}] ({})", e.prefix))?;
    }
    Ok(())
}

fn write_stub(out_path: &Path, src: &str, check: bool) -> Result<()> {
    if check {
        let cur = std::fs::read_to_string(out_path)
            .with_context(|| format!("read existing output: {}", out_path.display()))?;
        if cur != src {
            anyhow::bail!("generated output differs: {}", out_path.display());
        }
        return Ok(());
    }

    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir: {}", parent.display()))?;
        }
    }
    std::fs::write(out_path, src.as_bytes())
        .with_context(|| format!("write output: {}", out_path.display()))?;
    Ok(())
}

//! Run command - execute a guest against a filesystem module.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::Args;
use serde::Deserialize;

use ferry::prelude::*;

use crate::OutputFormat;

/// Arguments for the run command.
#[derive(Args)]
pub struct RunArgs {
    /// Path to the guest module (.wasm or .wat)
    #[arg(required = true)]
    pub guest: PathBuf,

    /// Path to the filesystem module (.wasm or .wat)
    #[arg(long, required = true)]
    pub memfs: PathBuf,

    /// Program name reported as argv[0] (default: the guest file stem)
    #[arg(long)]
    pub argv0: Option<String>,

    /// Environment pair, as NAME=VALUE (repeatable, order preserved)
    #[arg(long = "env", value_name = "NAME=VALUE")]
    pub env: Vec<String>,

    /// Run configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Arguments to pass to the guest
    #[arg(last = true)]
    pub args: Vec<String>,
}

/// A run configuration file.
///
/// Environment pairs are written as `NAME=VALUE` strings so their marshal
/// order is the file order.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RunFile {
    program: Option<String>,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: Vec<String>,
}

impl RunFile {
    fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("Invalid run file {}", path.display()))
    }
}

fn parse_env_pair(pair: &str) -> Result<(String, String)> {
    match pair.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => bail!("invalid environment pair '{pair}', expected NAME=VALUE"),
    }
}

/// Build the run configuration from the file (if any) plus flags.
///
/// Flags win over the file: `--argv0` overrides its `program`, command-line
/// guest arguments and `--env` pairs are appended after the file's.
fn build_config(args: &RunArgs) -> Result<RunConfig> {
    let file = match &args.config {
        Some(path) => RunFile::load(path)?,
        None => RunFile::default(),
    };

    let program = args
        .argv0
        .clone()
        .or(file.program)
        .or_else(|| {
            args.guest
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "guest".to_string());

    let mut config = RunConfig::new(program)
        .with_args(file.args.iter().cloned())
        .with_args(args.args.iter().cloned());

    for pair in file.env.iter().chain(&args.env) {
        let (name, value) = parse_env_pair(pair)?;
        config = config.with_env(name, value);
    }

    Ok(config)
}

fn load_module(runtime: &FerryRuntime, path: &Path) -> Result<LoadedModule> {
    let module = if path.extension().is_some_and(|ext| ext == "wat") {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        runtime.load_wat(&text)
    } else {
        runtime.load_file(path)
    };
    module.with_context(|| format!("Failed to load module {}", path.display()))
}

/// Execute the run command.
pub fn execute(args: RunArgs, format: OutputFormat, quiet: bool) -> Result<ExitCode> {
    let config = build_config(&args)?;

    let runtime = Ferry::builder().build().context("Failed to create runtime")?;

    let filesystem = load_module(&runtime, &args.memfs)?;
    let guest = load_module(&runtime, &args.guest)?;

    if !quiet {
        tracing::info!(
            guest = %args.guest.display(),
            memfs = %args.memfs.display(),
            program = %config.program,
            "Running guest"
        );
    }

    let report = runtime
        .run(&filesystem, &guest, config)
        .context("Run failed")?;

    match format {
        OutputFormat::Human => {
            if !report.outcome.is_clean_exit() || !quiet {
                eprintln!("{}", report.outcome);
            }
        }
        OutputFormat::Json => {
            println!("{}", report.to_json_pretty());
        }
        OutputFormat::JsonCompact => {
            println!("{}", serde_json::to_string(&report)?);
        }
    }

    Ok(ExitCode::from(exit_code(&report.outcome)))
}

/// Map the run outcome onto the process exit code, wrapping like `exit(2)`.
fn exit_code(outcome: &RunOutcome) -> u8 {
    match outcome {
        RunOutcome::Exited { code } => code.rem_euclid(256) as u8,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_pair() {
        assert_eq!(
            parse_env_pair("USER=alice").unwrap(),
            ("USER".to_string(), "alice".to_string())
        );
        assert_eq!(
            parse_env_pair("EMPTY=").unwrap(),
            ("EMPTY".to_string(), String::new())
        );
        assert!(parse_env_pair("=oops").is_err());
        assert!(parse_env_pair("novalue").is_err());
    }

    #[test]
    fn test_run_file_env_order() {
        let file: RunFile = toml::from_str(
            r#"
            program = "clang"
            args = ["-O2"]
            env = ["USER=alice", "HOME=/home/alice"]
        "#,
        )
        .unwrap();

        assert_eq!(file.program.as_deref(), Some("clang"));
        assert_eq!(file.env, ["USER=alice", "HOME=/home/alice"]);
    }

    #[test]
    fn test_flags_append_after_file() {
        let dir = std::env::temp_dir().join("ferry-run-file-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("run.toml");
        std::fs::write(&path, "program = \"clang\"\nargs = [\"-O2\"]\n").unwrap();

        let args = RunArgs {
            guest: PathBuf::from("guest.wasm"),
            memfs: PathBuf::from("memfs.wasm"),
            argv0: None,
            env: vec!["USER=alice".to_string()],
            config: Some(path),
            args: vec!["main.c".to_string()],
        };

        let config = build_config(&args).unwrap();
        let argv: Vec<&str> = config.argv().collect();
        assert_eq!(argv, ["clang", "-O2", "main.c"]);
        assert_eq!(config.env, [("USER".to_string(), "alice".to_string())]);
    }

    #[test]
    fn test_program_defaults_to_guest_stem() {
        let args = RunArgs {
            guest: PathBuf::from("out/hello.wasm"),
            memfs: PathBuf::from("memfs.wasm"),
            argv0: None,
            env: Vec::new(),
            config: None,
            args: Vec::new(),
        };

        assert_eq!(build_config(&args).unwrap().program, "hello");
    }

    #[test]
    fn test_exit_code_wraps_like_a_process() {
        assert_eq!(exit_code(&RunOutcome::Exited { code: 42 }), 42);
        assert_eq!(exit_code(&RunOutcome::Exited { code: 256 }), 0);
        assert_eq!(exit_code(&RunOutcome::Exited { code: -1 }), 255);
        assert_eq!(
            exit_code(&RunOutcome::Aborted {
                reason: "abort".to_string()
            }),
            1
        );
    }
}

//! Inspect command - show a module's imports, exports, and memories.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use ferry::prelude::*;
use ferry_core::{ExportInfo, ExternKind, ImportInfo};
use ferry_host::{SYSCALL_NAMESPACE, fixed_syscalls};

use crate::OutputFormat;

/// Arguments for the inspect command.
#[derive(Args)]
pub struct InspectArgs {
    /// Path to the WebAssembly module (.wasm or .wat)
    #[arg(required = true)]
    pub module: PathBuf,

    /// Show only exports
    #[arg(long)]
    pub exports: bool,

    /// Show only imports
    #[arg(long)]
    pub imports: bool,

    /// Show only memory definitions
    #[arg(long)]
    pub memory: bool,

    /// Show everything (default if no filter given)
    #[arg(long)]
    pub all: bool,
}

#[derive(Debug, Serialize)]
struct InspectionResult {
    path: String,
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exports: Option<Vec<ExportDisplay>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    imports: Option<Vec<ImportDisplay>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    memories: Option<Vec<MemoryDisplay>>,
}

#[derive(Debug, Serialize)]
struct ExportDisplay {
    name: String,
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    signature: Option<String>,
}

#[derive(Debug, Serialize)]
struct ImportDisplay {
    namespace: String,
    name: String,
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    signature: Option<String>,
    /// Who satisfies this import at run time.
    provided_by: String,
}

#[derive(Debug, Serialize)]
struct MemoryDisplay {
    min_pages: u64,
    max_pages: Option<u64>,
    memory64: bool,
}

fn describe_kind(kind: &ExternKind) -> (String, Option<String>) {
    match kind {
        ExternKind::Function { params, results } => (
            "function".to_string(),
            Some(format!("({}) -> ({})", params, results)),
        ),
        ExternKind::Memory => ("memory".to_string(), None),
        ExternKind::Global => ("global".to_string(), None),
        ExternKind::Table => ("table".to_string(), None),
    }
}

/// Classify who would satisfy an import of `(namespace, name)`.
fn provided_by(namespace: &str, name: &str) -> String {
    if fixed_syscalls()
        .iter()
        .any(|(ns, n)| *ns == namespace && *n == name)
    {
        "fixed syscall table".to_string()
    } else if namespace == SYSCALL_NAMESPACE {
        "filesystem module, if exported; fails when called otherwise".to_string()
    } else {
        "nobody; fails when called".to_string()
    }
}

impl From<&ExportInfo> for ExportDisplay {
    fn from(info: &ExportInfo) -> Self {
        let (kind, signature) = describe_kind(&info.kind);
        Self {
            name: info.name.clone(),
            kind,
            signature,
        }
    }
}

impl From<&ImportInfo> for ImportDisplay {
    fn from(info: &ImportInfo) -> Self {
        let (kind, signature) = describe_kind(&info.kind);
        Self {
            namespace: info.namespace.clone(),
            name: info.name.clone(),
            kind,
            signature,
            provided_by: provided_by(&info.namespace, &info.name),
        }
    }
}

/// Execute the inspect command.
pub fn execute(args: InspectArgs, format: OutputFormat) -> Result<ExitCode> {
    let runtime = Ferry::builder().build().context("Failed to create runtime")?;

    let module = if args.module.extension().is_some_and(|ext| ext == "wat") {
        let text = std::fs::read_to_string(&args.module)
            .with_context(|| format!("Failed to read {}", args.module.display()))?;
        runtime.load_wat(&text)
    } else {
        runtime.load_file(&args.module)
    }
    .context("Failed to load module")?;

    let show_all = args.all || (!args.exports && !args.imports && !args.memory);

    let mut result = InspectionResult {
        path: args.module.display().to_string(),
        name: module.name().map(String::from),
        exports: None,
        imports: None,
        memories: None,
    };

    if show_all || args.exports {
        result.exports = Some(module.exports().iter().map(ExportDisplay::from).collect());
    }

    if show_all || args.imports {
        result.imports = Some(module.imports().iter().map(ImportDisplay::from).collect());
    }

    if show_all || args.memory {
        result.memories = Some(
            module
                .metadata()
                .memories
                .iter()
                .map(|m| MemoryDisplay {
                    min_pages: m.min_pages,
                    max_pages: m.max_pages,
                    memory64: m.memory64,
                })
                .collect(),
        );
    }

    // Output results
    match format {
        OutputFormat::Human => {
            println!("Module: {}", args.module.display());
            if let Some(name) = &result.name {
                println!("Name: {}", name);
            }
            println!();

            if let Some(exports) = &result.exports {
                println!("Exports ({}):", exports.len());
                for export in exports {
                    if let Some(sig) = &export.signature {
                        println!("  {} [{}]: {}", export.name, export.kind, sig);
                    } else {
                        println!("  {} [{}]", export.name, export.kind);
                    }
                }
                println!();
            }

            if let Some(imports) = &result.imports {
                println!("Imports ({}):", imports.len());
                for import in imports {
                    if let Some(sig) = &import.signature {
                        println!(
                            "  {}::{} [{}]: {} - {}",
                            import.namespace, import.name, import.kind, sig, import.provided_by
                        );
                    } else {
                        println!(
                            "  {}::{} [{}] - {}",
                            import.namespace, import.name, import.kind, import.provided_by
                        );
                    }
                }
                println!();
            }

            if let Some(memories) = &result.memories {
                println!("Memories ({}):", memories.len());
                for (i, memory) in memories.iter().enumerate() {
                    let max = memory
                        .max_pages
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "unbounded".to_string());
                    let bits = if memory.memory64 { "64-bit" } else { "32-bit" };
                    println!("  [{}] {} - {} pages ({})", i, memory.min_pages, max, bits);
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::JsonCompact => {
            println!("{}", serde_json::to_string(&result)?);
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provided_by_classification() {
        assert_eq!(provided_by("wasi_unstable", "proc_exit"), "fixed syscall table");
        assert_eq!(provided_by("env", "copy_out"), "fixed syscall table");
        assert!(provided_by("wasi_unstable", "path_open").starts_with("filesystem module"));
        assert!(provided_by("foo", "bar").starts_with("nobody"));
    }
}

//! Configuration types for the Ferry runtime.
//!
//! This module provides configuration structures for the engine and for one
//! bridged run: the program name, argument list, and environment the guest
//! observes through the syscall surface.

/// Configuration for the Ferry engine.
///
/// This controls how the underlying Wasmtime engine is configured.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum WASM stack size in bytes.
    ///
    /// Defaults to 1MB.
    pub max_wasm_stack: usize,

    /// Enable debug information in compiled code.
    ///
    /// This increases compilation time and memory usage but provides
    /// better error messages and backtraces.
    pub debug_info: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_wasm_stack: 1024 * 1024, // 1MB
            debug_info: false,
        }
    }
}

impl EngineConfig {
    /// Create a new engine configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum WASM stack size.
    pub fn with_max_wasm_stack(mut self, bytes: usize) -> Self {
        self.max_wasm_stack = bytes;
        self
    }

    /// Enable debug information.
    pub fn with_debug_info(mut self, enabled: bool) -> Self {
        self.debug_info = enabled;
        self
    }
}

/// Configuration for one bridged run.
///
/// The guest retrieves all of this through the argument and environment
/// syscalls; nothing here is ambient process state. Environment pairs are
/// marshaled in insertion order.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// The program name reported as `argv[0]`.
    pub program: String,

    /// Arguments following the program name.
    pub args: Vec<String>,

    /// Environment pairs, marshaled as `name=value` in insertion order.
    pub env: Vec<(String, String)>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            program: "guest".to_string(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }
}

impl RunConfig {
    /// Create a run configuration with the given program name.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    /// Append one guest argument.
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several guest arguments.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append one environment pair.
    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((name.into(), value.into()));
        self
    }

    /// The full argument vector, program name first.
    pub fn argv(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.program.as_str()).chain(self.args.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_wasm_stack, 1024 * 1024);
        assert!(!config.debug_info);
    }

    #[test]
    fn test_engine_config_builder() {
        let config = EngineConfig::new()
            .with_max_wasm_stack(2 * 1024 * 1024)
            .with_debug_info(true);

        assert_eq!(config.max_wasm_stack, 2 * 1024 * 1024);
        assert!(config.debug_info);
    }

    #[test]
    fn test_run_config_argv() {
        let config = RunConfig::new("clang")
            .with_arg("-O2")
            .with_args(["main.c", "-o", "main"]);

        let argv: Vec<&str> = config.argv().collect();
        assert_eq!(argv, ["clang", "-O2", "main.c", "-o", "main"]);
    }

    #[test]
    fn test_run_config_env_preserves_order() {
        let config = RunConfig::default()
            .with_env("USER", "alice")
            .with_env("HOME", "/home/alice");

        assert_eq!(config.env[0], ("USER".into(), "alice".into()));
        assert_eq!(config.env[1], ("HOME".into(), "/home/alice".into()));
    }
}

//! The unimplemented-import guard.
//!
//! A module may declare imports the host never anticipated, in any
//! namespace. Failing at link time would reject modules whose unsupported
//! paths are never taken, so the guard walks the declared imports before
//! instantiation and binds a stand-in for every function the table cannot
//! resolve. The stand-in raises `UnimplementedCall` on every invocation,
//! deferring the failure from load time to call time.

use tracing::warn;
use wasmtime::{ExternType, Func, Module, Store};

use crate::error::{HostError, HostResult};
use crate::signal::TerminationSignal;
use crate::state::BridgeState;
use crate::table::CapabilityTable;

/// Records which of a module's imports were stubbed at load.
#[derive(Debug, Default)]
pub struct ImportGuard {
    stubbed: Vec<(String, String)>,
}

impl ImportGuard {
    /// Resolve `module`'s declared imports against `table`, stubbing every
    /// function import the table does not define.
    ///
    /// Stand-ins are defined with the import's exact declared type, so the
    /// module links cleanly and fails only when the import is actually
    /// called. A missing non-function import (memory, global, table) cannot
    /// be stubbed and is a load error.
    pub fn bind(
        table: &mut CapabilityTable,
        store: &mut Store<BridgeState>,
        module: &Module,
    ) -> HostResult<Self> {
        let mut stubbed = Vec::new();

        for import in module.imports() {
            let namespace = import.module().to_string();
            let name = import.name().to_string();

            if table
                .linker()
                .get(&mut *store, &namespace, &name)
                .is_some()
            {
                continue;
            }

            match import.ty() {
                ExternType::Func(func_ty) => {
                    let (ns, n) = (namespace.clone(), name.clone());
                    let stand_in =
                        Func::new(&mut *store, func_ty, move |_caller, _params, _results| {
                            Err(TerminationSignal::unimplemented(ns.clone(), n.clone()).into())
                        });
                    table.define_raw(store, &namespace, &name, stand_in)?;

                    warn!(
                        namespace = %namespace,
                        name = %name,
                        "import has no host definition; will trap when called"
                    );
                    stubbed.push((namespace, name));
                }
                _ => {
                    return Err(HostError::UnresolvableImport { namespace, name });
                }
            }
        }

        Ok(Self { stubbed })
    }

    /// The `(namespace, name)` pairs that were stubbed.
    pub fn stubbed(&self) -> &[(String, String)] {
        &self.stubbed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use ferry_core::RunConfig;
    use wasmtime::Engine;

    use crate::writer::CaptureSink;

    fn setup(wat_src: &str) -> (Store<BridgeState>, CapabilityTable, Module) {
        let engine = Engine::default();
        let store = Store::new(
            &engine,
            BridgeState::new(RunConfig::default(), Arc::new(CaptureSink::new())),
        );
        let table = CapabilityTable::with_fixed_syscalls(&engine).unwrap();
        let wasm = wat::parse_str(wat_src).unwrap();
        let module = Module::new(&engine, &wasm).unwrap();
        (store, table, module)
    }

    #[test]
    fn test_defined_imports_are_not_stubbed() {
        let (mut store, mut table, module) = setup(
            r#"
            (module
                (import "wasi_unstable" "proc_exit" (func (param i32)))
                (import "env" "abort" (func))
            )
        "#,
        );

        let guard = ImportGuard::bind(&mut table, &mut store, &module).unwrap();
        assert!(guard.stubbed().is_empty());
    }

    #[test]
    fn test_unknown_namespace_resolves_per_capability() {
        let (mut store, mut table, module) = setup(
            r#"
            (module
                (import "foo" "bar" (func $bar (result i32)))
                (func (export "call_bar") (result i32) call $bar)
            )
        "#,
        );

        let guard = ImportGuard::bind(&mut table, &mut store, &module).unwrap();
        assert_eq!(guard.stubbed(), [("foo".to_string(), "bar".to_string())]);

        // The module links; the stubbed import raises on every call.
        let instance = table.linker().instantiate(&mut store, &module).unwrap();
        let call_bar = instance
            .get_typed_func::<(), i32>(&mut store, "call_bar")
            .unwrap();

        for _ in 0..2 {
            let err = call_bar.call(&mut store, ()).unwrap_err();
            let signal = err.downcast::<TerminationSignal>().unwrap();
            assert_eq!(signal, TerminationSignal::unimplemented("foo", "bar"));
        }
    }

    #[test]
    fn test_missing_memory_import_is_a_load_error() {
        let (mut store, mut table, module) = setup(
            r#"
            (module
                (import "host" "memory" (memory 1))
            )
        "#,
        );

        let err = ImportGuard::bind(&mut table, &mut store, &module).unwrap_err();
        assert!(matches!(err, HostError::UnresolvableImport { .. }));
    }
}

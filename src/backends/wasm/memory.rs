// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! `LinearMemory` over a wasmtime instance of the translator module.

use crate::backends::wasm::detector::ensure_core_module;
use crate::backends::wasm::engine::create_engine;
use crate::backends::wasm::error::WasmError;
use crate::backends::wasm::loader::load_wasm_bytes;
use crate::errors::{ChannelError, ProtocolError, TranslatorError, TranslatorResult};
use crate::observability::messages::wasm::{InstanceCreated, OptionalExportMissing};
use crate::traits::{GuestPtr, LinearMemory};
use std::path::Path;
use wasmtime::{Instance, Linker, Memory, Module, Store, TypedFunc};
use wasmtime_wasi::p1::{self, WasiP1Ctx};
use wasmtime_wasi::WasiCtxBuilder;

/// Per-instance settings taken from configuration.
#[derive(Debug, Clone, Copy)]
pub struct InstanceOptions {
    /// Fuel granted before every entry-point call.
    pub fuel: u64,
    /// Let the module write diagnostics to the host's stderr.
    pub inherit_stderr: bool,
}

/// A live translator instance with its exports resolved.
///
/// The WASI context has no preopened directories, arguments or environment. Only
/// stderr may be inherited.
pub struct WasmtimeMemory {
    store: Store<WasiP1Ctx>,
    #[cfg_attr(not(test), allow(dead_code))]
    instance: Instance,
    memory: Memory,
    malloc: TypedFunc<i32, i32>,
    free: TypedFunc<i32, ()>,
    initialize: TypedFunc<(), i32>,
    invoke: TypedFunc<i32, i32>,
    finalize: Option<TypedFunc<(), ()>>,
    fuel: u64,
}

impl WasmtimeMemory {
    pub fn load<P: AsRef<Path>>(path: P, options: InstanceOptions) -> TranslatorResult<Self> {
        let bytes = load_wasm_bytes(path)?;
        Self::from_bytes(&bytes, options)
    }

    pub fn from_bytes(bytes: &[u8], options: InstanceOptions) -> TranslatorResult<Self> {
        ensure_core_module(bytes)?;

        let engine = create_engine()?;
        let module = Module::new(&engine, bytes).map_err(module_error)?;

        let mut wasi = WasiCtxBuilder::new();
        if options.inherit_stderr {
            wasi.inherit_stderr();
        }
        let mut store = Store::new(&engine, wasi.build_p1());

        let mut linker: Linker<WasiP1Ctx> = Linker::new(&engine);
        p1::add_to_linker_sync(&mut linker, |cx| cx).map_err(module_error)?;

        // Instantiation may run a start function, which also burns fuel.
        store
            .set_fuel(options.fuel)
            .map_err(|e| WasmError::EngineError(e.to_string()))?;
        let instance = linker
            .instantiate(&mut store, &module)
            .map_err(module_error)?;

        let memory = instance
            .get_memory(&mut store, "memory")
            .ok_or(ChannelError::MissingExport {
                name: "memory",
                reason: "module does not export a linear memory".to_string(),
            })?;

        let malloc = required_export(&instance, &mut store, "malloc")?;
        let free = required_export(&instance, &mut store, "free")?;
        let initialize = required_export(&instance, &mut store, "initialize")?;
        let invoke = required_export(&instance, &mut store, "invoke")?;
        let finalize = match instance.get_func(&mut store, "finalize") {
            Some(func) => Some(func.typed::<(), ()>(&store).map_err(|e| {
                ChannelError::MissingExport {
                    name: "finalize",
                    reason: e.to_string(),
                }
            })?),
            None => {
                tracing::debug!("{}", OptionalExportMissing { name: "finalize" });
                None
            }
        };

        // WASI reactors expect `_initialize` to run once before any other export.
        if let Ok(reactor_init) = instance.get_typed_func::<(), ()>(&mut store, "_initialize") {
            reactor_init
                .call(&mut store, ())
                .map_err(|e| trap("_initialize", e))?;
        }

        tracing::info!(
            "{}",
            InstanceCreated {
                memory_bytes: memory.data_size(&store),
                fuel_level: options.fuel,
                has_finalize: finalize.is_some(),
            }
        );

        Ok(Self {
            store,
            instance,
            memory,
            malloc,
            free,
            initialize,
            invoke,
            finalize,
            fuel: options.fuel,
        })
    }

    fn refuel(&mut self) -> TranslatorResult<()> {
        self.store
            .set_fuel(self.fuel)
            .map_err(|e| WasmError::EngineError(e.to_string()).into())
    }

    /// Calls an arbitrary `() -> i32` export, for inspecting test modules.
    #[cfg(test)]
    pub(crate) fn call_i32_export(&mut self, name: &'static str) -> TranslatorResult<i32> {
        self.refuel()?;
        let func: TypedFunc<(), i32> = required_export(&self.instance, &mut self.store, name)?;
        func.call(&mut self.store, ()).map_err(|e| trap(name, e))
    }
}

impl LinearMemory for WasmtimeMemory {
    fn allocate(&mut self, size: u32) -> TranslatorResult<GuestPtr> {
        self.refuel()?;
        let ptr = self
            .malloc
            .call(&mut self.store, size as i32)
            .map_err(|e| trap("malloc", e))?;
        Ok(GuestPtr(ptr as u32))
    }

    fn write(&mut self, ptr: GuestPtr, bytes: &[u8]) -> TranslatorResult<()> {
        let memory_size = self.memory.data_size(&self.store);
        self.memory
            .write(&mut self.store, ptr.offset(), bytes)
            .map_err(|_| {
                ProtocolError::OutOfBounds {
                    ptr: ptr.0,
                    memory_size,
                }
                .into()
            })
    }

    fn read(&mut self, ptr: GuestPtr, max: usize) -> TranslatorResult<Vec<u8>> {
        let data = self.memory.data(&self.store);
        let start = ptr.offset().min(data.len());
        let end = start.saturating_add(max).min(data.len());
        Ok(data[start..end].to_vec())
    }

    fn free(&mut self, ptr: GuestPtr) -> TranslatorResult<()> {
        self.refuel()?;
        self.free
            .call(&mut self.store, ptr.0 as i32)
            .map_err(|e| trap("free", e))
    }

    fn size(&mut self) -> usize {
        self.memory.data_size(&self.store)
    }

    fn initialize(&mut self) -> TranslatorResult<bool> {
        self.refuel()?;
        let status = self
            .initialize
            .call(&mut self.store, ())
            .map_err(|e| trap("initialize", e))?;
        Ok(status != 0)
    }

    fn invoke(&mut self, request: GuestPtr) -> TranslatorResult<GuestPtr> {
        self.refuel()?;
        let response = self
            .invoke
            .call(&mut self.store, request.0 as i32)
            .map_err(|e| trap("invoke", e))?;
        Ok(GuestPtr(response as u32))
    }

    fn finalize(&mut self) -> TranslatorResult<()> {
        let Some(finalize) = self.finalize.clone() else {
            return Ok(());
        };
        self.refuel()?;
        finalize
            .call(&mut self.store, ())
            .map_err(|e| trap("finalize", e))
    }
}

fn required_export<Params, Results>(
    instance: &Instance,
    store: &mut Store<WasiP1Ctx>,
    name: &'static str,
) -> TranslatorResult<TypedFunc<Params, Results>>
where
    Params: wasmtime::WasmParams,
    Results: wasmtime::WasmResults,
{
    instance
        .get_typed_func::<Params, Results>(&mut *store, name)
        .map_err(|e| {
            ChannelError::MissingExport {
                name,
                reason: e.to_string(),
            }
            .into()
        })
}

fn module_error(err: wasmtime::Error) -> WasmError {
    WasmError::ModuleError(format!("{:#}", err))
}

fn trap(entry_point: &'static str, err: wasmtime::Error) -> TranslatorError {
    ChannelError::Trap {
        entry_point,
        message: format!("{:#}", err),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::in_process::{InProcessChannel, ResponseOwnership};
    use crate::backends::wasm::fixtures::{translator_module, InvokeBody, FIXTURE_FUEL};
    use crate::traits::Transport;

    const OPTIONS: InstanceOptions = InstanceOptions {
        fuel: FIXTURE_FUEL,
        inherit_stderr: false,
    };

    const CANNED: &str = r#"{"jsonrpc":"2.0","id":1,"result":{"info_log":"","object_code":"void main() {}\n"}}"#;

    #[test]
    fn test_exports_are_resolved() {
        let bytes = translator_module(InvokeBody::Respond(CANNED.to_string()), 1);
        let mut memory = WasmtimeMemory::from_bytes(&bytes, OPTIONS).unwrap();

        assert!(memory.initialize().unwrap());
        assert_eq!(memory.size(), 2 * 65536);
    }

    #[test]
    fn test_missing_required_export() {
        let bytes = wat::parse_str(
            r#"(module
                (memory (export "memory") 1)
                (func (export "malloc") (param i32) (result i32) (i32.const 0))
                (func (export "free") (param i32))
                (func (export "initialize") (result i32) (i32.const 1)))"#,
        )
        .unwrap();

        match WasmtimeMemory::from_bytes(&bytes, OPTIONS) {
            Err(TranslatorError::Channel(ChannelError::MissingExport { name, .. })) => {
                assert_eq!(name, "invoke")
            }
            Err(other) => panic!("expected MissingExport, got {:?}", other),
            Ok(_) => panic!("expected MissingExport, got a live instance"),
        }
    }

    #[test]
    fn test_component_binary_is_rejected() {
        let component = wat::parse_str("(component)").unwrap();
        assert!(matches!(
            WasmtimeMemory::from_bytes(&component, OPTIONS),
            Err(TranslatorError::Channel(ChannelError::Module(
                WasmError::UnsupportedEncoding(_)
            )))
        ));
    }

    #[test]
    fn test_round_trip_through_linear_memory() {
        let bytes = translator_module(InvokeBody::Respond(CANNED.to_string()), 1);
        let memory = WasmtimeMemory::from_bytes(&bytes, OPTIONS).unwrap();
        let mut channel = InProcessChannel::new(memory, ResponseOwnership::Host);
        channel.start().unwrap();

        let response = channel.round_trip(1, r#"{"jsonrpc":"2.0","id":1}"#).unwrap();
        assert_eq!(response, CANNED);

        drop(channel);
    }

    #[test]
    fn test_every_allocation_is_freed() {
        let bytes = translator_module(InvokeBody::Respond(CANNED.to_string()), 1);
        let mut memory = WasmtimeMemory::from_bytes(&bytes, OPTIONS).unwrap();
        assert!(memory.initialize().unwrap());

        let response = crate::backends::in_process::with_guest_string(
            &mut memory,
            b"{\"id\":1}",
            |memory, request| memory.invoke(request),
        )
        .unwrap();
        assert_eq!(memory.call_i32_export("live_allocations").unwrap(), 1);

        let text = crate::backends::in_process::read_c_string(&mut memory, response).unwrap();
        assert_eq!(text, CANNED);
        memory.free(response).unwrap();
        assert_eq!(memory.call_i32_export("live_allocations").unwrap(), 0);
    }

    #[test]
    fn test_trap_is_reported_with_entry_point() {
        let bytes = translator_module(InvokeBody::Trap, 1);
        let mut memory = WasmtimeMemory::from_bytes(&bytes, OPTIONS).unwrap();

        let err = memory.invoke(GuestPtr(8192)).unwrap_err();
        assert!(matches!(
            err,
            TranslatorError::Channel(ChannelError::Trap { entry_point: "invoke", .. })
        ));
    }

    #[test]
    fn test_fuel_exhaustion_traps_instead_of_hanging() {
        let bytes = translator_module(InvokeBody::Spin, 1);
        let mut memory = WasmtimeMemory::from_bytes(&bytes, OPTIONS).unwrap();

        let err = memory.invoke(GuestPtr(8192)).unwrap_err();
        assert!(matches!(
            err,
            TranslatorError::Channel(ChannelError::Trap { entry_point: "invoke", .. })
        ));
    }

    #[test]
    fn test_finalize_is_called() {
        let bytes = translator_module(InvokeBody::Null, 1);
        let mut memory = WasmtimeMemory::from_bytes(&bytes, OPTIONS).unwrap();

        memory.finalize().unwrap();
        assert_eq!(memory.call_i32_export("finalize_calls").unwrap(), 1);
    }

    #[test]
    fn test_initialize_false() {
        let bytes = translator_module(InvokeBody::Null, 0);
        let mut memory = WasmtimeMemory::from_bytes(&bytes, OPTIONS).unwrap();
        assert!(!memory.initialize().unwrap());
    }
}

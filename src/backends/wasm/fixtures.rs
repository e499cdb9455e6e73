// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Hand-written translator modules for exercising the real wasmtime path.

/// Default fuel for fixture instances.
pub const FIXTURE_FUEL: u64 = 10_000_000;

/// How the fixture's `invoke` behaves.
pub enum InvokeBody {
    /// Copy this JSON into a fresh `malloc` block and return it.
    Respond(String),
    /// Return the null address.
    Null,
    /// Execute `unreachable`.
    Trap,
    /// Spin until fuel runs out.
    Spin,
}

/// Builds a core module with a bump allocator and a live-allocation counter.
///
/// Exports `memory`, `malloc`, `free`, `initialize`, `invoke`, `finalize`,
/// `live_allocations` and `finalize_calls`. It also imports WASI `fd_write` so
/// instantiation goes through the preview 1 linker.
pub fn translator_module(body: InvokeBody, initialize_result: i32) -> Vec<u8> {
    let (data, invoke) = match body {
        InvokeBody::Respond(json) => {
            let len = json.len() + 1;
            (
                format!(r#"(data (i32.const 1024) "{}\00")"#, escape(&json)),
                format!(
                    r#"(local $out i32)
                    (local.set $out (call $malloc (i32.const {len})))
                    (memory.copy (local.get $out) (i32.const 1024) (i32.const {len}))
                    (local.get $out)"#
                ),
            )
        }
        InvokeBody::Null => (String::new(), "(i32.const 0)".to_string()),
        InvokeBody::Trap => (String::new(), "unreachable".to_string()),
        InvokeBody::Spin => (String::new(), "(loop $forever (br $forever)) (i32.const 0)".to_string()),
    };

    let wat = format!(
        r#"(module
            (import "wasi_snapshot_preview1" "fd_write"
                (func $fd_write (param i32 i32 i32 i32) (result i32)))
            (memory (export "memory") 2)
            (global $heap (mut i32) (i32.const 8192))
            (global $live (mut i32) (i32.const 0))
            (global $finalized (mut i32) (i32.const 0))
            {data}
            (func $malloc (export "malloc") (param $size i32) (result i32)
                (local $ptr i32)
                (local.set $ptr (global.get $heap))
                (global.set $heap
                    (i32.and
                        (i32.add (i32.add (global.get $heap) (local.get $size)) (i32.const 7))
                        (i32.const -8)))
                (global.set $live (i32.add (global.get $live) (i32.const 1)))
                (local.get $ptr))
            (func (export "free") (param $ptr i32)
                (global.set $live (i32.sub (global.get $live) (i32.const 1))))
            (func (export "initialize") (result i32)
                (i32.const {initialize_result}))
            (func (export "invoke") (param $request i32) (result i32)
                {invoke})
            (func (export "finalize")
                (global.set $finalized (i32.add (global.get $finalized) (i32.const 1))))
            (func (export "live_allocations") (result i32)
                (global.get $live))
            (func (export "finalize_calls") (result i32)
                (global.get $finalized)))"#
    );

    wat::parse_str(wat).expect("fixture module must assemble")
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

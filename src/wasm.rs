//! WebAssembly bindings for the interpreter.
//!
//! This module provides JavaScript-friendly wrappers around [`Machine`].

use wasm_bindgen::prelude::*;
use crate::{load, Machine, Program, Register};
use serde::Serialize;

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// WebAssembly-friendly machine wrapper.
#[wasm_bindgen]
pub struct WasmMachine {
    machine: Machine,
}

#[derive(Serialize)]
struct Snapshot<'a> {
    a: i32,
    b: i32,
    c: i32,
    d: i32,
    comparator: crate::Comparator,
    pc: usize,
    steps: u64,
    state: crate::MachineState,
    call_depth: usize,
    output: &'a [i32],
}

#[wasm_bindgen]
impl WasmMachine {
    /// Create a machine with an empty program.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            machine: Machine::new(Program::default()),
        }
    }

    /// Load a program from source. Returns the instruction count.
    #[wasm_bindgen]
    pub fn load(&mut self, source: &str) -> Result<usize, JsError> {
        let program = load(source)
            .map_err(|e| JsError::new(&e.to_string()))?;

        let len = program.len();
        self.machine = Machine::new(program);
        Ok(len)
    }

    /// Step one instruction. Returns the trace line for it.
    #[wasm_bindgen]
    pub fn step(&mut self) -> Result<String, JsError> {
        let step = self.machine.step()
            .map_err(|e| JsError::new(&e.to_string()))?;
        Ok(step.to_string())
    }

    /// Run until the program stops or `max_steps` instructions have run.
    #[wasm_bindgen]
    pub fn run(&mut self, max_steps: u32) -> Result<u64, JsError> {
        self.machine.run_limited(max_steps as u64)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    /// Reset execution state, keeping the program.
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.machine.reset();
    }

    #[wasm_bindgen]
    pub fn is_running(&self) -> bool {
        self.machine.is_running()
    }

    #[wasm_bindgen]
    pub fn steps(&self) -> u64 {
        self.machine.steps
    }

    #[wasm_bindgen]
    pub fn pc(&self) -> usize {
        self.machine.pc()
    }

    /// Get a register by name (`"a"` to `"d"`).
    #[wasm_bindgen]
    pub fn register(&self, name: &str) -> Result<i32, JsError> {
        let reg = Register::parse(name)
            .ok_or_else(|| JsError::new(&format!("unknown register {}", name)))?;
        Ok(self.machine.register(reg))
    }

    /// Get the comparator as a string.
    #[wasm_bindgen]
    pub fn comparator(&self) -> String {
        self.machine.comparator.to_string()
    }

    /// Get state as string.
    #[wasm_bindgen]
    pub fn state(&self) -> String {
        format!("{:?}", self.machine.state)
    }

    /// Values printed so far.
    #[wasm_bindgen]
    pub fn output(&self) -> js_sys::Int32Array {
        js_sys::Int32Array::from(self.machine.output())
    }

    /// Program listing.
    #[wasm_bindgen]
    pub fn listing(&self) -> String {
        self.machine.program().listing()
    }

    /// Get the whole machine state as a JSON string.
    #[wasm_bindgen]
    pub fn state_json(&self) -> Result<String, JsError> {
        let m = &self.machine;
        let snapshot = Snapshot {
            a: m.register(Register::A),
            b: m.register(Register::B),
            c: m.register(Register::C),
            d: m.register(Register::D),
            comparator: m.comparator,
            pc: m.pc(),
            steps: m.steps,
            state: m.state,
            call_depth: m.stack.len(),
            output: m.output(),
        };
        serde_json::to_string(&snapshot).map_err(|e| JsError::new(&e.to_string()))
    }
}

impl Default for WasmMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Run source for at most `max_steps` instructions and return the final
/// report as JSON. A program still going at the cap reports `"running"`.
#[wasm_bindgen]
pub fn wasm_execute(source: &str, max_steps: u32) -> Result<String, JsError> {
    let config = crate::RunConfig {
        max_steps: Some(max_steps as u64),
        ..crate::RunConfig::default()
    };
    let report = crate::execute(source, &config)
        .map_err(|e| JsError::new(&e.to_string()))?;
    serde_json::to_string(&report).map_err(|e| JsError::new(&e.to_string()))
}

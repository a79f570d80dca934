//! Shared test utilities for integration tests
//!
//! Provides an isolated environment with capturing streams, and serializes
//! tests that touch process-wide state (environment variables and the process
//! stdio environment).

use std::sync::{Mutex, MutexGuard};
use stdio_context::{Capture, Environment, InputStream, OutputStream, Slot, SlotValue};

/// Global mutex serializing access to process-wide state across tests.
static PROCESS_STATE_MUTEX: Mutex<()> = Mutex::new(());

pub fn lock_process_state() -> MutexGuard<'static, ()> {
    PROCESS_STATE_MUTEX.lock().unwrap_or_else(|e| e.into_inner())
}

/// An environment whose original streams are all observable.
pub struct Fixture {
    pub env: Environment,
    pub input: InputStream,
    pub out: Capture,
    pub err: Capture,
}

impl Fixture {
    pub fn new() -> Self {
        let input = InputStream::from_bytes("original input");
        let out = Capture::new();
        let err = Capture::new();
        let env = Environment::with_streams(input.clone(), out.stream(), err.stream());
        Self { env, input, out, err }
    }

    pub fn write_out(&self, text: &str) {
        self.env.output().unwrap().write_str(text).unwrap();
    }

    pub fn write_err(&self, text: &str) {
        self.env.error().unwrap().write_str(text).unwrap();
    }

    /// Assert every slot holds exactly what it held when the fixture was built.
    pub fn assert_pristine(&self, console: &SlotValue) {
        assert!(InputStream::ptr_eq(&self.env.input().unwrap(), &self.input));
        assert!(OutputStream::ptr_eq(&self.env.output().unwrap(), &self.out.stream()));
        assert!(OutputStream::ptr_eq(&self.env.error().unwrap(), &self.err.stream()));
        assert!(self.env.get(Slot::LogFacade).unwrap().same(console));
        assert_eq!(self.env.depth(), 0);
    }

    pub fn console_value(&self) -> SlotValue {
        self.env.get(Slot::LogFacade).unwrap()
    }
}

/// Set environment variables for the duration of `f`, restoring them afterwards.
pub fn with_env_vars<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = lock_process_state();
    let saved: Vec<(String, Option<String>)> = vars
        .iter()
        .map(|(key, _)| (key.to_string(), std::env::var(key).ok()))
        .collect();
    for (key, value) in vars {
        std::env::set_var(key, value);
    }

    let result = f();

    for (key, value) in saved {
        match value {
            Some(value) => std::env::set_var(&key, value),
            None => std::env::remove_var(&key),
        }
    }
    result
}

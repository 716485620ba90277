//! Testing utilities for the weave workspace
//!
//! Shared fixtures: a call [`Recorder`], the `greet` operation in its
//! typed and named-slot forms, and tracing setup.

#![allow(missing_docs)]

use parking_lot::Mutex;
use std::sync::{Arc, Once};
use weave_core::{Interceptable, Target, WeaveConfig, WeavingRegistry};

/// Ordered log of labels written by advice under test
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, label: impl Into<String>) {
        self.entries.lock().push(label.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Return the entries and start a fresh log
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.entries.lock())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

pub fn greet(name: &String) -> String {
    format!("Hi {name}")
}

/// Registry with its own id counter and dispatch tracing on
pub fn test_registry() -> Arc<WeavingRegistry> {
    Arc::new(WeavingRegistry::new(
        WeaveConfig::new().with_trace_dispatch(true),
    ))
}

pub fn greet_interceptable() -> Interceptable<String, String> {
    Interceptable::with_registry(test_registry(), greet)
}

/// Target with a `greet` slot
pub fn greet_target() -> Target {
    let target = Target::with_registry(test_registry());
    target.define("greet", greet);
    target
}

/// `greet` that records each call with the name it received
pub fn recorded_greet(recorder: &Recorder) -> Interceptable<String, String> {
    let recorder = recorder.clone();
    Interceptable::with_registry(test_registry(), move |name: &String| {
        recorder.record(format!("greet:{name}"));
        greet(name)
    })
}

/// Install a test subscriber filtered by `RUST_LOG`; safe to call repeatedly
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

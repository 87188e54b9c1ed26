//! Host functions seeded into the global table.

use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::runtime::callable::NativeFn;
use crate::runtime::environment::Frame;
use crate::runtime::value::Value;

pub fn install(globals: &mut Frame) {
    for native in [NativeFn::new("clock", 0, clock)] {
        tracing::trace!(name = native.name, "defining native");
        globals.define(native.name, Some(Value::Native(Rc::new(native))));
    }
}

/// Seconds since the Unix epoch.
fn clock(_args: &[Value]) -> Result<Value, String> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| Value::Number(d.as_secs_f64()))
        .map_err(|e| format!("clock error: {e}"))
}

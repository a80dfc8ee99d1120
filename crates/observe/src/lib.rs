//! Shared observability setup for the binaries in this workspace:
//! tracing initialization and a panic hook that routes panics through the
//! log output.
pub mod panic_hook;
pub mod tracing;

/// Audit logging for session lifecycle events.
pub mod audit;
/// Configuration management for the kernel.
pub mod config;
/// HTTP server and control plane.
pub mod server;
/// Telemetry setup for logging and tracing.
pub mod telemetry;

/// Audit logging for branch and commit events.
pub mod audit;
/// Configuration management for the hook.
pub mod config;
/// Telemetry setup for logging and tracing.
pub mod telemetry;

/// Scanning core - domain models and domain services
///
/// Pure business logic for the caching subsystem: snapshot deltas, the
/// CPE translation cache, and the call-quota governor. Nothing in here
/// performs network I/O; durable state is plain JSON files.
pub mod domain;
pub mod services;

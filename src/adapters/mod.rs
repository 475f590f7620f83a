/// Adapters layer - Infrastructure implementations
///
/// Concrete implementations of the outbound ports: network clients for
/// the two external services, filesystem persistence, the bundled
/// collector, and console output.
pub mod outbound;

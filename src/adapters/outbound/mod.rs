/// Outbound adapters - Infrastructure implementations of outbound ports
pub mod collector;
pub mod console;
pub mod filesystem;
pub mod network;

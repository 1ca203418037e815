/// Adapters - concrete implementations of the port traits
///
/// These modules implement the port traits for specific databases and services.
pub mod services;
pub mod storage;

//! Release lookups against an Octopus Deploy server.

mod cache;
mod client;
mod releases;

pub use client::OctopusClient;
pub use releases::ReleaseCatalog;

//! mcegen - MCE cluster configuration generator
//!
//! Derives multi-cluster-engine nodepool documents from a small typed input
//! and serves them over a CLI and an HTTP API, with optional GitOps publishing.

pub mod cli;
pub mod config;
pub mod engine;
pub mod flavors;
pub mod gitops;
pub mod server;
pub mod service;

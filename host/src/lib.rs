//! Proof of Art service
//!
//! Generates artwork for a prompt, fingerprints it with `poa-core`, pins the
//! artwork and its metadata, registers the fingerprint and answers
//! verification queries. Every external collaborator sits behind a trait and
//! is constructed from [`config::PoaConfig`] and passed in.

pub mod api;
pub mod config;
pub mod error;
pub mod generator;
pub mod registry;
pub mod resolver;
pub mod server;
pub mod service;
pub mod storage;
pub mod telemetry;

pub use config::PoaConfig;
pub use error::{PoaError, Result};
pub use resolver::{Resolver, VerifiedProof, VerifyQuery};
pub use service::{GenerationOutcome, GenerationRequest, ProofService};

//! cellplane-claims — declarative Claim documents and the sticky store.
//!
//! The control plane's only output is a Claim: a versioned document an
//! external orchestrator reconciles into cloud resources. This crate
//! builds Claims (with the canonical placement-reason annotation),
//! defines the store adapter the handlers talk to, and ships two
//! implementations: an in-memory server-side-apply store and a
//! return-only standalone store for running without an orchestrator.

pub mod builder;
pub mod claim;
pub mod client;
pub mod store;

pub use builder::build_claim;
pub use claim::{canonical_json, Claim, ClaimMetadata, ClaimSpec, PLACEMENT_REASON_ANNOTATION};
pub use client::StoreClient;
pub use store::{ApplyOutcome, ClaimStore, MemoryClaimStore, StandaloneStore, StoreError};

#![cfg_attr(not(feature = "std"), no_std)]

//! Proof-fingerprint derivation for generated artwork.
//!
//! Everything in this crate is pure: no I/O, no clocks, no randomness that is
//! not seeded by the caller. The host crate wires these functions to the
//! generator, content storage and on-chain registry.

extern crate alloc;

pub mod art;
pub mod fingerprint;
pub mod hash;
pub mod proof;

pub use art::{derive_parameters, render_artwork, render_half, Canvas, Palette, Pixel};
pub use fingerprint::{combined_fingerprint, combined_fingerprint_framed, FingerprintScheme};
pub use hash::{digest_bytes, digest_string, sha256, DIGEST_HEX_LEN};
pub use proof::{assemble_proof, assemble_proof_with, ProofRecord};

//! The permutation argument engine of a PLONK-style proof system.
//!
//! The prover half builds the grand-product polynomial Z(X) certifying that
//! the circuit wires are consistent with the copy-constraint permutation,
//! then contributes the permutation terms of the quotient polynomial and of
//! the linearisation polynomial. The verifier half reconstructs the same
//! terms as scalars from the openings carried by the transcript.
//!
//! Curve arithmetic, multi-scalar multiplication, FFT primitives, the
//! Fiat-Shamir hash and the circuit frontend are external collaborators.

/// Module for the evaluation domains.
pub mod domain;

/// Module for errors.
pub mod errors;

/// Module for the proving and verification keys.
pub mod key;

/// Module for the prover.
pub mod prover;

/// Module for the public-input delta.
pub mod public_inputs;

/// Module for the transcript.
pub mod transcript;

/// Module for the verifier.
pub mod verifier;

/// Module for the work queue.
pub mod work_queue;

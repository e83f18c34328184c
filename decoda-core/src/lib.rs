#![warn(missing_docs)]
//! decoda Core - Data Model and Test Bindings
//!
//! This crate provides the vocabulary of the conformance framework:
//! - `Codec`, `TestVector`, `TestSuite` and the persisted suite schema
//! - The `Decoder` trait implemented by decoder front ends
//! - `ConformanceTest`, the unit binding one decoder to one vector
//! - `SuiteRun`, the mutable result of a run, kept separate from the
//!   immutable suite definition and merged by vector name

mod codec;
mod decoder;
mod digest;
mod run;
mod suite;
mod vector;

pub use codec::{Codec, UnknownCodec};
pub use decoder::{DecodeError, Decoder};
pub use digest::sha256_file;
pub use run::{RunError, RunSummary, SuiteRun, VectorVerdict};
pub use suite::{SuiteError, SuiteFile, TestSuite, VectorRecord};
pub use test::ConformanceTest;
pub use vector::{TestOutcome, TestStatus, TestVector};

//! Backend adapters.
//!
//! Each backend resolves its own completion signal into an
//! [`AssemblyInput`](crate::assembler::AssemblyInput) through two flow
//! stages, then shares the [`EventAssembler`](crate::assembler::EventAssembler).
//!
//! - [`kfp`]: workflow-engine backend with run/job services and a lineage store
//! - [`vai`]: managed pipeline backend with a single job API

pub mod kfp;
pub mod vai;

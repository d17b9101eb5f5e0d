//! Employment case lifecycle and repayment schedule engine.
//!
//! A case tracks one placement contract between an employer, a foreign
//! domestic worker and the handling agency: its versioned record, signature
//! collection, stage-gating completeness checks, fee schedule invoicing,
//! the 24-period salary/loan repayment schedule, and final archival with
//! immutable identity snapshots. [`service::CaseService`] is the entry
//! point; records persist in sled as CBOR.

pub mod archive;
pub mod case;
pub mod checker;
pub mod error;
pub mod external;
pub mod fees;
pub mod money;
pub mod schedule;
pub mod service;
pub mod signature;
pub mod utils;

#[cfg(test)]
pub(crate) mod testutil;

//! Audit trail: decision records, JSONL export, BLAKE3 ids and fingerprints.

pub mod hasher;
pub mod log;

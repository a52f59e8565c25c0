//! Core domain types and storage contracts for the bottega project.
//!
//! This crate is deliberately free of any AWS SDK dependency: everything in
//! here is pure data and pure functions, so the storage engine in the
//! `bottega` crate can be tested against these types in isolation.

pub mod domain;
pub mod storage;

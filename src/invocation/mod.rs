//! Invocation ledger for Gantry.
//!
//! Every AI-role invocation (orchestrator, coder or reviewer) is appended
//! here as an immutable record linked to its task. Prompt and response
//! payloads are stored beside the record and fetched on demand. Each record
//! is classified on write; credit-exhaustion failures are forwarded to a
//! [`ports::CreditExhaustionSink`] so the alert manager can pause work.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

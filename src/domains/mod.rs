//! Domains module containing business logic organized by bounded contexts.
//!
//! The server only exposes tools. Resources and prompts are not offered.

pub mod tools;

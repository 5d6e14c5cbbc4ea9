//! Upstream estate API routes consumed by the gate console, with their
//! request bodies.

pub mod console;
pub mod passes;
pub mod visitors;

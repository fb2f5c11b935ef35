//! Bytecode analysis: decoding, control-flow graph construction, and heuristics

pub mod decoder;
pub mod cfg;
pub mod heuristics;

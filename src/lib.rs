//! Heuristics for the Graph Coloring problem: greedy constructions, tabu search and
//! a genetic algorithm driven by a decremental color budget.

// #![warn(clippy::all, clippy::pedantic)]
// useful additional warnings if docs are missing, or crates imported but unused, etc.
#![warn(missing_debug_implementations)]
#![warn(missing_docs)]
#![warn(trivial_casts, trivial_numeric_casts)]
#![warn(unsafe_code)]
#![warn(unused_extern_crates)]
#![warn(variant_size_differences)]

// not sure if already by default in clippy
#![warn(clippy::similar_names)]
#![warn(clippy::shadow_unrelated)]
#![warn(clippy::shadow_same)]
#![warn(clippy::shadow_reuse)]


/// coloring instance base trait, solutions and checker
pub mod color;

/// read/write DIMACS formats
pub mod dimacs;

/// compact instance (adjacency lists and optional adjacency matrix)
pub mod compact_instance;

/// loading errors and configuration errors
pub mod error;

/// parameters of the engines and of the run controller
pub mod config;

/// helper and utility methods for executables
pub mod util;

/// search procedures for the graph coloring problem
pub mod search;

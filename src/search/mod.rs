//! Search procedures for the graph coloring problem.

/// greedy (first-fit) constructor and vertex orders
pub mod greedy;

/// greedy DSATUR algorithm
pub mod greedy_dsatur;

/// conflict evaluation (full and incremental)
pub mod conflicts;

/// color normalization and color class elimination
pub mod reduction;

/// TABUCOL implementation
pub mod tabucol;

/// genetic algorithm
pub mod genetic;

/// decremental search and repeated runs
pub mod controller;

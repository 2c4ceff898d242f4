//! Cross-module flows through `spawn_engine`.

pub mod fixtures;

mod data_paths;
mod discovery;
mod lifecycle;
mod transactions;

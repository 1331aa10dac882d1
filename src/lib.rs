pub mod dataset;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod models;
pub mod performance;
pub mod returns;
pub mod simulator;
pub mod strategy;

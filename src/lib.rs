//! satmesh: a simulated satellite relay mesh
//!
//! Vessels report positions to a satellite, satellites flood messages across
//! lossy, delayed links under a hop budget, and a ground station persists
//! whatever arrives.

pub mod config;
pub mod groundstation;
pub mod message;
pub mod metrics;
pub mod relay;
pub mod simulation;
pub mod topology;
pub mod vessel;

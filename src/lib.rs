//! Stowage: a 3D container-loading optimization job service.

pub mod api;
pub mod config;
pub mod error;
pub mod manager;
pub mod model;
pub mod solver;

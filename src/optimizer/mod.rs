pub mod covariance;
pub mod optimizer_model;
pub mod optimizer_service;

#[cfg(test)]
mod optimizer_tests;

pub use covariance::*;
pub use optimizer_model::*;
pub use optimizer_service::*;

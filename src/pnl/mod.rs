pub mod pnl_model;
pub mod pnl_service;

#[cfg(test)]
mod pnl_tests;

pub use pnl_model::*;
pub use pnl_service::*;

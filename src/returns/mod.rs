pub mod returns_model;
pub mod returns_service;

#[cfg(test)]
mod returns_tests;

pub use returns_model::*;
pub use returns_service::*;

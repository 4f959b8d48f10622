pub mod correlation_model;
pub mod correlation_service;


pub use correlation_model::*;
pub use correlation_service::*;

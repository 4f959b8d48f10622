pub mod risk_model;
pub mod risk_service;


pub use risk_model::*;
pub use risk_service::*;

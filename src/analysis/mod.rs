pub mod analysis_model;
pub mod analysis_service;


pub use analysis_model::*;
pub use analysis_service::*;

pub mod snapshot_model;
pub mod snapshot_traits;


pub use snapshot_model::*;
pub use snapshot_traits::*;

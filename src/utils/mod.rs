pub mod arithmetic;
pub mod decimal_serde;

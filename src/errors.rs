//! Core error types for the analytics engine.
//!
//! Degenerate arithmetic (zero denominators, non-positive bases for
//! fractional exponents) is deliberately NOT represented here: every ratio
//! collapses to a neutral value instead of failing. See
//! `utils::arithmetic::Ratio` for the internal guard type.

use rust_decimal::Decimal;
use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the analytics engine.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Calculation failed: {0}")]
    Calculation(#[from] CalculatorError),
}

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Insufficient quantity for {symbol}: available {available}, needed {needed}")]
    InsufficientQuantity {
        symbol: String,
        available: Decimal,
        needed: Decimal,
    },

    #[error("Failed to parse decimal number: {0}")]
    DecimalParse(#[from] rust_decimal::Error),
}

#[derive(Error, Debug)]
pub enum CalculatorError {
    #[error("Insufficient data: {required} points required, {actual} available")]
    InsufficientData { required: usize, actual: usize },

    #[error("Calculation error: {0}")]
    Calculation(String),
}

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(ValidationError::DecimalParse(err))
    }
}

impl Error {
    /// Shorthand used by calculators that bail out on short histories.
    pub fn insufficient_data(required: usize, actual: usize) -> Self {
        Error::Calculation(CalculatorError::InsufficientData { required, actual })
    }
}

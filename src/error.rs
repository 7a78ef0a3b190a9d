use thiserror::Error;

/// Error type for estimator construction and state validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EstimatorError {
    #[error("precision {precision} is out of range, maximum is {max}")]
    PrecisionOutOfRange { precision: i32, max: u8 },
    #[error("expected {expected} registers, found {actual}")]
    RegisterCountMismatch { expected: usize, actual: usize },
    #[error("register {index} holds {value}, maximum is {max}")]
    InvalidRegister { index: usize, value: u32, max: u32 },
    #[error("register index {index} is out of range, estimator has {registers} registers")]
    IndexOutOfRange { index: usize, registers: usize },
}

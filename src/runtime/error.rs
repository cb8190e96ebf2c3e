use thiserror::Error;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Unknown symbol `{name}`")]
    UnknownSymbol { name: String },
    #[error("Type mismatch: {message}")]
    TypeMismatch { message: String },
    #[error("Shape mismatch: {left} and {right}")]
    ShapeMismatch { left: String, right: String },
    #[error("Index {index} is out of bounds for axis {axis} with size {size}")]
    IndexOutOfBounds { index: i64, axis: usize, size: usize },
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Integer overflow in `{op}`")]
    Overflow { op: &'static str },
    #[error("Invalid dimension {value}: sizes must be non-negative")]
    InvalidDimension { value: i64 },
    #[error("Array of shape {shape} is too large")]
    TooLarge { shape: String },
    #[error("`{keyword}` outside of a loop")]
    StrayFlow { keyword: &'static str },
    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

impl RuntimeError {
    pub fn mismatch(message: impl Into<String>) -> Self {
        RuntimeError::TypeMismatch {
            message: message.into(),
        }
    }
}

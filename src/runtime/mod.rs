pub mod environment;
pub mod error;
pub mod interpreter;
pub mod ops;
pub mod value;

pub use interpreter::Interpreter;

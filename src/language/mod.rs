pub mod ast;
pub mod typecheck;
pub mod types;

pub mod value;
pub mod environment;
pub mod callable;
pub mod natives;
pub mod interpreter;

pub use interpreter::{Flow, Interpreter};
pub use value::Value;

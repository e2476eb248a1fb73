pub mod ast;
pub mod cursor;
pub mod diag;
pub mod loc;
pub mod op_info;
pub mod parser;
pub mod registry;
pub mod source;
pub mod token;

pub use parser::{UnitOutput, parse_unit};

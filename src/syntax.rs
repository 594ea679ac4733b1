//! CUDA C front-end: lexing, parsing and name resolution.

pub mod lexeme;
pub mod lexer;
pub mod parser;
pub mod resolve;
pub mod span;

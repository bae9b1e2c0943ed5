//! SQL parsing: tokenizer, AST, and recursive-descent grammar

pub mod ast;
pub mod grammar;
pub mod tokenizer;

pub use ast::{Expr, Stmt};
pub use grammar::{parse, parse_expression, parse_single, Parser};
pub use tokenizer::{tokenize, tokenize_all, unquote, Token, TokenKind, Tokenizer};

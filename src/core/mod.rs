//! Compilation pipeline: lexing, parsing, lowering, rule-based planning.

pub mod config;
pub mod dag;
pub mod error;
pub mod estimate;
pub mod ir;
pub mod lexer;
pub mod parser;
pub mod planner;
pub mod rules;
pub mod steps;
pub mod types;

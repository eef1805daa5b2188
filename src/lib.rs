//! This crate contains the core of an untyped lambda calculus interpreter:
//! tokenizer, scope-resolving parser, capture-avoiding substitution, alpha
//! conversion and budgeted normal-order beta reduction.

pub mod church_encoding;
pub mod end_to_end;
pub mod lambda_errors;
pub mod lexical_analysis;
pub mod program_representation;
pub mod rc_tree_impl;

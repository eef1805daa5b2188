//! Parser and rewriting code that represents expressions as immutable trees
//! whose nodes are shared through `Rc` smart pointers.

pub mod rc_tree_ast;
pub mod rc_tree_recursive_descent_parsing;
pub mod rc_tree_rewriting;

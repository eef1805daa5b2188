//! Data structures to represent lambda calculus expressions as immutable trees
//! whose nodes are shared through `Rc` pointers, and the printer for them.
use std::cell::Cell;
use std::rc::Rc;

/// Identifies one binder. Every occurrence of a bound variable carries the id
/// of the lambda head that introduced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BinderId(u64);

impl BinderId {
    pub fn value(self) -> u64 {
        return self.0;
    }
}

/// Hands out binder ids for one session. Clones share the same counter, so
/// ids stay unique across every holder of the allocator.
#[derive(Debug, Clone, Default)]
pub struct BinderIdAllocator {
    next_id: Rc<Cell<u64>>,
}

impl BinderIdAllocator {
    pub fn new() -> Self {
        return Self::default();
    }

    /// Returns a binder id that was never returned before by this allocator
    /// or any of its clones.
    pub fn next_id(&self) -> BinderId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        return BinderId(id);
    }
}

/// A variable occurrence or a lambda head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    name: String,
    bound: bool,
    id: BinderId,
}

impl Variable {
    pub fn new(name: impl Into<String>, bound: bool, id: BinderId) -> Self {
        return Variable {
            name: name.into(),
            bound,
            id,
        };
    }

    /// Creates a new binder.
    pub fn bound(name: impl Into<String>, allocator: &BinderIdAllocator) -> Self {
        return Variable::new(name, true, allocator.next_id());
    }

    /// Creates a free variable. Free variables never share an id, so they are
    /// never the target of a substitution.
    pub fn free(name: impl Into<String>, allocator: &BinderIdAllocator) -> Self {
        return Variable::new(name, false, allocator.next_id());
    }

    pub fn name(&self) -> &str {
        return self.name.as_str();
    }

    pub fn is_bound(&self) -> bool {
        return self.bound;
    }

    pub fn id(&self) -> BinderId {
        return self.id;
    }

    /// Same binding, different display name.
    pub fn renamed(&self, new_name: &str) -> Variable {
        return Variable::new(new_name, self.bound, self.id);
    }
}

/// Represents a lambda-calculus expression.
#[derive(Debug, PartialEq)]
pub enum ExprNode {
    Var {
        variable: Variable,
    },
    FnDef {
        formal_param: Variable,
        fn_body: Expression,
    },
    FnApp {
        fn_body: Expression,
        actual_arg: Expression,
    },
}

/// Shared handle to an immutable expression node.
///
/// Rewriting operations return the very same handle when nothing changed,
/// which is what `is_same` checks.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression(Rc<ExprNode>);

impl Expression {
    pub fn var(variable: Variable) -> Self {
        return Expression(Rc::new(ExprNode::Var { variable }));
    }

    pub fn fn_def(formal_param: Variable, fn_body: Expression) -> Self {
        return Expression(Rc::new(ExprNode::FnDef {
            formal_param,
            fn_body,
        }));
    }

    pub fn fn_app(fn_body: Expression, actual_arg: Expression) -> Self {
        return Expression(Rc::new(ExprNode::FnApp {
            fn_body,
            actual_arg,
        }));
    }

    pub fn node(&self) -> &ExprNode {
        return &self.0;
    }

    /// Identity comparison: true iff both handles point at the same node.
    pub fn is_same(&self, other: &Expression) -> bool {
        return Rc::ptr_eq(&self.0, &other.0);
    }
}

// What is still left to print, last item first.
enum PendingOutput<'a> {
    Node(&'a ExprNode),
    Text(&'static str),
}

// Helper function to produce a string representation of an ExprNode. Works
// off an explicit stack so deep trees cannot overflow the call stack.
fn expr_node_to_string_helper(expr_node: &ExprNode, string_so_far: &mut String) {
    let mut pending = vec![PendingOutput::Node(expr_node)];

    while let Some(next) = pending.pop() {
        match next {
            PendingOutput::Text(text) => string_so_far.push_str(text),
            PendingOutput::Node(ExprNode::Var { variable }) => {
                string_so_far.push_str(variable.name());
            }
            // The function is always bracketed and the argument never is,
            // which is exactly how the parser reads an application back.
            PendingOutput::Node(ExprNode::FnApp {
                fn_body,
                actual_arg,
            }) => {
                string_so_far.push('(');
                pending.push(PendingOutput::Node(actual_arg.node()));
                pending.push(PendingOutput::Text(") "));
                pending.push(PendingOutput::Node(fn_body.node()));
            }
            PendingOutput::Node(ExprNode::FnDef {
                formal_param,
                fn_body,
            }) => {
                string_so_far.push('\\');
                string_so_far.push_str(formal_param.name());
                string_so_far.push_str(" . ");
                pending.push(PendingOutput::Node(fn_body.node()));
            }
        }
    }
}

// Converts an expr node to a string.
pub fn expr_node_to_string(expr_node: &ExprNode) -> String {
    let mut out_string = String::new();
    expr_node_to_string_helper(expr_node, &mut out_string);
    return out_string;
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "{}", expr_node_to_string(self.node()).as_str());
    }
}

//! Rewriting operations on rc-tree expressions: substitution, normal-order
//! beta reduction and alpha conversion.
//!
//! None of these mutate their input. Subtrees that do not change are handed
//! back by the same `Rc`, so callers detect "no change" with
//! `Expression::is_same`.

use std::collections::HashMap;

use crate::lambda_errors::LambdaError;
use crate::rc_tree_impl::rc_tree_ast::{BinderId, BinderIdAllocator, ExprNode, Expression, Variable};

impl Expression {
    /// Replaces every occurrence bound by `binder` with `replacement`.
    /// Stops at a lambda whose head is `binder` itself.
    pub fn substitute(&self, binder: &Variable, replacement: &Expression) -> Expression {
        return self.substitute_with(binder.id(), &mut || replacement.clone());
    }

    // Substitution where every inserted copy is produced by
    // `make_replacement`.
    fn substitute_with(
        &self,
        binder_id: BinderId,
        make_replacement: &mut dyn FnMut() -> Expression,
    ) -> Expression {
        match self.node() {
            ExprNode::Var { variable } => {
                if variable.is_bound() && variable.id() == binder_id {
                    return make_replacement();
                }
                return self.clone();
            }

            ExprNode::FnApp {
                fn_body,
                actual_arg,
            } => {
                let subbed_fn_body = fn_body.substitute_with(binder_id, make_replacement);
                let subbed_actual_arg = actual_arg.substitute_with(binder_id, make_replacement);

                if subbed_fn_body.is_same(fn_body) && subbed_actual_arg.is_same(actual_arg) {
                    return self.clone();
                }
                return Expression::fn_app(subbed_fn_body, subbed_actual_arg);
            }

            ExprNode::FnDef {
                formal_param,
                fn_body,
            } => {
                // The binder is shadowed from here on.
                if formal_param.id() == binder_id {
                    return self.clone();
                }

                let subbed_fn_body = fn_body.substitute_with(binder_id, make_replacement);
                if subbed_fn_body.is_same(fn_body) {
                    return self.clone();
                }
                return Expression::fn_def(formal_param.clone(), subbed_fn_body);
            }
        }
    }

    /// Copies the expression giving every lambda inside it a fresh binder id.
    /// Returns the same handle if the expression contains no lambda.
    ///
    /// Used whenever a subtree is duplicated, so that two binders in one tree
    /// never share an id.
    pub fn refresh_binders(&self, allocator: &BinderIdAllocator) -> Expression {
        let mut fresh_params = HashMap::new();
        return self.refresh_binders_helper(allocator, &mut fresh_params);
    }

    fn refresh_binders_helper(
        &self,
        allocator: &BinderIdAllocator,
        fresh_params: &mut HashMap<BinderId, Variable>,
    ) -> Expression {
        match self.node() {
            ExprNode::Var { variable } => match fresh_params.get(&variable.id()) {
                Some(fresh_param) => Expression::var(fresh_param.clone()),
                None => self.clone(),
            },

            ExprNode::FnApp {
                fn_body,
                actual_arg,
            } => {
                let new_fn_body = fn_body.refresh_binders_helper(allocator, fresh_params);
                let new_actual_arg = actual_arg.refresh_binders_helper(allocator, fresh_params);

                if new_fn_body.is_same(fn_body) && new_actual_arg.is_same(actual_arg) {
                    return self.clone();
                }
                return Expression::fn_app(new_fn_body, new_actual_arg);
            }

            ExprNode::FnDef {
                formal_param,
                fn_body,
            } => {
                let fresh_param = Variable::bound(formal_param.name(), allocator);
                let outer = fresh_params.insert(formal_param.id(), fresh_param.clone());

                let new_fn_body = fn_body.refresh_binders_helper(allocator, fresh_params);

                match outer {
                    Some(outer_param) => fresh_params.insert(formal_param.id(), outer_param),
                    None => fresh_params.remove(&formal_param.id()),
                };

                return Expression::fn_def(fresh_param, new_fn_body);
            }
        }
    }

    /// Performs one step of normal-order (leftmost-outermost) beta reduction.
    /// Returns the same handle if the expression is in normal form.
    ///
    /// A redex is contracted before its argument is looked at, so arguments
    /// without a normal form are harmless as long as they get discarded.
    pub fn beta_reduce(&self, allocator: &BinderIdAllocator) -> Expression {
        match self.node() {
            // A variable is already in normal form.
            ExprNode::Var { .. } => self.clone(),

            // Beta reduction needs an application, so pass it on to the body.
            ExprNode::FnDef {
                formal_param,
                fn_body,
            } => {
                let reduced_fn_body = fn_body.beta_reduce(allocator);
                if reduced_fn_body.is_same(fn_body) {
                    return self.clone();
                }
                return Expression::fn_def(formal_param.clone(), reduced_fn_body);
            }

            ExprNode::FnApp {
                fn_body,
                actual_arg,
            } => {
                // The function being applied is a function definition, so we
                // are at a redex.
                if let ExprNode::FnDef {
                    formal_param,
                    fn_body: defined_fn,
                } = fn_body.node()
                {
                    return defined_fn.substitute_with(formal_param.id(), &mut || {
                        actual_arg.refresh_binders(allocator)
                    });
                }

                // Not a redex: reduce the function first and only touch the
                // argument once the function is in normal form.
                let reduced_fn_body = fn_body.beta_reduce(allocator);
                if !reduced_fn_body.is_same(fn_body) {
                    return Expression::fn_app(reduced_fn_body, actual_arg.clone());
                }

                let reduced_actual_arg = actual_arg.beta_reduce(allocator);
                if reduced_actual_arg.is_same(actual_arg) {
                    return self.clone();
                }
                return Expression::fn_app(fn_body.clone(), reduced_actual_arg);
            }
        }
    }

    /// Renames the first binder called `old_name` (in leftmost-outermost
    /// order) to `new_name`. Its id, and so its meaning, is kept.
    ///
    /// Fails with `NameClash` if the new name would capture an occurrence
    /// that is free at that binder, or if one of the binder's occurrences
    /// would end up under an inner binder already called `new_name`.
    /// Returns the same handle if no binder is called `old_name`.
    pub fn alpha_convert(&self, old_name: &str, new_name: &str) -> Result<Expression, LambdaError> {
        if old_name == new_name {
            return Ok(self.clone());
        }

        match self.node() {
            ExprNode::Var { .. } => Ok(self.clone()),

            ExprNode::FnDef {
                formal_param,
                fn_body,
            } => {
                if formal_param.name() == old_name {
                    let mut inner_params = Vec::new();
                    if has_name_clash(fn_body, formal_param.id(), new_name, &mut inner_params) {
                        return Err(LambdaError::NameClash {
                            old_name: String::from(old_name),
                            new_name: String::from(new_name),
                        });
                    }

                    let renamed_param = formal_param.renamed(new_name);
                    let renamed_fn_body =
                        fn_body.substitute(formal_param, &Expression::var(renamed_param.clone()));

                    return Ok(Expression::fn_def(renamed_param, renamed_fn_body));
                }

                let converted_fn_body = fn_body.alpha_convert(old_name, new_name)?;
                if converted_fn_body.is_same(fn_body) {
                    return Ok(self.clone());
                }
                return Ok(Expression::fn_def(formal_param.clone(), converted_fn_body));
            }

            ExprNode::FnApp {
                fn_body,
                actual_arg,
            } => {
                let converted_fn_body = fn_body.alpha_convert(old_name, new_name)?;
                if !converted_fn_body.is_same(fn_body) {
                    return Ok(Expression::fn_app(converted_fn_body, actual_arg.clone()));
                }

                let converted_actual_arg = actual_arg.alpha_convert(old_name, new_name)?;
                if converted_actual_arg.is_same(actual_arg) {
                    return Ok(self.clone());
                }
                return Ok(Expression::fn_app(fn_body.clone(), converted_actual_arg));
            }
        }
    }
}

// Checks whether renaming the binder `renamed_id` to `new_name` would change
// the meaning of `expr`, the body of that binder. `inner_params` holds the
// lambda heads between the renamed binder and `expr`.
fn has_name_clash<'a>(
    expr: &'a Expression,
    renamed_id: BinderId,
    new_name: &str,
    inner_params: &mut Vec<&'a Variable>,
) -> bool {
    match expr.node() {
        ExprNode::Var { variable } => {
            if variable.id() == renamed_id {
                // This occurrence would be captured by an inner binder.
                return inner_params.iter().any(|param| param.name() == new_name);
            }

            // An occurrence of new_name that is free here would be captured by
            // the renamed binder.
            return variable.name() == new_name
                && !inner_params.iter().any(|param| param.id() == variable.id());
        }

        ExprNode::FnApp {
            fn_body,
            actual_arg,
        } => {
            return has_name_clash(fn_body, renamed_id, new_name, inner_params)
                || has_name_clash(actual_arg, renamed_id, new_name, inner_params);
        }

        ExprNode::FnDef {
            formal_param,
            fn_body,
        } => {
            inner_params.push(formal_param);
            let clash = has_name_clash(fn_body, renamed_id, new_name, inner_params);
            inner_params.pop();
            return clash;
        }
    }
}

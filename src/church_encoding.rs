//! Church encodings of natural numbers and booleans. The parser folds numeric
//! and boolean literals into these at parse time.

use crate::rc_tree_impl::rc_tree_ast::{BinderIdAllocator, Expression, Variable};

/// Largest numeral the parser folds. A numeral `n` is a chain of `n` nested
/// applications, and every tree walk recurses once per level.
pub const MAX_NUMERAL: u64 = 10_000;

/// Encodes `n` as `\f . \x . (f) ... (f) x` with `n` applications of `f`.
pub fn church_encode(n: u64, allocator: &BinderIdAllocator) -> Expression {
    let f = Variable::bound("f", allocator);
    let x = Variable::bound("x", allocator);

    let mut fn_body = Expression::var(x.clone());
    for _ in 0..n {
        fn_body = Expression::fn_app(Expression::var(f.clone()), fn_body);
    }

    return Expression::fn_def(f, Expression::fn_def(x, fn_body));
}

/// Encodes true as `\a . \b . a`.
pub fn church_true(allocator: &BinderIdAllocator) -> Expression {
    let a = Variable::bound("a", allocator);
    let b = Variable::bound("b", allocator);

    return Expression::fn_def(a.clone(), Expression::fn_def(b, Expression::var(a)));
}

/// Encodes false as `\a . \b . b`.
pub fn church_false(allocator: &BinderIdAllocator) -> Expression {
    let a = Variable::bound("a", allocator);
    let b = Variable::bound("b", allocator);

    return Expression::fn_def(a, Expression::fn_def(b.clone(), Expression::var(b)));
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::rc_tree_impl::rc_tree_recursive_descent_parsing::parse_expression;

    #[test]
    fn test_church_zero() {
        let allocator = BinderIdAllocator::new();
        assert_eq!(church_encode(0, &allocator).to_string(), r"\f . \x . x");
    }

    #[test]
    fn test_church_five() {
        let allocator = BinderIdAllocator::new();
        assert_eq!(
            church_encode(5, &allocator).to_string(),
            r"\f . \x . (f) (f) (f) (f) (f) x"
        );
    }

    #[test]
    fn test_church_booleans() {
        let allocator = BinderIdAllocator::new();
        assert_eq!(church_true(&allocator).to_string(), r"\a . \b . a");
        assert_eq!(church_false(&allocator).to_string(), r"\a . \b . b");
    }

    // Test that true selects its first argument and false its second.
    #[test]
    fn test_church_booleans_select() {
        let allocator = BinderIdAllocator::new();
        let p = Expression::var(Variable::free("p", &allocator));
        let q = Expression::var(Variable::free("q", &allocator));

        for (boolean, expected) in [
            (church_true(&allocator), "p"),
            (church_false(&allocator), "q"),
        ] {
            let applied = Expression::fn_app(Expression::fn_app(boolean, p.clone()), q.clone());
            let once = applied.beta_reduce(&allocator);
            let twice = once.beta_reduce(&allocator);
            assert_eq!(twice.to_string(), expected);
        }
    }

    proptest! {
        // Printing a numeral and parsing it back gives the same text.
        #[test]
        fn prop_church_numeral_round_trip(n in 0u64..64) {
            let allocator = BinderIdAllocator::new();
            let printed = church_encode(n, &allocator).to_string();
            let reparsed = parse_expression(&printed, &allocator).unwrap();
            prop_assert_eq!(reparsed.to_string(), printed);
        }

        // Numerals are normal forms.
        #[test]
        fn prop_church_numeral_is_normal_form(n in 0u64..64) {
            let allocator = BinderIdAllocator::new();
            let numeral = church_encode(n, &allocator);
            prop_assert!(numeral.beta_reduce(&allocator).is_same(&numeral));
        }
    }
}

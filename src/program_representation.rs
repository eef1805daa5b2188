//! Commands pair an expression with the conversion to apply to it, and the
//! `Program` keeps the commands the user gave a name to.

use std::collections::HashMap;
use std::fmt::Display;

use crate::lambda_errors::LambdaError;
use crate::rc_tree_impl::rc_tree_ast::{BinderIdAllocator, Expression};

/// n-fold beta reduction. `num_steps == 0` means "until convergence", and
/// `max_iter == 0` means "no budget".
#[derive(Debug, Clone)]
pub struct BetaReduction {
    pub num_steps: u64,
    pub max_iter: u64,
    allocator: BinderIdAllocator,
}

impl BetaReduction {
    pub fn new(num_steps: u64, max_iter: u64, allocator: BinderIdAllocator) -> Self {
        return BetaReduction {
            num_steps,
            max_iter,
            allocator,
        };
    }

    /// Reduces `expr` step by step. Stops after `num_steps` steps or as soon
    /// as a step changes nothing. When reducing until convergence, running
    /// out of budget is an error and the partial result is dropped.
    pub fn execute(&self, expr: &Expression) -> Result<Expression, LambdaError> {
        let mut current = expr.clone();
        let mut steps: u64 = 0;

        loop {
            let reduced = current.beta_reduce(&self.allocator);

            if reduced.is_same(&current) {
                tracing::debug!(steps, "normal form reached");
                return Ok(current);
            }

            if self.max_iter != 0 && steps == self.max_iter {
                if self.num_steps == 0 {
                    tracing::debug!(max_iter = self.max_iter, "no normal form within budget");
                    return Err(LambdaError::MaxIterationsExceeded(self.max_iter));
                }
                return Ok(current);
            }

            steps += 1;
            current = reduced;
            tracing::trace!(steps, expression = %current, "beta reduction step");

            if self.num_steps != 0 && steps == self.num_steps {
                return Ok(current);
            }
        }
    }
}

/// The ways an expression can be converted.
#[derive(Debug, Clone)]
pub enum Conversion {
    Identity,
    Alpha { old_name: String, new_name: String },
    Beta(BetaReduction),
}

impl Conversion {
    /// Applies the conversion. The input expression is never modified.
    pub fn execute(&self, expr: &Expression) -> Result<Expression, LambdaError> {
        match self {
            Conversion::Identity => Ok(expr.clone()),
            Conversion::Alpha { old_name, new_name } => expr.alpha_convert(old_name, new_name),
            Conversion::Beta(beta_reduction) => beta_reduction.execute(expr),
        }
    }
}

/// Prints the conversion the way it is written after an expression.
impl Display for Conversion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Conversion::Identity => Ok(()),
            Conversion::Alpha { old_name, new_name } => write!(f, "{}>{}", old_name, new_name),
            Conversion::Beta(beta_reduction) => write!(f, "{}>", beta_reduction.num_steps),
        }
    }
}

/// An expression together with the conversion to run on it.
#[derive(Debug, Clone)]
pub struct Command {
    expression: Expression,
    conversion: Conversion,
}

impl Command {
    pub fn new(expression: Expression, conversion: Conversion) -> Self {
        return Command {
            expression,
            conversion,
        };
    }

    /// Runs the conversion on the stored expression. Nothing is cached, every
    /// call starts again from the stored expression.
    pub fn execute(&self) -> Result<Expression, LambdaError> {
        return self.conversion.execute(&self.expression);
    }

    pub fn expression(&self) -> &Expression {
        return &self.expression;
    }

    pub fn conversion(&self) -> &Conversion {
        return &self.conversion;
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.conversion {
            Conversion::Identity => write!(f, "{};", self.expression),
            _ => write!(f, "{} {};", self.expression, self.conversion),
        }
    }
}

/// The named commands of a session, plus the command of the most recent
/// statement.
#[derive(Debug, Clone, Default)]
pub struct Program {
    known_symbols: HashMap<String, Command>,
    last_command: Option<Command>,
}

impl Program {
    pub fn new() -> Self {
        return Self::default();
    }

    /// Binds `name` to `command`, returning the command it replaces.
    pub fn insert(&mut self, name: &str, command: Command) -> Option<Command> {
        return self.known_symbols.insert(String::from(name), command);
    }

    pub fn get(&self, name: &str) -> Option<&Command> {
        return self.known_symbols.get(name);
    }

    pub fn contains(&self, name: &str) -> bool {
        return self.known_symbols.contains_key(name);
    }

    /// The command of the last statement that was parsed.
    pub fn last_command(&self) -> Option<&Command> {
        return self.last_command.as_ref();
    }

    pub fn set_last_command(&mut self, command: Command) {
        self.last_command = Some(command);
    }

    /// True if at least one name was assigned.
    pub fn has_symbols(&self) -> bool {
        return !self.known_symbols.is_empty();
    }

    /// All assigned names, sorted.
    pub fn symbol_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.known_symbols.keys().map(String::as_str).collect();
        names.sort_unstable();
        return names;
    }
}

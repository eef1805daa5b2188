//! Recursive descent parser that reads statements from a `Tokenizer` and
//! builds scope-resolved rc-tree expressions.
//!
//! The grammar is LL(1), the only lookahead is the current token:
//!
//! ```text
//! statement   := assignment? rvalue? ';'
//! assignment  := "'" NAME "'" '=' rvalue
//! rvalue      := expression conversion?
//! expression  := '\' IDENTIFIER '.' expression
//!              | '(' expression ')' expression?
//!              | IDENTIFIER | LITERAL | NAME
//! conversion  := '>' | LITERAL '>' | IDENTIFIER '>' IDENTIFIER
//! ```
//!
//! `'(' expression ')'` followed by something that starts an expression is an
//! application; otherwise the brackets only group.

use crate::church_encoding::{church_encode, church_false, church_true, MAX_NUMERAL};
use crate::lambda_errors::LambdaError;
use crate::lexical_analysis::{is_numeric_literal, Token, TokenClass, Tokenizer};
use crate::program_representation::{BetaReduction, Command, Conversion, Program};
use crate::rc_tree_impl::rc_tree_ast::{BinderIdAllocator, Expression, Variable};

// One level of lexical scope: `name` currently denotes `variable`. Frames
// live on the stack of the recursive descent and are never modified, so
// leaving a lambda body needs no restoring.
struct ScopeFrame<'a> {
    name: &'a str,
    variable: &'a Variable,
    parent: Option<&'a ScopeFrame<'a>>,
}

// Finds the binder that `name` refers to in `scope`, innermost first.
fn lookup<'a>(scope: Option<&'a ScopeFrame<'a>>, name: &str) -> Option<&'a Variable> {
    let mut frame = scope;
    while let Some(current) = frame {
        if current.name == name {
            return Some(current.variable);
        }
        frame = current.parent;
    }
    return None;
}

// Token classes that can start an expression.
fn starts_expression(token_class: TokenClass) -> bool {
    matches!(
        token_class,
        TokenClass::Lambda
            | TokenClass::BracketOpen
            | TokenClass::Identifier
            | TokenClass::Literal
            | TokenClass::Name
    )
}

/// Parses statements one at a time and records them in a `Program`.
pub struct Parser<I: Iterator<Item = char>> {
    tokenizer: Tokenizer<I>,
    cur: Token,
    program: Program,
    allocator: BinderIdAllocator,
    max_iter: u64,
}

impl<I: Iterator<Item = char>> Parser<I> {
    /// `max_iter` bounds every beta reduction requested in the input; 0 means
    /// no bound.
    pub fn new(input: I, max_iter: u64) -> Self {
        return Parser::with_allocator(input, max_iter, BinderIdAllocator::new());
    }

    /// Like `new`, but binder ids come from `allocator`.
    pub fn with_allocator(input: I, max_iter: u64, allocator: BinderIdAllocator) -> Self {
        return Parser {
            tokenizer: Tokenizer::new(input),
            cur: Token::undefined(),
            program: Program::new(),
            allocator,
            max_iter,
        };
    }

    /// Parses the next statement and stores its command as the program's
    /// last command. Returns `Ok(None)` at end of input.
    ///
    /// Nothing is recovered on error: the caller should discard input up to
    /// the next statement boundary, e.g. with `skip_line`.
    pub fn statement(&mut self) -> Result<Option<Command>, LambdaError> {
        loop {
            self.next_token()?;

            if self.cur.is_reserved() {
                return Err(LambdaError::ReservedSymbol(self.cur.token_text.clone()));
            }

            match self.cur.token_class {
                TokenClass::Undefined => return Ok(None),
                // An empty statement.
                TokenClass::Separator => continue,
                _ => {}
            }

            let command = if self.cur.token_class == TokenClass::NameDefine {
                self.try_assignment_rule()?
            } else {
                self.try_rvalue_rule()?
            };

            if self.cur.token_class != TokenClass::Separator {
                return Err(self.unexpected("Missing semicolon"));
            }

            tracing::debug!(command = %command, "parsed statement");
            self.program.set_last_command(command.clone());
            return Ok(Some(command));
        }
    }

    /// Reserves `symbol`; `callback` runs whenever it is read.
    pub fn register_symbol<F>(&mut self, symbol: &str, callback: F) -> Result<(), LambdaError>
    where
        F: FnMut() + 'static,
    {
        return self.tokenizer.register_symbol(symbol, callback);
    }

    pub fn unregister_symbol(&mut self, symbol: &str) {
        self.tokenizer.unregister_symbol(symbol);
    }

    /// Discards the rest of the current input line.
    pub fn skip_line(&mut self) {
        self.tokenizer.skip_line();
    }

    pub fn program(&self) -> &Program {
        return &self.program;
    }

    fn next_token(&mut self) -> Result<(), LambdaError> {
        self.cur = self.tokenizer.get()?;
        return Ok(());
    }

    // Builds the error for the current token. A reserved word anywhere in a
    // statement is reported as such rather than as bad syntax.
    fn unexpected(&self, message: &str) -> LambdaError {
        if self.cur.is_reserved() {
            return LambdaError::ReservedSymbol(self.cur.token_text.clone());
        }

        let found = match self.cur.token_class {
            TokenClass::Undefined => "end of input",
            _ => self.cur.token_text.as_str(),
        };
        return LambdaError::syntax(format!("{}, found '{}'", message, found));
    }

    // Checks that the current token has the given class and moves past it.
    fn try_token_class(
        &mut self,
        token_class: TokenClass,
        message: &str,
    ) -> Result<Token, LambdaError> {
        if self.cur.token_class != token_class {
            return Err(self.unexpected(message));
        }

        let token = std::mem::replace(&mut self.cur, Token::undefined());
        self.next_token()?;
        return Ok(token);
    }

    /// Tries to parse `'NAME' = rvalue` and binds the result in the program.
    fn try_assignment_rule(&mut self) -> Result<Command, LambdaError> {
        self.try_token_class(TokenClass::NameDefine, "Expected a quote")?;
        let name_token = self.try_token_class(
            TokenClass::Name,
            "Only names starting with an uppercase letter may be assigned to",
        )?;
        self.try_token_class(TokenClass::NameDefine, "Unclosed definition")?;
        self.try_token_class(TokenClass::Assignment, "Defined symbol must be assigned to")?;

        let command = self.try_rvalue_rule()?;

        tracing::debug!(name = name_token.token_text.as_str(), "assigning symbol");
        self.program.insert(&name_token.token_text, command.clone());

        return Ok(command);
    }

    /// Tries to parse an expression followed by an optional conversion.
    fn try_rvalue_rule(&mut self) -> Result<Command, LambdaError> {
        let expression = self.try_expr_rule(None)?;
        let conversion = self.try_conversion_rule()?;
        return Ok(Command::new(expression, conversion));
    }

    /// Tries to parse an expression in the given scope.
    fn try_expr_rule(&mut self, scope: Option<&ScopeFrame<'_>>) -> Result<Expression, LambdaError> {
        match self.cur.token_class {
            TokenClass::Lambda => self.try_lambda_rule(scope),
            TokenClass::BracketOpen => self.try_bracket_rule(scope),
            TokenClass::Identifier => self.try_var_rule(scope),
            TokenClass::Literal => self.try_literal_rule(),
            TokenClass::Name => self.try_name_rule(),
            _ => Err(self.unexpected("Expected an expression")),
        }
    }

    /// Tries to parse an expression that looks like `\[IDENTIFIER].[EXPR]`.
    fn try_lambda_rule(
        &mut self,
        scope: Option<&ScopeFrame<'_>>,
    ) -> Result<Expression, LambdaError> {
        self.try_token_class(TokenClass::Lambda, "Expected a lambda")?;
        let head_token = self.try_token_class(
            TokenClass::Identifier,
            "Lambda head must be a lowercase identifier",
        )?;
        self.try_token_class(TokenClass::BodyStart, "Malformed lambda")?;

        let formal_param = Variable::bound(head_token.token_text.as_str(), &self.allocator);
        let frame = ScopeFrame {
            name: head_token.token_text.as_str(),
            variable: &formal_param,
            parent: scope,
        };
        let fn_body = self.try_expr_rule(Some(&frame))?;

        return Ok(Expression::fn_def(formal_param, fn_body));
    }

    /// Tries to parse `([EXPR]) [EXPR]`, or just `([EXPR])` when nothing that
    /// starts an expression follows the closing bracket.
    fn try_bracket_rule(
        &mut self,
        scope: Option<&ScopeFrame<'_>>,
    ) -> Result<Expression, LambdaError> {
        self.try_token_class(TokenClass::BracketOpen, "Expected an opening bracket")?;
        let fn_body = self.try_expr_rule(scope)?;
        self.try_token_class(TokenClass::BracketClose, "Unmatched bracket")?;

        if !starts_expression(self.cur.token_class) {
            return Ok(fn_body);
        }

        let actual_arg = self.try_expr_rule(scope)?;
        return Ok(Expression::fn_app(fn_body, actual_arg));
    }

    /// Tries to parse a variable. Bound names resolve to their binder, every
    /// other occurrence becomes a new free variable.
    fn try_var_rule(&mut self, scope: Option<&ScopeFrame<'_>>) -> Result<Expression, LambdaError> {
        let var_token = self.try_token_class(TokenClass::Identifier, "Expected an identifier")?;

        let variable = match lookup(scope, &var_token.token_text) {
            Some(binder) => binder.clone(),
            None => Variable::free(var_token.token_text, &self.allocator),
        };

        return Ok(Expression::var(variable));
    }

    /// Tries to parse a numeric or boolean literal into its Church encoding.
    fn try_literal_rule(&mut self) -> Result<Expression, LambdaError> {
        let literal_token = self.try_token_class(TokenClass::Literal, "Expected a literal")?;

        return match literal_token.token_text.as_str() {
            "true" => Ok(church_true(&self.allocator)),
            "false" => Ok(church_false(&self.allocator)),
            digits => {
                let n = parse_count(digits)?;
                if n > MAX_NUMERAL {
                    return Err(LambdaError::syntax(format!(
                        "Numeral too large: {}, at most {} is supported",
                        digits, MAX_NUMERAL
                    )));
                }
                Ok(church_encode(n, &self.allocator))
            }
        };
    }

    /// Tries to parse a reference to an assigned name. The stored command is
    /// executed and its result spliced in with fresh binders.
    fn try_name_rule(&mut self) -> Result<Expression, LambdaError> {
        let name_token = self.try_token_class(TokenClass::Name, "Expected a name")?;

        let command = match self.program.get(&name_token.token_text) {
            Some(command) => command,
            None => {
                return Err(LambdaError::syntax(format!(
                    "Undefined symbol: {}",
                    name_token.token_text
                )))
            }
        };

        tracing::debug!(name = name_token.token_text.as_str(), "expanding symbol");
        let expression = command.execute()?;

        return Ok(expression.refresh_binders(&self.allocator));
    }

    /// Tries to parse the optional conversion after an expression.
    fn try_conversion_rule(&mut self) -> Result<Conversion, LambdaError> {
        match self.cur.token_class {
            TokenClass::Literal | TokenClass::ConversionEnd => self.try_beta_rule(),
            TokenClass::Identifier => self.try_alpha_rule(),
            _ => Ok(Conversion::Identity),
        }
    }

    /// Tries to parse `[IDENTIFIER]>[IDENTIFIER]`.
    fn try_alpha_rule(&mut self) -> Result<Conversion, LambdaError> {
        let old_token = self.try_token_class(TokenClass::Identifier, "Malformed alpha conversion")?;
        self.try_token_class(TokenClass::ConversionEnd, "Malformed alpha conversion")?;
        let new_token = self.try_token_class(TokenClass::Identifier, "Malformed alpha conversion")?;

        return Ok(Conversion::Alpha {
            old_name: old_token.token_text,
            new_name: new_token.token_text,
        });
    }

    /// Tries to parse `>` or `[LITERAL]>`. The step count is clamped to
    /// `max_iter`; `true` counts as 1 and `false` as 0.
    fn try_beta_rule(&mut self) -> Result<Conversion, LambdaError> {
        let mut num_steps = 1;

        if self.cur.token_class == TokenClass::Literal {
            let count_token =
                self.try_token_class(TokenClass::Literal, "Malformed beta reduction")?;
            num_steps = match count_token.token_text.as_str() {
                "true" => 1,
                "false" => 0,
                digits => parse_count(digits)?,
            };
        }

        self.try_token_class(TokenClass::ConversionEnd, "Malformed beta reduction")?;

        if self.max_iter != 0 && num_steps > self.max_iter {
            num_steps = self.max_iter;
        }

        return Ok(Conversion::Beta(BetaReduction::new(
            num_steps,
            self.max_iter,
            self.allocator.clone(),
        )));
    }
}

// Parses a non-negative decimal count.
fn parse_count(digits: &str) -> Result<u64, LambdaError> {
    if !is_numeric_literal(digits) {
        return Err(LambdaError::syntax(format!("Not a number: {}", digits)));
    }

    return digits
        .parse::<u64>()
        .map_err(|_| LambdaError::syntax(format!("Number too large: {}", digits)));
}

/// Parses a single expression, without conversion or semicolon, drawing
/// binder ids from `allocator`.
pub fn parse_expression(
    expr_str: &str,
    allocator: &BinderIdAllocator,
) -> Result<Expression, LambdaError> {
    let mut parser = Parser::with_allocator(expr_str.chars(), 0, allocator.clone());

    parser.next_token()?;
    let expression = parser.try_expr_rule(None)?;

    if parser.cur.is_defined() || parser.cur.is_reserved() {
        return Err(parser.unexpected("Unexpected trailing input"));
    }

    return Ok(expression);
}

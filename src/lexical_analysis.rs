//! Turns a stream of characters into the tokens of the lambda mini-language.
//!
//! Tokens are pulled one at a time with `Tokenizer::get`, which lets the
//! parser work on unbounded input such as an interactive stdin session.

use std::collections::HashMap;
use std::iter::Peekable;

use lazy_static::lazy_static;
use regex::Regex;

use crate::lambda_errors::LambdaError;

/// Starts a comment that runs until the end of the line.
pub const COMMENT_CHAR: char = '#';

// The different classes of tokens that compose the language.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum TokenClass {
    Identifier,
    Name,
    Literal,
    Lambda,
    BodyStart,
    BracketOpen,
    BracketClose,
    Separator,
    Assignment,
    NameDefine,
    ConversionEnd,
    Undefined,
}

/// Represents a single token of the language.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Token {
    pub token_class: TokenClass,
    pub token_text: String,
}

impl Token {
    pub fn new(token_class: TokenClass, token_text: impl Into<String>) -> Self {
        return Token {
            token_class,
            token_text: token_text.into(),
        };
    }

    /// The token returned at end of input.
    pub fn undefined() -> Self {
        return Token::new(TokenClass::Undefined, "");
    }

    /// False for end of input and for reserved words.
    pub fn is_defined(&self) -> bool {
        return self.token_class != TokenClass::Undefined;
    }

    /// True if this undefined token was produced by a reserved word rather
    /// than by running out of input.
    pub fn is_reserved(&self) -> bool {
        return !self.is_defined() && !self.token_text.is_empty();
    }
}

lazy_static! {
    // A reservable symbol is a lowercase word or one special character.
    static ref reserved_symbol_regex: Regex =
        Regex::new(r"^(?:[a-z][A-Za-z0-9_]*|[^A-Za-z0-9_\s])$")
            .expect("Unable to compile reserved symbol regex.");

    static ref numeric_literal_regex: Regex =
        Regex::new(r"^[0-9]+$").expect("Unable to compile numeric literal regex.");
}

/// Returns true if `text` is a literal made only of digits (as opposed to
/// `true` or `false`).
pub fn is_numeric_literal(text: &str) -> bool {
    return numeric_literal_regex.is_match(text);
}

// Maps single-character operators to their token class.
fn operator_class(c: char) -> Option<TokenClass> {
    match c {
        '\\' => Some(TokenClass::Lambda),
        '.' => Some(TokenClass::BodyStart),
        '(' => Some(TokenClass::BracketOpen),
        ')' => Some(TokenClass::BracketClose),
        ';' => Some(TokenClass::Separator),
        '=' => Some(TokenClass::Assignment),
        '\'' => Some(TokenClass::NameDefine),
        '>' => Some(TokenClass::ConversionEnd),
        _ => None,
    }
}

// Identifiers and names continue with letters, digits and underscores.
fn is_word_char(c: char) -> bool {
    return c.is_ascii_alphanumeric() || c == '_';
}

/// Pulls tokens out of a character iterator.
///
/// Host applications can reserve words with `register_symbol`. When a
/// reserved word is read, its callback runs immediately and `get` returns an
/// undefined token whose text is the reserved word.
pub struct Tokenizer<I: Iterator<Item = char>> {
    chars: Peekable<I>,
    reserved_symbols: HashMap<String, Box<dyn FnMut()>>,
}

impl<I: Iterator<Item = char>> Tokenizer<I> {
    pub fn new(input: I) -> Self {
        return Tokenizer {
            chars: input.peekable(),
            reserved_symbols: HashMap::new(),
        };
    }

    /// Gets the next token. Returns an undefined token at end of input.
    pub fn get(&mut self) -> Result<Token, LambdaError> {
        // Skip whitespace and comments until the first character of a token.
        let first_char = loop {
            match self.chars.next() {
                None => return Ok(Token::undefined()),
                Some(c) if c.is_whitespace() => continue,
                Some(COMMENT_CHAR) => self.skip_line(),
                Some(c) => break c,
            }
        };

        let mut token_text = String::from(first_char);

        if self.is_reserved(&token_text) {
            return Ok(self.fire_reserved(token_text));
        }

        let token_class = if first_char.is_ascii_lowercase() {
            TokenClass::Identifier
        } else if first_char.is_ascii_uppercase() {
            TokenClass::Name
        } else if first_char.is_ascii_digit() {
            TokenClass::Literal
        } else {
            return match operator_class(first_char) {
                Some(operator) => Ok(Token::new(operator, token_text)),
                None => Err(LambdaError::syntax(format!(
                    "unrecognized character '{}'",
                    first_char
                ))),
            };
        };

        // Accumulate the rest of the word or number.
        while let Some(&c) = self.chars.peek() {
            let continues = match token_class {
                TokenClass::Literal => c.is_ascii_digit(),
                _ => is_word_char(c),
            };

            if !continues {
                break;
            }

            token_text.push(c);
            self.chars.next();
        }

        if token_class == TokenClass::Literal {
            if let Some(&c) = self.chars.peek() {
                if is_word_char(c) {
                    return Err(LambdaError::syntax(format!(
                        "malformed literal '{}{}'",
                        token_text, c
                    )));
                }
            }
        }

        if token_class == TokenClass::Identifier {
            if self.is_reserved(&token_text) {
                return Ok(self.fire_reserved(token_text));
            }

            // true and false are literals.
            if token_text == "true" || token_text == "false" {
                return Ok(Token::new(TokenClass::Literal, token_text));
            }
        }

        return Ok(Token::new(token_class, token_text));
    }

    /// Registers `symbol` so that `callback` runs whenever it is read.
    pub fn register_symbol<F>(&mut self, symbol: &str, callback: F) -> Result<(), LambdaError>
    where
        F: FnMut() + 'static,
    {
        if !reserved_symbol_regex.is_match(symbol) {
            return Err(LambdaError::InvalidReservedSymbol(String::from(symbol)));
        }

        self.reserved_symbols
            .insert(String::from(symbol), Box::new(callback));

        return Ok(());
    }

    /// Removes `symbol` from the reserved symbols.
    pub fn unregister_symbol(&mut self, symbol: &str) {
        self.reserved_symbols.remove(symbol);
    }

    /// Discards everything up to and including the next newline.
    pub fn skip_line(&mut self) {
        for c in self.chars.by_ref() {
            if c == '\n' {
                break;
            }
        }
    }

    fn is_reserved(&self, text: &str) -> bool {
        return self.reserved_symbols.contains_key(text);
    }

    // Runs the callback registered for `symbol`.
    fn fire_reserved(&mut self, symbol: String) -> Token {
        tracing::debug!(symbol = symbol.as_str(), "reserved symbol encountered");

        if let Some(callback) = self.reserved_symbols.get_mut(&symbol) {
            callback();
        }

        return Token::new(TokenClass::Undefined, symbol);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    // Collects token classes until the first undefined token.
    fn token_classes(input: &str) -> Vec<TokenClass> {
        let mut tokenizer = Tokenizer::new(input.chars());
        let mut out = Vec::new();

        loop {
            let token = tokenizer.get().expect("Unexpected tokenizer error.");
            if !token.is_defined() {
                break;
            }
            out.push(token.token_class);
        }

        out
    }

    // Test the token classes of a simple application with and without
    // whitespace.
    #[test]
    fn test_application_token_stream() {
        let expected = vec![
            TokenClass::BracketOpen,
            TokenClass::Lambda,
            TokenClass::Identifier,
            TokenClass::BodyStart,
            TokenClass::Identifier,
            TokenClass::BracketClose,
            TokenClass::Identifier,
        ];

        assert_eq!(token_classes(r"(\ x. x) bt"), expected);
        assert_eq!(token_classes(r"(\x.x)bt"), expected);
    }

    // Test that the token text is kept for words and numbers.
    #[test]
    fn test_token_text() {
        let mut tokenizer = Tokenizer::new(r"foo_1 Bar 42 >".chars());

        assert_eq!(
            tokenizer.get().unwrap(),
            Token::new(TokenClass::Identifier, "foo_1")
        );
        assert_eq!(tokenizer.get().unwrap(), Token::new(TokenClass::Name, "Bar"));
        assert_eq!(
            tokenizer.get().unwrap(),
            Token::new(TokenClass::Literal, "42")
        );
        assert_eq!(
            tokenizer.get().unwrap(),
            Token::new(TokenClass::ConversionEnd, ">")
        );
        assert_eq!(tokenizer.get().unwrap(), Token::undefined());
        assert_eq!(tokenizer.get().unwrap(), Token::undefined());
    }

    // Test the token classes of an assignment with a conversion suffix.
    #[test]
    fn test_assignment_token_stream() {
        assert_eq!(
            token_classes(r"'ID' = \x. x 5>;"),
            vec![
                TokenClass::NameDefine,
                TokenClass::Name,
                TokenClass::NameDefine,
                TokenClass::Assignment,
                TokenClass::Lambda,
                TokenClass::Identifier,
                TokenClass::BodyStart,
                TokenClass::Identifier,
                TokenClass::Literal,
                TokenClass::ConversionEnd,
                TokenClass::Separator,
            ]
        );
    }

    // Test that true and false are reclassified as literals.
    #[test]
    fn test_boolean_literals() {
        let mut tokenizer = Tokenizer::new("true false truth".chars());

        assert_eq!(
            tokenizer.get().unwrap(),
            Token::new(TokenClass::Literal, "true")
        );
        assert_eq!(
            tokenizer.get().unwrap(),
            Token::new(TokenClass::Literal, "false")
        );
        assert_eq!(
            tokenizer.get().unwrap(),
            Token::new(TokenClass::Identifier, "truth")
        );
    }

    // Test that comments run to the end of the line.
    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            token_classes("# a comment ( \\ .\nx # another\n;"),
            vec![TokenClass::Identifier, TokenClass::Separator]
        );
    }

    // Test that unknown characters are rejected.
    #[test]
    fn test_unrecognized_character() {
        let mut tokenizer = Tokenizer::new("/ x . x".chars());
        assert_eq!(
            tokenizer.get(),
            Err(LambdaError::syntax("unrecognized character '/'"))
        );

        let mut tokenizer = Tokenizer::new(r"\ ? . ?".chars());
        tokenizer.get().expect("Lambda should tokenize.");
        assert!(matches!(tokenizer.get(), Err(LambdaError::SyntaxError(_))));
    }

    // Test that digits directly followed by letters are rejected.
    #[test]
    fn test_malformed_literal() {
        let mut tokenizer = Tokenizer::new("12ab".chars());
        assert_eq!(
            tokenizer.get(),
            Err(LambdaError::syntax("malformed literal '12a'"))
        );
    }

    // Test that a reserved word runs its callback and yields an undefined
    // token carrying the word.
    #[test]
    fn test_reserved_word_callback() {
        let fired = Rc::new(Cell::new(0));
        let fired_in_callback = fired.clone();

        let mut tokenizer = Tokenizer::new("x exit ?".chars());
        tokenizer
            .register_symbol("exit", move || {
                fired_in_callback.set(fired_in_callback.get() + 1)
            })
            .expect("exit should be reservable.");
        tokenizer
            .register_symbol("?", || {})
            .expect("? should be reservable.");

        assert_eq!(
            tokenizer.get().unwrap(),
            Token::new(TokenClass::Identifier, "x")
        );

        let exit_token = tokenizer.get().unwrap();
        assert!(exit_token.is_reserved());
        assert_eq!(exit_token.token_text, "exit");
        assert_eq!(fired.get(), 1);

        let help_token = tokenizer.get().unwrap();
        assert!(help_token.is_reserved());
        assert_eq!(help_token.token_text, "?");

        let end_token = tokenizer.get().unwrap();
        assert!(!end_token.is_defined());
        assert!(!end_token.is_reserved());
    }

    // Test that only lowercase words and single special characters can be
    // reserved.
    #[test]
    fn test_register_invalid_symbol() {
        let mut tokenizer = Tokenizer::new("".chars());

        for symbol in ["Exit", "??", "a?", "", " ", "1x"] {
            assert_eq!(
                tokenizer.register_symbol(symbol, || {}),
                Err(LambdaError::InvalidReservedSymbol(String::from(symbol)))
            );
        }

        for symbol in ["exit", "help_me", "?", "!"] {
            assert_eq!(tokenizer.register_symbol(symbol, || {}), Ok(()));
        }
    }

    // Test that unregistered words tokenize normally again.
    #[test]
    fn test_unregister_symbol() {
        let mut tokenizer = Tokenizer::new("exit exit".chars());
        tokenizer.register_symbol("exit", || {}).unwrap();

        assert!(tokenizer.get().unwrap().is_reserved());

        tokenizer.unregister_symbol("exit");
        assert_eq!(
            tokenizer.get().unwrap(),
            Token::new(TokenClass::Identifier, "exit")
        );
    }

    // Test that skip_line drops the rest of the current line only.
    #[test]
    fn test_skip_line() {
        let mut tokenizer = Tokenizer::new("a b c\nd".chars());

        assert_eq!(tokenizer.get().unwrap().token_text, "a");
        tokenizer.skip_line();
        assert_eq!(tokenizer.get().unwrap().token_text, "d");
    }

    // Test the numeric literal helper.
    #[test]
    fn test_is_numeric_literal() {
        assert!(is_numeric_literal("0"));
        assert!(is_numeric_literal("1234"));
        assert!(!is_numeric_literal("true"));
        assert!(!is_numeric_literal("12a"));
        assert!(!is_numeric_literal(""));
    }
}

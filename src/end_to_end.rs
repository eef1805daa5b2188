//! Code to configure and run the interpreter, either on an input source code
//! file or as an interactive session on standard input.

use std::cell::{Cell, RefCell};
use std::fs;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

use clap::Parser;
use thiserror::Error;

use crate::lambda_errors::LambdaError;
use crate::rc_tree_impl::rc_tree_ast::Expression;
use crate::rc_tree_impl::rc_tree_recursive_descent_parsing;

/// Default bound on the beta reduction steps of a single request.
pub const DEFAULT_MAX_ITER: u64 = 1000;

/// Prompt shown before every statement of an interactive session.
pub const PROMPT: &str = ">> ";

const HELP_TEXT: &str = r"Statements end with ';'. Comments start with '#'.
  x                 variable
  \x . body         lambda
  (f) arg           application
  'NAME' = expr;    assignment, use NAME afterwards
  expr >;           one beta reduction step
  expr N>;          N beta reduction steps, 0> reduces to normal form
  expr old>new;     rename the binder old to new
  0, 1, ...         Church numerals, true and false are Church booleans
Type 'exit' to quit.";

/// Config for the interpreter. Instantiate via `InterpreterConfig::parse()`.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct InterpreterConfig {
    /// The input filepath to run on. Without it, statements are read
    /// interactively from standard input.
    #[arg(short, long)]
    pub src_filepath: Option<String>,

    /// Maximum number of beta reduction steps per request, 0 for no limit.
    #[arg(short, long, default_value_t = DEFAULT_MAX_ITER)]
    pub max_iter: u64,

    /// Log parsed statements and reduction progress.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Errors that may be thrown when running the interpreter.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Input file error: {0}")]
    InputFileError(#[from] io::Error),

    #[error("{0}")]
    ProgramError(#[from] LambdaError),
}

/// The value of every statement of a program, in order.
pub type ExecutionResult = Vec<Expression>;

/// Parses and executes every statement in `input`. The first error stops the
/// program.
pub fn execute_program<I>(input: I, max_iter: u64) -> Result<ExecutionResult, LambdaError>
where
    I: Iterator<Item = char>,
{
    let mut parser = rc_tree_recursive_descent_parsing::Parser::new(input, max_iter);
    let mut execution_result = Vec::new();

    while let Some(command) = parser.statement()? {
        execution_result.push(command.execute()?);
    }

    tracing::info!(statements = execution_result.len(), "program executed");
    return Ok(execution_result);
}

/// One line per statement.
pub fn execution_result_to_string(execution_result: &ExecutionResult) -> String {
    return execution_result
        .iter()
        .map(|expr| expr.to_string())
        .collect::<Vec<String>>()
        .join("\n");
}

/// Run the interpreter on the file named in the config.
pub fn run_file_interpreter(src_filepath: &str, max_iter: u64) -> Result<String, RunError> {
    // Read the input file into a string.
    let program_string = fs::read_to_string(src_filepath)?;

    // Parse and execute the program.
    let execution_result = execute_program(program_string.chars(), max_iter)?;

    // Return the result.
    return Ok(execution_result_to_string(&execution_result));
}

/// Runs an interactive session: statements are read from `input` and their
/// results or errors are written to `output`. Errors in statements do not end
/// the session, the rest of the offending line is discarded instead. Failing
/// to read `input` ends the session with an error.
pub fn run_session<R, W>(input: R, output: &mut W, max_iter: u64) -> Result<(), RunError>
where
    R: BufRead,
    W: Write,
{
    let read_error: Rc<RefCell<Option<io::Error>>> = Rc::new(RefCell::new(None));
    let read_error_slot = Rc::clone(&read_error);

    // The parser sees a read error as the end of input; it is reported once
    // the session stops.
    let chars = input
        .lines()
        .map_while(move |line| match line {
            Ok(line) => Some(line),
            Err(io_err) => {
                *read_error_slot.borrow_mut() = Some(io_err);
                None
            }
        })
        .flat_map(|line| format!("{}\n", line).chars().collect::<Vec<char>>());

    let mut parser = rc_tree_recursive_descent_parsing::Parser::new(chars, max_iter);

    let exit_requested = Rc::new(Cell::new(false));
    let help_requested = Rc::new(Cell::new(false));

    let exit_flag = Rc::clone(&exit_requested);
    parser.register_symbol("exit", move || exit_flag.set(true))?;
    let help_flag = Rc::clone(&help_requested);
    parser.register_symbol("?", move || help_flag.set(true))?;

    loop {
        write!(output, "{}", PROMPT)?;
        output.flush()?;

        match parser.statement() {
            Ok(Some(command)) => match command.execute() {
                Ok(expr) => writeln!(output, "{}", expr)?,
                Err(lambda_error) => writeln!(output, "{}", lambda_error)?,
            },

            Ok(None) => {
                writeln!(output)?;
                if let Some(io_err) = read_error.borrow_mut().take() {
                    return Err(RunError::InputFileError(io_err));
                }
                break;
            }

            Err(LambdaError::ReservedSymbol(symbol)) => {
                if exit_requested.get() {
                    break;
                }

                if help_requested.replace(false) {
                    writeln!(output, "{}", HELP_TEXT)?;
                    if parser.program().has_symbols() {
                        writeln!(
                            output,
                            "Known symbols: {}",
                            parser.program().symbol_names().join(", ")
                        )?;
                    }
                } else {
                    tracing::warn!(symbol = symbol.as_str(), "unhandled reserved symbol");
                }
                parser.skip_line();
            }

            Err(lambda_error) => {
                writeln!(output, "{}", lambda_error)?;
                parser.skip_line();
            }
        }
    }

    return Ok(());
}

/// Run an interpreter (i.e. the lexer, parser, and code execution) given an
/// interpreter config. An interactive session yields an empty result string.
pub fn run_interpreter(config: &InterpreterConfig) -> Result<String, RunError> {
    if let Some(src_filepath) = &config.src_filepath {
        return run_file_interpreter(src_filepath, config.max_iter);
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    run_session(stdin.lock(), &mut stdout, config.max_iter)?;

    return Ok(String::new());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_output(input: &str, max_iter: u64) -> String {
        let mut output: Vec<u8> = Vec::new();
        run_session(input.as_bytes(), &mut output, max_iter).unwrap();
        return String::from_utf8(output).unwrap();
    }

    // Test that every statement contributes one line of output.
    #[test]
    fn test_execute_program() {
        let program = r"
            # identity and constant
            'ID' = \x . x;
            'K' = \a . \b . a;
            ((K) ID) z 0>;
            (ID) 3 >;
        ";

        let execution_result = execute_program(program.chars(), DEFAULT_MAX_ITER).unwrap();
        assert_eq!(
            execution_result_to_string(&execution_result),
            [
                r"\x . x",
                r"\a . \b . a",
                r"\x . x",
                r"\f . \x . (f) (f) (f) x",
            ]
            .join("\n")
        );
    }

    // Test that a program stops at its first error.
    #[test]
    fn test_execute_program_error() {
        let result = execute_program(r"x; (y; z;".chars(), DEFAULT_MAX_ITER);
        assert!(matches!(result, Err(LambdaError::SyntaxError(_))));

        let huge_numeral = execute_program("200000;".chars(), DEFAULT_MAX_ITER);
        assert!(matches!(huge_numeral, Err(LambdaError::SyntaxError(_))));

        let omega = r"(\x . (x) x) \y . (y) y 0>;";
        assert_eq!(
            execute_program(omega.chars(), 25).unwrap_err(),
            LambdaError::MaxIterationsExceeded(25)
        );
    }

    // Test running the interpreter on the bundled demo program.
    #[test]
    fn test_run_interpreter_on_demo_file() {
        let config = InterpreterConfig {
            src_filepath: Some(format!(
                "{}/demos/church_arithmetic.lc",
                env!("CARGO_MANIFEST_DIR")
            )),
            max_iter: DEFAULT_MAX_ITER,
            verbose: false,
        };

        let output = run_interpreter(&config).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 8);
        assert_eq!(lines[5], r"\f . \x . (f) (f) (f) (f) (f) x");
        assert_eq!(lines[6], r"\f . \x . (f) (f) (f) (f) (f) (f) x");
        assert_eq!(lines[7], "yes");
    }

    // Test that a missing input file is reported as such.
    #[test]
    fn test_run_interpreter_missing_file() {
        let config = InterpreterConfig {
            src_filepath: Some(String::from("no/such/file.lc")),
            max_iter: DEFAULT_MAX_ITER,
            verbose: false,
        };

        let run_error = run_interpreter(&config).unwrap_err();
        assert!(matches!(run_error, RunError::InputFileError(_)));
        assert!(run_error.to_string().starts_with("Input file error"));
    }

    // Test that an interactive session keeps going after errors.
    #[test]
    fn test_session_recovers_from_errors() {
        let output = session_output("'ID' = \\x . x;\n(ID y;\n(ID) y >;\n", 0);

        assert!(output.contains("\\x . x\n"));
        assert!(output.contains("Error: unexpected syntax!"));
        assert!(output.contains("y\n"));
        assert!(output.starts_with(PROMPT));
    }

    // Test the exit and help symbols of an interactive session.
    #[test]
    fn test_session_reserved_symbols() {
        let output = session_output("'K' = \\a . \\b . a;\n?\nexit\nK;\n", 0);

        assert!(output.contains("Type 'exit' to quit."));
        assert!(output.contains("Known symbols: K"));
        // Nothing after exit is read.
        assert_eq!(output.matches("\\a . \\b . a").count(), 1);
    }

    // Test that unreadable input ends the session with an error instead of
    // looking like the end of input.
    #[test]
    fn test_session_read_error() {
        let input: &[u8] = b"x;\n\xff\xfe;\ny;\n";
        let mut output: Vec<u8> = Vec::new();

        let run_error = run_session(input, &mut output, 0).unwrap_err();
        assert!(matches!(run_error, RunError::InputFileError(_)));

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("x\n"));
        assert!(!output.contains("y\n"));
    }

    // Test that reduction errors are printed instead of ending the session.
    #[test]
    fn test_session_reports_budget_errors() {
        let output = session_output("(\\x . (x) x) \\y . (y) y 0>;\nz;\n", 5);

        assert!(output.contains("Maximum iterations exceeded! No normal form after 5 steps."));
        assert!(output.contains("z\n"));
    }
}

use thiserror::Error;

// Utility macro, raise `err` if `cond` is false
macro_rules! assert_or_err {
    ($cond:expr, $err:expr $(,)?) => {
        if !$cond {
            Err($err)?;
        }
    };
}
pub(crate) use assert_or_err;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LispError {
    #[error("syntax error: missing expected ')'")]
    UnbalancedParen,
    #[error("syntax error: unexpected ')'")]
    UnexpectedParen,
    #[error("syntax error: unterminated string")]
    UnterminatedString,
    #[error("syntax error: `{0}` not followed by any form")]
    MissingToken(&'static str),
    #[error("syntax error: unrecognised character `{0}`")]
    UnexpectedChar(char),
    #[error("name error: function '{0}' is undefined")]
    UndefinedFunction(String),
    #[error("type error: expected {0}, received {1}")]
    InvalidDataType(&'static str, &'static str),
    #[error("arity error: expected {0} arguments, received {1}")]
    IncorrectArguments(usize, usize),
    #[error("type error: divide by zero")]
    DivideByZero,
    #[error("missing a value for a `let` or `set` binding")]
    MissingBinding,
    #[error("`unquote` can only be used inside `quasiquote`")]
    OnlyInQuasiquote,
    #[error("import error: {0}")]
    ImportFailed(String),
    #[error("{0}")]
    Raised(String),
}

// convenience type
pub type Result<T> = std::result::Result<T, LispError>;

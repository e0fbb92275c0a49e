use nom::{
    branch::alt,
    bytes::complete::{take_till, take_while, take_while1},
    character::complete::{char, digit1, one_of},
    combinator::{map, map_res, opt, recognize, value},
    multi::many0_count,
    sequence::{delimited, preceded},
    Finish, IResult,
};

use crate::heap::LispHeap;
use crate::util::{LispError, Result};
use crate::value::LispValue;

// a symbol is any run of printable bytes that can't mean anything else
fn is_symbol_char(c: char) -> bool {
    c.is_ascii_graphic() && !matches!(c, '(' | ')' | '\'' | '`' | ',' | '"')
}

#[derive(Clone, Debug, PartialEq)]
enum LispToken {
    LParen,
    RParen,
    Quote,
    Backtick,
    Comma,
    Number(i64),
    String(String),
    Symbol(String),
}

fn line_comment(input: &str) -> IResult<&str, ()> {
    value((), preceded(char(';'), take_till(|c| c == '\n')))(input)
}

fn ignored(input: &str) -> IResult<&str, usize> {
    many0_count(alt((value((), one_of(" \t\r\n")), line_comment)))(input)
}

fn number(input: &str) -> IResult<&str, LispToken> {
    map_res(recognize(preceded(opt(char('-')), digit1)), |s: &str| {
        s.parse::<i64>().map(LispToken::Number)
    })(input)
}

// strings run to the closing quote and may not span lines
fn string(input: &str) -> IResult<&str, LispToken> {
    map(
        delimited(
            char('"'),
            take_while(|c| c != '"' && c != '\n' && c != '\r'),
            char('"'),
        ),
        |s: &str| LispToken::String(s.to_owned()),
    )(input)
}

fn token(input: &str) -> IResult<&str, LispToken> {
    alt((
        value(LispToken::LParen, char('(')),
        value(LispToken::RParen, char(')')),
        value(LispToken::Quote, char('\'')),
        value(LispToken::Backtick, char('`')),
        value(LispToken::Comma, char(',')),
        number,
        string,
        map(take_while1(is_symbol_char), |s: &str| {
            LispToken::Symbol(s.to_owned())
        }),
    ))(input)
}

/// Reads top-level forms one at a time from a source string, allocating the
/// value graph on the heap. Reader problems are `LispError`s; the driving
/// layer decides whether to surface them as error values.
#[derive(Clone, Debug)]
pub struct LispParser<'a> {
    input: &'a str,
}

impl<'a> LispParser<'a> {
    pub fn new(input: &'a str) -> Self {
        LispParser { input }
    }

    fn next_token(&mut self) -> Result<Option<LispToken>> {
        if let Ok((rest, _)) = ignored(self.input) {
            self.input = rest;
        }
        if self.input.is_empty() {
            return Ok(None);
        }
        match token(self.input).finish() {
            Ok((rest, tok)) => {
                self.input = rest;
                Ok(Some(tok))
            }
            Err(_) => {
                if self.input.starts_with('"') {
                    Err(LispError::UnterminatedString)
                } else {
                    // non-ASCII or control byte outside a string
                    let c = self.input.chars().next().unwrap_or('\0');
                    Err(LispError::UnexpectedChar(c))
                }
            }
        }
    }

    /// The next top-level form, or `None` at end of input.
    pub fn next_form(&mut self, heap: &mut LispHeap) -> Result<Option<LispValue>> {
        match self.next_token()? {
            None => Ok(None),
            Some(tok) => self.read_form(heap, tok).map(Some),
        }
    }

    fn read_form(&mut self, heap: &mut LispHeap, tok: LispToken) -> Result<LispValue> {
        match tok {
            LispToken::LParen => self.read_list(heap),
            LispToken::RParen => Err(LispError::UnexpectedParen),
            LispToken::Quote => self.read_prefixed(heap, "quote", "'"),
            LispToken::Backtick => self.read_prefixed(heap, "quasiquote", "`"),
            LispToken::Comma => self.read_prefixed(heap, "unquote", ","),
            LispToken::Number(n) => Ok(heap.new_number(n)),
            LispToken::String(s) => Ok(heap.new_string(s)),
            LispToken::Symbol(s) => {
                if s.starts_with(':') {
                    Ok(heap.new_keyword(&s))
                } else {
                    Ok(heap.new_symbol(&s))
                }
            }
        }
    }

    // 'x, `x and ,x rewrite to (quote x), (quasiquote x), (unquote x)
    fn read_prefixed(
        &mut self,
        heap: &mut LispHeap,
        name: &'static str,
        prefix: &'static str,
    ) -> Result<LispValue> {
        let tok = self.next_token()?.ok_or(LispError::MissingToken(prefix))?;
        let inner = self.read_form(heap, tok)?;
        let head = heap.new_symbol(name);
        Ok(heap.new_list(&[head, inner]))
    }

    fn read_list(&mut self, heap: &mut LispHeap) -> Result<LispValue> {
        let mut items = Vec::new();
        loop {
            let tok = self.next_token()?.ok_or(LispError::UnbalancedParen)?;
            if tok == LispToken::RParen {
                break Ok(heap.new_list(&items));
            }
            items.push(self.read_form(heap, tok)?);
        }
    }
}

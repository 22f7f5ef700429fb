//! Line-oriented script parser.
//!
//! One statement per line:
//!
//! ```text
//! name [arg, arg, ...] [key: value, ...] [do]
//! ```
//!
//! A trailing `do` opens a block that runs until a line holding only `end`.
//! `key: value` pairs must follow the positional arguments and are passed as
//! one mapping argument. `#` starts a comment.

use std::fmt;

use bindef_core::{Int, Operation, Value};

use crate::source::Source;

/// Position inside the original file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    /// 1-indexed line number.
    pub line: usize,
    /// 1-indexed column number.
    pub column: usize,
}

/// Parse error with source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Location of the error.
    pub location: SourceLocation,
    /// Kind of parse error.
    pub kind: ParseErrorKind,
}

impl ParseError {
    const fn at(line: usize, column: usize, kind: ParseErrorKind) -> Self {
        Self {
            location: SourceLocation { line, column },
            kind,
        }
    }
}

/// Classification of parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Character that starts no token.
    UnexpectedCharacter(char),
    /// Numeric literal that does not parse or overflows 128 bits.
    InvalidNumber(String),
    /// String literal missing its closing quote.
    UnterminatedString,
    /// Unknown or malformed backslash escape.
    InvalidEscape(String),
    /// Line does not start with a command name.
    ExpectedCommand,
    /// A value was required here.
    ExpectedValue(String),
    /// Arguments must be separated by commas.
    ExpectedComma,
    /// Positional argument after a `key: value` pair.
    PositionalAfterKeyword,
    /// Same key twice in one statement.
    DuplicateKey(String),
    /// `end` without an open block.
    UnmatchedEnd,
    /// Block still open at end of input.
    UnclosedBlock(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedCharacter(c) => write!(f, "unexpected character: {c:?}"),
            Self::InvalidNumber(n) => write!(f, "invalid number: {n}"),
            Self::UnterminatedString => write!(f, "unterminated string literal"),
            Self::InvalidEscape(e) => write!(f, "invalid escape: \\{e}"),
            Self::ExpectedCommand => write!(f, "expected a command name"),
            Self::ExpectedValue(found) => write!(f, "expected a value, found {found}"),
            Self::ExpectedComma => write!(f, "expected `,` between arguments"),
            Self::PositionalAfterKeyword => {
                write!(f, "positional argument after `key: value` pairs")
            }
            Self::DuplicateKey(k) => write!(f, "duplicate key: {k}"),
            Self::UnmatchedEnd => write!(f, "`end` without an open block"),
            Self::UnclosedBlock(name) => write!(f, "`{name} ... do` block is never closed"),
        }
    }
}

impl std::error::Error for ParseError {}

/// A top-level operation and the line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// Parsed operation, including any block.
    pub operation: Operation,
    /// 1-indexed line of the statement head.
    pub line: usize,
}

/// A parsed script.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Script {
    /// Top-level statements in order.
    pub statements: Vec<Statement>,
}

/// One classified source line.
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    /// Empty or comment-only.
    Blank,
    /// Closes the innermost block.
    End,
    /// A command.
    Statement {
        /// Operation without its block.
        operation: Operation,
        /// Ends in `do`.
        opens_block: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Name(String),
    Key(String),
    Value(Value),
    Comma,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Self::Name(name) => format!("`{name}`"),
            Self::Key(key) => format!("`{key}:`"),
            Self::Value(value) => format!("`{value}`"),
            Self::Comma => "`,`".to_string(),
        }
    }
}

struct Lexer<'a> {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    text: &'a str,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str, line: usize) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            line,
            text,
        }
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn error(&self, column: usize, kind: ParseErrorKind) -> ParseError {
        ParseError::at(self.line, column, kind)
    }

    fn invalid_escape(&self, column: usize, sequence: String) -> ParseError {
        self.error(column, ParseErrorKind::InvalidEscape(sequence))
    }

    fn tokens(mut self) -> Result<Vec<(Token, usize)>, ParseError> {
        let mut tokens = Vec::new();
        while let Some(c) = self.peek_at(0) {
            let column = self.pos + 1;
            let token = match c {
                _ if c.is_whitespace() => {
                    self.pos += 1;
                    continue;
                }
                '#' => break,
                ',' => {
                    self.pos += 1;
                    Token::Comma
                }
                '"' => Token::Value(Value::Str(self.string()?)),
                ':' if self.peek_at(1).is_some_and(is_name_start) => {
                    self.pos += 1;
                    Token::Value(Value::Symbol(self.name()))
                }
                _ if is_name_start(c) => self.word(),
                _ if c.is_ascii_digit() => self.number()?,
                '+' | '-' if self.peek_at(1).is_some_and(|n| n.is_ascii_digit() || n == 'i') => {
                    self.number()?
                }
                _ => return Err(self.error(column, ParseErrorKind::UnexpectedCharacter(c))),
            };
            tokens.push((token, column));
        }
        log::trace!("line {}: {} tokens from {:?}", self.line, tokens.len(), self.text);
        Ok(tokens)
    }

    fn name(&mut self) -> String {
        let start = self.pos;
        while self.peek_at(0).is_some_and(is_name_char) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn word(&mut self) -> Token {
        let word = self.name();
        if self.peek_at(0) == Some(':') && self.peek_at(1) != Some(':') {
            self.pos += 1;
            return Token::Key(word);
        }
        match word.as_str() {
            "true" => Token::Value(Value::Bool(true)),
            "false" => Token::Value(Value::Bool(false)),
            "nan" => Token::Value(Value::Float(f64::NAN)),
            "inf" => Token::Value(Value::Float(f64::INFINITY)),
            _ => Token::Name(word),
        }
    }

    fn number(&mut self) -> Result<Token, ParseError> {
        let column = self.pos + 1;
        let start = self.pos;
        let negative = self.peek_at(0) == Some('-');
        if matches!(self.peek_at(0), Some('+' | '-')) {
            self.pos += 1;
        }
        let body_start = self.pos;
        while let Some(c) = self.peek_at(0) {
            let exponent_sign = matches!(c, '+' | '-')
                && matches!(self.chars.get(self.pos - 1), Some('e' | 'E'))
                && !self.chars[body_start..].starts_with(&['0', 'x'])
                && !self.chars[body_start..].starts_with(&['0', 'X']);
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' || exponent_sign {
                self.pos += 1;
            } else {
                break;
            }
        }
        let body: String = self.chars[body_start..self.pos].iter().collect();
        parse_number(negative, &body).map(Token::Value).ok_or_else(|| {
            let literal: String = self.chars[start..self.pos].iter().collect();
            self.error(column, ParseErrorKind::InvalidNumber(literal))
        })
    }

    fn string(&mut self) -> Result<String, ParseError> {
        let column = self.pos + 1;
        self.pos += 1;
        let mut text = String::new();
        loop {
            let Some(c) = self.peek_at(0) else {
                return Err(self.error(column, ParseErrorKind::UnterminatedString));
            };
            self.pos += 1;
            match c {
                '"' => return Ok(text),
                '\\' => text.push(self.escape()?),
                _ => text.push(c),
            }
        }
    }

    fn escape(&mut self) -> Result<char, ParseError> {
        let column = self.pos;
        let Some(c) = self.peek_at(0) else {
            return Err(self.error(column, ParseErrorKind::UnterminatedString));
        };
        self.pos += 1;
        match c {
            'n' => Ok('\n'),
            't' => Ok('\t'),
            'r' => Ok('\r'),
            '0' => Ok('\0'),
            '\\' => Ok('\\'),
            '"' => Ok('"'),
            'x' => {
                let digits: String = self.chars.iter().skip(self.pos).take(2).collect();
                self.pos += digits.chars().count();
                u8::from_str_radix(&digits, 16)
                    .ok()
                    .filter(|byte| byte.is_ascii() && digits.len() == 2)
                    .map(char::from)
                    .ok_or_else(|| self.invalid_escape(column, format!("x{digits}")))
            }
            'u' => {
                if self.peek_at(0) != Some('{') {
                    return Err(self.invalid_escape(column, "u".to_string()));
                }
                let close = self.chars[self.pos..].iter().position(|&c| c == '}');
                let Some(close) = close else {
                    return Err(self.invalid_escape(column, "u{".to_string()));
                };
                let digits: String = self.chars[self.pos + 1..self.pos + close].iter().collect();
                self.pos += close + 1;
                u32::from_str_radix(&digits, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| self.invalid_escape(column, format!("u{{{digits}}}")))
            }
            other => Err(self.invalid_escape(column, other.to_string())),
        }
    }
}

const fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

const fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Parses an unsigned numeric literal body; `negative` applies the sign.
///
/// Integers take `0x`, `0o` and `0b` prefixes and `_` separators. Bodies with
/// a `.` or a decimal exponent are floats.
fn parse_number(negative: bool, body: &str) -> Option<Value> {
    if body == "inf" {
        let inf = if negative { f64::NEG_INFINITY } else { f64::INFINITY };
        return Some(Value::Float(inf));
    }
    let cleaned = body.replace('_', "");
    let radix = match cleaned.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        let digits = &cleaned[2..];
        if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
            return None;
        }
        return u128::from_str_radix(digits, radix)
            .ok()
            .map(|magnitude| Value::Int(Int::new(negative, magnitude)));
    }
    if !cleaned.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return None;
    }
    if cleaned.contains(['.', 'e', 'E']) {
        let value: f64 = cleaned.parse().ok()?;
        return Some(Value::Float(if negative { -value } else { value }));
    }
    if !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    cleaned
        .parse::<u128>()
        .ok()
        .map(|magnitude| Value::Int(Int::new(negative, magnitude)))
}

/// Classifies one source line.
///
/// # Errors
///
/// Returns a [`ParseError`] for malformed literals or argument lists.
#[allow(clippy::option_if_let_else)]
pub fn parse_line(text: &str, line: usize) -> Result<Line, ParseError> {
    let mut tokens = Lexer::new(text, line).tokens()?.into_iter().peekable();

    let Some((first, column)) = tokens.next() else {
        return Ok(Line::Blank);
    };
    let Token::Name(name) = first else {
        return Err(ParseError::at(line, column, ParseErrorKind::ExpectedCommand));
    };

    let mut rest: Vec<(Token, usize)> = tokens.collect();
    if name == "end" {
        return match rest.first() {
            None => Ok(Line::End),
            Some((token, column)) => Err(ParseError::at(
                line,
                *column,
                ParseErrorKind::ExpectedValue(token.describe()),
            )),
        };
    }

    let opens_block = matches!(rest.last(), Some((Token::Name(word), _)) if word == "do");
    if opens_block {
        rest.pop();
    }

    let args = parse_arguments(rest, line)?;
    Ok(Line::Statement {
        operation: Operation::new(name, args),
        opens_block,
    })
}

fn parse_arguments(tokens: Vec<(Token, usize)>, line: usize) -> Result<Vec<Value>, ParseError> {
    let mut args = Vec::new();
    let mut entries: Vec<(String, Value)> = Vec::new();
    let mut tokens = tokens.into_iter().peekable();

    while let Some((token, column)) = tokens.next() {
        match token {
            Token::Value(value) => {
                if !entries.is_empty() {
                    return Err(ParseError::at(
                        line,
                        column,
                        ParseErrorKind::PositionalAfterKeyword,
                    ));
                }
                args.push(value);
            }
            Token::Key(key) => {
                let value = match tokens.next() {
                    Some((Token::Value(value), _)) => value,
                    Some((other, column)) => {
                        return Err(ParseError::at(
                            line,
                            column,
                            ParseErrorKind::ExpectedValue(other.describe()),
                        ))
                    }
                    None => {
                        return Err(ParseError::at(
                            line,
                            column,
                            ParseErrorKind::ExpectedValue("end of line".to_string()),
                        ))
                    }
                };
                if entries.iter().any(|(existing, _)| *existing == key) {
                    return Err(ParseError::at(line, column, ParseErrorKind::DuplicateKey(key)));
                }
                entries.push((key, value));
            }
            other => {
                return Err(ParseError::at(
                    line,
                    column,
                    ParseErrorKind::ExpectedValue(other.describe()),
                ))
            }
        }

        match tokens.next() {
            None => break,
            Some((Token::Comma, column)) => {
                if tokens.peek().is_none() {
                    return Err(ParseError::at(
                        line,
                        column,
                        ParseErrorKind::ExpectedValue("end of line".to_string()),
                    ));
                }
            }
            Some((_, column)) => {
                return Err(ParseError::at(line, column, ParseErrorKind::ExpectedComma));
            }
        }
    }

    if !entries.is_empty() {
        args.push(Value::Map(entries));
    }
    Ok(args)
}

struct OpenBlock {
    operation: Operation,
    line: usize,
    body: Vec<Operation>,
}

/// Parses a whole script, nesting `do ... end` blocks.
///
/// # Errors
///
/// Returns the first [`ParseError`], including unbalanced blocks.
pub fn parse_script(source: &Source) -> Result<Script, ParseError> {
    let mut script = Script::default();
    let mut open: Vec<OpenBlock> = Vec::new();

    for source_line in &source.lines {
        let line = source_line.number;
        match parse_line(&source_line.text, line)? {
            Line::Blank => {}
            Line::Statement {
                operation,
                opens_block: true,
            } => open.push(OpenBlock {
                operation,
                line,
                body: Vec::new(),
            }),
            Line::Statement {
                operation,
                opens_block: false,
            } => attach(&mut script, &mut open, operation, line),
            Line::End => {
                let block = open
                    .pop()
                    .ok_or_else(|| ParseError::at(line, 1, ParseErrorKind::UnmatchedEnd))?;
                let operation = block.operation.with_block(block.body);
                attach(&mut script, &mut open, operation, block.line);
            }
        }
    }

    if let Some(block) = open.pop() {
        return Err(ParseError::at(
            block.line,
            1,
            ParseErrorKind::UnclosedBlock(block.operation.name().to_string()),
        ));
    }
    log::debug!(
        "parsed {} top-level statements from {}",
        script.statements.len(),
        source.name
    );
    Ok(script)
}

#[allow(clippy::option_if_let_else)]
fn attach(script: &mut Script, open: &mut [OpenBlock], operation: Operation, line: usize) {
    match open.last_mut() {
        Some(block) => block.body.push(operation),
        None => script.statements.push(Statement { operation, line }),
    }
}

#[cfg(test)]
mod tests {
    use bindef_core::{Int, Operation, Value};
    use rstest::rstest;

    use super::{parse_line, parse_script, Line, ParseErrorKind};
    use crate::source::Source;

    fn statement(text: &str) -> (Operation, bool) {
        match parse_line(text, 1).unwrap() {
            Line::Statement {
                operation,
                opens_block,
            } => (operation, opens_block),
            other => panic!("expected statement, got {other:?}"),
        }
    }

    fn args(text: &str) -> Vec<Value> {
        statement(text).0.args().to_vec()
    }

    #[test]
    fn blank_and_comment_lines() {
        assert_eq!(parse_line("", 1).unwrap(), Line::Blank);
        assert_eq!(parse_line("   # only a note", 1).unwrap(), Line::Blank);
        assert_eq!(parse_line("end", 1).unwrap(), Line::End);
    }

    #[test]
    fn positional_arguments() {
        let (op, opens) = statement("lstr :u8, \"foo\" # trailing");
        assert_eq!(op.name(), "lstr");
        assert_eq!(op.args(), [Value::symbol("u8"), Value::str("foo")]);
        assert!(!opens);
    }

    #[test]
    fn keyword_pairs_become_one_mapping() {
        assert_eq!(
            args("tlv_u8 1, u32: 0xFF00_FF00"),
            [
                Value::int(1u8),
                Value::entry("u32", Value::int(0xFF00_FF00u32))
            ]
        );
        assert_eq!(
            args("pragma endian: :big, encoding: \"utf-16le\""),
            [Value::Map(vec![
                ("endian".into(), Value::symbol("big")),
                ("encoding".into(), Value::str("utf-16le")),
            ])]
        );
    }

    #[test]
    fn do_opens_a_block() {
        let (op, opens) = statement("pragma verbose: true do");
        assert!(opens);
        assert_eq!(op.args(), [Value::entry("verbose", Value::Bool(true))]);
    }

    #[rstest]
    #[case("u8 255", Value::int(255u8))]
    #[case("u8 -1", Value::Int(Int::from(-1i8)))]
    #[case("u8 0b1010", Value::int(10u8))]
    #[case("u8 0o17", Value::int(15u8))]
    #[case("u8 1_000", Value::int(1000u16))]
    #[case("u128 0xFFFF_FFFF_FFFF_FFFF_FFFF_FFFF_FFFF_FFFF", Value::Int(Int::from_u128(u128::MAX)))]
    #[case("u128 -0xFFFF_FFFF_FFFF_FFFF_FFFF_FFFF_FFFF_FFFF", Value::Int(Int::new(true, u128::MAX)))]
    #[case("f64 1.5", Value::Float(1.5))]
    #[case("f64 -2.5e3", Value::Float(-2500.0))]
    #[case("f32 1e-2", Value::Float(0.01))]
    #[case("f64 -inf", Value::Float(f64::NEG_INFINITY))]
    #[case("f64 inf", Value::Float(f64::INFINITY))]
    #[case("str \"a\\tb\\n\"", Value::str("a\tb\n"))]
    #[case("str \"\\x41\\u{e9}\\0\\\\\\\"\"", Value::str("A\u{e9}\0\\\""))]
    #[case("u8 false", Value::Bool(false))]
    fn literals(#[case] text: &str, #[case] expected: Value) {
        assert_eq!(args(text), [expected]);
    }

    #[test]
    fn nan_literal() {
        assert!(matches!(args("f64 nan")[..], [Value::Float(x)] if x.is_nan()));
    }

    #[rstest]
    #[case("u8 1 2", ParseErrorKind::ExpectedComma)]
    #[case("u8 0xZZ", ParseErrorKind::InvalidNumber("0xZZ".into()))]
    #[case("u8 12abc", ParseErrorKind::InvalidNumber("12abc".into()))]
    #[case("u128 0x1_0000_0000_0000_0000_0000_0000_0000_0000", ParseErrorKind::InvalidNumber("0x1_0000_0000_0000_0000_0000_0000_0000_0000".into()))]
    #[case("str \"open", ParseErrorKind::UnterminatedString)]
    #[case("str \"\\q\"", ParseErrorKind::InvalidEscape("q".into()))]
    #[case("str \"\\xFF\"", ParseErrorKind::InvalidEscape("xFF".into()))]
    #[case("42", ParseErrorKind::ExpectedCommand)]
    #[case("u8 $", ParseErrorKind::UnexpectedCharacter('$'))]
    #[case("u8 foo", ParseErrorKind::ExpectedValue("`foo`".into()))]
    #[case("u8 1,", ParseErrorKind::ExpectedValue("end of line".into()))]
    #[case("pragma verbose:", ParseErrorKind::ExpectedValue("end of line".into()))]
    #[case("tlv_u8 u8: 1, 2", ParseErrorKind::PositionalAfterKeyword)]
    #[case("pragma verbose: true, verbose: false", ParseErrorKind::DuplicateKey("verbose".into()))]
    fn malformed_lines(#[case] text: &str, #[case] kind: ParseErrorKind) {
        assert_eq!(parse_line(text, 3).unwrap_err().kind, kind);
    }

    #[test]
    fn errors_carry_columns() {
        let error = parse_line("u8 1 $", 7).unwrap_err();
        assert_eq!(error.location.line, 7);
        assert_eq!(error.location.column, 6);
    }

    #[test]
    fn blocks_nest() {
        let source = Source::from_text(
            "nested",
            "u8 1\npragma endian: :big do\n  u16 2\n  pragma encoding: \"utf-16le\" do\n    str \"x\"\n  end\nend\nu8 3\n",
        );
        let script = parse_script(&source).unwrap();
        assert_eq!(script.statements.len(), 3);
        assert_eq!(script.statements[1].line, 2);
        assert_eq!(script.statements[2].line, 8);

        let outer = script.statements[1].operation.block().unwrap();
        assert_eq!(outer.len(), 2);
        assert_eq!(outer[0].name(), "u16");
        assert_eq!(outer[1].block().map(<[Operation]>::len), Some(1));
    }

    #[test]
    fn unbalanced_blocks_are_rejected() {
        let unmatched = parse_script(&Source::from_text("s", "u8 1\nend\n")).unwrap_err();
        assert_eq!(unmatched.kind, ParseErrorKind::UnmatchedEnd);
        assert_eq!(unmatched.location.line, 2);

        let unclosed =
            parse_script(&Source::from_text("s", "u8 1\npragma verbose: true do\nu8 2\n")).unwrap_err();
        assert_eq!(unclosed.kind, ParseErrorKind::UnclosedBlock("pragma".into()));
        assert_eq!(unclosed.location.line, 2);
    }
}

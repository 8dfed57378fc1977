//! Hand-rolled lexer producing a token stream with source positions.

use std::iter::Peekable;
use std::str::CharIndices;

use crate::span::SourcePosition;

#[derive(Clone, Debug, PartialEq)]
pub enum Token<'a> {
    Name(&'a str),
    /// Canonical textual form; converted to `i32` only at value-visiting time.
    Int(&'a str),
    /// Canonical textual form; converted to `f64` only at value-visiting time.
    Float(&'a str),
    String(String),
    BlockString(String),
    ExclamationMark,
    Dollar,
    ParenOpen,
    ParenClose,
    BracketOpen,
    BracketClose,
    BraceOpen,
    BraceClose,
    Colon,
    Equals,
    At,
    Pipe,
    Ellipsis,
    EndOfFile,
}

impl std::fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Name(n) => write!(f, "{n}"),
            Token::Int(i) => write!(f, "{i}"),
            Token::Float(fl) => write!(f, "{fl}"),
            Token::String(s) | Token::BlockString(s) => write!(f, "{s:?}"),
            Token::ExclamationMark => write!(f, "!"),
            Token::Dollar => write!(f, "$"),
            Token::ParenOpen => write!(f, "("),
            Token::ParenClose => write!(f, ")"),
            Token::BracketOpen => write!(f, "["),
            Token::BracketClose => write!(f, "]"),
            Token::BraceOpen => write!(f, "{{"),
            Token::BraceClose => write!(f, "}}"),
            Token::Colon => write!(f, ":"),
            Token::Equals => write!(f, "="),
            Token::At => write!(f, "@"),
            Token::Pipe => write!(f, "|"),
            Token::Ellipsis => write!(f, "..."),
            Token::EndOfFile => write!(f, "<EOF>"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum LexerError {
    UnknownCharacter(char),
    UnexpectedCharacter(char),
    UnterminatedString,
    UnknownCharacterInString(char),
    UnknownEscapeSequence(String),
    UnexpectedEndOfFile,
    InvalidNumber,
}

impl std::fmt::Display for LexerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LexerError::UnknownCharacter(c) => write!(f, "unknown character \"{c}\""),
            LexerError::UnexpectedCharacter(c) => write!(f, "unexpected character \"{c}\""),
            LexerError::UnterminatedString => write!(f, "unterminated string literal"),
            LexerError::UnknownCharacterInString(c) => {
                write!(f, "unknown character \"{c}\" in string literal")
            }
            LexerError::UnknownEscapeSequence(s) => write!(f, "unknown escape sequence \"{s}\" in string"),
            LexerError::UnexpectedEndOfFile => write!(f, "unexpected end of input"),
            LexerError::InvalidNumber => write!(f, "invalid number literal"),
        }
    }
}

pub type LexerResult<'a> = Result<(SourcePosition, Token<'a>, SourcePosition), (SourcePosition, LexerError)>;

pub struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    position: SourcePosition,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        let source = source.strip_prefix('\u{FEFF}').unwrap_or(source);
        Lexer { source, chars: source.char_indices().peekable(), position: SourcePosition::start() }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn next_char(&mut self) -> Option<char> {
        let c = self.chars.next().map(|(_, c)| c);
        if let Some(c) = c {
            self.position.advance(c);
        }
        c
    }

    fn slice_from(&self, start_index: usize) -> &'a str {
        let end_index = self.chars.peek().map(|&(i, _)| i).unwrap_or(self.source.len());
        &self.source[start_index..end_index]
    }

    fn scan_over_whitespace(&mut self) {
        loop {
            match self.peek_char() {
                Some(c) if c.is_whitespace() || c == ',' => {
                    self.next_char();
                }
                Some('#') => {
                    while let Some(c) = self.peek_char() {
                        if c == '\n' {
                            break;
                        }
                        self.next_char();
                    }
                }
                _ => break,
            }
        }
    }

    fn scan_ellipsis(&mut self) -> Result<Token<'a>, LexerError> {
        for _ in 0..2 {
            match self.next_char() {
                Some('.') => {}
                Some(c) => return Err(LexerError::UnexpectedCharacter(c)),
                None => return Err(LexerError::UnexpectedEndOfFile),
            }
        }
        Ok(Token::Ellipsis)
    }

    fn scan_name(&mut self, start_index: usize) -> Token<'a> {
        while matches!(self.peek_char(), Some(c) if is_name_cont(c)) {
            self.next_char();
        }
        Token::Name(self.slice_from(start_index))
    }

    fn scan_number(&mut self, start_index: usize) -> Result<Token<'a>, LexerError> {
        let mut is_float = false;

        if self.peek_char() == Some('-') {
            self.next_char();
        }
        self.scan_integer_part()?;

        if self.peek_char() == Some('.') {
            is_float = true;
            self.next_char();
            if !matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
                return Err(LexerError::InvalidNumber);
            }
            self.scan_digits();
        }

        if matches!(self.peek_char(), Some('e') | Some('E')) {
            is_float = true;
            self.next_char();
            if matches!(self.peek_char(), Some('+') | Some('-')) {
                self.next_char();
            }
            if !matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
                return Err(LexerError::InvalidNumber);
            }
            self.scan_digits();
        }

        let text = self.slice_from(start_index);
        Ok(if is_float { Token::Float(text) } else { Token::Int(text) })
    }

    fn scan_integer_part(&mut self) -> Result<(), LexerError> {
        match self.peek_char() {
            Some('0') => {
                self.next_char();
                if matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
                    return Err(LexerError::InvalidNumber);
                }
                Ok(())
            }
            Some(c) if c.is_ascii_digit() => {
                self.scan_digits();
                Ok(())
            }
            _ => Err(LexerError::InvalidNumber),
        }
    }

    fn scan_digits(&mut self) {
        while matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
            self.next_char();
        }
    }

    fn scan_block_string(&mut self) -> Result<Token<'a>, LexerError> {
        let mut raw = String::new();
        loop {
            match self.next_char() {
                None => return Err(LexerError::UnterminatedString),
                Some('"') if self.peek_char() == Some('"') => {
                    self.next_char();
                    if self.peek_char() == Some('"') {
                        self.next_char();
                        break;
                    }
                    raw.push('"');
                    raw.push('"');
                }
                Some('\\') if self.source[self.position.index..].starts_with("\"\"\"") => {
                    self.next_char();
                    self.next_char();
                    self.next_char();
                    raw.push_str("\"\"\"");
                }
                Some(c) => raw.push(c),
            }
        }
        Ok(Token::BlockString(dedent_block_string(&raw)))
    }

    fn scan_string(&mut self) -> Result<Token<'a>, LexerError> {
        let mut value = String::new();
        loop {
            match self.next_char() {
                None => return Err(LexerError::UnterminatedString),
                Some('"') => break,
                Some('\n') | Some('\r') => return Err(LexerError::UnterminatedString),
                Some('\\') => value.push(self.scan_escape()?),
                Some(c) if (c as u32) < 0x20 => return Err(LexerError::UnknownCharacterInString(c)),
                Some(c) => value.push(c),
            }
        }
        Ok(Token::String(value))
    }

    fn scan_escape(&mut self) -> Result<char, LexerError> {
        match self.next_char() {
            Some('"') => Ok('"'),
            Some('\\') => Ok('\\'),
            Some('/') => Ok('/'),
            Some('b') => Ok('\u{8}'),
            Some('f') => Ok('\u{c}'),
            Some('n') => Ok('\n'),
            Some('r') => Ok('\r'),
            Some('t') => Ok('\t'),
            Some('u') => self.scan_escaped_unicode(),
            Some(c) => Err(LexerError::UnknownEscapeSequence(format!("\\{c}"))),
            None => Err(LexerError::UnterminatedString),
        }
    }

    fn scan_escaped_unicode(&mut self) -> Result<char, LexerError> {
        let mut code: u32 = 0;
        for _ in 0..4 {
            let c = self.next_char().ok_or(LexerError::UnterminatedString)?;
            let digit = c.to_digit(16).ok_or_else(|| LexerError::UnknownEscapeSequence(format!("\\u{c}")))?;
            code = code * 16 + digit;
        }
        char::from_u32(code).ok_or(LexerError::InvalidNumber)
    }
}

fn dedent_block_string(raw: &str) -> String {
    let lines: Vec<&str> = raw.split('\n').collect();
    let common_indent = lines
        .iter()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut out: Vec<&str> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| if i == 0 { *line } else { line.get(common_indent..).unwrap_or("") })
        .collect();

    while out.first().is_some_and(|l| l.trim().is_empty()) {
        out.remove(0);
    }
    while out.last().is_some_and(|l| l.trim().is_empty()) {
        out.pop();
    }

    out.join("\n")
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_cont(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_number_start(c: char) -> bool {
    c.is_ascii_digit() || c == '-'
}

impl<'a> Iterator for Lexer<'a> {
    type Item = LexerResult<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.scan_over_whitespace();
        let start = self.position;
        let (start_index, c) = match self.chars.peek().copied() {
            Some(pair) => pair,
            None => return None,
        };

        let result = match c {
            '!' => {
                self.next_char();
                Ok(Token::ExclamationMark)
            }
            '$' => {
                self.next_char();
                Ok(Token::Dollar)
            }
            '(' => {
                self.next_char();
                Ok(Token::ParenOpen)
            }
            ')' => {
                self.next_char();
                Ok(Token::ParenClose)
            }
            '[' => {
                self.next_char();
                Ok(Token::BracketOpen)
            }
            ']' => {
                self.next_char();
                Ok(Token::BracketClose)
            }
            '{' => {
                self.next_char();
                Ok(Token::BraceOpen)
            }
            '}' => {
                self.next_char();
                Ok(Token::BraceClose)
            }
            ':' => {
                self.next_char();
                Ok(Token::Colon)
            }
            '=' => {
                self.next_char();
                Ok(Token::Equals)
            }
            '@' => {
                self.next_char();
                Ok(Token::At)
            }
            '|' => {
                self.next_char();
                Ok(Token::Pipe)
            }
            '.' => self.scan_ellipsis(),
            '"' => {
                self.next_char();
                if self.source[self.position.index..].starts_with("\"\"") {
                    self.next_char();
                    self.next_char();
                    self.scan_block_string()
                } else {
                    self.scan_string()
                }
            }
            c if is_name_start(c) => Ok(self.scan_name(start_index)),
            c if is_number_start(c) => self.scan_number(start_index),
            c => {
                self.next_char();
                Err(LexerError::UnknownCharacter(c))
            }
        };

        let end = self.position;
        Some(result.map(|token| (start, token, end)).map_err(|err| (start, err)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token<'_>> {
        Lexer::new(source).map(|r| r.unwrap().1).collect()
    }

    #[test]
    fn lexes_punctuation() {
        assert_eq!(
            tokens("{ a(b: $c) }"),
            vec![
                Token::BraceOpen,
                Token::Name("a"),
                Token::ParenOpen,
                Token::Name("b"),
                Token::Colon,
                Token::Dollar,
                Token::Name("c"),
                Token::ParenClose,
                Token::BraceClose,
            ]
        );
    }

    #[test]
    fn lexes_numbers_as_canonical_text() {
        assert_eq!(tokens("42 -7 3.14 6.0e10"), vec![
            Token::Int("42"),
            Token::Int("-7"),
            Token::Float("3.14"),
            Token::Float("6.0e10"),
        ]);
    }

    #[test]
    fn rejects_leading_zero() {
        let mut lexer = Lexer::new("007");
        assert!(matches!(lexer.next(), Some(Err((_, LexerError::InvalidNumber)))));
    }

    #[test]
    fn lexes_strings_with_escapes() {
        assert_eq!(tokens(r#""a\nbA""#), vec![Token::String("a\nbA".to_owned())]);
    }

    #[test]
    fn lexes_block_strings_with_dedent() {
        let source = "\"\"\"\n    line one\n    line two\n    \"\"\"";
        assert_eq!(tokens(source), vec![Token::BlockString("line one\nline two".to_owned())]);
    }

    #[test]
    fn strips_leading_bom() {
        assert_eq!(tokens("\u{FEFF}{ a }"), vec![Token::BraceOpen, Token::Name("a"), Token::BraceClose]);
    }

    #[test]
    fn skips_comments_and_commas() {
        assert_eq!(tokens("a, # a comment\n b"), vec![Token::Name("a"), Token::Name("b")]);
    }
}

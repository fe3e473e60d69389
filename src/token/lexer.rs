//! A straightforward internal tokenizer.
//!
//! Production use is expected to plug in a faster, SIMD-accelerated
//! tokenizer built and maintained elsewhere; this one exists so the parser
//! has something to run against in its own tests and so callers without
//! that collaborator still have a working front end end-to-end.

use crate::error::{ParseError, ParseErrorKind, Result};
use crate::token::{Keyword, Token, TokenKind};

struct Scanner<'a> {
    chars: Vec<char>,
    src: &'a str,
    pos: usize,
    byte_pos: u32,
    line: u32,
    column: u32,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            chars: src.chars().collect(),
            src,
            pos: 0,
            byte_pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        self.byte_pos += c.len_utf8() as u32;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('-') if self.peek_at(1) == Some('-') => {
                    while !matches!(self.peek(), None | Some('\n')) {
                        self.bump();
                    }
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    self.bump();
                    self.bump();
                    while self.peek().is_some() && !(self.peek() == Some('*') && self.peek_at(1) == Some('/')) {
                        self.bump();
                    }
                    self.bump();
                    self.bump();
                }
                _ => break,
            }
        }
    }

    /// `text`'s byte length always equals the bytes just consumed (every
    /// scan function pushes exactly the source bytes it bumps past), so the
    /// token's start falls out of the current position without threading a
    /// separate offset through every scan function.
    fn make(&self, kind: TokenKind, text: String, keyword: Option<Keyword>, line: u32, column: u32) -> Token {
        let byte_end = self.byte_pos;
        let byte_start = byte_end - text.len() as u32;
        Token { kind, text, keyword, line, column, byte_start, byte_end }
    }

    fn err(&self, kind: ParseErrorKind, line: u32, column: u32) -> ParseError {
        ParseError::new(kind, line, column)
    }
}

/// Produce the filtered, EOF-terminated token stream the parser consumes.
///
/// Whitespace and comments (`--` line comments, `/* ... */` block comments)
/// never surface as tokens.
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut scanner = Scanner::new(source);
    let mut tokens = Vec::new();

    loop {
        scanner.skip_trivia();
        let (line, column) = (scanner.line, scanner.column);
        let Some(c) = scanner.peek() else {
            tokens.push(scanner.make(TokenKind::Eof, String::new(), None, line, column));
            break;
        };

        if c == '\'' {
            tokens.push(scan_string(&mut scanner, line, column)?);
            continue;
        }

        if c == '"' {
            tokens.push(scan_quoted_identifier(&mut scanner, line, column)?);
            continue;
        }

        if c.is_ascii_digit() {
            tokens.push(scan_number(&mut scanner, line, column));
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            tokens.push(scan_word(&mut scanner, line, column));
            continue;
        }

        if "(),;[]".contains(c) || c == '.' {
            scanner.bump();
            tokens.push(scanner.make(TokenKind::Delimiter, c.to_string(), None, line, column));
            continue;
        }

        tokens.push(scan_operator(&mut scanner, line, column)?);
    }

    Ok(tokens)
}

fn scan_string(scanner: &mut Scanner, line: u32, column: u32) -> Result<Token> {
    let mut text = String::new();
    text.push(scanner.bump().expect("caller checked opening quote"));
    loop {
        match scanner.peek() {
            None => return Err(scanner.err(ParseErrorKind::UnterminatedConstruct("string literal".into()), line, column)),
            Some('\'') if scanner.peek_at(1) == Some('\'') => {
                text.push(scanner.bump().unwrap());
                text.push(scanner.bump().unwrap());
            }
            Some('\'') => {
                text.push(scanner.bump().unwrap());
                break;
            }
            Some(_) => {
                text.push(scanner.bump().unwrap());
            }
        }
    }
    Ok(scanner.make(TokenKind::String, text, None, line, column))
}

fn scan_quoted_identifier(scanner: &mut Scanner, line: u32, column: u32) -> Result<Token> {
    let mut text = String::new();
    text.push(scanner.bump().expect("caller checked opening quote"));
    loop {
        match scanner.peek() {
            None => return Err(scanner.err(ParseErrorKind::UnterminatedConstruct("quoted identifier".into()), line, column)),
            Some('"') => {
                text.push(scanner.bump().unwrap());
                break;
            }
            Some(_) => {
                text.push(scanner.bump().unwrap());
            }
        }
    }
    Ok(scanner.make(TokenKind::Identifier, text, None, line, column))
}

fn scan_number(scanner: &mut Scanner, line: u32, column: u32) -> Token {
    let start = scanner.pos;
    while matches!(scanner.peek(), Some(c) if c.is_ascii_digit()) {
        scanner.bump();
    }
    if scanner.peek() == Some('.') && matches!(scanner.peek_at(1), Some(c) if c.is_ascii_digit()) {
        scanner.bump();
        while matches!(scanner.peek(), Some(c) if c.is_ascii_digit()) {
            scanner.bump();
        }
    }
    if matches!(scanner.peek(), Some('e') | Some('E')) {
        let save = scanner.pos;
        scanner.bump();
        if matches!(scanner.peek(), Some('+') | Some('-')) {
            scanner.bump();
        }
        if matches!(scanner.peek(), Some(c) if c.is_ascii_digit()) {
            while matches!(scanner.peek(), Some(c) if c.is_ascii_digit()) {
                scanner.bump();
            }
        } else {
            scanner.pos = save;
        }
    }
    let text: String = scanner.chars[start..scanner.pos].iter().collect();
    scanner.make(TokenKind::Number, text, None, line, column)
}

fn scan_word(scanner: &mut Scanner, line: u32, column: u32) -> Token {
    let start = scanner.pos;
    while matches!(scanner.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
        scanner.bump();
    }
    let text: String = scanner.chars[start..scanner.pos].iter().collect();
    match Keyword::from_str(&text) {
        Some(kw) => scanner.make(TokenKind::Keyword, text, Some(kw), line, column),
        None => scanner.make(TokenKind::Identifier, text, None, line, column),
    }
}

fn scan_operator(scanner: &mut Scanner, line: u32, column: u32) -> Result<Token> {
    const THREE_CHAR: &[&str] = &["===", "!=="];
    const TWO_CHAR: &[&str] = &["<=", ">=", "<>", "!=", "==", "||", "<<", ">>"];

    let rest: String = scanner.chars[scanner.pos..(scanner.pos + 3).min(scanner.chars.len())]
        .iter()
        .collect();

    for op in THREE_CHAR {
        if rest.starts_with(op) {
            for _ in 0..3 {
                scanner.bump();
            }
            return Ok(scanner.make(TokenKind::Operator, (*op).to_string(), None, line, column));
        }
    }
    for op in TWO_CHAR {
        if rest.starts_with(op) {
            for _ in 0..2 {
                scanner.bump();
            }
            return Ok(scanner.make(TokenKind::Operator, (*op).to_string(), None, line, column));
        }
    }

    let c = scanner.bump().expect("caller checked a character is present");
    if "+-*/%=<>&|^~".contains(c) {
        Ok(scanner.make(TokenKind::Operator, c.to_string(), None, line, column))
    } else {
        Err(scanner.err(ParseErrorKind::UnexpectedToken(format!("unexpected character '{c}'")), line, column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(sql: &str) -> Vec<TokenKind> {
        tokenize(sql).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn basic_select_tokenizes() {
        let tokens = tokenize("SELECT * FROM users WHERE id = 1").unwrap();
        assert_eq!(tokens.first().unwrap().keyword, Some(Keyword::Select));
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn string_literal_keeps_quotes_and_handles_doubled_quote_escape() {
        let tokens = tokenize("'it''s'").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].text, "'it''s'");
    }

    #[test]
    fn comments_are_skipped() {
        let tokens = tokenize("SELECT 1 -- trailing comment\n/* block */ FROM t").unwrap();
        let ks = kinds("SELECT 1 -- trailing comment\n/* block */ FROM t");
        assert!(ks.contains(&TokenKind::Keyword));
        assert!(tokens.iter().any(|t| t.is(Keyword::From)));
    }

    #[test]
    fn strict_operators_tokenize_without_judgement() {
        let tokens = tokenize("a == b").unwrap();
        assert!(tokens.iter().any(|t| t.is_operator("==")));
    }

    #[test]
    fn line_and_column_advance_across_newlines() {
        let tokens = tokenize("SELECT 1\nFROM t").unwrap();
        let from = tokens.iter().find(|t| t.is(Keyword::From)).unwrap();
        assert_eq!(from.line, 2);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert!(tokenize("'abc").is_err());
    }

    #[test]
    fn byte_offsets_cover_each_token_exactly() {
        let sql = "SELECT a FROM t";
        let tokens = tokenize(sql).unwrap();
        for tok in &tokens {
            if tok.kind == TokenKind::Eof {
                continue;
            }
            let slice = &sql[tok.byte_start as usize..tok.byte_end as usize];
            assert_eq!(slice, tok.text);
        }
        let eof = tokens.last().unwrap();
        assert_eq!(eof.byte_start as usize, sql.len());
        assert_eq!(eof.byte_end as usize, sql.len());
    }

    #[test]
    fn byte_offsets_account_for_multibyte_characters_before_a_token() {
        let sql = "SELECT 'caf\u{e9}' FROM t";
        let tokens = tokenize(sql).unwrap();
        let from = tokens.iter().find(|t| t.is(Keyword::From)).unwrap();
        assert_eq!(&sql[from.byte_start as usize..from.byte_end as usize], "FROM");
    }
}

//! Tokenizer for the Xcode ASCII plist dialect.

use crate::error::{Location, ParseErrorKind};
use crate::lexical::{decode_escape, is_comment_start, is_unquoted_char, CommentKind};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    LBrace,
    RBrace,
    LParen,
    RParen,
    Equals,
    Semicolon,
    Comma,
    Ident(String),
    QuotedString(String),
    Data(Vec<u8>),
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

pub struct Tokenizer<'a> {
    src: &'a [u8],
    pos: usize,
    line: usize,
    line_start: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(src: &'a [u8]) -> Self {
        Self { src, pos: 0, line: 1, line_start: 0 }
    }

    fn loc(&self, offset: usize) -> Location {
        location_at(self.src, offset)
    }

    fn peek_byte(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn advance_byte(&mut self) -> Option<u8> {
        let b = self.peek_byte()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
            self.line_start = self.pos;
        }
        Some(b)
    }

    fn skip_ws_and_comments(&mut self) -> Result<(), ParseErrorKind> {
        loop {
            while matches!(self.peek_byte(), Some(b) if b.is_ascii_whitespace()) {
                self.advance_byte();
            }
            match is_comment_start(&self.src[self.pos..]) {
                Some(CommentKind::Line) => {
                    while !matches!(self.peek_byte(), None | Some(b'\n')) {
                        self.advance_byte();
                    }
                }
                Some(CommentKind::Block) => {
                    let start = self.pos;
                    self.pos += 2;
                    loop {
                        if self.pos + 1 >= self.src.len() {
                            return Err(ParseErrorKind::ParseSyntax {
                                message: "unterminated block comment".into(),
                                location: self.loc(start),
                            });
                        }
                        if self.src[self.pos] == b'*' && self.src[self.pos + 1] == b'/' {
                            self.pos += 2;
                            break;
                        }
                        self.advance_byte();
                    }
                }
                None => break,
            }
        }
        Ok(())
    }

    pub fn next_token(&mut self) -> Result<Token, ParseErrorKind> {
        self.skip_ws_and_comments()?;
        let start = self.pos;
        let (line, column) = (self.line, start - self.line_start + 1);

        let Some(b) = self.peek_byte() else {
            return Ok(Token { kind: TokenKind::Eof, offset: start, line, column });
        };

        let kind = match b {
            b'{' => { self.pos += 1; TokenKind::LBrace }
            b'}' => { self.pos += 1; TokenKind::RBrace }
            b'(' => { self.pos += 1; TokenKind::LParen }
            b')' => { self.pos += 1; TokenKind::RParen }
            b'=' => { self.pos += 1; TokenKind::Equals }
            b';' => { self.pos += 1; TokenKind::Semicolon }
            b',' => { self.pos += 1; TokenKind::Comma }
            b'"' => self.read_quoted_string()?,
            b'<' => self.read_data()?,
            c if c.is_ascii() && is_unquoted_char(c as char) => self.read_unquoted_ident(),
            _ => {
                return Err(ParseErrorKind::ParseSyntax {
                    message: format!("unexpected byte {:?}", b as char),
                    location: self.loc(start),
                });
            }
        };

        Ok(Token { kind, offset: start, line, column })
    }

    fn read_unquoted_ident(&mut self) -> TokenKind {
        let start = self.pos;
        while matches!(self.peek_byte(), Some(b) if is_unquoted_char(b as char)) {
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.src[start..self.pos]).unwrap_or("").to_string();
        TokenKind::Ident(text)
    }

    fn read_quoted_string(&mut self) -> Result<TokenKind, ParseErrorKind> {
        let start = self.pos;
        self.pos += 1; // opening quote
        let mut out = String::new();
        loop {
            match self.peek_byte() {
                None => {
                    return Err(ParseErrorKind::MissingTerminator {
                        message: "unterminated quoted string".into(),
                        location: self.loc(start),
                    });
                }
                Some(b'"') => {
                    self.pos += 1;
                    break;
                }
                Some(b'\\') => {
                    self.pos += 1;
                    let (decoded, consumed) = decode_escape(&self.src[self.pos..]);
                    out.push_str(&decoded);
                    self.pos += consumed.max(1).min(self.src.len() - self.pos);
                }
                Some(_) => {
                    let ch_start = self.pos;
                    let remaining = std::str::from_utf8(&self.src[ch_start..]).unwrap_or("");
                    if let Some(ch) = remaining.chars().next() {
                        out.push(ch);
                        self.pos += ch.len_utf8();
                    } else {
                        self.pos += 1;
                    }
                }
            }
        }
        Ok(TokenKind::QuotedString(out))
    }

    fn read_data(&mut self) -> Result<TokenKind, ParseErrorKind> {
        let start = self.pos;
        self.pos += 1; // '<'
        let mut hex = String::new();
        loop {
            match self.peek_byte() {
                None => {
                    return Err(ParseErrorKind::MissingTerminator {
                        message: "unterminated data blob, expected '>'".into(),
                        location: self.loc(start),
                    });
                }
                Some(b'>') => {
                    self.pos += 1;
                    break;
                }
                Some(b) if b.is_ascii_whitespace() => {
                    self.advance_byte();
                }
                Some(b) if b.is_ascii_hexdigit() => {
                    hex.push(b as char);
                    self.pos += 1;
                }
                Some(b) => {
                    return Err(ParseErrorKind::ParseSyntax {
                        message: format!("invalid byte {:?} in data blob", b as char),
                        location: self.loc(self.pos),
                    });
                }
            }
        }
        if hex.len() % 2 != 0 {
            return Err(ParseErrorKind::ParseSyntax {
                message: "data blob has an odd number of hex digits".into(),
                location: self.loc(start),
            });
        }
        let mut bytes = Vec::with_capacity(hex.len() / 2);
        for pair in hex.as_bytes().chunks(2) {
            let s = std::str::from_utf8(pair).unwrap();
            bytes.push(u8::from_str_radix(s, 16).unwrap());
        }
        Ok(TokenKind::Data(bytes))
    }
}

/// Computes a human-friendly (line, column, one-line snippet, caret
/// offset) description of `offset` within `src`, for error reporting.
pub fn location_at(src: &[u8], offset: usize) -> Location {
    let offset = offset.min(src.len());
    let line_start = src[..offset].iter().rposition(|&b| b == b'\n').map(|p| p + 1).unwrap_or(0);
    let line_end = src[offset..].iter().position(|&b| b == b'\n').map(|p| offset + p).unwrap_or(src.len());
    let line = 1 + src[..line_start].iter().filter(|&&b| b == b'\n').count();
    let column = offset - line_start + 1;
    let snippet = String::from_utf8_lossy(&src[line_start..line_end]).into_owned();
    Location { line, column, snippet, caret_offset: offset - line_start }
}

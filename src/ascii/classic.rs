//! Recursive-descent parser for the Xcode ASCII plist dialect, with
//! precise line/column error reporting.

use crate::ascii::token::{Token, TokenKind, Tokenizer};
use crate::error::ParseErrorKind;
use crate::value::{Mapping, StringValue, Value};

const DEFAULT_RECURSION_LIMIT: usize = 128;

pub struct ClassicParser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    src: &'a [u8],
    recursion_limit: usize,
}

impl<'a> ClassicParser<'a> {
    pub fn new(src: &'a [u8]) -> Result<Self, ParseErrorKind> {
        let mut tokenizer = Tokenizer::new(src);
        let mut tokens = Vec::new();
        loop {
            let tok = tokenizer.next_token()?;
            let is_eof = matches!(tok.kind, TokenKind::Eof);
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        Ok(Self { tokens, pos: 0, src, recursion_limit: DEFAULT_RECURSION_LIMIT })
    }

    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    /// Parses the whole document: an optional `// !$*UTF8*$!` header
    /// comment was already dropped by the tokenizer (it reads as a
    /// line comment), followed by a single top-level value.
    pub fn parse(&mut self) -> Result<Value, ParseErrorKind> {
        log::trace!("classic parser: {} tokens", self.tokens.len());
        let value = self.parse_value(0)?;
        self.expect(TokenKind::Eof)?;
        Ok(value)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseErrorKind> {
        if std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(&kind) {
            Ok(self.advance())
        } else {
            let tok = self.peek().clone();
            Err(ParseErrorKind::ParseSyntax {
                message: format!("expected {:?}, found {:?}", kind, tok.kind),
                location: crate::ascii::token::location_at(self.src, tok.offset),
            })
        }
    }

    fn check_depth(&self, depth: usize) -> Result<(), ParseErrorKind> {
        if depth > self.recursion_limit {
            let tok = self.peek().clone();
            Err(ParseErrorKind::RecursionLimit {
                limit: self.recursion_limit,
                location: crate::ascii::token::location_at(self.src, tok.offset),
            })
        } else {
            Ok(())
        }
    }

    fn parse_value(&mut self, depth: usize) -> Result<Value, ParseErrorKind> {
        self.check_depth(depth)?;
        match &self.peek().kind {
            TokenKind::LBrace => self.parse_mapping(depth + 1),
            TokenKind::LParen => self.parse_sequence(depth + 1),
            TokenKind::Data(_) => {
                let tok = self.advance();
                match tok.kind {
                    TokenKind::Data(bytes) => Ok(Value::Data(bytes)),
                    _ => unreachable!(),
                }
            }
            TokenKind::Ident(_) | TokenKind::QuotedString(_) => self.parse_scalar(),
            other => Err(ParseErrorKind::ParseSyntax {
                message: format!("unexpected token {:?}", other),
                location: crate::ascii::token::location_at(self.src, self.peek().offset),
            }),
        }
    }

    fn parse_scalar(&mut self) -> Result<Value, ParseErrorKind> {
        let tok = self.advance();
        match tok.kind {
            TokenKind::Ident(s) => Ok(Value::String(StringValue::new(s, false))),
            TokenKind::QuotedString(s) => Ok(Value::String(StringValue::new(s, true))),
            other => Err(ParseErrorKind::ParseSyntax {
                message: format!("expected a string, found {:?}", other),
                location: crate::ascii::token::location_at(self.src, tok.offset),
            }),
        }
    }

    fn parse_key(&mut self) -> Result<String, ParseErrorKind> {
        let tok = self.advance();
        match tok.kind {
            TokenKind::Ident(s) | TokenKind::QuotedString(s) => Ok(s),
            other => Err(ParseErrorKind::ParseSyntax {
                message: format!("expected a mapping key, found {:?}", other),
                location: crate::ascii::token::location_at(self.src, tok.offset),
            }),
        }
    }

    fn parse_mapping(&mut self, depth: usize) -> Result<Value, ParseErrorKind> {
        self.expect(TokenKind::LBrace)?;
        let mut map = Mapping::new();
        loop {
            if matches!(self.peek().kind, TokenKind::RBrace) {
                self.advance();
                break;
            }
            let key = self.parse_key()?;
            self.expect(TokenKind::Equals)?;
            let value = self.parse_value(depth)?;
            let semi_tok = self.peek().clone();
            if !matches!(semi_tok.kind, TokenKind::Semicolon) {
                return Err(ParseErrorKind::MissingTerminator {
                    message: format!("expected ';' after value for key {:?}", key),
                    location: crate::ascii::token::location_at(self.src, semi_tok.offset),
                });
            }
            self.advance();
            map.insert(key, value);
        }
        Ok(Value::Mapping(map))
    }

    fn parse_sequence(&mut self, depth: usize) -> Result<Value, ParseErrorKind> {
        self.expect(TokenKind::LParen)?;
        let mut items = Vec::new();
        loop {
            if matches!(self.peek().kind, TokenKind::RParen) {
                self.advance();
                break;
            }
            items.push(self.parse_value(depth)?);
            match self.peek().kind {
                TokenKind::Comma => {
                    self.advance();
                }
                TokenKind::RParen => {
                    self.advance();
                    break;
                }
                _ => {
                    let tok = self.peek().clone();
                    return Err(ParseErrorKind::ParseSyntax {
                        message: format!("expected ',' or ')', found {:?}", tok.kind),
                        location: crate::ascii::token::location_at(self.src, tok.offset),
                    });
                }
            }
        }
        Ok(Value::Sequence(items))
    }
}

/// Parses `src` (the bytes of a `.pbxproj` file, UTF-8 header
/// optional) using the classic recursive-descent parser.
pub fn parse(src: &[u8]) -> Result<Value, ParseErrorKind> {
    ClassicParser::new(src)?.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_dict() {
        let v = parse(b"// !$*UTF8*$!\n{ a = 1; b = (1, 2, 3); }").unwrap();
        let m = v.as_mapping().unwrap();
        assert_eq!(m.get("a").unwrap().as_str(), Some("1"));
        assert_eq!(m.get("b").unwrap().as_sequence().unwrap().len(), 3);
    }

    #[test]
    fn missing_semicolon_is_error() {
        let err = parse(b"{ a = 1 }").unwrap_err();
        assert!(matches!(err, ParseErrorKind::MissingTerminator { .. }));
    }

    #[test]
    fn trailing_comma_in_array_is_ok() {
        let v = parse(b"{ a = (1, 2, ); }").unwrap();
        let m = v.as_mapping().unwrap();
        assert_eq!(m.get("a").unwrap().as_sequence().unwrap().len(), 2);
    }

    #[test]
    fn comma_between_elements_is_required() {
        let err = parse(b"{ a = (1 2); }").unwrap_err();
        assert!(matches!(err, ParseErrorKind::ParseSyntax { .. }));
    }

    #[test]
    fn quoted_unicode_is_ok() {
        let v = parse("{ a = \"caf\u{e9}\"; }".as_bytes()).unwrap();
        let m = v.as_mapping().unwrap();
        assert_eq!(m.get("a").unwrap().as_str(), Some("caf\u{e9}"));
    }

    #[test]
    fn unquoted_unicode_is_error() {
        let err = parse("{ a = caf\u{e9}; }".as_bytes()).unwrap_err();
        assert!(matches!(err, ParseErrorKind::ParseSyntax { .. }));
    }

    #[test]
    fn whitespace_before_header_is_ok() {
        let v = parse(b"   \n// !$*UTF8*$!\n{ a = 1; }").unwrap();
        assert!(v.is_mapping());
    }

    #[test]
    fn recursion_limit_triggers() {
        let mut src = String::new();
        for _ in 0..200 {
            src.push('(');
        }
        src.push_str("1");
        for _ in 0..200 {
            src.push(')');
        }
        let err = parse(src.as_bytes()).unwrap_err();
        assert!(matches!(err, ParseErrorKind::RecursionLimit { .. }));
    }

    #[test]
    fn data_blob_parses() {
        let v = parse(b"{ a = <48656C6C 6F>; }").unwrap();
        let m = v.as_mapping().unwrap();
        match m.get("a").unwrap() {
            Value::Data(bytes) => assert_eq!(bytes, b"Hello"),
            _ => panic!("expected data"),
        }
    }
}

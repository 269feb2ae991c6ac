//! PGN tokenizer.
//!
//! The lexer turns PGN text into a stream of typed tokens and knows how
//! to resynchronize on the next blank line after an error, which is the
//! PGN convention for separating games.

use std::fmt;

/// The kinds of tokens found in a PGN file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    LBracket,
    RBracket,
    LParen,
    RParen,
    /// A tag name (`Event`) or a move (`Bxe5+`).
    Symbol,
    /// A quoted string, quotes included.
    Str,
    /// A block comment, braces included; line comments are discarded.
    Comment,
    /// `!`, `?!`, `$1`, `$2`, ...
    Annotation,
    /// `1-0`, `0-1`, `1/2-1/2` or `*`.
    Result,
    MoveNumber,
    /// The dots following a move number.
    Dots,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::Symbol => "<symbol>",
            TokenKind::Str => "<string>",
            TokenKind::Comment => "<comment>",
            TokenKind::Annotation => "<annotation>",
            TokenKind::Result => "<result>",
            TokenKind::MoveNumber => "<movenr>",
            TokenKind::Dots => "<dots>",
            TokenKind::Eof => "<EOF>",
        };
        write!(f, "{}", name)
    }
}

/// A token with its raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub text: String,
}

/// A tokenizer error, carrying the coordinates where it occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LexError {
    pub line: u32,
    pub col: u32,
    pub message: String,
}

const SYMBOL_CHARS: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_+#=:-";

/// Holds the state of the scanner.
pub(crate) struct Lexer {
    input: String,
    /// Current byte position in the input.
    pos: usize,
    /// Line number of `pos`, counting from the line offset given at
    /// construction.
    line: u32,
    /// Start position of the pending token.
    start: usize,
}

impl Lexer {
    pub(crate) fn new(input: String, line_offset: u32) -> Self {
        Lexer {
            input,
            pos: 0,
            line: line_offset,
            start: 0,
        }
    }

    /// Current byte position in the input.
    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    /// Returns a copy of the input between the two byte positions.
    pub(crate) fn slice(&self, from: usize, to: usize) -> String {
        self.input[from..to].to_string()
    }

    /// Returns the line and column of the given byte position, which
    /// must not be past the current position. Columns are 1-based byte
    /// offsets from the preceding newline.
    pub(crate) fn coords(&self, pos: usize) -> (u32, u32) {
        let pos = pos.min(self.pos);
        let bytes = self.input.as_bytes();
        let newlines = bytes[pos..self.pos].iter().filter(|&&b| b == b'\n').count();
        let line = self.line - newlines as u32;
        let col = match bytes[..pos].iter().rposition(|&b| b == b'\n') {
            Some(nl) => pos - nl,
            None => pos + 1,
        };
        (line, col as u32)
    }

    /// Returns the line number of the given byte position.
    pub(crate) fn line_at(&self, pos: usize) -> u32 {
        self.coords(pos).0
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    /// Consumes a run of characters from the given set.
    fn accept_run(&mut self, set: &str) {
        while let Some(c) = self.peek() {
            if !set.contains(c) {
                break;
            }
            self.bump();
        }
    }

    /// Consumes input up to and including the target character.
    /// Returns false if the input ran out first.
    fn find(&mut self, target: char) -> bool {
        loop {
            match self.bump() {
                None => return false,
                Some(c) if c == target => return true,
                Some(_) => {}
            }
        }
    }

    fn emit(&mut self, kind: TokenKind) -> Token {
        let text = self.input[self.start..self.pos].to_string();
        self.start = self.pos;
        Token { kind, text }
    }

    fn error(&self, message: impl Into<String>) -> LexError {
        let (line, col) = self.coords(self.pos.saturating_sub(1));
        LexError {
            line,
            col,
            message: message.into(),
        }
    }

    /// Skips ahead to the start of the next game by scanning for an
    /// empty line, the PGN convention for separating games.
    pub(crate) fn recover(&mut self) {
        loop {
            match self.bump() {
                None => break,
                Some('\n') => {
                    self.accept_run(" \t\r");
                    match self.bump() {
                        Some('\n') | None => break,
                        Some(_) => {}
                    }
                }
                Some(_) => {}
            }
        }
        self.start = self.pos;
    }

    /// Returns the next token from the input.
    pub(crate) fn next_token(&mut self) -> Result<Token, LexError> {
        loop {
            self.start = self.pos;
            let c = match self.bump() {
                None => return Ok(self.emit(TokenKind::Eof)),
                Some(c) => c,
            };
            match c {
                ' ' | '\t' | '\x0b' | '\r' | '\n' => {
                    self.accept_run(" \t\x0b\r\n");
                }
                ';' | '%' => {
                    self.find('\n');
                }
                '[' => return Ok(self.emit(TokenKind::LBracket)),
                ']' => return Ok(self.emit(TokenKind::RBracket)),
                '(' => return Ok(self.emit(TokenKind::LParen)),
                ')' => return Ok(self.emit(TokenKind::RParen)),
                '*' => return Ok(self.emit(TokenKind::Result)),
                '{' => {
                    if !self.find('}') {
                        return Err(self.error("unclosed block comment"));
                    }
                    return Ok(self.emit(TokenKind::Comment));
                }
                '"' => return self.string(),
                '$' => {
                    self.accept_run("0123456789");
                    if self.pos - self.start < 2 {
                        return Err(self.error("expected digit"));
                    }
                    return Ok(self.emit(TokenKind::Annotation));
                }
                '!' | '?' => {
                    self.accept_run("!?");
                    return Ok(self.emit(TokenKind::Annotation));
                }
                '0'..='9' => return Ok(self.number()),
                '.' => {
                    self.accept_run(".");
                    return Ok(self.emit(TokenKind::Dots));
                }
                c if c.is_ascii_alphabetic() => {
                    self.accept_run(SYMBOL_CHARS);
                    return Ok(self.emit(TokenKind::Symbol));
                }
                c => {
                    return Err(self.error(format!("unexpected character: {}", describe(c))));
                }
            }
        }
    }

    /// Lexes a token opened by a digit: either one of the fixed result
    /// strings or a move number.
    fn number(&mut self) -> Token {
        for result in ["1-0", "0-1", "1/2-1/2"] {
            if self.input[self.start..].starts_with(result) {
                self.pos = self.start + result.len();
                return self.emit(TokenKind::Result);
            }
        }
        self.accept_run("0123456789");
        self.emit(TokenKind::MoveNumber)
    }

    /// Lexes a quoted string; backslash escapes the next character.
    fn string(&mut self) -> Result<Token, LexError> {
        loop {
            match self.bump() {
                Some('\\') => {
                    self.bump();
                }
                None | Some('\n') => return Err(self.error("unclosed quoted string")),
                Some('"') => return Ok(self.emit(TokenKind::Str)),
                Some(_) => {}
            }
        }
    }
}

/// Formats a character the way it appears in error messages, e.g.
/// `U+0026 '&'`; the quoted form is omitted for control characters.
fn describe(c: char) -> String {
    if c.is_control() {
        format!("U+{:04X}", c as u32)
    } else {
        format!("U+{:04X} '{}'", c as u32, c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(input: &str) -> (Vec<Token>, Option<String>) {
        let mut lex = Lexer::new(input.to_string(), 1);
        let mut tokens = Vec::new();
        loop {
            match lex.next_token() {
                Ok(token) => {
                    let done = token.kind == TokenKind::Eof;
                    tokens.push(token);
                    if done {
                        return (tokens, None);
                    }
                }
                Err(e) => return (tokens, Some(e.message)),
            }
        }
    }

    fn kinds_and_texts(input: &str) -> Vec<(TokenKind, String)> {
        let (tokens, err) = lex_all(input);
        assert_eq!(err, None, "unexpected lex error for {input:?}");
        tokens.into_iter().map(|t| (t.kind, t.text)).collect()
    }

    #[test]
    fn empty_and_whitespace() {
        assert_eq!(kinds_and_texts(""), vec![(TokenKind::Eof, String::new())]);
        assert_eq!(
            kinds_and_texts(" \t\r"),
            vec![(TokenKind::Eof, String::new())]
        );
    }

    #[test]
    fn line_comments_are_discarded() {
        assert_eq!(
            kinds_and_texts("% ignore this line"),
            vec![(TokenKind::Eof, String::new())]
        );
        assert_eq!(
            kinds_and_texts("; line comment"),
            vec![(TokenKind::Eof, String::new())]
        );
    }

    #[test]
    fn block_comment_spans_lines() {
        assert_eq!(
            kinds_and_texts("{ block\ncomment }"),
            vec![
                (TokenKind::Comment, "{ block\ncomment }".to_string()),
                (TokenKind::Eof, String::new()),
            ]
        );
    }

    #[test]
    fn tag_pair() {
        assert_eq!(
            kinds_and_texts(r#"[Event "casual game"]"#),
            vec![
                (TokenKind::LBracket, "[".to_string()),
                (TokenKind::Symbol, "Event".to_string()),
                (TokenKind::Str, r#""casual game""#.to_string()),
                (TokenKind::RBracket, "]".to_string()),
                (TokenKind::Eof, String::new()),
            ]
        );
    }

    #[test]
    fn movetext_tokens() {
        assert_eq!(
            kinds_and_texts("12. O-O-O Bxe5+ (12... e8=Q)"),
            vec![
                (TokenKind::MoveNumber, "12".to_string()),
                (TokenKind::Dots, ".".to_string()),
                (TokenKind::Symbol, "O-O-O".to_string()),
                (TokenKind::Symbol, "Bxe5+".to_string()),
                (TokenKind::LParen, "(".to_string()),
                (TokenKind::MoveNumber, "12".to_string()),
                (TokenKind::Dots, "...".to_string()),
                (TokenKind::Symbol, "e8=Q".to_string()),
                (TokenKind::RParen, ")".to_string()),
                (TokenKind::Eof, String::new()),
            ]
        );
    }

    #[test]
    fn results() {
        assert_eq!(
            kinds_and_texts("1-0 0-1 1/2-1/2 *"),
            vec![
                (TokenKind::Result, "1-0".to_string()),
                (TokenKind::Result, "0-1".to_string()),
                (TokenKind::Result, "1/2-1/2".to_string()),
                (TokenKind::Result, "*".to_string()),
                (TokenKind::Eof, String::new()),
            ]
        );
    }

    #[test]
    fn annotations() {
        assert_eq!(
            kinds_and_texts("$4 $12 Bxe5+? Bxe5+?!"),
            vec![
                (TokenKind::Annotation, "$4".to_string()),
                (TokenKind::Annotation, "$12".to_string()),
                (TokenKind::Symbol, "Bxe5+".to_string()),
                (TokenKind::Annotation, "?".to_string()),
                (TokenKind::Symbol, "Bxe5+".to_string()),
                (TokenKind::Annotation, "?!".to_string()),
                (TokenKind::Eof, String::new()),
            ]
        );
    }

    #[test]
    fn escaped_string() {
        assert_eq!(
            kinds_and_texts(r#"[Event "a\"b"]"#),
            vec![
                (TokenKind::LBracket, "[".to_string()),
                (TokenKind::Symbol, "Event".to_string()),
                (TokenKind::Str, r#""a\"b""#.to_string()),
                (TokenKind::RBracket, "]".to_string()),
                (TokenKind::Eof, String::new()),
            ]
        );
    }

    #[test]
    fn lex_errors() {
        let (_, err) = lex_all("[Event \x01]");
        assert_eq!(err.as_deref(), Some("unexpected character: U+0001"));

        let (_, err) = lex_all("\"casual game");
        assert_eq!(err.as_deref(), Some("unclosed quoted string"));

        let (_, err) = lex_all("{ block comment");
        assert_eq!(err.as_deref(), Some("unclosed block comment"));

        let (_, err) = lex_all("$a");
        assert_eq!(err.as_deref(), Some("expected digit"));

        let (_, err) = lex_all("e4 &");
        assert_eq!(err.as_deref(), Some("unexpected character: U+0026 '&'"));
    }

    #[test]
    fn error_coordinates() {
        let mut lex = Lexer::new("e4 e5\n  &".to_string(), 1);
        let err = loop {
            match lex.next_token() {
                Ok(t) if t.kind == TokenKind::Eof => panic!("expected an error"),
                Ok(_) => {}
                Err(e) => break e,
            }
        };
        assert_eq!((err.line, err.col), (2, 3));
    }

    #[test]
    fn recover_skips_to_blank_line() {
        let mut lex = Lexer::new("garbage ! more\n  \n[Event".to_string(), 1);
        lex.recover();
        let token = lex.next_token().unwrap();
        assert_eq!(token.kind, TokenKind::LBracket);
        assert_eq!(lex.line_at(lex.pos()), 3);
    }

    #[test]
    fn recover_at_eof() {
        let mut lex = Lexer::new("no blank line here".to_string(), 1);
        lex.recover();
        assert_eq!(lex.next_token().unwrap().kind, TokenKind::Eof);
    }
}

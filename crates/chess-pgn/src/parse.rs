//! Two-phase PGN parsing.
//!
//! [`Database::parse`] runs the cheap header pass over a whole PGN
//! file: for each game it reads the tag section and only scans the
//! movetext for its ply count and result, stashing the raw movetext on
//! the game. [`Game::parse_moves`] runs the expensive movetext pass on
//! demand, materializing the tree of moves by resolving each SAN token
//! against the live position.

use crate::game::{Database, DeferredMovetext, Game, Nag, NodeId};
use crate::lex::{LexError, Lexer, Token, TokenKind};
use std::collections::HashMap;
use thiserror::Error;

/// A problem encountered while parsing a PGN file, with 1-based line
/// and column coordinates into the input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{line}:{col}: {message}")]
pub struct ParseError {
    pub line: u32,
    pub col: u32,
    pub message: String,
}

/// Internal error plumbing: lexer errors carry their own coordinates,
/// parser errors are located at the parser's current item.
enum Failure {
    Lex(LexError),
    Parse(String),
}

impl From<LexError> for Failure {
    fn from(e: LexError) -> Self {
        Failure::Lex(e)
    }
}

/// Holds the state of the parser.
struct Parser {
    lex: Lexer,
    /// Input offset at which the current item started.
    pos: usize,
    /// The current item; `None` before the first fetch and after
    /// recovery.
    item: Option<Token>,
    /// The most recently consumed item.
    last: Option<Token>,
}

impl Parser {
    fn new(lex: Lexer) -> Self {
        Parser {
            lex,
            pos: 0,
            item: None,
            last: None,
        }
    }

    /// Fetches the next item from the lexer.
    fn next(&mut self) -> Result<(), Failure> {
        self.last = self.item.take();
        self.pos = self.lex.pos();
        self.item = Some(self.lex.next_token()?);
        Ok(())
    }

    /// Returns the current item, fetching the first one if needed.
    fn current(&mut self) -> Result<&Token, Failure> {
        if self.item.is_none() {
            self.next()?;
        }
        Ok(self.item.as_ref().expect("item was just fetched"))
    }

    /// Consumes the current item (skipping comments) if it has the
    /// requested kind.
    fn accept(&mut self, kind: TokenKind) -> Result<bool, Failure> {
        while self.current()?.kind == TokenKind::Comment {
            self.next()?;
        }
        if self.current()?.kind != kind {
            return Ok(false);
        }
        self.next()?;
        Ok(true)
    }

    /// Like [`Parser::accept`], but fails if the item kind does not
    /// match. Returns the consumed item.
    fn expect(&mut self, kind: TokenKind) -> Result<Token, Failure> {
        if !self.accept(kind)? {
            let got = self.current()?.kind;
            return Err(Failure::Parse(format!("expected {}, got {}", kind, got)));
        }
        Ok(self.last.clone().expect("accept consumed an item"))
    }

    /// Converts a failure into a [`ParseError`] with coordinates.
    fn locate(&self, failure: Failure) -> ParseError {
        match failure {
            Failure::Lex(e) => ParseError {
                line: e.line,
                col: e.col,
                message: e.message,
            },
            Failure::Parse(message) => {
                let (line, col) = self.lex.coords(self.pos);
                ParseError {
                    line,
                    col,
                    message,
                }
            }
        }
    }

    /// Reads the tag section and fast-scans the movetext of the next
    /// game. Returns `None` at the end of the input.
    fn read_game(&mut self) -> Result<Option<Game>, Failure> {
        self.current()?;
        if self.accept(TokenKind::Eof)? {
            return Ok(None);
        }

        let mut mtext_start = self.pos;
        let mut mtext_line = self.lex.line_at(self.pos);
        let mut tags = HashMap::new();
        while self.accept(TokenKind::LBracket)? {
            let tag = self.expect(TokenKind::Symbol)?;
            let val = self.expect(TokenKind::Str)?;
            tags.insert(tag.text, unescape(&val.text));
            self.expect(TokenKind::RBracket)?;
            // Remember where the movetext starts. Keeping this up to
            // date inside the loop places a comment following the last
            // tag (which the accept() above skips) inside the movetext,
            // where the movetext pass will attach it to the root node.
            mtext_start = self.pos;
            mtext_line = self.lex.line_at(self.pos);
        }
        if tags.is_empty() {
            return Err(Failure::Parse("no game tags found".to_string()));
        }

        // Parsing and validating the movetext is postponed until
        // parse_moves is called. Here the movetext is only scanned for
        // the main-line ply count and the game result, in case the
        // latter is missing from the tag section.
        let mut plies = 0;
        let mut depth = 0u32;
        loop {
            let token = self.current()?;
            match token.kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => depth = depth.saturating_sub(1),
                TokenKind::Symbol => {
                    if depth == 0 {
                        plies += 1;
                    }
                }
                TokenKind::Result => match tags.get("Result") {
                    None => {
                        tags.insert("Result".to_string(), token.text.clone());
                    }
                    Some(result) if *result != token.text => {
                        return Err(Failure::Parse(format!(
                            "game result {:?} differs from Result tag {:?}",
                            token.text, result
                        )));
                    }
                    Some(_) => {}
                },
                TokenKind::LBracket | TokenKind::Eof => break,
                _ => {}
            }
            self.next()?;
        }
        let mtext_end = self.pos;

        if tags.get("Result").map_or(true, |result| result.is_empty()) {
            tags.insert("Result".to_string(), "*".to_string());
        }
        let mut game =
            Game::new(tags).map_err(|e| Failure::Parse(format!("FEN tag: {}", e)))?;
        game.plies = plies;
        game.movetext = Some(DeferredMovetext {
            text: self.lex.slice(mtext_start, mtext_end),
            line: mtext_line,
        });
        Ok(Some(game))
    }

    /// Parses a movetext section into the game tree, knowing that the
    /// lexer has been set up to scan a single such section.
    fn parse_moves(&mut self, game: &mut Game) -> Result<(), Failure> {
        self.current()?;
        self.variation(game, game.root(), 0)
    }

    /// Parses a list of moves with recursive variations, starting at
    /// the variation's root node.
    fn variation(&mut self, game: &mut Game, node: NodeId, level: u32) -> Result<(), Failure> {
        let mut node = node;
        loop {
            let token = self.current()?.clone();
            match token.kind {
                TokenKind::Symbol => {
                    let mov = game
                        .node(node)
                        .board
                        .parse_move(&token.text)
                        .map_err(|e| Failure::Parse(format!("{:?}: {}", token.text, e)))?;
                    node = game.insert(node, mov);
                }
                TokenKind::Comment => {
                    game.add_comment(node, unquote(&token.text));
                }
                TokenKind::Annotation => {
                    game.add_nag(node, self.nag(&token.text)?);
                }
                TokenKind::LParen => {
                    if game.is_root(node) {
                        return Err(Failure::Parse(
                            "variation without a preceding move".to_string(),
                        ));
                    }
                    self.next()?;
                    let root = game.new_variation(node);
                    self.variation(game, root, level + 1)?;
                }
                TokenKind::RParen => {
                    if level == 0 {
                        return Err(Failure::Parse(
                            "unexpected right parenthesis".to_string(),
                        ));
                    }
                    return Ok(());
                }
                TokenKind::Eof | TokenKind::LBracket => {
                    if level != 0 {
                        return Err(Failure::Parse(format!("{} unclosed variations", level)));
                    }
                    return Ok(());
                }
                TokenKind::MoveNumber | TokenKind::Dots | TokenKind::Result => {}
                TokenKind::Str | TokenKind::RBracket => {
                    return Err(Failure::Parse(format!("unexpected token: {}", token.kind)));
                }
            }
            self.next()?;
        }
    }

    /// Decodes an annotation token into a [`Nag`].
    fn nag(&self, s: &str) -> Result<Nag, Failure> {
        let nag = match s.strip_prefix('$') {
            Some(digits) => digits.parse().ok().map(Nag),
            None => Nag::from_suffix(s),
        };
        nag.ok_or_else(|| Failure::Parse(format!("{:?}: invalid annotation", s)))
    }
}

/// Removes the first and last character from `s` and trims the result.
/// Used both for `{...}` comments and as the first step of string
/// unescaping.
fn unquote(s: &str) -> &str {
    if s.len() < 2 {
        return s;
    }
    s[1..s.len() - 1].trim()
}

/// Unquotes and unescapes a backslash-escaped PGN string: a backslash
/// includes the following character literally.
fn unescape(s: &str) -> String {
    let mut out = String::new();
    let mut chars = unquote(s).chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            _ => out.push(c),
        }
    }
    out
}

impl Database {
    /// Reads PGN games into the database. Only the tag section of each
    /// game is parsed up front; call [`Game::parse_moves`] on an
    /// individual game to materialize its move tree. Returns the list
    /// of per-game errors encountered; parsing continues with the next
    /// game after each error.
    pub fn parse(&mut self, text: &str) -> Vec<ParseError> {
        let mut errors = Vec::new();
        let mut p = Parser::new(Lexer::new(text.to_string(), 1));
        loop {
            match p.read_game() {
                Ok(None) => break,
                Ok(Some(game)) => self.games.push(game),
                Err(failure) => {
                    errors.push(p.locate(failure));
                    // resume with the next game after a blank line
                    p.lex.recover();
                    p.item = None;
                }
            }
        }
        errors
    }
}

impl Game {
    /// Parses the movetext section of the game, generating the tree of
    /// moves under the root node.
    ///
    /// The deferred movetext is consumed either way: a second call is a
    /// no-op returning success, and on failure the game tree is rolled
    /// back to its pre-parse state.
    pub fn parse_moves(&mut self) -> Result<(), ParseError> {
        let movetext = match self.movetext.take() {
            Some(movetext) => movetext,
            None => return Ok(()),
        };
        let node_count = self.node_count();
        let root = self.node(self.root()).clone();
        let mut p = Parser::new(Lexer::new(movetext.text, movetext.line));
        match p.parse_moves(self) {
            Ok(()) => Ok(()),
            Err(failure) => {
                self.rollback(node_count, root);
                Err(p.locate(failure))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unquote_strips_and_trims() {
        assert_eq!(unquote("{ comment }"), "comment");
        assert_eq!(unquote("{}"), "");
        assert_eq!(unquote("x"), "x");
    }

    #[test]
    fn unescape_handles_backslashes() {
        assert_eq!(unescape(r#""a\"b""#), r#"a"b"#);
        assert_eq!(unescape(r#""a\\b""#), r"a\b");
        assert_eq!(unescape(r#""plain""#), "plain");
    }

    #[test]
    fn parse_single_game_headers() {
        let mut db = Database::default();
        let errors = db.parse("[Result \"*\"] 1. e4 e5 2. Nf3 *");
        assert!(errors.is_empty());
        assert_eq!(db.games.len(), 1);
        let game = &db.games[0];
        assert_eq!(game.tags.get("Result").map(String::as_str), Some("*"));
        // header pass counted the plies without building the tree
        assert_eq!(game.plies(), 3);
        assert_eq!(game.node(game.root()).next, None);
    }

    #[test]
    fn parse_moves_is_idempotent_once_consumed() {
        let mut db = Database::default();
        db.parse("[Result \"*\"] 1. e4 e5 2. Nf3 *");
        let game = &mut db.games[0];
        game.parse_moves().unwrap();
        assert_eq!(game.plies(), 3);
        game.parse_moves().unwrap();
        assert_eq!(game.plies(), 3);
    }

    #[test]
    fn parse_moves_failure_rolls_back() {
        let mut db = Database::default();
        let errors = db.parse("[Result \"*\"] 1. e4 e9 *");
        assert!(errors.is_empty(), "header pass does not validate moves");
        let game = &mut db.games[0];
        let err = game.parse_moves().expect_err("e9 is not a legal move");
        assert!(err.message.contains("e9"));
        assert_eq!(game.node(game.root()).next, None);
        // the deferred movetext was consumed: a retry succeeds trivially
        assert_eq!(game.parse_moves(), Ok(()));
    }

    #[test]
    fn result_defaults_to_star() {
        let mut db = Database::default();
        let errors = db.parse("[White \"John\"] 1. e4 e5");
        assert!(errors.is_empty());
        assert_eq!(db.games[0].tags.get("Result").map(String::as_str), Some("*"));
    }

    #[test]
    fn result_token_fills_missing_tag() {
        let mut db = Database::default();
        let errors = db.parse("[White \"John\"] 1. e4 e5 0-1");
        assert!(errors.is_empty());
        assert_eq!(db.games[0].tags.get("Result").map(String::as_str), Some("0-1"));
    }

    #[test]
    fn invalid_fen_tag_is_reported() {
        let mut db = Database::default();
        let errors = db.parse("[FEN \"rubbish\"] 1. e4 *");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.starts_with("FEN tag:"));
        assert!(db.games.is_empty());
    }

    #[test]
    fn unclosed_variation_is_reported() {
        let mut db = Database::default();
        let errors = db.parse("[Result \"*\"] 1. e4 (1. d4 *");
        assert!(errors.is_empty());
        let err = db.games[0].parse_moves().expect_err("variation never closed");
        assert!(err.message.contains("unclosed variations"));
    }

    #[test]
    fn variation_before_first_move_is_an_error() {
        let mut db = Database::default();
        db.parse("[Result \"*\"] (1. d4) 1. e4 *");
        let err = db.games[0].parse_moves().expect_err("variation on the root");
        assert_eq!(err.message, "variation without a preceding move");
    }
}

//! Reading chess games from Portable Game Notation (PGN) text.
//!
//! This crate provides:
//! - [`Database`] - a collection of games parsed from PGN text
//! - [`Game`] - tags plus a tree of [`Node`]s holding moves,
//!   variations, comments and [`Nag`] annotations
//! - Two-phase parsing: [`Database::parse`] only reads tag sections and
//!   fast-scans movetext, so large files can be indexed cheaply;
//!   [`Game::parse_moves`] materializes an individual game's move tree
//!   on demand
//! - Error recovery: a malformed game is reported with line/column
//!   coordinates and parsing resumes at the next game
//!
//! # Example
//!
//! ```
//! use chess_pgn::Database;
//!
//! let mut db = Database::default();
//! let errors = db.parse("[Result \"*\"]\n\n1. e4 e5 2. Nf3 *");
//! assert!(errors.is_empty());
//!
//! let game = &mut db.games[0];
//! game.parse_moves().unwrap();
//! let first = game.node(game.root()).next.unwrap();
//! assert_eq!(game.node(first).mov.uci(), "e2e4");
//! ```

mod game;
mod lex;
mod parse;

pub use game::{Database, Game, Nag, Node, NodeId};
pub use parse::ParseError;

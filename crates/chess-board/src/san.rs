//! Move notation: the forgiving algebraic parser and the SAN, UCI and
//! figurine renderers.

use crate::{Board, Color, Move, Piece, Square, Wing};
use thiserror::Error;

/// Errors that can occur when parsing a move string.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseMoveError {
    #[error("invalid move")]
    InvalidMove,

    #[error("no matching legal move")]
    NoMatch,

    #[error("ambiguous move")]
    Ambiguous,
}

impl Board {
    /// Parses a move in algebraic notation. The parser is forgiving and
    /// accepts varying forms of algebraic notation, including slightly
    /// incorrect ones (for instance uncapitalized piece letters).
    ///
    /// Examples: `e4`, `Bb5`, `cxd3`, `O-O`, `0-0-0`, `Rae1+`, `f8=Q`,
    /// `f8/Q`, `e2-e4`, `Bf1-b5`, `e2e4`, `f1b5`, `e1g1` (castling),
    /// `f7f8q`, `--` (null move).
    pub fn parse_move(&self, s: &str) -> Result<Move, ParseMoveError> {
        if s == "--" {
            return Ok(Move::NULL);
        }
        if s.len() < 2 {
            return Err(ParseMoveError::InvalidMove);
        }

        let mut from_file: Option<u8> = None;
        let mut from_rank: Option<u8> = None;
        let mut to_file: Option<u8> = None;
        let mut to_rank: Option<u8> = None;
        let mut piece: Option<Piece> = None;
        let mut promotion: Option<Piece> = None;
        let mut castle: Option<Wing> = None;

        if s.starts_with("O-O-O") || s.starts_with("0-0-0") {
            castle = Some(Wing::Queenside);
        } else if s.starts_with("O-O") || s.starts_with("0-0") {
            castle = Some(Wing::Kingside);
        } else {
            // The first character may specify the piece type; lowercase
            // piece letters are also accepted. A leading 'b' is a piece
            // only when followed by a file letter: "bc3" reads as Bc3,
            // but "b3c4" as b3-c4, not B3c4.
            let mut rest = s;
            let bytes = s.as_bytes();
            if let Some((p, _)) = s.chars().next().and_then(Piece::from_char) {
                if bytes[0] != b'b' || (s.len() > 2 && (b'a'..=b'h').contains(&bytes[1])) {
                    piece = Some(p);
                    rest = &s[1..];
                }
            }
            // Scan for file/rank characters and a promotion piece. A
            // 'b' is first taken as a bishop promotion and reread as
            // the b-file if more file/rank characters follow.
            for c in rest.chars() {
                if promotion == Some(Piece::Bishop)
                    && matches!(c, 'a'..='h' | '1'..='8')
                {
                    from_file = to_file;
                    to_file = Some(1);
                    promotion = None;
                }
                match c {
                    'b' | 'n' | 'r' | 'q' | 'B' | 'N' | 'R' | 'Q' => {
                        promotion = Piece::from_char(c).map(|(p, _)| p);
                    }
                    'a' | 'c'..='h' => {
                        from_file = to_file;
                        to_file = Some(c as u8 - b'a');
                    }
                    '1'..='8' => {
                        from_rank = to_rank;
                        to_rank = Some(c as u8 - b'1');
                    }
                    _ => {}
                }
            }
            // An unspecified piece with an underspecified from-square
            // must be a pawn (e.g. e4, cxd5).
            if piece.is_none() && (from_file.is_none() || from_rank.is_none()) {
                piece = Some(Piece::Pawn);
            }
            // Recognize castling as a king either moving two files or
            // capturing its own rook.
            if let (Some(f0), Some(r0), Some(f1), Some(r1)) =
                (from_file, from_rank, to_file, to_rank)
            {
                let from = Square::new(f0, r0);
                let to = Square::new(f1, r1);
                let us = self.side_to_move;
                let two_files = (to.index() as i8 - from.index() as i8).abs() == 2;
                if self.piece_at(from) == Some((Piece::King, us))
                    && (self.piece_at(to) == Some((Piece::Rook, us)) || two_files)
                {
                    castle = Some(if to < from {
                        Wing::Queenside
                    } else {
                        Wing::Kingside
                    });
                }
            }
        }

        if let Some(wing) = castle {
            let cs = self
                .castle_squares(wing)
                .ok_or(ParseMoveError::NoMatch)?;
            from_file = Some(cs.king_from.file());
            from_rank = Some(cs.king_from.rank());
            to_file = Some(cs.rook_from.file());
            to_rank = Some(cs.rook_from.rank());
        }

        // Find the one pseudo-legal move matching the parsed files,
        // ranks, piece type and promotion that is also legal.
        let (moves, _) = self.pseudo_legal_moves();
        let mut found: Option<Move> = None;
        for m in moves {
            let matches = piece.map_or(true, |p| {
                self.piece_at(m.from).map(|(t, _)| t) == Some(p)
            }) && from_file.map_or(true, |f| m.from.file() == f)
                && from_rank.map_or(true, |r| m.from.rank() == r)
                && to_file.map_or(true, |f| m.to.file() == f)
                && to_rank.map_or(true, |r| m.to.rank() == r)
                && m.promotion == promotion;
            if matches && self.is_legal(m) {
                if found.is_some() {
                    return Err(ParseMoveError::Ambiguous);
                }
                found = Some(m);
            }
        }
        found.ok_or(ParseMoveError::NoMatch)
    }
}

impl Move {
    /// Returns the move in the long algebraic notation used by the UCI
    /// protocol (e.g. `e2e4`, `e7e8q`). The null move is `0000`.
    pub fn uci(self) -> String {
        self.to_string()
    }

    /// Returns the move in Standard Algebraic Notation for the position
    /// it is played in.
    pub fn san(self, board: &Board) -> String {
        self.algebraic(board, false)
    }

    /// Like [`Move::san`] but uses figurines for the piece letters.
    pub fn fan(self, board: &Board) -> String {
        self.algebraic(board, true)
    }

    fn algebraic(self, board: &Board, figurine: bool) -> String {
        if self.is_null() {
            return "--".to_string();
        }
        let us = board.side_to_move;
        let piece = match board.piece_at(self.from) {
            Some((piece, _)) => piece,
            None => return self.uci(),
        };
        let letter = |p: Piece| {
            if figurine {
                p.to_figurine(Color::White)
            } else {
                p.to_char(Color::White)
            }
        };
        let mut buf = String::new();

        if piece == Piece::King && board.piece_at(self.to) == Some((Piece::Rook, us)) {
            buf.push_str(if self.from < self.to { "O-O" } else { "O-O-O" });
        } else {
            let mut by_file = false;
            let mut by_rank = false;
            let mut is_capture = board.piece_at(self.to).is_some();
            match piece {
                Piece::Pawn => {
                    is_capture = self.from.file() != self.to.file();
                    by_file = is_capture;
                }
                Piece::Knight | Piece::Bishop | Piece::Rook | Piece::Queen => {
                    let (moves, _) = board.pseudo_legal_moves();
                    for n in moves {
                        if n.to == self.to
                            && n.from != self.from
                            && board.piece_at(n.from) == board.piece_at(self.from)
                            && board.is_legal(n)
                        {
                            if n.from.file() != self.from.file() {
                                by_file = true;
                            } else {
                                by_rank = true;
                            }
                        }
                    }
                }
                Piece::King => {}
            }
            if piece != Piece::Pawn {
                buf.push(letter(piece));
            }
            if by_file {
                buf.push((b'a' + self.from.file()) as char);
            }
            if by_rank {
                buf.push((b'1' + self.from.rank()) as char);
            }
            if is_capture {
                buf.push('x');
            }
            buf.push_str(&self.to.to_string());
            if let Some(promo) = self.promotion {
                buf.push('=');
                buf.push(letter(promo));
            }
        }

        let (check, mate) = board.make_move(self).is_check_or_mate();
        if check {
            buf.push(if mate { '#' } else { '+' });
        }
        buf
    }
}

//! FEN (Forsyth-Edwards Notation) parsing and rendering.

use crate::board::castle_index;
use crate::{Board, Color, Piece, Square, Wing};
use thiserror::Error;

/// Errors that can occur when parsing a FEN string.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FenError {
    #[error("too many ranks in piece placement")]
    TooManyRanks,

    #[error("too many files in piece placement")]
    TooManyFiles,

    #[error("unexpected character '{0}' in piece placement")]
    UnexpectedCharacter(char),

    #[error("side to move must be 'w' or 'b', got {0:?}")]
    InvalidSideToMove(String),

    #[error("invalid en-passant square {0:?}")]
    InvalidEnPassantSquare(String),

    #[error("invalid halfmove clock {0:?}")]
    InvalidHalfmoveClock(String),

    #[error("invalid fullmove number {0:?}")]
    InvalidFullmoveNumber(String),
}

impl Board {
    /// The FEN string of the starting position.
    pub const START_FEN: &'static str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    /// Parses a FEN string into a board.
    ///
    /// Fields omitted from the string default to their value in the
    /// starting position of a regular chess game (for example `w` for
    /// the side to move), so `parse_fen("")` returns the starting
    /// position.
    ///
    /// For castling rights both the conventional `KQkq` and file
    /// letters are accepted, for example `C` for a white rook on the
    /// c-file that can castle. The latter is sometimes needed for
    /// Chess960 positions.
    pub fn parse_fen(fen: &str) -> Result<Board, FenError> {
        let mut fields = fen.split_ascii_whitespace();
        let mut b = Board::empty();

        // field 1: pieces
        let placement = match fields.next() {
            Some(f) => f,
            None => "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR",
        };
        let (mut file, mut rank) = (0u8, 7u8);
        for c in placement.chars() {
            match c {
                '/' => {
                    if rank == 0 {
                        return Err(FenError::TooManyRanks);
                    }
                    rank -= 1;
                    file = 0;
                }
                '1'..='8' => file += c as u8 - b'0',
                _ => {
                    if file > 7 {
                        return Err(FenError::TooManyFiles);
                    }
                    let piece =
                        Piece::from_char(c).ok_or(FenError::UnexpectedCharacter(c))?;
                    b.put(Square::new(file, rank), Some(piece));
                    file += 1;
                }
            }
        }

        // field 2: side to move
        match fields.next().unwrap_or("w") {
            "w" => b.side_to_move = Color::White,
            "b" => b.side_to_move = Color::Black,
            other => return Err(FenError::InvalidSideToMove(other.to_string())),
        }

        // field 3: castling rights
        let castling = fields.next().unwrap_or("KQkq");
        if castling != "-" {
            for c in castling.chars() {
                b.set_can_castle(c, true);
            }
        }

        // field 4: en-passant square
        let ep = fields.next().unwrap_or("-");
        if ep != "-" {
            b.ep_square = Some(
                Square::from_algebraic(ep)
                    .ok_or_else(|| FenError::InvalidEnPassantSquare(ep.to_string()))?,
            );
        }

        // field 5: halfmove counter for the 50-move rule
        let rule50 = fields.next().unwrap_or("0");
        b.rule50 = rule50
            .parse()
            .map_err(|_| FenError::InvalidHalfmoveClock(rule50.to_string()))?;

        // field 6: fullmove counter
        let move_nr = fields.next().unwrap_or("1");
        b.move_nr = move_nr
            .parse()
            .map_err(|_| FenError::InvalidFullmoveNumber(move_nr.to_string()))?;

        Ok(b)
    }

    /// Returns the FEN string of the position.
    ///
    /// Castling rights are rendered as `K`/`Q` when the rook stands on
    /// the h/a file corner and as the rook's file letter otherwise, so
    /// regular chess positions always round-trip through `KQkq`. For
    /// Chess960 this means `K`/`Q` always refer to the corner rook, not
    /// to whichever rook happens to castle on that wing.
    pub fn fen(&self) -> String {
        let mut fen = String::new();

        // field 1: pieces
        for rank in (0..8u8).rev() {
            let mut empty = 0u8;
            for file in 0..8u8 {
                match self.piece_at(Square::new(file, rank)) {
                    None => empty += 1,
                    Some((piece, color)) => {
                        if empty > 0 {
                            fen.push((b'0' + empty) as char);
                            empty = 0;
                        }
                        fen.push(piece.to_char(color));
                    }
                }
            }
            if empty > 0 {
                fen.push((b'0' + empty) as char);
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        // field 2: side to move
        fen.push(' ');
        fen.push(match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        });

        // field 3: castling rights
        fen.push(' ');
        let len = fen.len();
        let rights = [
            (Color::White, Wing::Kingside, Square::H1, 'K'),
            (Color::White, Wing::Queenside, Square::A1, 'Q'),
            (Color::Black, Wing::Kingside, Square::H8, 'k'),
            (Color::Black, Wing::Queenside, Square::A8, 'q'),
        ];
        for (color, wing, corner, letter) in rights {
            if let Some(sq) = self.castling_rook(color, wing) {
                if sq == corner {
                    fen.push(letter);
                } else {
                    let base = match color {
                        Color::White => b'A',
                        Color::Black => b'a',
                    };
                    fen.push((base + sq.file()) as char);
                }
            }
        }
        if fen.len() == len {
            fen.push('-');
        }

        // fields 4-6
        fen.push(' ');
        match self.ep_square {
            Some(sq) => fen.push_str(&sq.to_string()),
            None => fen.push('-'),
        }
        fen.push_str(&format!(" {} {}", self.rule50, self.move_nr));
        fen
    }

    /// Sets or unsets a castling right. `c` is the file of the rook
    /// with which to castle (`A`-`H`) or `K`/`Q` for kingside/queenside
    /// castling; uppercase for White, lowercase for Black. The right is
    /// only recorded when a matching rook exists and the king stands on
    /// its own back rank. For an ambiguous `K`/`k` the rook nearest the
    /// kingside corner is taken; for `Q`/`q` the one nearest the
    /// queenside corner.
    pub(crate) fn set_can_castle(&mut self, c: char, can: bool) {
        let color = match c {
            'K' | 'Q' | 'A'..='H' => Color::White,
            'k' | 'q' | 'a'..='h' => Color::Black,
            _ => return,
        };
        let king_sq = match self.king_square(color) {
            Some(sq) if sq.relative_rank(color) == 0 => sq,
            _ => return,
        };
        // range of squares in which to look for the rook; the kingside
        // scan runs from the h-file towards the king so that with two
        // rooks on that side the outermost one is taken
        let (sq0, sq1) = match c {
            'Q' | 'q' => (Square::new(0, king_sq.rank()), king_sq),
            'K' | 'k' => (Square::new(7, king_sq.rank()), king_sq),
            'A'..='H' => {
                let sq = Square::new(c as u8 - b'A', king_sq.rank());
                (sq, sq)
            }
            _ => {
                let sq = Square::new(c as u8 - b'a', king_sq.rank());
                (sq, sq)
            }
        };
        let rook_sq = match self.find_piece(Piece::Rook, color, sq0, sq1) {
            Some(sq) => sq,
            None => return,
        };
        let wing = if rook_sq < king_sq {
            Wing::Queenside
        } else {
            Wing::Kingside
        };
        self.castling[castle_index(color, wing)] = if can { Some(rook_sq) } else { None };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_fen_is_start_position() {
        let b = Board::parse_fen("").unwrap();
        assert_eq!(b.fen(), Board::START_FEN);
        assert_eq!(b.side_to_move, Color::White);
        assert_eq!(b.move_nr, 1);
        assert_eq!(b.rule50, 0);
        assert_eq!(b.ep_square, None);
        assert_eq!(b.castling_rook(Color::White, Wing::Kingside), Some(Square::H1));
        assert_eq!(b.castling_rook(Color::White, Wing::Queenside), Some(Square::A1));
        assert_eq!(b.castling_rook(Color::Black, Wing::Kingside), Some(Square::H8));
        assert_eq!(b.castling_rook(Color::Black, Wing::Queenside), Some(Square::A8));
    }

    #[test]
    fn full_fen_roundtrip() {
        let fen = "r4rk1/2pp1ppp/8/8/5P2/8/PPPPP1PP/RNBQKBNR b KQ c3 0 12";
        let b = Board::parse_fen(fen).unwrap();
        assert_eq!(b.side_to_move, Color::Black);
        assert_eq!(b.move_nr, 12);
        assert_eq!(b.ep_square, Some(Square::new(2, 2)));
        assert_eq!(b.castling_rook(Color::Black, Wing::Kingside), None);
        assert_eq!(b.fen(), fen);
    }

    #[test]
    fn missing_trailing_fields_default() {
        let b = Board::parse_fen("8/8/8/8/8/8/8/4K2k w").unwrap();
        assert_eq!(b.fen(), "8/8/8/8/8/8/8/4K2k w - - 0 1");
    }

    #[test]
    fn castling_letters_require_matching_rook() {
        // no rooks on the back rank: KQkq silently yields no rights
        let b = Board::parse_fen("4k3/8/8/8/8/8/8/4K3 w KQkq - 0 1").unwrap();
        assert_eq!(b.fen(), "4k3/8/8/8/8/8/8/4K3 w - - 0 1");
    }

    #[test]
    fn chess960_file_letter_castling() {
        // scrambled back rank with the castling rook named by file
        let fen = "1rk1r3/pppppppp/8/8/8/8/PPPPPPPP/1RK1R3 w EBeb - 0 1";
        let b = Board::parse_fen(fen).unwrap();
        assert_eq!(b.castling_rook(Color::White, Wing::Kingside), Some(Square::E1));
        assert_eq!(b.castling_rook(Color::White, Wing::Queenside), Some(Square::B1));
        assert_eq!(b.castling_rook(Color::Black, Wing::Kingside), Some(Square::E8));
        assert_eq!(b.castling_rook(Color::Black, Wing::Queenside), Some(Square::B8));
        assert_eq!(b.fen(), fen);
    }

    #[test]
    fn ambiguous_kingside_letter_prefers_corner_rook() {
        // two rooks on the kingside of the king: K selects the h-rook
        let b = Board::parse_fen("4k3/8/8/8/8/8/8/4KR1R w K - 0 1").unwrap();
        assert_eq!(b.castling_rook(Color::White, Wing::Kingside), Some(Square::H1));
    }

    #[test]
    fn king_off_back_rank_denies_castling() {
        let b = Board::parse_fen("4k3/8/8/8/8/4K3/8/R6R w KQ - 0 1").unwrap();
        assert_eq!(b.castling_rook(Color::White, Wing::Kingside), None);
        assert_eq!(b.castling_rook(Color::White, Wing::Queenside), None);
    }

    #[test]
    fn parse_errors() {
        assert_eq!(
            Board::parse_fen("8/8/8/8/8/8/8/8/8"),
            Err(FenError::TooManyRanks)
        );
        assert_eq!(
            Board::parse_fen("rnbqkbnrr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR"),
            Err(FenError::TooManyFiles)
        );
        assert!(matches!(
            Board::parse_fen("rnbqkbnr/ppppXppp/8/8/8/8/PPPPPPPP/RNBQKBNR"),
            Err(FenError::UnexpectedCharacter('X'))
        ));
        assert!(matches!(
            Board::parse_fen("8/8/8/8/8/8/8/8 x"),
            Err(FenError::InvalidSideToMove(_))
        ));
        assert!(matches!(
            Board::parse_fen("8/8/8/8/8/8/8/8 w - e9"),
            Err(FenError::InvalidEnPassantSquare(_))
        ));
        assert!(matches!(
            Board::parse_fen("8/8/8/8/8/8/8/8 w - - abc"),
            Err(FenError::InvalidHalfmoveClock(_))
        ));
        assert!(matches!(
            Board::parse_fen("8/8/8/8/8/8/8/8 w - - 0 xyz"),
            Err(FenError::InvalidFullmoveNumber(_))
        ));
    }

    #[test]
    fn en_passant_roundtrip() {
        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";
        let b = Board::parse_fen(fen).unwrap();
        assert_eq!(b.ep_square, Some(Square::new(4, 2)));
        assert_eq!(b.fen(), fen);
    }
}

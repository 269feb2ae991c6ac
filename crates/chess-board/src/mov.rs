//! Move representation.

use crate::{Piece, Square};
use std::fmt;

/// A chess move: source square, destination square and an optional
/// promotion piece.
///
/// Castling is encoded as the king capturing its own rook: `from` is
/// the king's square and `to` is the rook's square. This encoding is
/// identical for standard chess and Chess960, which is what makes the
/// variable castling squares of Chess960 representable without special
/// cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Piece>,
}

impl Move {
    /// The null move. Applying it only passes the turn.
    pub const NULL: Move = Move {
        from: Square::A1,
        to: Square::A1,
        promotion: None,
    };

    /// Creates a move without promotion.
    #[inline]
    pub const fn new(from: Square, to: Square) -> Self {
        Move {
            from,
            to,
            promotion: None,
        }
    }

    /// Creates a promotion move.
    #[inline]
    pub const fn promoting(from: Square, to: Square, piece: Piece) -> Self {
        Move {
            from,
            to,
            promotion: Some(piece),
        }
    }

    /// Returns true if this is the null move.
    #[inline]
    pub fn is_null(self) -> bool {
        self == Move::NULL
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return write!(f, "0000");
        }
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(p) = self.promotion {
            write!(f, "{}", p.to_char(crate::Color::Black))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_move() {
        assert!(Move::NULL.is_null());
        assert!(!Move::new(Square::E1, Square::E2).is_null());
        assert_eq!(Move::NULL.to_string(), "0000");
    }

    #[test]
    fn display_uses_lowercase_promotion() {
        let m = Move::promoting(Square::new(4, 6), Square::new(4, 7), Piece::Queen);
        assert_eq!(m.to_string(), "e7e8q");
    }
}

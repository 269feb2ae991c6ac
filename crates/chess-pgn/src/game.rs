//! Chess games as trees of moves with variations, comments and
//! annotations.

use chess_board::{Board, FenError, Move};
use std::collections::HashMap;
use std::fmt;

/// A Numeric Annotation Glyph: `$n` in PGN, or one of the suffix forms
/// `!`, `?`, `!!`, `??`, `!?`, `?!`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Nag(pub u16);

impl Nag {
    pub const GOOD_MOVE: Nag = Nag(1); // !
    pub const MISTAKE: Nag = Nag(2); // ?
    pub const BRILLIANT_MOVE: Nag = Nag(3); // !!
    pub const BLUNDER: Nag = Nag(4); // ??
    pub const INTERESTING_MOVE: Nag = Nag(5); // !?
    pub const DUBIOUS_MOVE: Nag = Nag(6); // ?!

    /// Parses one of the `!`/`?` suffix forms.
    pub fn from_suffix(s: &str) -> Option<Nag> {
        match s {
            "!" => Some(Nag::GOOD_MOVE),
            "?" => Some(Nag::MISTAKE),
            "!!" => Some(Nag::BRILLIANT_MOVE),
            "??" => Some(Nag::BLUNDER),
            "!?" => Some(Nag::INTERESTING_MOVE),
            "?!" => Some(Nag::DUBIOUS_MOVE),
            _ => None,
        }
    }
}

impl fmt::Display for Nag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            1 => write!(f, "!"),
            2 => write!(f, "?"),
            3 => write!(f, "!!"),
            4 => write!(f, "??"),
            5 => write!(f, "!?"),
            6 => write!(f, "?!"),
            n => write!(f, "${}", n),
        }
    }
}

/// Handle to a [`Node`] in a [`Game`]'s tree.
///
/// Node handles are only meaningful for the game that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

/// An element in the game tree, holding one move.
///
/// The next move of the line is found by following `next`, the previous
/// one through `parent`. `variation` may point to an alternative list
/// of moves replacing this move. Every variation, including the main
/// line, starts with a special *root* node that repeats the board of
/// its parent and carries the null move; it is there to hold comments
/// preceding the first move of the variation. Following `next` never
/// reaches a root node; following `variation` always does.
#[derive(Debug, Clone)]
pub struct Node {
    /// The previous move, if any. A back-reference: the parent owns
    /// this node, not the other way around.
    pub parent: Option<NodeId>,
    /// The next move on this line.
    pub next: Option<NodeId>,
    /// An alternative to this move.
    pub variation: Option<NodeId>,
    /// The move leading to `board`; the null move on a variation root.
    pub mov: Move,
    /// The position after `mov` (for a root, before any move of the
    /// line).
    pub board: Board,
    /// Comment paragraphs attached to this node.
    pub comments: Vec<String>,
    /// Annotations in insertion order, without duplicates.
    pub nags: Vec<Nag>,
}

/// The deferred movetext section of a game read by the header pass:
/// the raw text plus the line it starts on.
#[derive(Debug, Clone)]
pub(crate) struct DeferredMovetext {
    pub text: String,
    pub line: u32,
}

/// A chess game: its PGN tags and a tree of moves.
///
/// The node tree is stored in an arena owned by the game; nodes refer
/// to each other by [`NodeId`], so the `parent` back-references carry
/// no ownership and dropping the game drops the whole tree at once.
#[derive(Debug, Clone)]
pub struct Game {
    /// The PGN tags of the game. `Result` is always present after
    /// parsing.
    pub tags: HashMap<String, String>,
    nodes: Vec<Node>,
    /// Main-line ply count as seen by the header pass; used until the
    /// movetext has been materialized.
    pub(crate) plies: usize,
    pub(crate) movetext: Option<DeferredMovetext>,
}

impl Game {
    /// Creates a new game. The starting position, if not the default,
    /// is taken from the `FEN` tag.
    pub fn new(tags: HashMap<String, String>) -> Result<Game, FenError> {
        let fen = tags.get("FEN").map(String::as_str).unwrap_or("");
        let board = Board::parse_fen(fen)?;
        let root = Node {
            parent: None,
            next: None,
            variation: None,
            mov: Move::NULL,
            board,
            comments: Vec::new(),
            nags: Vec::new(),
        };
        Ok(Game {
            tags,
            nodes: vec![root],
            plies: 0,
            movetext: None,
        })
    }

    /// The root node of the main line. Its board is the starting
    /// position of the game.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Returns the node behind a handle.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn rollback(&mut self, node_count: usize, root: Node) {
        self.nodes.truncate(node_count);
        self.nodes[0] = root;
    }

    /// Returns the number of halfmoves in the main line. This works
    /// even when the game was read from a PGN file and the movetext has
    /// not been parsed yet.
    pub fn plies(&self) -> usize {
        let mut next = self.node(self.root()).next;
        if next.is_none() {
            return self.plies;
        }
        let mut count = 0;
        while let Some(id) = next {
            count += 1;
            next = self.node(id).next;
        }
        count
    }

    /// Adds a move to the game tree as the continuation of `at`,
    /// replacing any existing continuation. Returns the new node so
    /// consecutive moves can be chained:
    ///
    /// ```
    /// # use chess_pgn::Game;
    /// # use std::collections::HashMap;
    /// let mut game = Game::new(HashMap::new()).unwrap();
    /// let mut n = game.root();
    /// for san in ["e4", "e5", "Nf3"] {
    ///     let m = game.node(n).board.parse_move(san).unwrap();
    ///     n = game.insert(n, m);
    /// }
    /// assert_eq!(game.plies(), 3);
    /// ```
    pub fn insert(&mut self, at: NodeId, mov: Move) -> NodeId {
        let board = self.node(at).board.make_move(mov);
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            parent: Some(at),
            next: None,
            variation: None,
            mov,
            board,
            comments: Vec::new(),
            nags: Vec::new(),
        });
        self.node_mut(at).next = Some(id);
        id
    }

    /// Creates a new variation on `at`, returning the root node of that
    /// variation. The new variation is appended to the list of
    /// alternatives hanging off `at`; an empty variation already at the
    /// end of that list is replaced.
    pub fn new_variation(&mut self, at: NodeId) -> NodeId {
        // the variation root duplicates the position before `at`
        let parent = self.node(at).parent;
        let board = match parent {
            Some(p) => self.node(p).board.clone(),
            None => self.node(at).board.clone(),
        };
        let root = Node {
            parent,
            next: None,
            variation: None,
            mov: Move::NULL,
            board,
            comments: Vec::new(),
            nags: Vec::new(),
        };
        let mut v = at;
        loop {
            let var = match self.node(v).variation {
                None => break,
                Some(var) => var,
            };
            match self.node(var).next {
                None => {
                    // empty variation: replace its root
                    *self.node_mut(var) = root;
                    return var;
                }
                Some(next) => v = next,
            }
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(root);
        self.node_mut(v).variation = Some(id);
        id
    }

    /// Returns the variation roots for the alternatives to this move.
    /// Empty variations are skipped, and the first move of a variation
    /// reports no variations of its own (those belong to the move it is
    /// an alternative to).
    pub fn variations(&self, at: NodeId) -> Vec<NodeId> {
        if let Some(parent) = self.node(at).parent {
            if self.is_root(parent) && self.node(parent).parent.is_some() {
                return Vec::new();
            }
        }
        let mut vs = Vec::new();
        let mut variation = self.node(at).variation;
        while let Some(id) = variation {
            let next = match self.node(id).next {
                None => break, // empty variation
                Some(next) => next,
            };
            vs.push(id);
            variation = self.node(next).variation;
        }
        vs
    }

    /// Returns whether the node is the root node of a variation.
    pub fn is_root(&self, at: NodeId) -> bool {
        match self.node(at).parent {
            None => true,
            Some(p) => self.node(p).next != Some(at),
        }
    }

    /// Appends a comment paragraph to a node.
    pub fn add_comment(&mut self, at: NodeId, comment: impl Into<String>) {
        self.node_mut(at).comments.push(comment.into());
    }

    /// Adds an annotation to a move. Duplicates are ignored.
    pub fn add_nag(&mut self, at: NodeId, nag: Nag) {
        let node = self.node_mut(at);
        if !node.nags.contains(&nag) {
            node.nags.push(nag);
        }
    }

    /// Removes an annotation from a move.
    pub fn drop_nag(&mut self, at: NodeId, nag: Nag) {
        let node = self.node_mut(at);
        if let Some(i) = node.nags.iter().position(|&x| x == nag) {
            node.nags.swap_remove(i);
        }
    }
}

/// A collection of chess games. The default value is an empty database
/// ready for use.
#[derive(Debug, Default)]
pub struct Database {
    pub games: Vec<Game>,
}

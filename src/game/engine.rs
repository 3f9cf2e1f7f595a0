//! Chess engine resource - the authoritative position
//!
//! `ChessEngine` wraps a `shakmaty::Chess` position together with the UCI
//! history that produced it. It is the single source of truth for board
//! contents and side to move; every mutation goes through a move the rules
//! engine accepted.
//!
//! # Trial validation
//!
//! [`ChessEngine::try_move`] works on a clone and returns the resulting
//! engine alongside the [`LogicalMove`]. The caller decides whether to
//! commit it, so a rejected attempt never touches the live position.
//!
//! # Coordinate notation
//!
//! Moves are exchanged with Lichess as UCI strings (`e2e4`, `e7e8q`,
//! `e1g1` for castling). Castling is always written king-to-destination.

use crate::game::error::{GameError, GameResult};
use shakmaty::fen::Fen;
use shakmaty::uci::UciMove;
use shakmaty::{
    CastlingMode, Chess, Color, EnPassantMode, File, Move, Piece, Position, Rank, Role, Square,
};

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A piece removed from the board by a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capture {
    pub role: Role,
    /// Where the victim stood; differs from the destination only for en passant
    pub square: Square,
}

/// A rules-validated move, independent of how it is carried out physically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalMove {
    pub color: Color,
    pub from: Square,
    pub to: Square,
    pub uci: String,
    pub captured: Option<Capture>,
    pub promotion: Option<Role>,
    /// Rook relocation accompanying a castling move
    pub castle_rook: Option<(Square, Square)>,
}

#[derive(Debug, Clone)]
pub struct ChessEngine {
    position: Chess,
    history: Vec<String>,
}

impl Default for ChessEngine {
    fn default() -> Self {
        Self {
            position: Chess::default(),
            history: Vec::new(),
        }
    }
}

impl ChessEngine {
    /// Load a position from FEN. `startpos` and the empty string mean the standard start.
    pub fn from_fen(fen: &str) -> GameResult<Self> {
        let fen = fen.trim();
        if fen.is_empty() || fen == "startpos" {
            return Ok(Self::default());
        }
        let parsed: Fen = fen.parse().map_err(|e| GameError::InvalidFen {
            fen: fen.to_string(),
            message: format!("{e}"),
        })?;
        let position: Chess =
            parsed
                .into_position(CastlingMode::Standard)
                .map_err(|e| GameError::InvalidFen {
                    fen: fen.to_string(),
                    message: format!("{e}"),
                })?;
        Ok(Self {
            position,
            history: Vec::new(),
        })
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.position.board().piece_at(square)
    }

    pub fn turn(&self) -> Color {
        self.position.turn()
    }

    /// `'w'` or `'b'`, as the dashboard expects.
    pub fn active_color(&self) -> char {
        self.position.turn().char()
    }

    pub fn fen(&self) -> String {
        Fen::from_position(self.position.clone(), EnPassantMode::Legal).to_string()
    }

    /// UCI moves applied since the position was loaded.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn ply_count(&self) -> usize {
        self.history.len()
    }

    pub fn last_uci(&self) -> Option<&str> {
        self.history.last().map(String::as_str)
    }

    pub fn is_checkmate(&self) -> bool {
        self.position.is_checkmate()
    }

    /// Try `from → to` on a scratch copy. Pawns reaching the last rank promote to a queen.
    pub fn try_move(&self, from: Square, to: Square) -> GameResult<(ChessEngine, LogicalMove)> {
        let promotion = match self.piece_at(from) {
            Some(piece) if piece.role == Role::Pawn && to.rank() == last_rank(piece.color) => {
                Some(Role::Queen)
            }
            _ => None,
        };
        let uci = UciMove::Normal {
            from,
            to,
            promotion,
        };
        let mut scratch = self.clone();
        let played = scratch.play(&uci)?;
        Ok((scratch, played))
    }

    /// Apply a move given in UCI notation to the live position.
    pub fn play_uci(&mut self, notation: &str) -> GameResult<LogicalMove> {
        let uci: UciMove = notation
            .trim()
            .parse()
            .map_err(|_| GameError::InvalidNotation {
                notation: notation.to_string(),
            })?;
        self.play(&uci)
    }

    fn play(&mut self, uci: &UciMove) -> GameResult<LogicalMove> {
        let m = uci
            .to_move(&self.position)
            .map_err(|_| GameError::IllegalMove {
                uci: uci.to_string(),
            })?;
        let logical = describe(self.position.turn(), &m)?;
        self.position.play_unchecked(&m);
        self.history.push(logical.uci.clone());
        Ok(logical)
    }
}

fn last_rank(color: Color) -> Rank {
    match color {
        Color::White => Rank::Eighth,
        Color::Black => Rank::First,
    }
}

fn describe(color: Color, m: &Move) -> GameResult<LogicalMove> {
    let uci = UciMove::from_move(m, CastlingMode::Standard).to_string();
    match *m {
        Move::Normal {
            from,
            capture,
            to,
            promotion,
            ..
        } => Ok(LogicalMove {
            color,
            from,
            to,
            uci,
            captured: capture.map(|role| Capture { role, square: to }),
            promotion,
            castle_rook: None,
        }),
        Move::EnPassant { from, to } => Ok(LogicalMove {
            color,
            from,
            to,
            uci,
            captured: Some(Capture {
                role: Role::Pawn,
                square: Square::from_coords(to.file(), from.rank()),
            }),
            promotion: None,
            castle_rook: None,
        }),
        Move::Castle { king, rook } => {
            let rank = king.rank();
            let (king_file, rook_file) = if rook.file() > king.file() {
                (File::G, File::F)
            } else {
                (File::C, File::D)
            };
            Ok(LogicalMove {
                color,
                from: king,
                to: Square::from_coords(king_file, rank),
                uci,
                captured: None,
                promotion: None,
                castle_rook: Some((rook, Square::from_coords(rook_file, rank))),
            })
        }
        Move::Put { .. } => Err(GameError::UnsupportedMove {
            message: format!("drop move {uci}"),
        }),
    }
}

/// Parse `e2`-style square text, case-insensitive.
pub fn parse_square(text: &str) -> GameResult<Square> {
    text.trim()
        .to_ascii_lowercase()
        .parse()
        .map_err(|_| GameError::InvalidSquare {
            square: text.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_after(moves: &[&str]) -> ChessEngine {
        let mut engine = ChessEngine::default();
        for m in moves {
            engine.play_uci(m).expect("test line should be legal");
        }
        engine
    }

    #[test]
    fn test_default_is_starting_position() {
        let engine = ChessEngine::default();
        assert_eq!(engine.fen(), STARTING_FEN);
        assert_eq!(engine.turn(), Color::White);
        assert_eq!(engine.active_color(), 'w');
        assert_eq!(engine.ply_count(), 0);
    }

    #[test]
    fn test_startpos_alias() {
        let engine = ChessEngine::from_fen("startpos").unwrap();
        assert_eq!(engine.fen(), STARTING_FEN);
    }

    #[test]
    fn test_from_fen_custom_position() {
        let fen = "4k3/8/8/8/8/8/8/4K2R w K - 0 1";
        let engine = ChessEngine::from_fen(fen).unwrap();
        assert_eq!(engine.fen(), fen);
        assert_eq!(
            engine.piece_at(Square::H1),
            Some(Piece {
                color: Color::White,
                role: Role::Rook
            })
        );
    }

    #[test]
    fn test_from_fen_rejects_garbage() {
        assert!(matches!(
            ChessEngine::from_fen("not a fen"),
            Err(GameError::InvalidFen { .. })
        ));
    }

    #[test]
    fn test_try_move_leaves_live_position_untouched() {
        let engine = ChessEngine::default();
        let (next, mv) = engine.try_move(Square::E2, Square::E4).unwrap();

        assert_eq!(mv.uci, "e2e4");
        assert_eq!(mv.color, Color::White);
        assert_eq!(engine.piece_at(Square::E2).map(|p| p.role), Some(Role::Pawn));
        assert!(engine.piece_at(Square::E4).is_none());
        assert_eq!(next.piece_at(Square::E4).map(|p| p.role), Some(Role::Pawn));
        assert_eq!(next.history(), ["e2e4".to_string()]);
    }

    #[test]
    fn test_try_move_rejects_illegal() {
        let engine = ChessEngine::default();
        assert!(matches!(
            engine.try_move(Square::E2, Square::E5),
            Err(GameError::IllegalMove { .. })
        ));
    }

    #[test]
    fn test_capture_is_recorded_on_destination() {
        let engine = engine_after(&["e2e4", "d7d5"]);
        let (_, mv) = engine.try_move(Square::E4, Square::D5).unwrap();
        assert_eq!(
            mv.captured,
            Some(Capture {
                role: Role::Pawn,
                square: Square::D5
            })
        );
    }

    #[test]
    fn test_en_passant_victim_square() {
        let engine = engine_after(&["e2e4", "a7a6", "e4e5", "d7d5"]);
        let (_, mv) = engine.try_move(Square::E5, Square::D6).unwrap();
        assert_eq!(
            mv.captured,
            Some(Capture {
                role: Role::Pawn,
                square: Square::D5
            })
        );
    }

    #[test]
    fn test_castling_carries_rook_relocation() {
        let engine = engine_after(&["e2e4", "e7e5", "g1f3", "b8c6", "f1c4", "g8f6"]);
        let (next, mv) = engine.try_move(Square::E1, Square::G1).unwrap();
        assert_eq!(mv.uci, "e1g1");
        assert_eq!(mv.to, Square::G1);
        assert_eq!(mv.castle_rook, Some((Square::H1, Square::F1)));
        assert_eq!(next.piece_at(Square::F1).map(|p| p.role), Some(Role::Rook));
    }

    #[test]
    fn test_promotion_defaults_to_queen() {
        let engine = ChessEngine::from_fen("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let (next, mv) = engine.try_move(Square::A7, Square::A8).unwrap();
        assert_eq!(mv.promotion, Some(Role::Queen));
        assert_eq!(mv.uci, "a7a8q");
        assert_eq!(next.piece_at(Square::A8).map(|p| p.role), Some(Role::Queen));
    }

    #[test]
    fn test_play_uci_rejects_bad_notation() {
        let mut engine = ChessEngine::default();
        assert!(matches!(
            engine.play_uci("Nf3"),
            Err(GameError::InvalidNotation { .. })
        ));
        assert_eq!(engine.ply_count(), 0);
    }

    #[test]
    fn test_fools_mate_is_checkmate() {
        let engine = engine_after(&["f2f3", "e7e5", "g2g4", "d8h4"]);
        assert!(engine.is_checkmate());
        assert_eq!(engine.last_uci(), Some("d8h4"));
    }

    #[test]
    fn test_parse_square_is_case_insensitive() {
        assert_eq!(parse_square("E2").unwrap(), Square::E2);
        assert!(parse_square("z9").is_err());
    }
}

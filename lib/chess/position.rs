use crate::chess::{Color, Fen, Move, Piece, Promotion, Role, Square};
use derive_more::{DebugCustom, Display, Error};
use shakmaty as sm;
use tracing::instrument;

#[cfg(test)]
use proptest::{prelude::*, sample::Selector};

/// What happened when a [`Move`] was played.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[display(fmt = "{}", _0)]
pub struct MoveResult(pub Move, pub Option<Role>);

impl MoveResult {
    /// The [`Move`] in coordinate notation.
    pub fn r#move(&self) -> Move {
        self.0
    }

    /// The destination [`Square`] of the moving piece.
    pub fn whither(&self) -> Square {
        self.0.whither()
    }

    /// The [`Role`] of the captured piece, if any.
    pub fn capture(&self) -> Option<Role> {
        self.1
    }

    /// Whether a piece was captured.
    pub fn is_capture(&self) -> bool {
        self.1.is_some()
    }
}

#[doc(hidden)]
impl From<&sm::Move> for MoveResult {
    fn from(m: &sm::Move) -> Self {
        match *m {
            sm::Move::Normal {
                from,
                capture,
                to,
                promotion,
                ..
            } => MoveResult(
                Move(from.into(), to.into(), promotion.into()),
                capture.map(Role::from),
            ),

            sm::Move::EnPassant { from, to } => MoveResult(
                Move(from.into(), to.into(), Promotion::None),
                Some(Role::Pawn),
            ),

            sm::Move::Castle { king, rook } => {
                let file = if rook.file() > king.file() {
                    sm::File::G
                } else {
                    sm::File::C
                };

                let to = sm::Square::from_coords(file, king.rank());
                MoveResult(Move(king.into(), to.into(), Promotion::None), None)
            }

            sm::Move::Put { to, .. } => {
                MoveResult(Move(to.into(), to.into(), Promotion::None), None)
            }
        }
    }
}

/// Represents an illegal [`Move`] in a given [`Position`].
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
#[display(fmt = "move `{}` is illegal in position `{}`", _0, _1)]
pub struct IllegalMove(pub Move, pub Position);

/// The reason why a move token broadcast by the game server could not be replayed.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
pub enum ReplayError {
    #[display(fmt = "`{}` is not a move in coordinate or standard algebraic notation", _0)]
    Unparseable(#[error(not(source))] String),

    #[display(fmt = "move `{}` is illegal in position `{}`", _0, _1)]
    Illegal(String, Position),
}

/// The state of the chess board.
///
/// Unlike a position in standard chess, this type may hold boards left behind by
/// explosions, for instance boards with a missing king, which admit no further moves.
#[derive(DebugCustom, Display, Clone, Eq, PartialEq)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[debug(fmt = "Position(\"{}\")", self)]
#[display(fmt = "{}", "Fen::from(self.clone())")]
pub struct Position(
    #[cfg_attr(test, strategy((0..128usize, any::<Selector>()).prop_map(|(moves, selector)| {
        let mut atomic = sm::variant::Atomic::default();
        for _ in 0..moves {
            match selector.try_select(sm::Position::legal_moves(&atomic)) {
                Some(m) => sm::Position::play_unchecked(&mut atomic, &m),
                _ => break,
            }
        }
        sm::Position::into_setup(atomic, sm::EnPassantMode::Legal)
    }).no_shrink()))]
    sm::Setup,
);

impl Default for Position {
    fn default() -> Self {
        sm::Setup::default().into()
    }
}

impl Position {
    /// The side to move.
    pub fn turn(&self) -> Color {
        self.0.turn.into()
    }

    /// The [`Piece`] at a given [`Square`], if any.
    pub fn piece_at(&self, s: Square) -> Option<Piece> {
        self.0.board.piece_at(s.into()).map(Piece::from)
    }

    /// Removes the [`Piece`] at a given [`Square`], if any.
    pub fn remove(&mut self, s: Square) -> Option<Piece> {
        self.0.board.remove_piece_at(s.into()).map(Piece::from)
    }

    /// [`Square`]s occupied, row by row.
    pub fn occupied(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::iter().filter_map(|s| Some((s, self.piece_at(s)?)))
    }

    /// A snapshot of this position in FEN.
    pub fn fen(&self) -> Fen {
        self.clone().into()
    }

    /// Whether this position admits any further moves.
    pub fn is_playable(&self) -> bool {
        self.rules()
            .map_or(false, |atomic| !sm::Position::is_game_over(&atomic))
    }

    /// Play a [`Move`] if legal in this position.
    #[instrument(level = "trace", skip(self, m), fields(%self, %m), err)]
    pub fn play(&mut self, m: Move) -> Result<MoveResult, IllegalMove> {
        let atomic = self.rules().ok_or_else(|| IllegalMove(m, self.clone()))?;

        match sm::uci::Uci::from(m).to_move(&atomic) {
            Ok(vm) if sm::Position::is_legal(&atomic, &vm) => Ok(self.execute(&vm)),
            _ => Err(IllegalMove(m, self.clone())),
        }
    }

    /// Play a move given either in coordinate or in standard algebraic notation.
    #[instrument(level = "trace", skip(self), fields(%self), err)]
    pub fn replay(&mut self, token: &str) -> Result<MoveResult, ReplayError> {
        let illegal = || ReplayError::Illegal(token.into(), self.clone());

        let (atomic, vm) = match token.parse::<sm::uci::Uci>() {
            Ok(uci) => {
                let atomic = self.rules().ok_or_else(illegal)?;
                let vm = uci.to_move(&atomic).map_err(|_| illegal())?;
                (atomic, vm)
            }

            Err(_) => match token.parse::<sm::san::SanPlus>() {
                Ok(san) => {
                    let atomic = self.rules().ok_or_else(illegal)?;
                    let vm = san.san.to_move(&atomic).map_err(|_| illegal())?;
                    (atomic, vm)
                }

                Err(_) => return Err(ReplayError::Unparseable(token.into())),
            },
        };

        if sm::Position::is_legal(&atomic, &vm) {
            Ok(self.execute(&vm))
        } else {
            Err(illegal())
        }
    }

    /// Moves the pieces without setting off the explosion of a capture.
    fn execute(&mut self, vm: &sm::Move) -> MoveResult {
        let result = MoveResult::from(vm);
        let setup = &mut self.0;
        let color = setup.turn;
        let home = sm::Bitboard::from_rank(color.fold_wb(sm::Rank::First, sm::Rank::Eighth));

        setup.ep_square = None;
        setup.halfmoves += 1;

        match *vm {
            sm::Move::Normal {
                role,
                from,
                capture,
                to,
                promotion,
            } => {
                setup.board.discard_piece_at(from);
                setup.board.set_piece_at(to, promotion.unwrap_or(role).of(color));
                setup.castling_rights.discard(from);
                setup.castling_rights.discard(to);

                if role == sm::Role::King {
                    setup.castling_rights.discard(home);
                }

                if role == sm::Role::Pawn || capture.is_some() {
                    setup.halfmoves = 0;
                }

                if role == sm::Role::Pawn && from.distance(to) == 2 {
                    setup.ep_square = from.offset(color.fold_wb(8, -8));
                }
            }

            sm::Move::EnPassant { from, to } => {
                setup.board.discard_piece_at(from);
                setup.board.discard_piece_at(sm::Square::from_coords(to.file(), from.rank()));
                setup.board.set_piece_at(to, sm::Role::Pawn.of(color));
                setup.halfmoves = 0;
            }

            sm::Move::Castle { king, rook } => {
                let (k, r) = if rook.file() > king.file() {
                    (sm::File::G, sm::File::F)
                } else {
                    (sm::File::C, sm::File::D)
                };

                let (k, r) = (
                    sm::Square::from_coords(k, king.rank()),
                    sm::Square::from_coords(r, king.rank()),
                );

                setup.board.discard_piece_at(king);
                setup.board.discard_piece_at(rook);
                setup.board.set_piece_at(k, sm::Role::King.of(color));
                setup.board.set_piece_at(r, sm::Role::Rook.of(color));
                setup.castling_rights.discard(home);
            }

            sm::Move::Put { role, to } => {
                setup.board.set_piece_at(to, role.of(color));
            }
        }

        if !color.is_white() {
            setup.fullmoves = setup.fullmoves.saturating_add(1);
        }

        setup.turn = !color;
        result
    }

    /// The rules of Atomic chess applied to this board.
    ///
    /// Castling rights and en passant squares invalidated by explosions are dropped.
    fn rules(&self) -> Option<sm::variant::Atomic> {
        let mode = sm::CastlingMode::Standard;
        <sm::variant::Atomic as sm::FromSetup>::from_setup(self.0.clone(), mode)
            .or_else(sm::PositionError::ignore_invalid_castling_rights)
            .or_else(sm::PositionError::ignore_invalid_ep_square)
            .or_else(sm::PositionError::ignore_impossible_check)
            .ok()
    }
}

impl From<Fen> for Position {
    fn from(fen: Fen) -> Self {
        sm::Setup::from(fen).into()
    }
}

#[doc(hidden)]
impl From<sm::Setup> for Position {
    fn from(setup: sm::Setup) -> Self {
        Position(setup)
    }
}

#[doc(hidden)]
impl From<Position> for sm::Setup {
    fn from(pos: Position) -> Self {
        pos.0
    }
}

use crate::atomic::explode;
use crate::chess::{Color, Move, Position, Promotion, Role, Square};
use crate::view::View;
use tracing::{debug, instrument};

/// Turns the squares picked by the player into [`Move`]s.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Selection {
    side: Color,
    selected: Option<Square>,
}

impl Selection {
    /// Constructs a [`Selection`] for the player of the given [`Color`].
    pub fn new(side: Color) -> Self {
        Selection {
            side,
            selected: None,
        }
    }

    /// The [`Color`] of the player's pieces.
    pub fn side(&self) -> Color {
        self.side
    }

    /// The [`Square`] currently selected, if any.
    pub fn selected(&self) -> Option<Square> {
        self.selected
    }

    /// Clears the selection, if any.
    pub fn clear<V: View + ?Sized>(&mut self, view: &mut V) {
        if let Some(s) = self.selected.take() {
            view.highlight(s, false);
        }
    }

    /// Picks a [`Square`].
    ///
    /// The first pick selects one of the player's pieces, the second forms a [`Move`]
    /// from the selected square, which is played in `pos` if legal.
    #[instrument(level = "trace", skip(self, pos, view), ret)]
    pub fn click<V: View + ?Sized>(
        &mut self,
        s: Square,
        pos: &mut Position,
        view: &mut V,
    ) -> Option<Move> {
        match self.selected {
            None => {
                if matches!(pos.piece_at(s), Some(p) if p.color() == self.side) {
                    self.selected = Some(s);
                    view.highlight(s, true);
                }

                None
            }

            Some(whence) => {
                self.clear(view);

                if whence == s {
                    return None;
                }

                let promotion = match (pos.piece_at(whence), s.row()) {
                    (Some(p), 0 | 7) if p.role() == Role::Pawn => Promotion::Queen,
                    _ => Promotion::None,
                };

                self.attempt(Move(whence, s, promotion), pos, view)
            }
        }
    }

    /// Plays a [`Move`] entered in full if it's legal and made by the player.
    #[instrument(level = "trace", skip(self, pos, view), ret)]
    pub fn attempt<V: View + ?Sized>(
        &mut self,
        m: Move,
        pos: &mut Position,
        view: &mut V,
    ) -> Option<Move> {
        self.clear(view);

        if pos.turn() != self.side {
            debug!(%m, "not the player's turn");
            return None;
        }

        match pos.play(m) {
            Err(e) => {
                debug!(error = %e, "ignoring illegal move");
                None
            }

            Ok(result) => {
                if result.is_capture() {
                    explode(pos, &result);
                }

                view.redraw(pos);
                Some(m)
            }
        }
    }
}

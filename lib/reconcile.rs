use crate::atomic::explode;
use crate::chess::{Fen, ParseFenError, Position, ReplayError, Square};
use crate::lichess::{Event, Finish, GameState, GameStatus, Moves, Snapshot};
use crate::status::{Report, Status};
use crate::view::View;
use derive_more::{Display, Error};
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, instrument, warn};

/// The default interval between a capture and the commit of its outcome.
pub const SETTLE: Duration = Duration::from_millis(500);

/// The reason why an [`Event`] could not be reconciled with the board.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
pub enum ReconcileError {
    #[display(fmt = "the initial position is invalid")]
    InvalidSetup(ParseFenError),

    #[display(fmt = "failed to replay the game: {}", _0)]
    Desync(ReplayError),

    #[display(fmt = "failed to apply the latest move: {}", _0)]
    Rejected(ReplayError),

    #[display(fmt = "moves already played were rewritten")]
    ProtocolViolation,

    #[display(fmt = "waiting for a full snapshot of the game")]
    Frozen,
}

/// A capture whose outcome is shown once the explosion settles.
#[derive(Debug, Clone)]
struct Pending {
    square: Square,
    deadline: Instant,
    snapshot: Fen,
    report: Report,
}

/// Keeps the board in agreement with the moves confirmed by the game server.
#[derive(Debug)]
pub struct Reconciler {
    settle: Duration,
    position: Position,
    baseline: Fen,
    confirmed: Moves,
    pending: Option<Pending>,
    frozen: bool,
    status: Status,
}

impl Default for Reconciler {
    fn default() -> Self {
        Reconciler::new(SETTLE)
    }
}

impl Reconciler {
    /// Constructs a [`Reconciler`] that waits `settle` before committing captures.
    pub fn new(settle: Duration) -> Self {
        Reconciler {
            settle,
            position: Position::default(),
            baseline: Fen::default(),
            confirmed: Moves::default(),
            pending: None,
            frozen: false,
            status: Status::Idle,
        }
    }

    /// The current [`Position`], which may be ahead of the last confirmed one.
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Mutable access to the current [`Position`], for moves yet to be confirmed.
    pub fn position_mut(&mut self) -> &mut Position {
        &mut self.position
    }

    /// The snapshot of the last confirmed [`Position`].
    pub fn baseline(&self) -> &Fen {
        &self.baseline
    }

    /// The moves confirmed by the game server.
    pub fn confirmed(&self) -> &Moves {
        &self.confirmed
    }

    /// The current [`Status`].
    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Whether incremental updates are ignored until the next full snapshot.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Whether a capture is waiting to be committed.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The [`Square`] of the capture waiting to be committed, if any.
    pub fn pending_square(&self) -> Option<Square> {
        self.pending.as_ref().map(|p| p.square)
    }

    /// When the capture waiting to be committed is due, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    /// Shows a [`Status`] unless it's already shown.
    pub fn set_status<V: View + ?Sized>(&mut self, status: Status, view: &mut V) {
        if self.status != status {
            view.status(&status);
            self.status = status;
        }
    }

    /// Reconciles an [`Event`] broadcast by the game server.
    #[instrument(level = "debug", skip(self, view), err)]
    pub async fn apply<V: View + ?Sized>(
        &mut self,
        event: &Event,
        view: &mut V,
    ) -> Result<(), ReconcileError> {
        match event {
            Event::GameFull(snapshot) => self.load(snapshot, view),
            Event::GameState(state) => self.update(state, view).await,
            Event::GameFinish(finish) => {
                self.finish(finish, view).await;
                Ok(())
            }
        }
    }

    /// Waits for the capture pending, if any, and commits it.
    pub async fn settle<V: View + ?Sized>(&mut self, view: &mut V) {
        if let Some(deadline) = self.deadline() {
            sleep_until(deadline).await;
            self.commit(view);
        }
    }

    /// Commits the capture pending, if any, without waiting for it to settle.
    pub fn commit<V: View + ?Sized>(&mut self, view: &mut V) {
        if let Some(p) = self.pending.take() {
            debug!(square = %p.square, "explosion settled");
            self.baseline = p.snapshot;
            self.position = self.baseline.clone().into();
            view.redraw(&self.position);
            self.set_status(Status::Report(p.report), view);
        }
    }

    /// Drops the capture pending, if any, and returns to the last confirmed [`Position`].
    pub fn cancel(&mut self) {
        self.pending = None;
        self.position = self.baseline.clone().into();
    }

    /// Returns to the last confirmed [`Position`] and redraws it.
    pub fn rollback<V: View + ?Sized>(&mut self, view: &mut V) {
        self.position = self.baseline.clone().into();
        view.redraw(&self.position);
    }

    fn accept<V: View + ?Sized>(&mut self, pos: Position, report: Report, view: &mut V) {
        self.baseline = pos.fen();
        self.position = pos;
        view.redraw(&self.position);
        self.set_status(Status::Report(report), view);
    }

    fn replay(snapshot: &Snapshot) -> Result<Position, ReconcileError> {
        let mut pos = snapshot
            .initial_position()
            .map_err(ReconcileError::InvalidSetup)?;

        for token in &snapshot.state.moves {
            let result = pos.replay(token).map_err(ReconcileError::Desync)?;
            if result.is_capture() {
                explode(&mut pos, &result);
            }
        }

        Ok(pos)
    }

    fn load<V: View + ?Sized>(
        &mut self,
        snapshot: &Snapshot,
        view: &mut V,
    ) -> Result<(), ReconcileError> {
        self.pending = None;

        match Self::replay(snapshot) {
            Ok(pos) => {
                self.frozen = false;
                self.confirmed = snapshot.state.moves.clone();
                let state = &snapshot.state;
                let report = Report::classify(state.status, state.winner, state.moves.len());
                self.accept(pos, report, view);
                Ok(())
            }

            Err(e) => {
                warn!(error = %e, "freezing until the next full snapshot");
                self.frozen = true;
                self.rollback(view);
                self.set_status(Status::Desync(e.to_string()), view);
                Err(e)
            }
        }
    }

    async fn update<V: View + ?Sized>(
        &mut self,
        state: &GameState,
        view: &mut V,
    ) -> Result<(), ReconcileError> {
        // The status still shows the failure that froze the board.
        if self.frozen {
            return Err(ReconcileError::Frozen);
        }

        let appended = match self.confirmed.appended(&state.moves) {
            Some(appended) => appended,
            None => {
                let e = ReconcileError::ProtocolViolation;
                warn!(error = %e, "ignoring the update");
                self.set_status(Status::Desync(e.to_string()), view);
                return Err(e);
            }
        };

        let report = Report::classify(state.status, state.winner, state.moves.len());

        if appended.is_empty() {
            match &mut self.pending {
                Some(p) => p.report = report,
                None => self.set_status(Status::Report(report), view),
            }

            return Ok(());
        }

        for (i, token) in appended.iter().enumerate() {
            self.settle(view).await;

            let mut pos: Position = self.baseline.clone().into();
            let result = match pos.replay(token) {
                Ok(r) => r,
                Err(e) => {
                    let e = ReconcileError::Rejected(e);
                    warn!(error = %e, "keeping the last confirmed position");
                    self.rollback(view);
                    self.set_status(Status::Desync(e.to_string()), view);
                    return Err(e);
                }
            };

            let report = if i + 1 == appended.len() {
                report
            } else {
                let plies = self.confirmed.len() + 1;
                Report::classify(GameStatus::Started, None, plies)
            };

            if result.is_capture() {
                let square = result.whither();
                view.explode(square, self.settle);
                explode(&mut pos, &result);

                self.pending = Some(Pending {
                    square,
                    deadline: Instant::now() + self.settle,
                    snapshot: pos.fen(),
                    report,
                });

                self.position = pos;
            } else {
                self.accept(pos, report, view);
            }

            self.confirmed.push(token.clone());
        }

        Ok(())
    }

    async fn finish<V: View + ?Sized>(&mut self, finish: &Finish, view: &mut V) {
        self.settle(view).await;
        let report = Report::classify(finish.status(), finish.winner(), self.confirmed.len());
        self.set_status(Status::Report(report), view);
    }
}

use crate::chess::{Move, Square};
use crate::input::Selection;
use crate::lichess::{Challenge, Event, Service, ServiceError};
use crate::reconcile::Reconciler;
use crate::session::{Session, Token};
use crate::status::Status;
use crate::view::View;
use derive_more::{Display, Error};
use futures_util::{pin_mut, Stream, StreamExt};
use std::str::FromStr;
use tokio::{select, time::sleep_until, time::Instant};
use tracing::{debug, info, instrument, warn};

/// An instruction given by the player.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub enum Command {
    /// Picks a [`Square`] on the board.
    #[display(fmt = "{}", _0)]
    Select(Square),

    /// Plays a [`Move`] entered in full.
    #[display(fmt = "{}", _0)]
    Play(Move),

    /// Resigns the game.
    #[display(fmt = "resign")]
    Resign,

    /// Aborts the game.
    #[display(fmt = "abort")]
    Abort,
}

/// The reason why parsing [`Command`] failed.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
#[display(fmt = "`{}` is neither a square, a move, `resign` nor `abort`", _0)]
pub struct ParseCommandError(#[error(not(source))] pub String);

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let error = || ParseCommandError(s.into());

        match s.trim() {
            "resign" => Ok(Command::Resign),
            "abort" => Ok(Command::Abort),
            t if t.len() == 2 => Ok(Command::Select(t.parse().map_err(|_| error())?)),
            t => Ok(Command::Play(t.parse().map_err(|_| error())?)),
        }
    }
}

/// A game played or watched on a remote game server.
#[derive(Debug)]
pub struct Game<S: Service, V: View> {
    service: S,
    session: Session,
    reconciler: Reconciler,
    selection: Option<Selection>,
    view: V,
}

impl<S: Service, V: View> Game<S, V> {
    /// Challenges the computer to a new game.
    #[instrument(level = "debug", skip(service, token, reconciler, view), err)]
    pub async fn start(
        service: S,
        token: Token,
        challenge: &Challenge,
        reconciler: Reconciler,
        mut view: V,
    ) -> Result<Self, ServiceError> {
        match service.challenge(&token, challenge).await {
            Err(e) => {
                view.status(&Status::Unstarted(e.to_string()));
                Err(e)
            }

            Ok(id) => {
                let session = Session::new(id.clone(), token);
                let selection = Some(Selection::new(challenge.color));
                let mut game = Game::attach(service, session, reconciler, selection, view);
                let status = Status::Started(id, challenge.level);
                game.reconciler.set_status(status, &mut game.view);
                Ok(game)
            }
        }
    }

    /// Joins a game in progress.
    ///
    /// Without a [`Selection`] the game is only watched.
    pub fn attach(
        service: S,
        session: Session,
        reconciler: Reconciler,
        selection: Option<Selection>,
        view: V,
    ) -> Self {
        Game {
            service,
            session,
            reconciler,
            selection,
            view,
        }
    }

    /// The [`Session`] of this game.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The [`Reconciler`] of this game.
    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// The [`View`] of this game.
    pub fn view(&self) -> &V {
        &self.view
    }

    /// Follows the game until it ends, the session is closed, or the connection drops.
    #[instrument(level = "debug", skip(self, commands), fields(id = %self.session.id()))]
    pub async fn run<C: Stream<Item = Command>>(&mut self, commands: C) {
        pin_mut!(commands);
        let mut events = self.service.stream(&self.session);
        let mut input = self.selection.is_some();

        while self.session.is_active() {
            let deadline = self.reconciler.deadline();

            select! {
                biased;

                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.reconciler.commit(&mut self.view);
                }

                c = commands.next(), if input => match c {
                    None => input = false,
                    Some(c) => self.execute(c).await,
                },

                e = events.next() => match e {
                    None => {
                        info!("game stream ended");
                        break;
                    }

                    Some(Ok(event)) => {
                        if let Err(e) = self.reconciler.apply(&event, &mut self.view).await {
                            debug!(error = %e, "event not reconciled");
                        }

                        if let Event::GameFinish(_) = event {
                            self.session.close();
                        }
                    }

                    Some(Err(e)) if e.is_decode() => {
                        warn!(error = %e, "skipping message");
                    }

                    Some(Err(e)) => {
                        let status = Status::Disconnected(e.to_string());
                        self.reconciler.set_status(status, &mut self.view);
                        break;
                    }
                },
            }
        }

        self.reconciler.settle(&mut self.view).await;
        self.session.close();
    }

    /// Carries out a [`Command`].
    #[instrument(level = "debug", skip(self))]
    pub async fn execute(&mut self, command: Command) {
        if let Command::Resign | Command::Abort = command {
            return self.forfeit(command).await;
        }

        if self.selection.is_none() {
            warn!("watching games admits no moves");
            return;
        }

        self.reconciler.settle(&mut self.view).await;

        let pos = self.reconciler.position_mut();
        let played = match (&mut self.selection, command) {
            (Some(selection), Command::Select(s)) => selection.click(s, pos, &mut self.view),
            (Some(selection), Command::Play(m)) => selection.attempt(m, pos, &mut self.view),
            _ => None,
        };

        if let Some(m) = played {
            self.submit(m).await;
        }
    }

    async fn submit(&mut self, m: Move) {
        match self.service.submit(&self.session, m).await {
            Ok(()) => self.reconciler.set_status(Status::Sent(m), &mut self.view),
            Err(e) => {
                warn!(error = %e, "returning to the last confirmed position");
                self.reconciler.rollback(&mut self.view);
                let status = Status::Failed(e.to_string());
                self.reconciler.set_status(status, &mut self.view);
            }
        }
    }

    async fn forfeit(&mut self, command: Command) {
        let result = match command {
            Command::Abort => self.service.abort(&self.session).await,
            _ => self.service.resign(&self.session).await,
        };

        match result {
            Ok(()) => {
                self.session.close();
                self.reconciler.cancel();
                self.reconciler.rollback(&mut self.view);
                self.reconciler.set_status(Status::Forfeited, &mut self.view);
            }

            Err(e) => {
                let status = Status::Failed(e.to_string());
                self.reconciler.set_status(status, &mut self.view);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chess::{Color, Piece, Position, Role};
    use crate::lichess::{Level, MockService};
    use crate::status::Report;
    use crate::view::MockView;
    use futures_util::stream;
    use test_strategy::proptest;

    fn square(s: &str) -> Square {
        s.parse().unwrap()
    }

    fn event(json: &str) -> Result<Event, ServiceError> {
        Ok(serde_json::from_str(json).unwrap())
    }

    fn session() -> Session {
        Session::new("abcd1234".parse().unwrap(), "lip_secret".parse().unwrap())
    }

    fn quiet_view() -> MockView {
        let mut view = MockView::new();
        view.expect_redraw().return_const(());
        view.expect_highlight().return_const(());
        view.expect_explode().return_const(());
        view.expect_status().return_const(());
        view
    }

    fn streaming(events: Vec<Result<Event, ServiceError>>) -> MockService {
        let mut service = MockService::new();
        service
            .expect_stream()
            .return_once(move |_| stream::iter(events).boxed());
        service
    }

    const GAME_FULL: &str = r#"{"type":"gameFull","id":"abcd1234","initialFen":"startpos","state":{"type":"gameState","moves":"","status":"started"}}"#;
    const GAME_STATE: &str = r#"{"type":"gameState","moves":"e2e4","status":"started"}"#;

    #[proptest]
    fn parsing_printed_command_is_an_identity(c: Command) {
        assert_eq!(c.to_string().parse(), Ok(c));
    }

    #[test]
    fn parsing_invalid_command_fails() {
        assert_eq!(
            "draw".parse::<Command>(),
            Err(ParseCommandError("draw".into()))
        );
    }

    #[tokio::test]
    async fn start_challenges_the_computer() {
        let mut service = MockService::new();
        service
            .expect_challenge()
            .once()
            .returning(|_, _| Ok("abcd1234".parse().unwrap()));

        let mut view = MockView::new();
        view.expect_status()
            .once()
            .withf(|s| {
                s.to_string() == "Game started against Stockfish (Level 3)! ID: abcd1234"
            })
            .return_const(());

        let token = "lip_secret".parse().unwrap();
        let challenge = Challenge::default();
        let game = Game::start(service, token, &challenge, Reconciler::default(), view)
            .await
            .unwrap();

        assert_eq!(game.session().id(), &"abcd1234".parse().unwrap());
        assert!(game.session().is_active());
        assert_eq!(
            game.reconciler().status(),
            &Status::Started("abcd1234".parse().unwrap(), Level::default())
        );
    }

    #[tokio::test]
    async fn failure_to_start_is_shown() {
        let mut service = MockService::new();
        service
            .expect_challenge()
            .once()
            .returning(|_, _| Err(ServiceError::Status(401, "unauthorized".into())));

        let mut view = MockView::new();
        view.expect_status()
            .once()
            .withf(|s| matches!(s, Status::Unstarted(_)))
            .return_const(());

        let token = "lip_secret".parse().unwrap();
        let challenge = Challenge::default();
        let result = Game::start(service, token, &challenge, Reconciler::default(), view).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn run_follows_the_game_stream() {
        let service = streaming(vec![event(GAME_FULL), event(GAME_STATE)]);
        let mut game = Game::attach(service, session(), Reconciler::default(), None, quiet_view());
        game.run(stream::empty()).await;

        let pos = game.reconciler().position();
        assert_eq!(pos.piece_at(square("e4")), Some(Piece(Color::White, Role::Pawn)));
        assert_eq!(game.reconciler().status(), &Status::Report(Report::Turn(Color::Black)));
        assert!(!game.session().is_active());
    }

    #[tokio::test]
    async fn undecodable_messages_are_skipped() {
        let garbage = serde_json::from_str::<Event>("garbage").unwrap_err();
        let service = streaming(vec![event(GAME_FULL), Err(garbage.into()), event(GAME_STATE)]);
        let mut game = Game::attach(service, session(), Reconciler::default(), None, quiet_view());
        game.run(stream::empty()).await;

        assert_eq!(game.reconciler().confirmed().len(), 1);
    }

    #[tokio::test]
    async fn connectivity_failures_end_the_game() {
        let failure = ServiceError::Status(503, "unavailable".into());
        let service = streaming(vec![event(GAME_FULL), Err(failure), event(GAME_STATE)]);
        let mut game = Game::attach(service, session(), Reconciler::default(), None, quiet_view());
        game.run(stream::empty()).await;

        assert!(matches!(game.reconciler().status(), Status::Disconnected(_)));
        assert_eq!(game.reconciler().confirmed().len(), 0);
    }

    #[tokio::test]
    async fn player_moves_are_submitted() {
        let mut service = streaming(vec![event(GAME_FULL), event(GAME_STATE)]);
        service
            .expect_submit()
            .once()
            .withf(|_, m| m.to_string() == "e2e4")
            .returning(|_, _| Ok(()));

        let selection = Some(Selection::new(Color::White));
        let mut game = Game::attach(
            service,
            session(),
            Reconciler::default(),
            selection,
            quiet_view(),
        );

        let commands = ["e2", "e4"].map(|s| s.parse::<Command>().unwrap());
        game.run(stream::iter(commands)).await;

        assert_eq!(game.reconciler().confirmed().len(), 1);
        assert_eq!(
            game.reconciler().position().piece_at(square("e4")),
            Some(Piece(Color::White, Role::Pawn))
        );
    }

    #[tokio::test]
    async fn rejected_submission_is_rolled_back() {
        let mut service = streaming(vec![]);
        service
            .expect_submit()
            .once()
            .returning(|_, _| Err(ServiceError::Status(400, "Not your turn".into())));

        let selection = Some(Selection::new(Color::White));
        let mut game = Game::attach(
            service,
            session(),
            Reconciler::default(),
            selection,
            quiet_view(),
        );
        game.run(stream::iter([Command::Play("e2e4".parse().unwrap())])).await;

        assert_eq!(game.reconciler().position(), &Position::default());
        assert_eq!(
            game.reconciler().status().to_string(),
            "Error making move: HTTP error! status: 400, message: Not your turn"
        );
    }

    #[tokio::test]
    async fn watched_games_admit_no_moves() {
        let service = streaming(vec![event(GAME_FULL)]);
        let mut game = Game::attach(service, session(), Reconciler::default(), None, quiet_view());
        game.execute(Command::Play("e2e4".parse().unwrap())).await;
        assert_eq!(game.reconciler().position(), &Position::default());
    }

    #[tokio::test]
    async fn resigning_closes_the_session() {
        let mut service = MockService::new();
        service
            .expect_stream()
            .return_once(|_| stream::pending().boxed());

        service.expect_resign().once().returning(|_| Ok(()));

        let selection = Some(Selection::new(Color::White));
        let mut game = Game::attach(
            service,
            session(),
            Reconciler::default(),
            selection,
            quiet_view(),
        );
        game.run(stream::iter([Command::Resign])).await;

        assert!(!game.session().is_active());
        assert_eq!(game.reconciler().status(), &Status::Forfeited);
    }

    #[tokio::test(start_paused = true)]
    async fn aborting_cancels_the_pending_capture() {
        let mut service = MockService::new();
        service.expect_abort().once().returning(|_| Ok(()));

        let mut game = Game::attach(service, session(), Reconciler::default(), None, quiet_view());
        let full =
            r#"{"type":"gameFull","id":"abcd1234","state":{"moves":"e2e4 d7d5","status":"started"}}"#;
        let capture = r#"{"type":"gameState","moves":"e2e4 d7d5 e4d5","status":"started"}"#;

        for json in [full, capture] {
            let e = event(json).unwrap();
            game.reconciler.apply(&e, &mut game.view).await.unwrap();
        }

        assert!(game.reconciler().is_pending());
        game.execute(Command::Abort).await;
        assert!(!game.reconciler().is_pending());
        assert_eq!(
            game.reconciler().position().piece_at(square("d5")),
            Some(Piece(Color::Black, Role::Pawn))
        );
    }
}

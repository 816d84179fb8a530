use lib::chess::{Color, Piece, Position, ReplayError, Role, Square};
use lib::lichess::Event;
use lib::reconcile::{ReconcileError, Reconciler, SETTLE};
use lib::status::Status;
use lib::view::View;
use std::time::Duration;
use tokio::time::{advance, Instant};

#[derive(Debug, Clone, Eq, PartialEq)]
enum Call {
    Redraw(Position),
    Highlight(Square, bool),
    Explode(Square, Duration),
    Status(String),
}

#[derive(Debug, Default)]
struct Recorder(Vec<Call>);

impl View for Recorder {
    fn redraw(&mut self, pos: &Position) {
        self.0.push(Call::Redraw(pos.clone()));
    }

    fn highlight(&mut self, s: Square, on: bool) {
        self.0.push(Call::Highlight(s, on));
    }

    fn explode(&mut self, s: Square, duration: Duration) {
        self.0.push(Call::Explode(s, duration));
    }

    fn status(&mut self, status: &Status) {
        self.0.push(Call::Status(status.to_string()));
    }
}

fn square(s: &str) -> Square {
    s.parse().unwrap()
}

fn event(json: &str) -> Event {
    serde_json::from_str(json).unwrap()
}

fn game_full(initial_fen: &str, moves: &str) -> Event {
    let state = format!(
        r#"{{"type":"gameState","moves":"{}","status":"started"}}"#,
        moves
    );

    event(&format!(
        r#"{{"type":"gameFull","id":"abcd1234","initialFen":"{}","state":{}}}"#,
        initial_fen, state
    ))
}

fn game_state(moves: &str) -> Event {
    event(&format!(
        r#"{{"type":"gameState","moves":"{}","status":"started"}}"#,
        moves
    ))
}

#[tokio::test(start_paused = true)]
async fn empty_full_snapshot_shows_the_starting_position() {
    let mut view = Recorder::default();
    let mut rec = Reconciler::default();

    assert_eq!(rec.apply(&game_full("startpos", ""), &mut view).await, Ok(()));

    assert_eq!(rec.position(), &Position::default());
    assert_eq!(
        view.0,
        [
            Call::Redraw(Position::default()),
            Call::Status("White to move".into())
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn quiet_moves_are_committed_immediately() {
    let mut view = Recorder::default();
    let mut rec = Reconciler::default();
    rec.apply(&game_full("startpos", ""), &mut view).await.unwrap();
    view.0.clear();

    let start = Instant::now();
    assert_eq!(rec.apply(&game_state("e2e4"), &mut view).await, Ok(()));
    assert_eq!(Instant::now(), start);

    assert!(!rec.is_pending());
    assert_eq!(rec.baseline(), &rec.position().fen());
    assert_eq!(
        rec.position().piece_at(square("e4")),
        Some(Piece(Color::White, Role::Pawn))
    );

    assert_eq!(
        view.0,
        [
            Call::Redraw(rec.position().clone()),
            Call::Status("Black to move".into())
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn captures_are_committed_once_the_explosion_settles() {
    let mut view = Recorder::default();
    let mut rec = Reconciler::default();

    let fen = "k7/8/2r1r3/3n4/4P3/8/B7/7K w - - 0 1";
    rec.apply(&game_full(fen, ""), &mut view).await.unwrap();
    let baseline = rec.baseline().clone();
    view.0.clear();

    assert_eq!(rec.apply(&game_state("a2d5"), &mut view).await, Ok(()));
    assert_eq!(view.0, [Call::Explode(square("d5"), SETTLE)]);
    assert_eq!(rec.baseline(), &baseline);
    assert_eq!(rec.pending_square(), Some(square("d5")));

    for s in ["d5", "c6", "e6"] {
        assert_eq!(rec.position().piece_at(square(s)), None);
    }

    assert_eq!(
        rec.position().piece_at(square("e4")),
        Some(Piece(Color::White, Role::Pawn))
    );

    let start = Instant::now();
    assert_eq!(rec.deadline(), Some(start + SETTLE));

    advance(SETTLE - Duration::from_millis(1)).await;
    assert!(rec.is_pending());

    rec.settle(&mut view).await;
    assert_eq!(Instant::now(), start + SETTLE);
    assert!(!rec.is_pending());
    assert_eq!(rec.baseline(), &rec.position().fen());
    assert_eq!(rec.position().occupied().count(), 3);

    assert_eq!(
        view.0[1..],
        [
            Call::Redraw(rec.position().clone()),
            Call::Status("Black to move".into())
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn repeated_updates_are_idempotent() {
    let mut view = Recorder::default();
    let mut rec = Reconciler::default();
    rec.apply(&game_full("startpos", "e2e4"), &mut view).await.unwrap();

    let update = game_state("e2e4 e7e5");
    rec.apply(&update, &mut view).await.unwrap();
    let position = rec.position().clone();
    let calls = view.0.len();

    rec.apply(&update, &mut view).await.unwrap();
    rec.apply(&update, &mut view).await.unwrap();

    assert_eq!(rec.position(), &position);
    assert_eq!(rec.confirmed().len(), 2);
    assert_eq!(view.0.len(), calls);
}

#[tokio::test(start_paused = true)]
async fn unparseable_move_in_full_snapshot_freezes_the_board() {
    let mut view = Recorder::default();
    let mut rec = Reconciler::default();

    assert_eq!(
        rec.apply(&game_full("startpos", "e2e4 zz9 e7e5"), &mut view).await,
        Err(ReconcileError::Desync(ReplayError::Unparseable("zz9".into())))
    );

    assert!(rec.is_frozen());
    assert_eq!(rec.position(), &Position::default());
    assert!(matches!(rec.status(), Status::Desync(_)));

    assert_eq!(
        rec.apply(&game_state("e2e4 zz9 e7e5 g1f3"), &mut view).await,
        Err(ReconcileError::Frozen)
    );
}

#[tokio::test(start_paused = true)]
async fn king_caught_in_an_explosion_ends_the_game() {
    let mut view = Recorder::default();
    let mut rec = Reconciler::default();

    let fen = "8/8/8/8/8/3pk3/8/3QK3 w - - 0 1";
    rec.apply(&game_full(fen, ""), &mut view).await.unwrap();
    rec.apply(&game_state("d1d3"), &mut view).await.unwrap();
    rec.settle(&mut view).await;

    assert!(!rec.position().is_playable());
    assert_eq!(rec.position().piece_at(square("e3")), None);
    assert_eq!(rec.position().occupied().count(), 1);
}

#[tokio::test(start_paused = true)]
async fn kings_may_move_next_to_each_other() {
    let mut view = Recorder::default();
    let mut rec = Reconciler::default();

    let fen = "4k3/8/4K3/8/8/8/8/R7 w - - 0 1";
    rec.apply(&game_full(fen, ""), &mut view).await.unwrap();

    assert_eq!(rec.apply(&game_state("e6e7"), &mut view).await, Ok(()));
    assert_eq!(rec.apply(&game_state("e6e7 e8d8"), &mut view).await, Ok(()));
    assert_eq!(rec.confirmed().len(), 2);
    assert_eq!(rec.baseline(), &rec.position().fen());

    assert_eq!(
        rec.position().piece_at(square("d8")),
        Some(Piece(Color::Black, Role::King))
    );
}

#[tokio::test(start_paused = true)]
async fn full_snapshot_with_connected_kings_is_replayed() {
    let mut view = Recorder::default();
    let mut rec = Reconciler::default();

    let fen = "8/8/8/3kK3/8/8/8/R7 w - - 0 1";
    assert_eq!(rec.apply(&game_full(fen, "a1a2"), &mut view).await, Ok(()));
    assert!(!rec.is_frozen());

    assert_eq!(
        rec.position().piece_at(square("a2")),
        Some(Piece(Color::White, Role::Rook))
    );
}

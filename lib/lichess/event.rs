use crate::chess::{Color, Fen, ParseFenError, Position};
use crate::session::GameId;
use derive_more::{Deref, IntoIterator};
use serde::{Deserialize, Serialize};

/// A message broadcast by the game server on the game stream.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Event {
    /// The complete state of the game.
    GameFull(Snapshot),
    /// The current move list and status.
    GameState(GameState),
    /// The game is over and the stream is about to end.
    GameFinish(Finish),
}

/// The complete state of a game, sent when the stream opens.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub id: GameId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_fen: Option<String>,
    pub state: GameState,
}

impl Snapshot {
    /// The position the game started from.
    pub fn initial_position(&self) -> Result<Position, ParseFenError> {
        match self.initial_fen.as_deref().map(str::trim) {
            None | Some("") | Some("startpos") => Ok(Position::default()),
            Some(fen) => Ok(fen.parse::<Fen>()?.into()),
        }
    }
}

/// The moves played so far and how the game stands.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct GameState {
    #[serde(default)]
    pub moves: Moves,
    pub status: GameStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<Color>,
}

/// The move list broadcast by the game server, one token per ply.
#[derive(Debug, Default, Clone, Eq, PartialEq, Hash, Deref, IntoIterator, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub struct Moves(#[into_iterator(owned, ref)] Vec<String>);

impl Moves {
    /// The moves in `next` played after the ones in `self`.
    ///
    /// Returns `None` unless `next` starts with every move in `self`.
    pub fn appended<'a>(&self, next: &'a Moves) -> Option<&'a [String]> {
        next.0.strip_prefix(self.0.as_slice())
    }

    /// Appends a move to the list.
    pub fn push(&mut self, token: String) {
        self.0.push(token)
    }
}

impl From<String> for Moves {
    fn from(s: String) -> Self {
        Moves(s.split_whitespace().map(String::from).collect())
    }
}

impl From<Moves> for String {
    fn from(moves: Moves) -> Self {
        moves.0.join(" ")
    }
}

impl FromIterator<String> for Moves {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Moves(iter.into_iter().collect())
    }
}

/// The status of a game as reported by the game server.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[serde(rename_all = "camelCase")]
pub enum GameStatus {
    Created,
    Started,
    Aborted,
    Mate,
    Resign,
    Stalemate,
    Timeout,
    Draw,
    #[serde(rename = "outoftime")]
    OutOfTime,
    Cheat,
    NoStart,
    UnknownFinish,
    VariantEnd,
    #[serde(other)]
    Unknown,
}

impl GameStatus {
    /// Whether the game is still being played.
    pub fn is_ongoing(&self) -> bool {
        matches!(self, GameStatus::Created | GameStatus::Started)
    }
}

/// The final outcome of a game.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct Finish {
    pub game: Outcome,
}

/// How a game ended.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct Outcome {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Named>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<Color>,
}

/// A [`GameStatus`] wrapped in an object.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct Named {
    pub name: GameStatus,
}

impl Finish {
    /// The final [`GameStatus`].
    pub fn status(&self) -> GameStatus {
        self.game.status.map_or(GameStatus::UnknownFinish, |s| s.name)
    }

    /// The winner, if any.
    pub fn winner(&self) -> Option<Color> {
        self.game.winner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_strategy::proptest;

    fn moves(s: &str) -> Moves {
        String::from(s).into()
    }

    #[test]
    fn game_full_is_decoded() {
        let json = r#"{"type":"gameFull","id":"abcd1234","rated":false,"variant":{"key":"atomic"},"initialFen":"startpos","state":{"type":"gameState","moves":"e2e4 e7e5","wtime":600000,"btime":600000,"winc":0,"binc":0,"status":"started"}}"#;

        let event: Event = serde_json::from_str(json).unwrap();
        let Event::GameFull(snapshot) = event else {
            panic!("expected a full snapshot, got {:?}", event)
        };

        assert_eq!(snapshot.id, "abcd1234".parse().unwrap());
        assert_eq!(snapshot.state.moves, moves("e2e4 e7e5"));
        assert_eq!(snapshot.state.status, GameStatus::Started);
        assert_eq!(snapshot.state.winner, None);
        assert_eq!(snapshot.initial_position(), Ok(Position::default()));
    }

    #[test]
    fn game_state_is_decoded() {
        let json = r#"{"type":"gameState","moves":"e2e4 d7d5 e4d5","wtime":1,"btime":2,"winc":0,"binc":0,"status":"variantEnd","winner":"white"}"#;

        assert_eq!(
            serde_json::from_str::<Event>(json).ok(),
            Some(Event::GameState(GameState {
                moves: moves("e2e4 d7d5 e4d5"),
                status: GameStatus::VariantEnd,
                winner: Some(Color::White),
            }))
        );
    }

    #[test]
    fn game_finish_is_decoded() {
        let json = r#"{"type":"gameFinish","game":{"id":"abcd1234","status":{"id":31,"name":"resign"},"winner":"black"}}"#;
        let event: Event = serde_json::from_str(json).unwrap();
        let Event::GameFinish(finish) = event else {
            panic!("expected the end of the game, got {:?}", event)
        };

        assert_eq!(finish.status(), GameStatus::Resign);
        assert_eq!(finish.winner(), Some(Color::Black));
    }

    #[test]
    fn unknown_event_types_are_rejected() {
        let json = r#"{"type":"chatLine","room":"player","username":"lichess","text":"hi"}"#;
        assert!(serde_json::from_str::<Event>(json).is_err());
    }

    #[test]
    fn unknown_status_is_tolerated() {
        let json = r#"{"moves":"","status":"somethingNew"}"#;
        let state: GameState = serde_json::from_str(json).unwrap();
        assert_eq!(state.status, GameStatus::Unknown);
        assert!(state.moves.is_empty());
    }

    #[test]
    fn out_of_time_is_spelled_in_lowercase() {
        assert_eq!(
            serde_json::from_str::<GameStatus>(r#""outoftime""#).ok(),
            Some(GameStatus::OutOfTime)
        );
    }

    #[test]
    fn custom_initial_position_is_loaded() {
        let snapshot = Snapshot {
            id: "abcd1234".parse().unwrap(),
            initial_fen: Some("k7/8/8/8/8/8/8/7K w - - 0 1".into()),
            state: GameState {
                moves: Moves::default(),
                status: GameStatus::Started,
                winner: None,
            },
        };

        assert_eq!(snapshot.initial_position().map(|p| p.occupied().count()), Ok(2));
    }

    #[test]
    fn invalid_initial_position_is_an_error() {
        let snapshot = Snapshot {
            id: "abcd1234".parse().unwrap(),
            initial_fen: Some("not a fen".into()),
            state: GameState {
                moves: Moves::default(),
                status: GameStatus::Started,
                winner: None,
            },
        };

        assert_eq!(snapshot.initial_position(), Err(ParseFenError));
    }

    #[test]
    fn moves_are_split_on_whitespace() {
        assert_eq!(moves("  e2e4   e7e5 ").len(), 2);
        assert!(moves("").is_empty());
    }

    #[proptest]
    fn appended_returns_the_new_moves(
        #[strategy(proptest::collection::vec("[a-h][1-8][a-h][1-8]", 0..8))] old: Vec<String>,
        #[strategy(proptest::collection::vec("[a-h][1-8][a-h][1-8]", 0..8))] new: Vec<String>,
    ) {
        let before: Moves = old.iter().cloned().collect();
        let after: Moves = old.iter().chain(&new).cloned().collect();
        assert_eq!(before.appended(&after), Some(&new[..]));
    }

    #[test]
    fn appended_rejects_rewritten_moves() {
        assert_eq!(moves("e2e4 e7e5").appended(&moves("e2e4 e7e6 g1f3")), None);
        assert_eq!(moves("e2e4 e7e5").appended(&moves("e2e4")), None);
        assert_eq!(moves("e2e4").appended(&moves("e2e4")), Some(&[][..]));
    }
}

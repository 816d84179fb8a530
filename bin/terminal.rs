use async_stream::stream;
use futures_util::Stream;
use lib::chess::{Position, Square};
use lib::game::Command;
use lib::status::Status;
use lib::view::View;
use std::{fmt::Write as _, io::Write, time::Duration};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::warn;

/// Draws the board on a character device.
#[derive(Debug)]
pub struct Terminal<W: Write> {
    writer: W,
    position: Position,
    highlighted: Option<Square>,
}

impl<W: Write> Terminal<W> {
    pub fn new(writer: W) -> Self {
        Terminal {
            writer,
            position: Position::default(),
            highlighted: None,
        }
    }

    fn print(&mut self, text: &str) {
        if let Err(e) = writeln!(self.writer, "{}", text).and_then(|_| self.writer.flush()) {
            warn!(error = %e, "failed to write to the terminal");
        }
    }

    fn draw(&mut self) {
        let board = render(&self.position, self.highlighted);
        self.print(&board);
    }
}

/// Renders a [`Position`] with the first rank at the bottom.
pub fn render(pos: &Position, highlighted: Option<Square>) -> String {
    let mut board = String::new();

    for (i, s) in Square::iter().enumerate() {
        if i % 8 == 0 {
            let _ = write!(board, "{} ", 8 - s.row());
        }

        let figure = pos.piece_at(s).map_or('·', |p| p.figure());
        let _ = match highlighted {
            Some(h) if h == s => write!(board, "[{}]", figure),
            _ => write!(board, " {} ", figure),
        };

        if i % 8 == 7 {
            board.push('\n');
        }
    }

    board.push_str("   a  b  c  d  e  f  g  h");
    board
}

impl<W: Write> View for Terminal<W> {
    fn redraw(&mut self, pos: &Position) {
        self.position = pos.clone();
        self.draw();
    }

    fn highlight(&mut self, s: Square, on: bool) {
        self.highlighted = match (on, self.highlighted) {
            (true, _) => Some(s),
            (false, Some(h)) if h == s => None,
            (false, h) => h,
        };

        self.draw();
    }

    fn explode(&mut self, s: Square, duration: Duration) {
        self.print(&format!("💥 {} ({:?})", s, duration));
    }

    fn status(&mut self, status: &Status) {
        self.print(&status.to_string());
    }
}

/// Reads [`Command`]s separated by whitespace.
pub fn commands<R: AsyncRead + Unpin>(reader: R) -> impl Stream<Item = Command> {
    stream! {
        let mut lines = BufReader::new(reader).lines();

        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    for token in line.split_whitespace() {
                        match token.parse() {
                            Ok(c) => {
                                yield c;
                            }

                            Err(e) => {
                                warn!(error = %e, "ignoring command");
                            }
                        }
                    }
                }

                Ok(None) => break,

                Err(e) => {
                    warn!(error = %e, "failed to read commands");
                    break;
                }
            }
        }
    }
}

use super::{ndjson, Challenge, Event, Service, ServiceError};
use crate::chess::Move;
use crate::session::{GameId, Session, Token};
use async_stream::stream;
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use tracing::{debug, instrument};

/// The default game server.
pub const LICHESS: &str = "https://lichess.org";

/// A client for the [Lichess board API].
///
/// [Lichess board API]: https://lichess.org/api#tag/Board
#[derive(Debug, Clone)]
pub struct Lichess {
    client: Client,
    server: String,
}

impl Default for Lichess {
    fn default() -> Self {
        Lichess::new(LICHESS)
    }
}

#[derive(Deserialize)]
struct Created {
    id: GameId,
}

impl Lichess {
    /// Connects to the game server at `server`.
    pub fn new(server: &str) -> Self {
        Lichess {
            client: Client::new(),
            server: server.trim_end_matches('/').into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.server, path)
    }

    fn game(&self, session: &Session, action: &str) -> RequestBuilder {
        let url = self.url(&format!("board/game/{}/{}", session.id(), action));
        self.client.post(url).bearer_auth(session.token().secret())
    }
}

/// Turns unsuccessful responses into errors.
async fn check(response: Response) -> Result<Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(ServiceError::Status(status.as_u16(), body))
    }
}

#[async_trait]
impl Service for Lichess {
    #[instrument(level = "trace", skip(self, token), err)]
    async fn challenge(
        &self,
        token: &Token,
        challenge: &Challenge,
    ) -> Result<GameId, ServiceError> {
        let response = self
            .client
            .post(self.url("challenge/ai"))
            .bearer_auth(token.secret())
            .form(&challenge.form())
            .send()
            .await?;

        let created: Created = check(response).await?.json().await?;
        debug!(id = %created.id, "game created");
        Ok(created.id)
    }

    #[instrument(level = "trace", skip(self, session), fields(id = %session.id()), err)]
    async fn submit(&self, session: &Session, m: Move) -> Result<(), ServiceError> {
        let response = self.game(session, &format!("move/{}", m)).send().await?;
        check(response).await?;
        Ok(())
    }

    #[instrument(level = "trace", skip(self, session), fields(id = %session.id()))]
    fn stream(&self, session: &Session) -> BoxStream<'static, Result<Event, ServiceError>> {
        let request = self
            .client
            .get(self.url(&format!("board/game/stream/{}", session.id())))
            .bearer_auth(session.token().secret());

        Box::pin(stream! {
            let response = match request.send().await {
                Ok(r) => check(r).await,
                Err(e) => Err(e.into()),
            };

            match response {
                Err(e) => {
                    yield Err(e);
                }

                Ok(r) => {
                    for await event in ndjson::<Event, _, _, _>(r.bytes_stream()) {
                        yield event;
                    }
                }
            }
        })
    }

    #[instrument(level = "trace", skip(self, session), fields(id = %session.id()), err)]
    async fn resign(&self, session: &Session) -> Result<(), ServiceError> {
        check(self.game(session, "resign").send().await?).await?;
        Ok(())
    }

    #[instrument(level = "trace", skip(self, session), fields(id = %session.id()), err)]
    async fn abort(&self, session: &Session) -> Result<(), ServiceError> {
        check(self.game(session, "abort").send().await?).await?;
        Ok(())
    }
}

use super::ServiceError;
use async_stream::stream;
use futures_util::{pin_mut, Stream, StreamExt};
use serde::de::DeserializeOwned;
use tracing::trace;

/// Decodes a stream of [newline delimited JSON] split into arbitrary chunks.
///
/// Blank lines are keep-alive messages and are skipped.
/// A line that fails to decode yields an error, but the stream goes on.
/// A chunk that fails to arrive yields an error and ends the stream.
///
/// [newline delimited JSON]: http://ndjson.org/
pub fn ndjson<T, S, B, E>(chunks: S) -> impl Stream<Item = Result<T, ServiceError>>
where
    T: DeserializeOwned,
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<ServiceError>,
{
    stream! {
        pin_mut!(chunks);
        let mut buffer = Vec::new();

        while let Some(chunk) = chunks.next().await {
            match chunk {
                Err(e) => {
                    let e: ServiceError = e.into();
                    buffer.clear();
                    yield Err(e);
                    break;
                }

                Ok(bytes) => {
                    buffer.extend_from_slice(bytes.as_ref());
                    while let Some(i) = buffer.iter().position(|&b| b == b'\n') {
                        let line: Vec<u8> = buffer.drain(..=i).collect();
                        if let Some(item) = decode(&line) {
                            yield item;
                        }
                    }
                }
            }
        }

        if let Some(item) = decode(&buffer) {
            yield item;
        }
    }
}

fn decode<T: DeserializeOwned>(line: &[u8]) -> Option<Result<T, ServiceError>> {
    if line.iter().all(u8::is_ascii_whitespace) {
        trace!("keep-alive");
        None
    } else {
        Some(serde_json::from_slice(line).map_err(ServiceError::from))
    }
}

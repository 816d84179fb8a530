mod challenge;
mod client;
mod event;
mod ndjson;
mod service;

pub use challenge::*;
pub use client::*;
pub use event::*;
pub use ndjson::*;
pub use service::*;

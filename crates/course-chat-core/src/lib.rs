// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub use app::deps::ChatConfig;
pub use client::{ChatClient, ClientDelegate};
pub use client_builder::{Backend, ClientBuilder, UndefinedBackend};
pub use client_event::{ClientEvent, FeedEventType};
pub use infra::general::ServerEndpoints;

#[cfg(any(test, feature = "test"))]
pub mod test;

pub mod app;
mod client;
mod client_builder;
mod client_event;
pub mod domain;

#[cfg(feature = "test")]
pub mod infra;
#[cfg(not(feature = "test"))]
pub(crate) mod infra;

pub(crate) mod util;

// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub use active_thread::ActiveThread;
pub use thread_service::ThreadService;
pub use transport_session::{DynConnector, ServerEventSink, TransportSession};

mod active_thread;
mod thread_service;
mod transport_session;

// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub use connector::{ClientFrame, Connection, ConnectionEvent, ConnectionEventHandler, Connector};

mod connector;

// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub mod connection;
pub mod feed;
pub mod general;
pub mod history;
pub mod messaging;
pub mod mutations;
pub mod sending;
pub mod thread;

// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub use pending_send_ledger::{PendingSend, PendingSendLedger, SendState, StaleSends};

pub mod models;
mod pending_send_ledger;

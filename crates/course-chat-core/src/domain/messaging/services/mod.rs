// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub use history_service::HistoryService;
pub use message_mutation_service::MessageMutationService;
pub use message_transport::MessageTransport;
pub use temp_id_provider::TempIdProvider;

mod history_service;
mod message_mutation_service;
mod message_transport;
mod temp_id_provider;

#[cfg(any(test, feature = "test"))]
pub mod mocks {
    pub use super::history_service::MockHistoryService;
    pub use super::message_mutation_service::MockMessageMutationService;
    pub use super::message_transport::MockMessageTransport;
}

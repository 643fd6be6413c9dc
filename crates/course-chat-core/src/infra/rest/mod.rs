// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub use rest_history_service::RestHistoryService;
pub use rest_message_mutation_service::RestMessageMutationService;

mod rest_client;
mod rest_history_service;
mod rest_message_mutation_service;

pub(crate) use rest_client::RestClient;

// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub use mutation_coordinator::MutationCoordinator;

pub mod models;
mod mutation_coordinator;

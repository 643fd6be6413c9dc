// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub use server_endpoints::ServerEndpoints;
pub use system_time_provider::SystemTimeProvider;
pub use uuid_temp_id_provider::UuidTempIdProvider;

mod server_endpoints;
mod system_time_provider;
mod uuid_temp_id_provider;

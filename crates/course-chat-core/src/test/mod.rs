// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub use constant_time_provider::ConstantTimeProvider;
pub use fake_connector::FakeConnector;
pub use incrementing_temp_id_provider::IncrementingTempIdProvider;
pub use message_builder::MessageBuilder;
pub use mock_app_dependencies::{mock_sender, MockAppDependencies};

mod incrementing_temp_id_provider;

pub mod mock_data {
    pub use super::mock_app_dependencies::{
        mock_course_id as course_id, mock_reference_date as reference_date,
        mock_sender as sender,
    };
}

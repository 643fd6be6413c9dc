// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use uuid::Uuid;

use crate::domain::messaging::models::TempId;
use crate::domain::messaging::services::TempIdProvider;

#[derive(Default)]
pub struct UuidTempIdProvider {}

impl TempIdProvider for UuidTempIdProvider {
    fn new_temp_id(&self) -> TempId {
        Uuid::new_v4().to_string().into()
    }
}

// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use crate::domain::messaging::models::TempId;

pub trait TempIdProvider: Send + Sync {
    fn new_temp_id(&self) -> TempId;
}

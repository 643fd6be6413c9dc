// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use parking_lot::Mutex;

use crate::domain::messaging::models::TempId;
use crate::domain::messaging::services::TempIdProvider;

/// Hands out `temp-1`, `temp-2`, …
#[derive(Default)]
pub struct IncrementingTempIdProvider {
    last_id: Mutex<u64>,
}

impl IncrementingTempIdProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TempIdProvider for IncrementingTempIdProvider {
    fn new_temp_id(&self) -> TempId {
        let mut last_id = self.last_id.lock();
        *last_id += 1;
        format!("temp-{}", *last_id).into()
    }
}

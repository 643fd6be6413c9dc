// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::fmt::{Debug, Formatter};

use secrecy::SecretString;

use crate::domain::messaging::models::CourseId;

pub struct ConnectParams {
    pub course_id: CourseId,
    pub access_token: SecretString,
}

impl Debug for ConnectParams {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectParams")
            .field("course_id", &self.course_id)
            .finish_non_exhaustive()
    }
}

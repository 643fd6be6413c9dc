// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::fmt::{Debug, Formatter};

use secrecy::{ExposeSecret, SecretString};

use crate::domain::messaging::models::{CourseId, Sender};

use super::ConnectParams;

/// Who is chatting. Provided by the embedding platform which owns authentication.
pub struct Credentials {
    pub user: Sender,
    pub access_token: SecretString,
}

impl Credentials {
    pub fn new(user: Sender, access_token: impl Into<String>) -> Self {
        Self {
            user,
            access_token: SecretString::new(access_token.into()),
        }
    }

    pub fn connect_params(&self, course_id: CourseId) -> ConnectParams {
        ConnectParams {
            course_id,
            access_token: SecretString::new(self.access_token.expose_secret().clone()),
        }
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

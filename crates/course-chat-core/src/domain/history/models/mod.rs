// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub use message_page::{MessagePage, PageCursor};
pub use page_load_error::PageLoadError;
pub use page_load_outcome::PageLoadOutcome;

mod message_page;
mod page_load_error;
mod page_load_outcome;

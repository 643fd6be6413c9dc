// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub use history_pager::{HistoryPager, PageCompletion, PageFetch, PageRequest};

mod history_pager;
pub mod models;

// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use url::Url;

/// Where the chat backend lives.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerEndpoints {
    /// The push channel, e.g. `wss://chat.example.org/ws`.
    pub websocket_url: Url,
    /// Base of the REST interface, e.g. `https://chat.example.org/api/v1`.
    pub api_base_url: Url,
}

// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub use backoff_policy::BackoffPolicy;
pub use connect_params::ConnectParams;
pub use connection_status::ConnectionStatus;
pub use credentials::Credentials;
pub use transport_error::TransportError;

mod backoff_policy;
mod connect_params;
mod connection_status;
mod credentials;
mod transport_error;

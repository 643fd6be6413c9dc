// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::sync::Arc;

use crate::app::deps::app_context::AppContext;
use crate::app::event_handlers::ClientEventDispatcherTrait;
use crate::app::services::ActiveThread;
use crate::domain::general::services::TimeProvider;
use crate::domain::messaging::services::{
    HistoryService, MessageMutationService, MessageTransport, TempIdProvider,
};

pub type DynActiveThread = Arc<ActiveThread>;
pub type DynAppContext = Arc<AppContext>;
pub type DynClientEventDispatcher = Arc<dyn ClientEventDispatcherTrait>;
pub type DynHistoryService = Arc<dyn HistoryService>;
pub type DynMessageMutationService = Arc<dyn MessageMutationService>;
pub type DynMessageTransport = Arc<dyn MessageTransport>;
pub type DynTempIdProvider = Arc<dyn TempIdProvider>;
pub type DynTimeProvider = Arc<dyn TimeProvider>;

pub struct AppDependencies {
    pub active_thread: DynActiveThread,
    pub client_event_dispatcher: DynClientEventDispatcher,
    pub ctx: DynAppContext,
    pub history_service: DynHistoryService,
    pub mutation_service: DynMessageMutationService,
    pub temp_id_provider: DynTempIdProvider,
    pub time_provider: DynTimeProvider,
    pub transport: DynMessageTransport,
}

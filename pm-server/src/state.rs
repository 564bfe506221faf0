//! Shared state handed to every handler.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, OnceCell, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

use pm_core::config::{AppConfig, ServerConfig};
use pm_core::error::{PmError, PmResult};
use pm_llm::{ChatModel, OllamaClient};
use pm_models::Database;
use pm_services::{AssistantService, Conversation, DirectoryService, Service};

/// A conversation shared between requests. Turns are serialized by the mutex.
pub type SharedConversation = Arc<Mutex<Conversation>>;

/// Bounds on the explicit sessions a server keeps in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    pub max_sessions: usize,
    /// `None` keeps idle sessions until they are deleted or evicted.
    pub idle_timeout: Option<Duration>,
}

impl SessionLimits {
    pub fn from_config(server: &ServerConfig) -> Self {
        Self {
            max_sessions: server.max_chat_sessions.max(1),
            idle_timeout: (server.chat_session_idle_secs > 0)
                .then(|| Duration::from_secs(server.chat_session_idle_secs)),
        }
    }
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self::from_config(&ServerConfig::default())
    }
}

struct SessionSlot {
    conversation: SharedConversation,
    last_used: Instant,
    /// Position in use order; smallest is least recently used.
    touched: u64,
}

#[derive(Default)]
struct SessionMap {
    slots: HashMap<Uuid, SessionSlot>,
    clock: u64,
}

impl SessionMap {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn expire_idle(&mut self, idle_timeout: Option<Duration>) {
        let Some(timeout) = idle_timeout else {
            return;
        };
        let before = self.slots.len();
        self.slots.retain(|_, slot| slot.last_used.elapsed() <= timeout);
        let expired = before - self.slots.len();
        if expired > 0 {
            info!(expired, "idle chat sessions dropped");
        }
    }

    fn evict_least_recent(&mut self) {
        let oldest = self
            .slots
            .iter()
            .min_by_key(|(_, slot)| slot.touched)
            .map(|(id, _)| *id);
        if let Some(id) = oldest {
            self.slots.remove(&id);
            warn!(session = %id, "session limit reached; evicted least recently used session");
        }
    }
}

/// Live chat sessions keyed by id, plus the lazily created default session
/// behind `POST /chat`.
///
/// Explicit sessions are capped and expire when idle; the default session
/// lives as long as the store.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<SessionMap>>,
    default: Arc<OnceCell<SharedConversation>>,
    limits: SessionLimits,
}

impl SessionStore {
    pub fn new(limits: SessionLimits) -> Self {
        Self {
            sessions: Arc::default(),
            default: Arc::default(),
            limits,
        }
    }

    pub fn limits(&self) -> SessionLimits {
        self.limits
    }

    /// Register a conversation and return its id, making room first when
    /// the store is full.
    pub async fn insert(&self, conversation: Conversation) -> Uuid {
        let id = conversation.id();
        let mut map = self.sessions.write().await;
        map.expire_idle(self.limits.idle_timeout);
        while map.slots.len() >= self.limits.max_sessions.max(1) {
            map.evict_least_recent();
        }
        let touched = map.tick();
        map.slots.insert(
            id,
            SessionSlot {
                conversation: Arc::new(Mutex::new(conversation)),
                last_used: Instant::now(),
                touched,
            },
        );
        info!(session = %id, open = map.slots.len(), "chat session opened");
        id
    }

    /// Look up a session and mark it used. Expired sessions are dropped and
    /// reported as missing.
    pub async fn get(&self, id: &Uuid) -> Option<SharedConversation> {
        let mut map = self.sessions.write().await;
        map.expire_idle(self.limits.idle_timeout);
        let touched = map.tick();
        let slot = map.slots.get_mut(id)?;
        slot.last_used = Instant::now();
        slot.touched = touched;
        Some(slot.conversation.clone())
    }

    /// Drop a session. Returns whether it existed.
    pub async fn remove(&self, id: &Uuid) -> bool {
        let removed = self.sessions.write().await.slots.remove(id).is_some();
        if removed {
            info!(session = %id, "chat session closed");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.slots.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// The single-endpoint session, created on first use.
    pub async fn default_session(&self, assistant: &AssistantService) -> PmResult<SharedConversation> {
        self.default
            .get_or_try_init(|| async {
                let conversation = assistant.new_conversation()?;
                info!(session = %conversation.id(), "default chat session created");
                Ok::<_, PmError>(Arc::new(Mutex::new(conversation)))
            })
            .await
            .cloned()
    }
}

/// Everything a handler can reach.
#[derive(Clone)]
pub struct AppState {
    pub directory: DirectoryService,
    pub assistant: AssistantService,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(directory: DirectoryService, assistant: AssistantService) -> Self {
        Self {
            directory,
            assistant,
            sessions: SessionStore::default(),
        }
    }

    /// Replace the session store with one bounded by `limits`.
    pub fn with_session_limits(mut self, limits: SessionLimits) -> Self {
        self.sessions = SessionStore::new(limits);
        self
    }

    /// Open the database, connect the model client and start both services.
    pub fn from_config(config: &AppConfig) -> PmResult<Self> {
        let db_path = config.effective_db_path()?;
        let database = Database::init(&db_path, &config.database)?;

        let mut directory = DirectoryService::new(database);
        directory.init()?;

        let model: Arc<dyn ChatModel> = Arc::new(OllamaClient::new(&config.llm)?);
        let mut assistant = AssistantService::new(model, directory.clone(), config.assistant.clone());
        assistant.init()?;

        Ok(Self::new(directory, assistant)
            .with_session_limits(SessionLimits::from_config(&config.server)))
    }
}

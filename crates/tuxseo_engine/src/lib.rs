//! TuxSEO engine: dispatching actions to the server, polling, and client-local storage.
mod api;
mod dispatch;
mod engine;
mod filename;
mod persist;
mod poll;
mod store;
mod token;
mod types;

pub use api::{
    CompetitorDto, GeneratedContentDto, KeywordDto, ProjectDetailsForm, ScanStatus,
    ScannedProject, SuggestionDto, TuxSeoApi, UserSettings,
};
pub use dispatch::{interpret_response, ActionDispatcher, DispatchSettings, ReqwestDispatcher};
pub use engine::{ApiCall, ApiReply, EngineEvent, EngineHandle};
pub use filename::key_filename;
pub use persist::{ensure_store_dir, AtomicFileWriter, PersistError};
pub use poll::{start_polling, PollHandle, PollObserver, PollPolicy, PollStep, PollTracker};
pub use store::{
    project_settings_key, CachedFeatures, FileStore, LocalStore, MemoryStore, SettingsCache,
    CURRENT_PROJECT_KEY, USER_PROFILE_KEY, VIEW_STATE_KEY,
};
pub use token::PageContext;
pub use types::{ActionError, ActionRequest, ErrorKind, Method, ProjectId, RequestBody};

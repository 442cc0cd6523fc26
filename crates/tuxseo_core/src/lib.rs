//! TuxSEO core: pure view-state machines for the dashboard controllers.
mod effect;
mod model;
mod msg;
mod optimistic;
mod reconcile;
mod rows;
mod state;
pub mod trend;
mod update;
mod view_model;

pub use effect::Effect;
pub use model::{
    ActionFailure, Competitor, FailureKind, GeneratedContent, GroupId, Keyword, KeywordId,
    Notification, PostId, ProjectDetails, ProjectFeatures, ProjectId, ScanJob, Score, Severity,
    Suggestion, SuggestionId, DEFAULT_PRICING_STRATEGY,
};
pub use msg::Msg;
pub use optimistic::{CellState, InFlight, OptimisticCell};
pub use reconcile::{
    Direction, GroupBoard, ItemGroup, ItemKey, ItemList, KeyKind, ListItem, MoveEvent, SortKey,
};
pub use rows::KeyValueRows;
pub use state::{
    normalize_scan_url, AppState, ContentPhase, KeywordSort, ProjectTask, ScanPhase, ViewState,
};
pub use update::update;
pub use view_model::{
    AppViewModel, GroupView, KeywordRowView, ProjectRowView, SuggestionRowView, ToggleView,
};

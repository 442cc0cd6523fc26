use std::collections::{BTreeMap, BTreeSet};

use url::Url;

use crate::optimistic::OptimisticCell;
use crate::reconcile::{Direction, GroupBoard, ItemList, KeyKind, ListItem, SortKey};
use crate::view_model::{
    AppViewModel, GroupView, KeywordRowView, ProjectRowView, SuggestionRowView, ToggleView,
};
use crate::{
    Competitor, GeneratedContent, GroupId, Keyword, KeywordId, ProjectFeatures, ProjectId,
    ScanJob, Score, Suggestion, SuggestionId,
};

/// Progress of the project scan form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScanPhase {
    #[default]
    Idle,
    Submitting {
        url: String,
    },
    Analyzing {
        job: ScanJob,
    },
    Complete {
        job: ScanJob,
    },
    Failed {
        message: String,
    },
}

/// Content generation state for one suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ContentPhase {
    #[default]
    Idle,
    Generating,
    Ready(GeneratedContent),
    Failed {
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordSort {
    Text,
    Volume,
    Created,
}

impl KeywordSort {
    pub fn sort_key(self) -> SortKey {
        match self {
            KeywordSort::Text => SortKey::new(KEYWORD_TEXT_ATTR, KeyKind::Text),
            KeywordSort::Volume => SortKey::new(KEYWORD_VOLUME_ATTR, KeyKind::Numeric),
            KeywordSort::Created => SortKey::new(CREATED_ATTR, KeyKind::Chronological),
        }
    }
}

/// Per-project requests that disable their own button while in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProjectTask {
    PricingPage,
    PricingStrategy,
    TitleFromIdea,
    SaveDetails,
}

/// The one place current tab, sort and filter live. Local storage only caches it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewState {
    pub current_tab: GroupId,
    pub keyword_sort: Option<(KeywordSort, Direction)>,
    pub keyword_filter: String,
}

pub(crate) const KEYWORD_TEXT_ATTR: &str = "keyword";
pub(crate) const KEYWORD_VOLUME_ATTR: &str = "volume";
pub(crate) const CREATED_ATTR: &str = "created";
pub(crate) const TITLE_ATTR: &str = "title";
pub(crate) const CATEGORY_ATTR: &str = "category";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    auto_submission: BTreeMap<ProjectId, OptimisticCell<bool>>,
    scan: ScanPhase,
    projects: Vec<ScanJob>,
    suggestions: BTreeMap<SuggestionId, Suggestion>,
    board: GroupBoard,
    scores: BTreeMap<SuggestionId, OptimisticCell<Score>>,
    generating_for: BTreeSet<ProjectId>,
    pending_archive: BTreeSet<SuggestionId>,
    pending_post: BTreeSet<SuggestionId>,
    content: BTreeMap<SuggestionId, ContentPhase>,
    keywords: BTreeMap<KeywordId, Keyword>,
    keyword_list: ItemList,
    keyword_use: BTreeMap<KeywordId, OptimisticCell<bool>>,
    adding_keyword: bool,
    competitors: Vec<Competitor>,
    adding_competitor: bool,
    project_tasks: BTreeSet<(ProjectId, ProjectTask)>,
    pricing_agents: BTreeSet<ProjectId>,
    features: BTreeMap<ProjectId, ProjectFeatures>,
    loading_settings: BTreeSet<ProjectId>,
    view_state: ViewState,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        let toggles = self
            .auto_submission
            .iter()
            .map(|(project_id, cell)| ToggleView {
                project_id: *project_id,
                enabled: cell.displayed(),
                pending: cell.is_pending(),
            })
            .collect();

        let projects = self
            .projects
            .iter()
            .map(|job| ProjectRowView {
                project_id: job.project_id,
                name: job.display_name().to_string(),
                kind: job.kind.clone(),
                url: job.url.clone(),
                summary: job.summary.clone(),
            })
            .collect();

        let groups = self
            .board
            .groups()
            .iter()
            .map(|group| GroupView {
                id: group.id(),
                suggestions: group
                    .list()
                    .visible()
                    .filter_map(|item| self.suggestions.get(&item.key()))
                    .map(|suggestion| self.suggestion_row(suggestion))
                    .collect(),
            })
            .collect();

        let keywords = self
            .keyword_list
            .visible()
            .filter_map(|item| self.keywords.get(&item.key()))
            .map(|keyword| KeywordRowView {
                keyword_id: keyword.id,
                text: keyword.text.clone(),
                volume: keyword.volume,
                in_use: keyword.in_use,
                pending: self
                    .keyword_use
                    .get(&keyword.id)
                    .is_some_and(OptimisticCell::is_pending),
            })
            .collect();

        AppViewModel {
            toggles,
            scan: self.scan.clone(),
            projects,
            groups,
            current_tab: self.view_state.current_tab,
            generating_suggestions: self.generating_for.iter().copied().collect(),
            keywords,
            keyword_filter: self.view_state.keyword_filter.clone(),
            competitors: self.competitors.clone(),
            adding_keyword: self.adding_keyword,
            adding_competitor: self.adding_competitor,
            busy: self.project_tasks.iter().copied().collect(),
            pricing_agents: self.pricing_agents.iter().copied().collect(),
            dirty: self.dirty,
        }
    }

    fn suggestion_row(&self, suggestion: &Suggestion) -> SuggestionRowView {
        SuggestionRowView {
            suggestion_id: suggestion.id,
            title: suggestion.title.clone(),
            description: suggestion.description.clone(),
            category: suggestion.category.clone(),
            score: suggestion.score,
            archived: suggestion.archived,
            posted: suggestion.posted,
            pending: self.pending_archive.contains(&suggestion.id)
                || self.pending_post.contains(&suggestion.id)
                || self
                    .scores
                    .get(&suggestion.id)
                    .is_some_and(OptimisticCell::is_pending),
            content: self.content.get(&suggestion.id).cloned().unwrap_or_default(),
        }
    }

    /// Returns and clears the dirty flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn view_state(&self) -> &ViewState {
        &self.view_state
    }

    pub fn scan_phase(&self) -> &ScanPhase {
        &self.scan
    }

    pub fn suggestion(&self, id: SuggestionId) -> Option<&Suggestion> {
        self.suggestions.get(&id)
    }

    pub fn keyword(&self, id: KeywordId) -> Option<&Keyword> {
        self.keywords.get(&id)
    }

    pub fn group_of(&self, id: SuggestionId) -> Option<GroupId> {
        self.board.locate(id)
    }

    pub fn features(&self, project_id: ProjectId) -> ProjectFeatures {
        self.features.get(&project_id).copied().unwrap_or_default()
    }

    /// True while any request started by this state is still unresolved.
    pub fn has_pending_work(&self) -> bool {
        !matches!(self.scan, ScanPhase::Idle | ScanPhase::Complete { .. } | ScanPhase::Failed { .. })
            || self.auto_submission.values().any(OptimisticCell::is_pending)
            || self.scores.values().any(OptimisticCell::is_pending)
            || self.keyword_use.values().any(OptimisticCell::is_pending)
            || !self.generating_for.is_empty()
            || !self.pending_archive.is_empty()
            || !self.pending_post.is_empty()
            || self
                .content
                .values()
                .any(|phase| matches!(phase, ContentPhase::Generating))
            || self.adding_keyword
            || self.adding_competitor
            || !self.project_tasks.is_empty()
            || !self.loading_settings.is_empty()
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    // Auto-submission toggles.

    pub(crate) fn auto_submission_cell(&mut self, project_id: ProjectId) -> &mut OptimisticCell<bool> {
        self.auto_submission.entry(project_id).or_default()
    }

    pub(crate) fn load_auto_submission(&mut self, project_id: ProjectId, enabled: bool) {
        let cell = self.auto_submission_cell(project_id);
        if !cell.is_pending() {
            *cell = OptimisticCell::new(enabled);
        }
    }

    // Scan.

    pub(crate) fn set_scan(&mut self, phase: ScanPhase) {
        self.scan = phase;
    }

    pub(crate) fn add_project(&mut self, job: ScanJob) {
        self.projects.retain(|existing| existing.project_id != job.project_id);
        self.projects.insert(0, job);
    }

    // Suggestions.

    /// Stores a server copy of a suggestion. A settled score cell restarts from the
    /// server value; a pending one keeps its speculative score.
    pub(crate) fn insert_suggestion(&mut self, mut suggestion: Suggestion) {
        match self.scores.get(&suggestion.id) {
            Some(cell) if cell.is_pending() => suggestion.score = cell.displayed(),
            _ => {
                self.scores
                    .insert(suggestion.id, OptimisticCell::new(suggestion.score));
            }
        }
        let item = suggestion_item(&suggestion);
        let home = suggestion.home_group();
        let id = suggestion.id;
        self.suggestions.insert(id, suggestion);
        match self.board.locate(id) {
            Some(current) => {
                if current != home {
                    self.board.move_item(id, home);
                }
                if let Some(existing) = self.board.get_mut(id) {
                    *existing = item;
                }
            }
            None => {
                if let Some(group) = self.board.group_mut(home) {
                    group.list_mut().push(item);
                }
            }
        }
    }

    pub(crate) fn suggestion_mut(&mut self, id: SuggestionId) -> Option<&mut Suggestion> {
        self.suggestions.get_mut(&id)
    }

    pub(crate) fn move_suggestion(&mut self, id: SuggestionId, destination: GroupId) -> bool {
        self.board.move_item(id, destination)
    }

    pub(crate) fn score_cell(&mut self, id: SuggestionId, current: Score) -> &mut OptimisticCell<Score> {
        self.scores
            .entry(id)
            .or_insert_with(|| OptimisticCell::new(current))
    }

    pub(crate) fn existing_score_cell(&mut self, id: SuggestionId) -> Option<&mut OptimisticCell<Score>> {
        self.scores.get_mut(&id)
    }

    pub(crate) fn generating_for_mut(&mut self) -> &mut BTreeSet<ProjectId> {
        &mut self.generating_for
    }

    pub(crate) fn pending_archive_mut(&mut self) -> &mut BTreeSet<SuggestionId> {
        &mut self.pending_archive
    }

    pub(crate) fn pending_post_mut(&mut self) -> &mut BTreeSet<SuggestionId> {
        &mut self.pending_post
    }

    pub(crate) fn content_phase(&self, id: SuggestionId) -> ContentPhase {
        self.content.get(&id).cloned().unwrap_or_default()
    }

    pub(crate) fn set_content_phase(&mut self, id: SuggestionId, phase: ContentPhase) {
        self.content.insert(id, phase);
    }

    pub(crate) fn set_features(&mut self, project_id: ProjectId, features: ProjectFeatures) {
        self.loading_settings.remove(&project_id);
        self.features.insert(project_id, features);
    }

    /// True the first time a project's settings are requested.
    pub(crate) fn begin_settings_load(&mut self, project_id: ProjectId) -> bool {
        !self.features.contains_key(&project_id) && self.loading_settings.insert(project_id)
    }

    // Keywords.

    /// Same refresh rule as `insert_suggestion`, for the mark-as-used cell.
    pub(crate) fn insert_keyword(&mut self, mut keyword: Keyword) {
        match self.keyword_use.get(&keyword.id) {
            Some(cell) if cell.is_pending() => keyword.in_use = cell.displayed(),
            _ => {
                self.keyword_use
                    .insert(keyword.id, OptimisticCell::new(keyword.in_use));
            }
        }
        let item = keyword_item(&keyword);
        let id = keyword.id;
        self.keywords.insert(id, keyword);
        if let Some(existing) = self.keyword_list.get_mut(id) {
            *existing = item;
        } else {
            self.keyword_list.push(item);
        }
    }

    pub(crate) fn keyword_mut(&mut self, id: KeywordId) -> Option<&mut Keyword> {
        self.keywords.get_mut(&id)
    }

    pub(crate) fn keyword_use_cell(&mut self, id: KeywordId, current: bool) -> &mut OptimisticCell<bool> {
        self.keyword_use
            .entry(id)
            .or_insert_with(|| OptimisticCell::new(current))
    }

    pub(crate) fn existing_keyword_use_cell(&mut self, id: KeywordId) -> Option<&mut OptimisticCell<bool>> {
        self.keyword_use.get_mut(&id)
    }

    pub(crate) fn adding_keyword(&self) -> bool {
        self.adding_keyword
    }

    pub(crate) fn set_adding_keyword(&mut self, adding: bool) {
        self.adding_keyword = adding;
    }

    /// Re-applies the view-state sort and filter to the keyword list.
    pub(crate) fn reconcile_keywords(&mut self) {
        if let Some((sort, direction)) = self.view_state.keyword_sort {
            self.keyword_list.sort(&sort.sort_key(), direction);
        }
        let query = self.view_state.keyword_filter.clone();
        self.keyword_list.filter_text(KEYWORD_TEXT_ATTR, &query);
    }

    // Competitors.

    pub(crate) fn adding_competitor(&self) -> bool {
        self.adding_competitor
    }

    pub(crate) fn set_adding_competitor(&mut self, adding: bool) {
        self.adding_competitor = adding;
    }

    pub(crate) fn push_competitor(&mut self, competitor: Competitor) {
        self.competitors.push(competitor);
    }

    // Project tasks.

    pub fn is_busy(&self, project_id: ProjectId, task: ProjectTask) -> bool {
        self.project_tasks.contains(&(project_id, task))
    }

    /// False when the same task is already running for the project.
    pub(crate) fn begin_task(&mut self, project_id: ProjectId, task: ProjectTask) -> bool {
        self.project_tasks.insert((project_id, task))
    }

    pub(crate) fn finish_task(&mut self, project_id: ProjectId, task: ProjectTask) {
        self.project_tasks.remove(&(project_id, task));
    }

    pub(crate) fn enable_pricing_agent(&mut self, project_id: ProjectId) {
        self.pricing_agents.insert(project_id);
    }

    // View state.

    pub(crate) fn view_state_mut(&mut self) -> &mut ViewState {
        &mut self.view_state
    }
}

fn suggestion_item(suggestion: &Suggestion) -> ListItem {
    ListItem::new(suggestion.id)
        .with_attr(TITLE_ATTR, suggestion.title.clone())
        .with_attr(CATEGORY_ATTR, suggestion.category.clone())
        .with_attr(CREATED_ATTR, suggestion.created_at.clone())
}

fn keyword_item(keyword: &Keyword) -> ListItem {
    let item = ListItem::new(keyword.id)
        .with_attr(KEYWORD_TEXT_ATTR, keyword.text.clone())
        .with_attr(CREATED_ATTR, keyword.created_at.clone());
    match keyword.volume {
        Some(volume) => item.with_attr(KEYWORD_VOLUME_ATTR, volume.to_string()),
        None => item,
    }
}

/// Validates the scan form input, defaulting to https when no scheme is given.
pub fn normalize_scan_url(raw: &str) -> Result<String, &'static str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("Please enter a URL.");
    }
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    let parsed = Url::parse(&candidate).map_err(|_| "Please enter a valid URL.")?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err("Please enter a valid URL.");
    }
    Ok(parsed.to_string())
}

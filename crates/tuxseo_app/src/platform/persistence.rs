use serde::{Deserialize, Serialize};
use tuxseo_core::{Direction, GroupId, KeywordSort, ScanJob, ViewState};
use tuxseo_engine::{ScannedProject, SettingsCache, VIEW_STATE_KEY};
use tuxseo_logging::{tux_error, tux_info};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedSort {
    column: String,
    direction: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedViewState {
    #[serde(default)]
    current_tab: String,
    #[serde(default)]
    keyword_sort: Option<PersistedSort>,
    #[serde(default)]
    keyword_filter: String,
}

pub(crate) fn load_view_state(cache: &SettingsCache) -> Option<ViewState> {
    let persisted: PersistedViewState = cache.load_json(VIEW_STATE_KEY)?;
    let keyword_sort = persisted.keyword_sort.and_then(|sort| {
        Some((parse_sort(&sort.column)?, parse_direction(&sort.direction)?))
    });
    tux_info!("Loaded persisted view state");
    Some(ViewState {
        current_tab: GroupId::parse(&persisted.current_tab).unwrap_or_default(),
        keyword_sort,
        keyword_filter: persisted.keyword_filter,
    })
}

pub(crate) fn save_view_state(cache: &SettingsCache, view_state: &ViewState) {
    let persisted = PersistedViewState {
        current_tab: view_state.current_tab.as_str().to_string(),
        keyword_sort: view_state
            .keyword_sort
            .map(|(sort, direction)| PersistedSort {
                column: sort_name(sort).to_string(),
                direction: direction_name(direction).to_string(),
            }),
        keyword_filter: view_state.keyword_filter.clone(),
    };
    if let Err(err) = cache.save_json(VIEW_STATE_KEY, &persisted) {
        tux_error!("Failed to write persisted view state: {}", err);
    }
}

pub(crate) fn remember_scan(cache: &SettingsCache, job: &ScanJob) {
    let project = ScannedProject {
        project_id: job.project_id,
        name: job.name.clone(),
        kind: job.kind.clone(),
        url: job.url.clone(),
        summary: job.summary.clone(),
    };
    if let Err(err) = cache.remember_scan(&project) {
        tux_error!("Failed to remember scan of project {}: {}", job.project_id, err);
    }
}

pub(crate) fn remembered_scan(cache: &SettingsCache) -> Option<ScanJob> {
    cache.remembered_scan().map(scan_job)
}

pub(crate) fn forget_scan(cache: &SettingsCache) {
    if let Err(err) = cache.forget_scan() {
        tux_error!("Failed to forget remembered scan: {}", err);
    }
}

pub(crate) fn scan_job(project: ScannedProject) -> ScanJob {
    ScanJob {
        project_id: project.project_id,
        url: project.url,
        name: project.name,
        kind: project.kind,
        summary: project.summary,
        completed: false,
    }
}

fn sort_name(sort: KeywordSort) -> &'static str {
    match sort {
        KeywordSort::Text => "text",
        KeywordSort::Volume => "volume",
        KeywordSort::Created => "created",
    }
}

fn parse_sort(raw: &str) -> Option<KeywordSort> {
    match raw {
        "text" => Some(KeywordSort::Text),
        "volume" => Some(KeywordSort::Volume),
        "created" => Some(KeywordSort::Created),
        _ => None,
    }
}

fn direction_name(direction: Direction) -> &'static str {
    match direction {
        Direction::Ascending => "asc",
        Direction::Descending => "desc",
    }
}

fn parse_direction(raw: &str) -> Option<Direction> {
    match raw {
        "asc" => Some(Direction::Ascending),
        "desc" => Some(Direction::Descending),
        _ => None,
    }
}

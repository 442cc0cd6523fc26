use crate::{
    Competitor, ContentPhase, GroupId, KeywordId, ProjectId, ProjectTask, ScanPhase, Score,
    SuggestionId,
};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub toggles: Vec<ToggleView>,
    pub scan: ScanPhase,
    pub projects: Vec<ProjectRowView>,
    pub groups: Vec<GroupView>,
    pub current_tab: GroupId,
    pub generating_suggestions: Vec<ProjectId>,
    pub keywords: Vec<KeywordRowView>,
    pub keyword_filter: String,
    pub competitors: Vec<Competitor>,
    pub adding_keyword: bool,
    pub adding_competitor: bool,
    /// Project requests in flight; their buttons render disabled.
    pub busy: Vec<(ProjectId, ProjectTask)>,
    /// Projects whose pricing page was analyzed and can open the pricing agent.
    pub pricing_agents: Vec<ProjectId>,
    pub dirty: bool,
}

impl AppViewModel {
    pub fn group(&self, id: GroupId) -> Option<&GroupView> {
        self.groups.iter().find(|group| group.id == id)
    }

    pub fn is_busy(&self, project_id: ProjectId, task: ProjectTask) -> bool {
        self.busy.contains(&(project_id, task))
    }

    pub fn toggle(&self, project_id: ProjectId) -> Option<&ToggleView> {
        self.toggles
            .iter()
            .find(|toggle| toggle.project_id == project_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleView {
    pub project_id: ProjectId,
    pub enabled: bool,
    pub pending: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRowView {
    pub project_id: ProjectId,
    pub name: String,
    pub kind: String,
    pub url: String,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupView {
    pub id: GroupId,
    pub suggestions: Vec<SuggestionRowView>,
}

impl GroupView {
    pub fn ids(&self) -> Vec<SuggestionId> {
        self.suggestions.iter().map(|row| row.suggestion_id).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionRowView {
    pub suggestion_id: SuggestionId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub score: Score,
    pub archived: bool,
    pub posted: bool,
    pub pending: bool,
    pub content: ContentPhase,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordRowView {
    pub keyword_id: KeywordId,
    pub text: String,
    pub volume: Option<u64>,
    pub in_use: bool,
    pub pending: bool,
}

use crate::{
    Notification, PostId, ProjectDetails, ProjectId, ScanJob, Score, SuggestionId, ViewState,
};

/// Side effects requested by `update`; the platform layer executes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    ToggleAutoSubmission {
        project_id: ProjectId,
        desired: bool,
    },
    SubmitScan {
        url: String,
    },
    StartPolling {
        project_id: ProjectId,
    },
    StopPolling {
        project_id: ProjectId,
    },
    /// Keep the in-progress scan so a reload can resume polling.
    RememberScan(ScanJob),
    ForgetScan,
    GenerateSuggestions {
        project_id: ProjectId,
    },
    SetArchiveStatus {
        suggestion_id: SuggestionId,
        archived: bool,
    },
    UpdateScore {
        suggestion_id: SuggestionId,
        score: Score,
    },
    PublishPost {
        suggestion_id: SuggestionId,
        post_id: PostId,
    },
    GenerateContent {
        suggestion_id: SuggestionId,
    },
    AddKeyword {
        project_id: ProjectId,
        text: String,
    },
    ToggleKeywordUse {
        project_id: ProjectId,
        keyword_id: crate::KeywordId,
    },
    AddCompetitor {
        project_id: ProjectId,
        url: String,
    },
    AddPricingPage {
        project_id: ProjectId,
        url: String,
    },
    CreatePricingStrategy {
        project_id: ProjectId,
        strategy_name: String,
        user_prompt: String,
    },
    GenerateTitleFromIdea {
        project_id: ProjectId,
        idea: String,
    },
    UpdateProjectDetails {
        project_id: ProjectId,
        details: ProjectDetails,
    },
    /// Refresh the cached project and profile settings.
    FetchProjectSettings {
        project_id: ProjectId,
    },
    PersistViewState(ViewState),
    Notify(Notification),
}

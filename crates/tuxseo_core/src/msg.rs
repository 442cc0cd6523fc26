use crate::reconcile::Direction;
use crate::{
    ActionFailure, Competitor, GeneratedContent, GroupId, Keyword, KeywordId, KeywordSort,
    ProjectDetails, ProjectFeatures, ProjectId, ScanJob, Score, Suggestion, SuggestionId,
    ViewState,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Initial toggle value from server-rendered markup.
    AutoSubmissionLoaded { project_id: ProjectId, enabled: bool },
    /// Server-rendered suggestions present when the page loads.
    SuggestionsLoaded(Vec<Suggestion>),
    KeywordsLoaded(Vec<Keyword>),
    /// A project page was opened; its settings are fetched once.
    ProjectOpened {
        project_id: ProjectId,
    },
    /// Cached project settings became available.
    ProjectFeaturesLoaded {
        project_id: ProjectId,
        features: ProjectFeatures,
    },
    /// Cached view state read at startup.
    RestoreViewState(ViewState),
    /// A scan remembered from a previous page load.
    RestoreScan(ScanJob),

    AutoSubmissionToggleClicked { project_id: ProjectId },
    AutoSubmissionToggled {
        project_id: ProjectId,
        result: Result<bool, ActionFailure>,
    },

    ScanSubmitted { url: String },
    ScanAccepted(ScanJob),
    ScanRejected(ActionFailure),
    /// One poll tick answered.
    ScanStatusReceived { project_id: ProjectId, completed: bool },
    /// Polling gave up.
    ScanPollFailed {
        project_id: ProjectId,
        failure: ActionFailure,
    },
    DismissScan,

    GenerateSuggestionsClicked { project_id: ProjectId },
    SuggestionsGenerated {
        project_id: ProjectId,
        result: Result<Vec<Suggestion>, ActionFailure>,
    },

    ArchiveClicked {
        suggestion_id: SuggestionId,
        archived: bool,
    },
    ArchiveStatusChanged {
        suggestion_id: SuggestionId,
        archived: bool,
        result: Result<(), ActionFailure>,
    },
    ScoreClicked {
        suggestion_id: SuggestionId,
        score: Score,
    },
    ScoreUpdated {
        suggestion_id: SuggestionId,
        result: Result<(), ActionFailure>,
    },
    PostClicked { suggestion_id: SuggestionId },
    PostPublished {
        suggestion_id: SuggestionId,
        result: Result<(), ActionFailure>,
    },
    GenerateContentClicked { suggestion_id: SuggestionId },
    ContentGenerated {
        suggestion_id: SuggestionId,
        result: Result<GeneratedContent, ActionFailure>,
    },
    TabSelected(GroupId),

    KeywordSubmitted {
        project_id: Option<ProjectId>,
        text: String,
    },
    KeywordAdded {
        result: Result<Option<Keyword>, ActionFailure>,
    },
    KeywordUseClicked {
        project_id: ProjectId,
        keyword_id: KeywordId,
    },
    KeywordUseToggled {
        keyword_id: KeywordId,
        result: Result<bool, ActionFailure>,
    },
    KeywordFilterChanged(String),
    KeywordSortChanged {
        sort: KeywordSort,
        direction: Direction,
    },

    CompetitorSubmitted {
        project_id: Option<ProjectId>,
        url: String,
    },
    CompetitorAdded {
        result: Result<Competitor, ActionFailure>,
    },

    PricingPageSubmitted {
        project_id: Option<ProjectId>,
        url: String,
    },
    PricingPageAdded {
        project_id: ProjectId,
        result: Result<(), ActionFailure>,
    },
    PricingStrategyClicked {
        project_id: ProjectId,
        user_prompt: String,
    },
    PricingStrategyCreated {
        project_id: ProjectId,
        result: Result<(), ActionFailure>,
    },

    /// Free-text idea to turn into one title suggestion.
    IdeaSubmitted { project_id: ProjectId, idea: String },
    TitleFromIdeaGenerated {
        project_id: ProjectId,
        result: Result<Suggestion, ActionFailure>,
    },

    ProjectDetailsSubmitted {
        project_id: ProjectId,
        details: ProjectDetails,
    },
    ProjectDetailsSaved {
        project_id: ProjectId,
        result: Result<(), ActionFailure>,
    },

    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}

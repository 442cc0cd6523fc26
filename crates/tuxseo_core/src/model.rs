use std::fmt;

pub type ProjectId = u64;
pub type SuggestionId = u64;
pub type KeywordId = u64;
pub type PostId = u64;

/// A project scan accepted by the server and tracked until analysis completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanJob {
    pub project_id: ProjectId,
    pub url: String,
    pub name: String,
    pub kind: String,
    pub summary: String,
    pub completed: bool,
}

impl ScanJob {
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.url
        } else {
            &self.name
        }
    }
}

/// User feedback on a suggested title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Score {
    Disliked,
    #[default]
    Neutral,
    Liked,
}

impl Score {
    pub fn value(self) -> i8 {
        match self {
            Score::Disliked => -1,
            Score::Neutral => 0,
            Score::Liked => 1,
        }
    }
}

impl TryFrom<i64> for Score {
    type Error = i64;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Score::Disliked),
            0 => Ok(Score::Neutral),
            1 => Ok(Score::Liked),
            other => Err(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub id: SuggestionId,
    pub project_id: ProjectId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub target_keywords: Vec<String>,
    pub meta_description: String,
    pub score: Score,
    pub archived: bool,
    pub posted: bool,
    /// Generated post awaiting publication, when the server has one.
    pub generated_post_id: Option<PostId>,
    /// ISO-8601 creation timestamp as rendered by the server.
    pub created_at: String,
}

impl Suggestion {
    /// Minimal suggestion used when only the identifier is known.
    pub fn bare(id: SuggestionId, project_id: ProjectId) -> Self {
        Self {
            id,
            project_id,
            title: String::new(),
            description: String::new(),
            category: String::new(),
            target_keywords: Vec::new(),
            meta_description: String::new(),
            score: Score::Neutral,
            archived: false,
            posted: false,
            generated_post_id: None,
            created_at: String::new(),
        }
    }

    /// The list group a suggestion belongs to given its flags.
    pub fn home_group(&self) -> GroupId {
        if self.posted {
            GroupId::Posted
        } else if self.archived {
            GroupId::Archived
        } else {
            GroupId::Active
        }
    }
}

/// Full post content generated for a suggestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedContent {
    pub slug: String,
    pub tags: String,
    pub description: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyword {
    pub id: KeywordId,
    pub project_id: ProjectId,
    pub text: String,
    pub volume: Option<u64>,
    pub in_use: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Competitor {
    pub id: Option<u64>,
    pub project_id: ProjectId,
    pub name: String,
    pub url: String,
    pub description: String,
}

/// Identity of a suggestion list grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum GroupId {
    #[default]
    Active,
    Archived,
    Posted,
}

impl GroupId {
    pub const ALL: [GroupId; 3] = [GroupId::Active, GroupId::Archived, GroupId::Posted];

    pub fn as_str(self) -> &'static str {
        match self {
            GroupId::Active => "active",
            GroupId::Archived => "archived",
            GroupId::Posted => "posted",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "active" => Some(GroupId::Active),
            "archived" => Some(GroupId::Archived),
            "posted" => Some(GroupId::Posted),
            _ => None,
        }
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

/// Transient user-visible message; never blocks or asks for acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub text: String,
    pub severity: Severity,
}

impl Notification {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity: Severity::Success,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity: Severity::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Network,
    Application,
    Validation,
    Configuration,
}

/// Transport-free description of a failed action, as seen by the view layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl ActionFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn application(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Application, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Network, message)
    }

    /// Message to show, falling back when the server sent nothing useful.
    pub fn message_or(&self, fallback: &str) -> String {
        if self.message.trim().is_empty() {
            fallback.to_string()
        } else {
            self.message.clone()
        }
    }
}

impl fmt::Display for ActionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// Pricing strategy requested when the user does not pick one.
pub const DEFAULT_PRICING_STRATEGY: &str = "Alex Hormozi";

/// Editable project profile. The whole form is sent on save.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProjectDetails {
    pub key_features: String,
    pub target_audience_summary: String,
    pub pain_points: String,
    pub product_usage: String,
    pub links: String,
    pub blog_theme: String,
    pub founders: String,
    pub language: String,
}

/// Project settings cached per page load; absence means every feature is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProjectFeatures {
    pub has_auto_submission_setting: bool,
    pub has_pro_subscription: bool,
}

impl ProjectFeatures {
    pub fn can_post(&self) -> bool {
        self.has_auto_submission_setting
    }
}

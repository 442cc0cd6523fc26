use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::dispatch::ActionDispatcher;
use crate::{ActionError, ActionRequest, ProjectId};

/// Project accepted by `/api/scan`. Also the shape remembered while a scan is in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannedProject {
    pub project_id: ProjectId,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ScanStatus {
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SuggestionDto {
    pub id: u64,
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub target_keywords: Option<Vec<String>>,
    #[serde(default, alias = "suggested_meta_description")]
    pub meta_description: String,
    #[serde(default, alias = "user_score")]
    pub score: i64,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub posted: bool,
    #[serde(default)]
    pub generated_post_id: Option<u64>,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeneratedContentDto {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KeywordDto {
    pub id: u64,
    #[serde(default, alias = "keyword_text")]
    pub text: String,
    #[serde(default)]
    pub volume: Option<u64>,
    #[serde(default, rename = "use")]
    pub in_use: bool,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompetitorDto {
    #[serde(default, alias = "competitor_id")]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: String,
}

/// `/api/user/settings` payload; both halves are cached verbatim.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct UserSettings {
    #[serde(default)]
    pub profile: Value,
    #[serde(default)]
    pub project: Value,
}

#[derive(Deserialize)]
struct ToggleReply {
    enabled: bool,
}

#[derive(Deserialize)]
struct KeywordUseReply {
    #[serde(rename = "use")]
    in_use: bool,
}

#[derive(Deserialize)]
struct SuggestionsReply {
    #[serde(default)]
    suggestions: Vec<SuggestionDto>,
}

#[derive(Deserialize)]
struct IdeaReply {
    suggestion: SuggestionDto,
}

/// Fields of the project details form, sent form-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProjectDetailsForm {
    pub key_features: String,
    pub target_audience_summary: String,
    pub pain_points: String,
    pub product_usage: String,
    pub links: String,
    pub blog_theme: String,
    pub founders: String,
    pub language: String,
}

impl ProjectDetailsForm {
    pub fn fields(&self) -> Vec<(String, String)> {
        [
            ("key_features", &self.key_features),
            ("target_audience_summary", &self.target_audience_summary),
            ("pain_points", &self.pain_points),
            ("product_usage", &self.product_usage),
            ("links", &self.links),
            ("blog_theme", &self.blog_theme),
            ("founders", &self.founders),
            ("language", &self.language),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
    }
}

#[derive(Deserialize)]
struct KeywordAddedReply {
    #[serde(default)]
    keyword: Option<KeywordDto>,
}

/// Typed endpoints of the TuxSEO server. Local input is validated before anything is sent.
#[derive(Clone)]
pub struct TuxSeoApi {
    dispatcher: Arc<dyn ActionDispatcher>,
}

impl TuxSeoApi {
    pub fn new(dispatcher: Arc<dyn ActionDispatcher>) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> Arc<dyn ActionDispatcher> {
        self.dispatcher.clone()
    }

    pub async fn toggle_auto_submission(&self, project_id: ProjectId) -> Result<bool, ActionError> {
        let endpoint = format!("/api/projects/{project_id}/toggle-auto-submission");
        let reply: ToggleReply = self.call(ActionRequest::post_empty(endpoint)).await?;
        Ok(reply.enabled)
    }

    pub async fn scan(&self, url: &str) -> Result<ScannedProject, ActionError> {
        let url = require(url, "Please enter a URL.")?;
        self.call(ActionRequest::post_json("/api/scan", json!({ "url": url })))
            .await
    }

    /// Status check used by the poll loop. Sent without the anti-forgery token.
    pub fn status_request(project_id: ProjectId) -> ActionRequest {
        ActionRequest::get(format!("/project/{project_id}/status/"))
    }

    pub async fn project_status(&self, project_id: ProjectId) -> Result<ScanStatus, ActionError> {
        self.call(Self::status_request(project_id)).await
    }

    pub async fn generate_title_suggestions(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<SuggestionDto>, ActionError> {
        let request = ActionRequest::post_json(
            "/api/generate-title-suggestions",
            json!({ "project_id": project_id }),
        );
        let reply: SuggestionsReply = self.call(request).await?;
        Ok(reply.suggestions)
    }

    pub async fn generate_blog_content(
        &self,
        suggestion_id: u64,
    ) -> Result<GeneratedContentDto, ActionError> {
        let endpoint = format!("/api/generate-blog-content/{suggestion_id}");
        self.call(ActionRequest::post_empty(endpoint)).await
    }

    pub async fn set_archive_status(
        &self,
        suggestion_id: u64,
        archived: bool,
    ) -> Result<(), ActionError> {
        let endpoint = format!("/api/suggestions/{suggestion_id}/archive-status");
        self.dispatcher
            .perform(ActionRequest::post_json(endpoint, json!({ "archived": archived })))
            .await
            .map(drop)
    }

    pub async fn update_title_score(&self, suggestion_id: u64, score: i8) -> Result<(), ActionError> {
        if !(-1..=1).contains(&score) {
            return Err(ActionError::Validation(
                "Invalid score value. Must be -1, 0, or 1".to_string(),
            ));
        }
        let endpoint = format!("/api/update-title-score/{suggestion_id}");
        self.dispatcher
            .perform(ActionRequest::post_json(endpoint, json!({ "score": score })))
            .await
            .map(drop)
    }

    pub async fn post_generated_blog_post(&self, post_id: u64) -> Result<(), ActionError> {
        self.dispatcher
            .perform(ActionRequest::post_json(
                "/api/post-generated-blog-post",
                json!({ "id": post_id }),
            ))
            .await
            .map(drop)
    }

    pub async fn add_keyword(
        &self,
        project_id: ProjectId,
        text: &str,
    ) -> Result<Option<KeywordDto>, ActionError> {
        let text = require(text, "Keyword and project are required.")?;
        let request = ActionRequest::post_json(
            "/api/keywords/add",
            json!({ "project_id": project_id, "keyword_text": text }),
        );
        let reply: KeywordAddedReply = self.call(request).await?;
        Ok(reply.keyword)
    }

    pub async fn toggle_keyword_use(
        &self,
        project_id: ProjectId,
        keyword_id: u64,
    ) -> Result<bool, ActionError> {
        let request = ActionRequest::post_json(
            "/api/keywords/toggle-use",
            json!({ "project_id": project_id, "keyword_id": keyword_id }),
        );
        let reply: KeywordUseReply = self.call(request).await?;
        Ok(reply.in_use)
    }

    pub async fn add_competitor(
        &self,
        project_id: ProjectId,
        url: &str,
    ) -> Result<CompetitorDto, ActionError> {
        let url = require(url, "URL is required")?;
        self.call(ActionRequest::post_json(
            "/api/add-competitor",
            json!({ "project_id": project_id, "url": url }),
        ))
        .await
    }

    pub async fn add_pricing_page(&self, project_id: ProjectId, url: &str) -> Result<(), ActionError> {
        let url = require(url, "URL is required")?;
        self.dispatcher
            .perform(ActionRequest::post_json(
                "/api/add-pricing-page",
                json!({ "project_id": project_id, "url": url }),
            ))
            .await
            .map(drop)
    }

    pub async fn create_pricing_strategy(
        &self,
        project_id: ProjectId,
        strategy_name: &str,
        user_prompt: &str,
    ) -> Result<(), ActionError> {
        self.dispatcher
            .perform(ActionRequest::post_json(
                "/api/create-pricing-strategy",
                json!({
                    "project_id": project_id,
                    "strategy_name": strategy_name,
                    "user_prompt": user_prompt,
                }),
            ))
            .await
            .map(drop)
    }

    /// One suggestion written from a free-text idea.
    pub async fn generate_title_from_idea(
        &self,
        project_id: ProjectId,
        idea: &str,
    ) -> Result<SuggestionDto, ActionError> {
        let idea = require(idea, "Please describe your idea.")?;
        let request = ActionRequest::post_json(
            "/api/generate-title-from-idea",
            json!({ "project_id": project_id, "user_prompt": idea }),
        );
        let reply: IdeaReply = self.call(request).await?;
        Ok(reply.suggestion)
    }

    pub async fn update_project_details(
        &self,
        project_id: ProjectId,
        form: &ProjectDetailsForm,
    ) -> Result<(), ActionError> {
        let endpoint = format!("/api/projects/{project_id}/update");
        self.dispatcher
            .perform(ActionRequest::post_form(endpoint, form.fields()))
            .await
            .map(drop)
    }

    pub async fn user_settings(&self, project_id: ProjectId) -> Result<UserSettings, ActionError> {
        let endpoint = format!("/api/user/settings?project_id={project_id}");
        self.call(ActionRequest::get(endpoint)).await
    }

    async fn call<T: DeserializeOwned>(&self, request: ActionRequest) -> Result<T, ActionError> {
        let value = self.dispatcher.perform(request).await?;
        decode(value)
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ActionError> {
    serde_json::from_value(value).map_err(|err| ActionError::Decode(err.to_string()))
}

fn require<'a>(value: &'a str, message: &str) -> Result<&'a str, ActionError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ActionError::Validation(message.to_string()))
    } else {
        Ok(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggestion_accepts_server_field_names() {
        let dto: SuggestionDto = decode(json!({
            "id": 7,
            "title": "Ten Rust tips",
            "category": "GENERAL",
            "target_keywords": null,
            "suggested_meta_description": "Tips",
            "user_score": -1
        }))
        .unwrap();
        assert_eq!(dto.meta_description, "Tips");
        assert_eq!(dto.score, -1);
        assert_eq!(dto.target_keywords, None);
        assert!(!dto.archived);
    }

    #[test]
    fn scanned_project_maps_type_field() {
        let dto: ScannedProject = decode(json!({
            "status": "success",
            "project_id": 3,
            "name": "Acme",
            "type": "SaaS",
            "url": "https://acme.test"
        }))
        .unwrap();
        assert_eq!(dto.kind, "SaaS");
        assert_eq!(dto.summary, "");
    }
}

use std::time::{Duration, Instant};

use tuxseo_core::{
    ActionFailure, Competitor, Effect, FailureKind, GeneratedContent, Keyword, Msg,
    ProjectDetails, ProjectFeatures, ProjectId, Score, Suggestion,
};
use tuxseo_engine::{
    ActionError, ApiCall, ApiReply, CachedFeatures, CompetitorDto, EngineEvent, EngineHandle,
    ErrorKind, KeywordDto, ProjectDetailsForm, SettingsCache, SuggestionDto,
};
use tuxseo_logging::{tux_debug, tux_info, tux_warn};

use super::notify::Notifier;
use super::persistence;

/// Executes core effects against the engine and turns engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
    cache: SettingsCache,
    notifier: Box<dyn Notifier>,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, cache: SettingsCache, notifier: Box<dyn Notifier>) -> Self {
        Self {
            engine,
            cache,
            notifier,
        }
    }

    pub fn cache(&self) -> &SettingsCache {
        &self.cache
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::ToggleAutoSubmission {
                    project_id,
                    desired,
                } => {
                    tux_info!("ToggleAutoSubmission project_id={} desired={}", project_id, desired);
                    self.engine.call(ApiCall::ToggleAutoSubmission { project_id });
                }
                Effect::SubmitScan { url } => {
                    tux_info!("SubmitScan url_len={}", url.len());
                    self.engine.call(ApiCall::Scan { url });
                }
                Effect::StartPolling { project_id } => self.engine.start_polling(project_id),
                Effect::StopPolling { project_id } => self.engine.stop_polling(project_id),
                Effect::RememberScan(job) => persistence::remember_scan(&self.cache, &job),
                Effect::ForgetScan => persistence::forget_scan(&self.cache),
                Effect::GenerateSuggestions { project_id } => self
                    .engine
                    .call(ApiCall::GenerateTitleSuggestions { project_id }),
                Effect::SetArchiveStatus {
                    suggestion_id,
                    archived,
                } => self.engine.call(ApiCall::SetArchiveStatus {
                    suggestion_id,
                    archived,
                }),
                Effect::UpdateScore {
                    suggestion_id,
                    score,
                } => self.engine.call(ApiCall::UpdateTitleScore {
                    suggestion_id,
                    score: score.value(),
                }),
                Effect::PublishPost {
                    suggestion_id,
                    post_id,
                } => self.engine.call(ApiCall::PostGeneratedBlogPost {
                    suggestion_id,
                    post_id,
                }),
                Effect::GenerateContent { suggestion_id } => self
                    .engine
                    .call(ApiCall::GenerateBlogContent { suggestion_id }),
                Effect::AddKeyword { project_id, text } => {
                    self.engine.call(ApiCall::AddKeyword { project_id, text })
                }
                Effect::ToggleKeywordUse {
                    project_id,
                    keyword_id,
                } => self.engine.call(ApiCall::ToggleKeywordUse {
                    project_id,
                    keyword_id,
                }),
                Effect::AddCompetitor { project_id, url } => {
                    self.engine.call(ApiCall::AddCompetitor { project_id, url })
                }
                Effect::AddPricingPage { project_id, url } => {
                    self.engine.call(ApiCall::AddPricingPage { project_id, url })
                }
                Effect::CreatePricingStrategy {
                    project_id,
                    strategy_name,
                    user_prompt,
                } => self.engine.call(ApiCall::CreatePricingStrategy {
                    project_id,
                    strategy_name,
                    user_prompt,
                }),
                Effect::GenerateTitleFromIdea { project_id, idea } => self
                    .engine
                    .call(ApiCall::GenerateTitleFromIdea { project_id, idea }),
                Effect::UpdateProjectDetails {
                    project_id,
                    details,
                } => self.engine.call(ApiCall::UpdateProjectDetails {
                    project_id,
                    form: to_form(details),
                }),
                Effect::FetchProjectSettings { project_id } => self
                    .engine
                    .call(ApiCall::FetchUserSettings { project_id }),
                Effect::PersistViewState(view_state) => {
                    persistence::save_view_state(&self.cache, &view_state)
                }
                Effect::Notify(notification) => self.notifier.notify(&notification),
            }
        }
    }

    /// Waits up to `timeout` for the next event that means something to the core.
    pub fn next_msg(&self, timeout: Duration) -> Option<Msg> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }
            let event = self.engine.recv_timeout(remaining)?;
            if let Some(msg) = map_event(event, &self.cache) {
                return Some(msg);
            }
        }
    }
}

pub(crate) fn map_event(event: EngineEvent, cache: &SettingsCache) -> Option<Msg> {
    match event {
        EngineEvent::CallCompleted { call, result } => Some(map_call(call, result, cache)),
        EngineEvent::PollTick {
            project_id,
            attempt,
            error,
        } => {
            tux_debug!("status check {} for project {} failed: {}", attempt, project_id, error);
            None
        }
        EngineEvent::PollFinished {
            project_id,
            outcome,
        } => Some(match outcome {
            Ok(status) => Msg::ScanStatusReceived {
                project_id,
                completed: status.completed,
            },
            Err(err) => Msg::ScanPollFailed {
                project_id,
                failure: to_failure(&err),
            },
        }),
    }
}

fn map_call(call: ApiCall, result: Result<ApiReply, ActionError>, cache: &SettingsCache) -> Msg {
    match call {
        ApiCall::ToggleAutoSubmission { project_id } => Msg::AutoSubmissionToggled {
            project_id,
            result: expect_reply(result, |reply| match reply {
                ApiReply::AutoSubmission(enabled) => Some(enabled),
                _ => None,
            }),
        },
        ApiCall::Scan { .. } => {
            match expect_reply(result, |reply| match reply {
                ApiReply::Scanned(project) => Some(project),
                _ => None,
            }) {
                Ok(project) => Msg::ScanAccepted(persistence::scan_job(project)),
                Err(failure) => Msg::ScanRejected(failure),
            }
        }
        ApiCall::GenerateTitleSuggestions { project_id } => Msg::SuggestionsGenerated {
            project_id,
            result: expect_reply(result, |reply| match reply {
                ApiReply::Suggestions(items) => Some(
                    items
                        .into_iter()
                        .map(|dto| to_suggestion(dto, project_id))
                        .collect(),
                ),
                _ => None,
            }),
        },
        ApiCall::GenerateBlogContent { suggestion_id } => Msg::ContentGenerated {
            suggestion_id,
            result: expect_reply(result, |reply| match reply {
                ApiReply::Content(dto) => Some(GeneratedContent {
                    slug: dto.slug,
                    tags: dto.tags,
                    description: dto.description,
                    content: dto.content,
                }),
                _ => None,
            }),
        },
        ApiCall::SetArchiveStatus {
            suggestion_id,
            archived,
        } => Msg::ArchiveStatusChanged {
            suggestion_id,
            archived,
            result: expect_done(result),
        },
        ApiCall::UpdateTitleScore { suggestion_id, .. } => Msg::ScoreUpdated {
            suggestion_id,
            result: expect_done(result),
        },
        ApiCall::PostGeneratedBlogPost { suggestion_id, .. } => Msg::PostPublished {
            suggestion_id,
            result: expect_done(result),
        },
        ApiCall::AddKeyword { project_id, .. } => Msg::KeywordAdded {
            result: expect_reply(result, |reply| match reply {
                ApiReply::Keyword(keyword) => Some(keyword.map(|dto| to_keyword(dto, project_id))),
                _ => None,
            }),
        },
        ApiCall::ToggleKeywordUse { keyword_id, .. } => Msg::KeywordUseToggled {
            keyword_id,
            result: expect_reply(result, |reply| match reply {
                ApiReply::KeywordUse(in_use) => Some(in_use),
                _ => None,
            }),
        },
        ApiCall::AddCompetitor { project_id, .. } => Msg::CompetitorAdded {
            result: expect_reply(result, |reply| match reply {
                ApiReply::Competitor(dto) => Some(to_competitor(dto, project_id)),
                _ => None,
            }),
        },
        ApiCall::AddPricingPage { project_id, .. } => Msg::PricingPageAdded {
            project_id,
            result: expect_done(result),
        },
        ApiCall::CreatePricingStrategy { project_id, .. } => Msg::PricingStrategyCreated {
            project_id,
            result: expect_done(result),
        },
        ApiCall::GenerateTitleFromIdea { project_id, .. } => Msg::TitleFromIdeaGenerated {
            project_id,
            result: expect_reply(result, |reply| match reply {
                ApiReply::Suggestion(dto) => Some(to_suggestion(dto, project_id)),
                _ => None,
            }),
        },
        ApiCall::UpdateProjectDetails { project_id, .. } => Msg::ProjectDetailsSaved {
            project_id,
            result: expect_done(result),
        },
        ApiCall::FetchUserSettings { project_id } => {
            let features = match result {
                Ok(ApiReply::Features(features)) => features,
                Ok(other) => {
                    tux_warn!("unexpected settings reply for project {}: {:?}", project_id, other);
                    cache.project_features(project_id)
                }
                Err(err) => {
                    tux_warn!("settings for project {} unavailable: {}", project_id, err);
                    cache.project_features(project_id)
                }
            };
            Msg::ProjectFeaturesLoaded {
                project_id,
                features: to_features(features),
            }
        }
    }
}

fn expect_reply<T>(
    result: Result<ApiReply, ActionError>,
    pick: impl FnOnce(ApiReply) -> Option<T>,
) -> Result<T, ActionFailure> {
    let reply = result.map_err(|err| to_failure(&err))?;
    pick(reply).ok_or_else(|| ActionFailure::application("Unexpected response from server."))
}

fn expect_done(result: Result<ApiReply, ActionError>) -> Result<(), ActionFailure> {
    expect_reply(result, |reply| match reply {
        ApiReply::Done => Some(()),
        _ => None,
    })
}

pub(crate) fn to_failure(err: &ActionError) -> ActionFailure {
    let kind = match err.kind() {
        ErrorKind::Network => FailureKind::Network,
        ErrorKind::Application => FailureKind::Application,
        ErrorKind::Validation => FailureKind::Validation,
        ErrorKind::Configuration => FailureKind::Configuration,
    };
    ActionFailure::new(kind, err.user_message())
}

fn to_form(details: ProjectDetails) -> ProjectDetailsForm {
    ProjectDetailsForm {
        key_features: details.key_features,
        target_audience_summary: details.target_audience_summary,
        pain_points: details.pain_points,
        product_usage: details.product_usage,
        links: details.links,
        blog_theme: details.blog_theme,
        founders: details.founders,
        language: details.language,
    }
}

pub(crate) fn to_suggestion(dto: SuggestionDto, project_id: ProjectId) -> Suggestion {
    Suggestion {
        id: dto.id,
        project_id: dto.project_id.unwrap_or(project_id),
        title: dto.title,
        description: dto.description,
        category: dto.category,
        target_keywords: dto.target_keywords.unwrap_or_default(),
        meta_description: dto.meta_description,
        score: Score::try_from(dto.score).unwrap_or_default(),
        archived: dto.archived,
        posted: dto.posted,
        generated_post_id: dto.generated_post_id,
        created_at: dto.created_at,
    }
}

fn to_keyword(dto: KeywordDto, project_id: ProjectId) -> Keyword {
    Keyword {
        id: dto.id,
        project_id,
        text: dto.text,
        volume: dto.volume,
        in_use: dto.in_use,
        created_at: dto.created_at,
    }
}

fn to_competitor(dto: CompetitorDto, project_id: ProjectId) -> Competitor {
    Competitor {
        id: dto.id,
        project_id,
        name: dto.name,
        url: dto.url,
        description: dto.description,
    }
}

fn to_features(features: CachedFeatures) -> ProjectFeatures {
    ProjectFeatures {
        has_auto_submission_setting: features.has_auto_submission_setting,
        has_pro_subscription: features.has_pro_subscription,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use tuxseo_engine::{
        project_settings_key, GeneratedContentDto, LocalStore, MemoryStore, ScanStatus,
        ScannedProject,
    };

    fn cache() -> (Arc<MemoryStore>, SettingsCache) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), SettingsCache::new(store))
    }

    fn completed(call: ApiCall, result: Result<ApiReply, ActionError>) -> EngineEvent {
        EngineEvent::CallCompleted { call, result }
    }

    #[test]
    fn accepted_scan_becomes_job() {
        let (_, cache) = cache();
        let msg = map_event(
            completed(
                ApiCall::Scan {
                    url: "https://acme.test".to_string(),
                },
                Ok(ApiReply::Scanned(ScannedProject {
                    project_id: 8,
                    name: "Acme".to_string(),
                    kind: "SaaS".to_string(),
                    url: "https://acme.test".to_string(),
                    summary: "Tools".to_string(),
                })),
            ),
            &cache,
        );
        match msg {
            Some(Msg::ScanAccepted(job)) => {
                assert_eq!(job.project_id, 8);
                assert!(!job.completed);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejected_scan_keeps_server_message() {
        let (_, cache) = cache();
        let msg = map_event(
            completed(
                ApiCall::Scan {
                    url: "bad".to_string(),
                },
                Err(ActionError::Application {
                    message: "Invalid URL".to_string(),
                }),
            ),
            &cache,
        );
        assert_eq!(
            msg,
            Some(Msg::ScanRejected(ActionFailure::new(
                FailureKind::Application,
                "Invalid URL"
            )))
        );
    }

    #[test]
    fn mismatched_reply_is_application_failure() {
        let (_, cache) = cache();
        let msg = map_event(
            completed(
                ApiCall::SetArchiveStatus {
                    suggestion_id: 2,
                    archived: true,
                },
                Ok(ApiReply::KeywordUse(true)),
            ),
            &cache,
        );
        match msg {
            Some(Msg::ArchiveStatusChanged {
                result: Err(failure),
                ..
            }) => assert_eq!(failure.kind, FailureKind::Application),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn suggestions_default_to_requesting_project() {
        let dto = SuggestionDto {
            id: 11,
            project_id: None,
            title: "Rust tips".to_string(),
            description: String::new(),
            category: "GENERAL".to_string(),
            target_keywords: None,
            meta_description: String::new(),
            score: 5,
            archived: false,
            posted: false,
            generated_post_id: None,
            created_at: String::new(),
        };
        let suggestion = to_suggestion(dto, 3);
        assert_eq!(suggestion.project_id, 3);
        assert_eq!(suggestion.score, Score::Neutral);
        assert!(suggestion.target_keywords.is_empty());
    }

    #[test]
    fn content_maps_to_core() {
        let (_, cache) = cache();
        let msg = map_event(
            completed(
                ApiCall::GenerateBlogContent { suggestion_id: 4 },
                Ok(ApiReply::Content(GeneratedContentDto {
                    slug: "rust-tips".to_string(),
                    tags: "rust".to_string(),
                    description: "d".to_string(),
                    content: "# Tips".to_string(),
                })),
            ),
            &cache,
        );
        assert!(matches!(
            msg,
            Some(Msg::ContentGenerated { suggestion_id: 4, result: Ok(ref c) }) if c.slug == "rust-tips"
        ));
    }

    #[test]
    fn settings_failure_falls_back_to_cache() {
        let (store, cache) = cache();
        store
            .set(&project_settings_key(6), r#"{"has_auto_submission_setting":true}"#)
            .unwrap();
        let msg = map_event(
            completed(
                ApiCall::FetchUserSettings { project_id: 6 },
                Err(ActionError::Network {
                    status: None,
                    message: "Could not reach the server.".to_string(),
                }),
            ),
            &cache,
        );
        assert_eq!(
            msg,
            Some(Msg::ProjectFeaturesLoaded {
                project_id: 6,
                features: ProjectFeatures {
                    has_auto_submission_setting: true,
                    has_pro_subscription: false,
                },
            })
        );
    }

    #[test]
    fn poll_events_map_to_scan_messages() {
        let (_, cache) = cache();
        let tick = EngineEvent::PollTick {
            project_id: 1,
            attempt: 1,
            error: ActionError::Network {
                status: None,
                message: "Request timed out.".to_string(),
            },
        };
        assert_eq!(map_event(tick, &cache), None);

        let done = EngineEvent::PollFinished {
            project_id: 1,
            outcome: Ok(ScanStatus { completed: true }),
        };
        assert_eq!(
            map_event(done, &cache),
            Some(Msg::ScanStatusReceived {
                project_id: 1,
                completed: true
            })
        );

        let exhausted = EngineEvent::PollFinished {
            project_id: 1,
            outcome: Err(ActionError::Exhausted { attempts: 150 }),
        };
        match map_event(exhausted, &cache) {
            Some(Msg::ScanPollFailed { failure, .. }) => assert!(failure.message.is_empty()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn idea_reply_becomes_suggestion_of_requesting_project() {
        let (_, cache) = cache();
        let dto: SuggestionDto = serde_json::from_value(serde_json::json!({
            "id": 31,
            "title": "Rust for SEO",
            "category": "GENERAL",
            "target_keywords": ["rust"]
        }))
        .unwrap();
        let msg = map_event(
            completed(
                ApiCall::GenerateTitleFromIdea {
                    project_id: 2,
                    idea: "rust".to_string(),
                },
                Ok(ApiReply::Suggestion(dto)),
            ),
            &cache,
        );
        match msg {
            Some(Msg::TitleFromIdeaGenerated {
                project_id: 2,
                result: Ok(suggestion),
            }) => {
                assert_eq!(suggestion.id, 31);
                assert_eq!(suggestion.project_id, 2);
                assert_eq!(suggestion.target_keywords, vec!["rust".to_string()]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn project_details_map_field_for_field() {
        let form = to_form(ProjectDetails {
            target_audience_summary: "Founders".to_string(),
            blog_theme: "Growth".to_string(),
            ..ProjectDetails::default()
        });
        assert_eq!(form.target_audience_summary, "Founders");
        assert_eq!(form.blog_theme, "Growth");
        assert!(form.key_features.is_empty());
    }

    #[test]
    fn pricing_failures_keep_project() {
        let (_, cache) = cache();
        let msg = map_event(
            completed(
                ApiCall::AddPricingPage {
                    project_id: 4,
                    url: "https://a.test/pricing".to_string(),
                },
                Err(ActionError::Application {
                    message: "Could not read page".to_string(),
                }),
            ),
            &cache,
        );
        assert_eq!(
            msg,
            Some(Msg::PricingPageAdded {
                project_id: 4,
                result: Err(ActionFailure::application("Could not read page")),
            })
        );
    }
}

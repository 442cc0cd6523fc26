use std::collections::HashMap;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use serde_json::Value;
use tuxseo_logging::{tux_debug, tux_warn};

use crate::api::{
    CompetitorDto, GeneratedContentDto, KeywordDto, ProjectDetailsForm, ScanStatus,
    ScannedProject, SuggestionDto, TuxSeoApi,
};
use crate::dispatch::ActionDispatcher;
use crate::poll::{start_polling, PollHandle, PollObserver, PollPolicy};
use crate::store::{CachedFeatures, LocalStore, SettingsCache};
use crate::{ActionError, ProjectId};

/// One typed request the engine runs on behalf of the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    ToggleAutoSubmission { project_id: ProjectId },
    Scan { url: String },
    GenerateTitleSuggestions { project_id: ProjectId },
    GenerateBlogContent { suggestion_id: u64 },
    SetArchiveStatus { suggestion_id: u64, archived: bool },
    UpdateTitleScore { suggestion_id: u64, score: i8 },
    PostGeneratedBlogPost { suggestion_id: u64, post_id: u64 },
    AddKeyword { project_id: ProjectId, text: String },
    ToggleKeywordUse { project_id: ProjectId, keyword_id: u64 },
    AddCompetitor { project_id: ProjectId, url: String },
    AddPricingPage { project_id: ProjectId, url: String },
    CreatePricingStrategy {
        project_id: ProjectId,
        strategy_name: String,
        user_prompt: String,
    },
    GenerateTitleFromIdea { project_id: ProjectId, idea: String },
    UpdateProjectDetails {
        project_id: ProjectId,
        form: ProjectDetailsForm,
    },
    /// Fetches settings and writes them to the local store before replying.
    FetchUserSettings { project_id: ProjectId },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApiReply {
    AutoSubmission(bool),
    Scanned(ScannedProject),
    Suggestions(Vec<SuggestionDto>),
    Suggestion(SuggestionDto),
    Content(GeneratedContentDto),
    Done,
    Keyword(Option<KeywordDto>),
    KeywordUse(bool),
    Competitor(CompetitorDto),
    Features(CachedFeatures),
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    CallCompleted {
        call: ApiCall,
        result: Result<ApiReply, ActionError>,
    },
    /// A status tick failed; polling continues.
    PollTick {
        project_id: ProjectId,
        attempt: u32,
        error: ActionError,
    },
    PollFinished {
        project_id: ProjectId,
        outcome: Result<ScanStatus, ActionError>,
    },
}

enum EngineCommand {
    Call(ApiCall),
    StartPolling { project_id: ProjectId },
    StopPolling { project_id: ProjectId },
}

pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(
        dispatcher: Arc<dyn ActionDispatcher>,
        store: Arc<dyn LocalStore>,
        policy: PollPolicy,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let api = TuxSeoApi::new(dispatcher);
        let cache = SettingsCache::new(store);

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            let _guard = runtime.enter();
            let mut polls: HashMap<ProjectId, PollHandle> = HashMap::new();
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::Call(call) => {
                        let api = api.clone();
                        let cache = cache.clone();
                        let event_tx = event_tx.clone();
                        runtime.spawn(async move {
                            let result = run_call(&api, &cache, &call).await;
                            let _ = event_tx.send(EngineEvent::CallCompleted { call, result });
                        });
                    }
                    EngineCommand::StartPolling { project_id } => {
                        let observer = Arc::new(StatusObserver {
                            project_id,
                            event_tx: event_tx.clone(),
                        });
                        let handle = start_polling(
                            api.dispatcher(),
                            TuxSeoApi::status_request(project_id),
                            policy,
                            observer,
                        );
                        if let Some(previous) = polls.insert(project_id, handle) {
                            previous.stop();
                        }
                        tux_debug!("polling project {project_id}");
                    }
                    EngineCommand::StopPolling { project_id } => {
                        if let Some(handle) = polls.remove(&project_id) {
                            handle.stop();
                        }
                    }
                }
            }
            for handle in polls.values() {
                handle.stop();
            }
        });

        Self { cmd_tx, event_rx }
    }

    pub fn call(&self, call: ApiCall) {
        let _ = self.cmd_tx.send(EngineCommand::Call(call));
    }

    pub fn start_polling(&self, project_id: ProjectId) {
        let _ = self.cmd_tx.send(EngineCommand::StartPolling { project_id });
    }

    /// Idempotent; stopping a project that is not polled does nothing.
    pub fn stop_polling(&self, project_id: ProjectId) {
        let _ = self.cmd_tx.send(EngineCommand::StopPolling { project_id });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

struct StatusObserver {
    project_id: ProjectId,
    event_tx: mpsc::Sender<EngineEvent>,
}

impl StatusObserver {
    fn send(&self, event: EngineEvent) {
        let _ = self.event_tx.send(event);
    }
}

impl PollObserver for StatusObserver {
    fn is_done(&self, status: &Value) -> bool {
        status
            .get("completed")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    fn on_done(&self, status: Value) {
        let outcome = serde_json::from_value::<ScanStatus>(status)
            .map_err(|err| ActionError::Decode(err.to_string()));
        self.send(EngineEvent::PollFinished {
            project_id: self.project_id,
            outcome,
        });
    }

    fn on_error(&self, attempt: u32, error: &ActionError) {
        self.send(EngineEvent::PollTick {
            project_id: self.project_id,
            attempt,
            error: error.clone(),
        });
    }

    fn on_exhausted(&self, error: ActionError) {
        self.send(EngineEvent::PollFinished {
            project_id: self.project_id,
            outcome: Err(error),
        });
    }
}

async fn run_call(
    api: &TuxSeoApi,
    cache: &SettingsCache,
    call: &ApiCall,
) -> Result<ApiReply, ActionError> {
    match call {
        ApiCall::ToggleAutoSubmission { project_id } => api
            .toggle_auto_submission(*project_id)
            .await
            .map(ApiReply::AutoSubmission),
        ApiCall::Scan { url } => api.scan(url).await.map(ApiReply::Scanned),
        ApiCall::GenerateTitleSuggestions { project_id } => api
            .generate_title_suggestions(*project_id)
            .await
            .map(ApiReply::Suggestions),
        ApiCall::GenerateBlogContent { suggestion_id } => api
            .generate_blog_content(*suggestion_id)
            .await
            .map(ApiReply::Content),
        ApiCall::SetArchiveStatus {
            suggestion_id,
            archived,
        } => api
            .set_archive_status(*suggestion_id, *archived)
            .await
            .map(|()| ApiReply::Done),
        ApiCall::UpdateTitleScore {
            suggestion_id,
            score,
        } => api
            .update_title_score(*suggestion_id, *score)
            .await
            .map(|()| ApiReply::Done),
        ApiCall::PostGeneratedBlogPost { post_id, .. } => api
            .post_generated_blog_post(*post_id)
            .await
            .map(|()| ApiReply::Done),
        ApiCall::AddKeyword { project_id, text } => api
            .add_keyword(*project_id, text)
            .await
            .map(ApiReply::Keyword),
        ApiCall::ToggleKeywordUse {
            project_id,
            keyword_id,
        } => api
            .toggle_keyword_use(*project_id, *keyword_id)
            .await
            .map(ApiReply::KeywordUse),
        ApiCall::AddCompetitor { project_id, url } => api
            .add_competitor(*project_id, url)
            .await
            .map(ApiReply::Competitor),
        ApiCall::AddPricingPage { project_id, url } => api
            .add_pricing_page(*project_id, url)
            .await
            .map(|()| ApiReply::Done),
        ApiCall::CreatePricingStrategy {
            project_id,
            strategy_name,
            user_prompt,
        } => api
            .create_pricing_strategy(*project_id, strategy_name, user_prompt)
            .await
            .map(|()| ApiReply::Done),
        ApiCall::GenerateTitleFromIdea { project_id, idea } => api
            .generate_title_from_idea(*project_id, idea)
            .await
            .map(ApiReply::Suggestion),
        ApiCall::UpdateProjectDetails { project_id, form } => api
            .update_project_details(*project_id, form)
            .await
            .map(|()| ApiReply::Done),
        ApiCall::FetchUserSettings { project_id } => {
            let settings = api.user_settings(*project_id).await?;
            if let Err(err) = cache.store_user_settings(*project_id, &settings) {
                tux_warn!("could not cache settings for project {project_id}: {err}");
            }
            Ok(ApiReply::Features(cache.project_features(*project_id)))
        }
    }
}

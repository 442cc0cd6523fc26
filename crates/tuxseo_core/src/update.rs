use crate::{
    normalize_scan_url, ActionFailure, AppState, ContentPhase, Effect, GroupId, Msg, Notification,
    ProjectTask, ScanPhase, Score, DEFAULT_PRICING_STRATEGY,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let mut effects = Vec::new();
    match msg {
        Msg::AutoSubmissionLoaded {
            project_id,
            enabled,
        } => {
            state.load_auto_submission(project_id, enabled);
            state.mark_dirty();
        }
        Msg::SuggestionsLoaded(suggestions) => {
            for suggestion in suggestions {
                state.insert_suggestion(suggestion);
            }
            state.mark_dirty();
        }
        Msg::KeywordsLoaded(keywords) => {
            for keyword in keywords {
                state.insert_keyword(keyword);
            }
            state.reconcile_keywords();
            state.mark_dirty();
        }
        Msg::ProjectOpened { project_id } => {
            if state.begin_settings_load(project_id) {
                effects.push(Effect::FetchProjectSettings { project_id });
                state.mark_dirty();
            }
        }
        Msg::ProjectFeaturesLoaded {
            project_id,
            features,
        } => {
            state.set_features(project_id, features);
            state.mark_dirty();
        }
        Msg::RestoreViewState(view_state) => {
            *state.view_state_mut() = view_state;
            state.reconcile_keywords();
            state.mark_dirty();
        }
        Msg::RestoreScan(job) => {
            if matches!(state.scan_phase(), ScanPhase::Idle) {
                effects.push(Effect::StartPolling {
                    project_id: job.project_id,
                });
                state.set_scan(ScanPhase::Analyzing { job });
                state.mark_dirty();
            }
        }

        Msg::AutoSubmissionToggleClicked { project_id } => {
            // A second click while the first is unresolved is rejected.
            if let Ok(desired) = state.auto_submission_cell(project_id).toggle() {
                effects.push(Effect::ToggleAutoSubmission {
                    project_id,
                    desired,
                });
                state.mark_dirty();
            }
        }
        Msg::AutoSubmissionToggled { project_id, result } => {
            let cell = state.auto_submission_cell(project_id);
            match result {
                Ok(server_value) => {
                    cell.confirm(server_value);
                }
                Err(failure) => {
                    cell.rollback();
                    effects.push(notify_failure(&failure, "Failed to toggle auto-submission."));
                }
            }
            state.mark_dirty();
        }

        Msg::ScanSubmitted { url } => {
            if matches!(state.scan_phase(), ScanPhase::Submitting { .. }) {
                return (state, effects);
            }
            match normalize_scan_url(&url) {
                Ok(url) => {
                    // The new scan replaces any job still being polled.
                    if let ScanPhase::Analyzing { job } = state.scan_phase() {
                        effects.push(Effect::StopPolling {
                            project_id: job.project_id,
                        });
                        effects.push(Effect::ForgetScan);
                    }
                    effects.push(Effect::SubmitScan { url: url.clone() });
                    state.set_scan(ScanPhase::Submitting { url });
                }
                Err(message) => {
                    effects.push(Effect::Notify(Notification::error(message)));
                }
            }
            state.mark_dirty();
        }
        Msg::ScanAccepted(job) => {
            if let ScanPhase::Analyzing { job: previous, .. } = state.scan_phase() {
                if previous.project_id != job.project_id {
                    effects.push(Effect::StopPolling {
                        project_id: previous.project_id,
                    });
                }
            }
            effects.push(Effect::RememberScan(job.clone()));
            effects.push(Effect::StartPolling {
                project_id: job.project_id,
            });
            state.set_scan(ScanPhase::Analyzing { job });
            state.mark_dirty();
        }
        Msg::ScanRejected(failure) => {
            let message = failure.message_or("Something went wrong. Please try again.");
            effects.push(Effect::Notify(Notification::error(message.clone())));
            state.set_scan(ScanPhase::Failed { message });
            state.mark_dirty();
        }
        Msg::ScanStatusReceived {
            project_id,
            completed,
        } => {
            let ScanPhase::Analyzing { job } = state.scan_phase() else {
                return (state, effects);
            };
            if job.project_id != project_id {
                return (state, effects);
            }
            if completed {
                let mut job = job.clone();
                job.completed = true;
                effects.push(Effect::StopPolling { project_id });
                effects.push(Effect::ForgetScan);
                effects.push(Effect::Notify(Notification::success(format!(
                    "Finished analyzing {}.",
                    job.display_name()
                ))));
                if state.generating_for_mut().insert(project_id) {
                    effects.push(Effect::GenerateSuggestions { project_id });
                }
                state.add_project(job.clone());
                state.set_scan(ScanPhase::Complete { job });
            }
            state.mark_dirty();
        }
        Msg::ScanPollFailed {
            project_id,
            failure,
        } => {
            let matches_job = matches!(
                state.scan_phase(),
                ScanPhase::Analyzing { job, .. } if job.project_id == project_id
            );
            if matches_job {
                let message = failure.message_or("Project analysis did not finish in time.");
                effects.push(Effect::StopPolling { project_id });
                effects.push(Effect::ForgetScan);
                effects.push(Effect::Notify(Notification::error(message.clone())));
                state.set_scan(ScanPhase::Failed { message });
                state.mark_dirty();
            }
        }
        Msg::DismissScan => {
            if let ScanPhase::Analyzing { job, .. } = state.scan_phase() {
                effects.push(Effect::StopPolling {
                    project_id: job.project_id,
                });
            }
            effects.push(Effect::ForgetScan);
            state.set_scan(ScanPhase::Idle);
            state.mark_dirty();
        }

        Msg::GenerateSuggestionsClicked { project_id } => {
            if state.generating_for_mut().insert(project_id) {
                effects.push(Effect::GenerateSuggestions { project_id });
                state.mark_dirty();
            }
        }
        Msg::SuggestionsGenerated { project_id, result } => {
            state.generating_for_mut().remove(&project_id);
            match result {
                Ok(suggestions) => {
                    let count = suggestions.len();
                    for suggestion in suggestions {
                        state.insert_suggestion(suggestion);
                    }
                    effects.push(Effect::Notify(Notification::success(format!(
                        "Generated {count} new suggestion{}.",
                        if count == 1 { "" } else { "s" }
                    ))));
                }
                Err(failure) => {
                    effects.push(notify_failure(&failure, "Failed to generate suggestions"));
                }
            }
            state.mark_dirty();
        }

        Msg::ArchiveClicked {
            suggestion_id,
            archived,
        } => {
            if state.suggestion(suggestion_id).is_some()
                && state.pending_archive_mut().insert(suggestion_id)
            {
                effects.push(Effect::SetArchiveStatus {
                    suggestion_id,
                    archived,
                });
                state.mark_dirty();
            }
        }
        Msg::ArchiveStatusChanged {
            suggestion_id,
            archived,
            result,
        } => {
            state.pending_archive_mut().remove(&suggestion_id);
            let action = if archived { "archive" } else { "unarchive" };
            match result {
                Ok(()) => {
                    if let Some(suggestion) = state.suggestion_mut(suggestion_id) {
                        suggestion.archived = archived;
                    }
                    let destination = if archived {
                        GroupId::Archived
                    } else {
                        GroupId::Active
                    };
                    state.move_suggestion(suggestion_id, destination);
                    effects.push(Effect::Notify(Notification::success(format!(
                        "Suggestion {action}d successfully."
                    ))));
                }
                Err(failure) => {
                    effects.push(notify_failure(
                        &failure,
                        &format!("Failed to {action} suggestion."),
                    ));
                }
            }
            state.mark_dirty();
        }
        Msg::ScoreClicked {
            suggestion_id,
            score,
        } => {
            let Some(current) = state.suggestion(suggestion_id).map(|s| s.score) else {
                return (state, effects);
            };
            if state.score_cell(suggestion_id, current).begin(score).is_ok() {
                set_score(&mut state, suggestion_id, score);
                effects.push(Effect::UpdateScore {
                    suggestion_id,
                    score,
                });
                state.mark_dirty();
            }
        }
        Msg::ScoreUpdated {
            suggestion_id,
            result,
        } => {
            let Some(cell) = state.existing_score_cell(suggestion_id) else {
                return (state, effects);
            };
            let settled = match result {
                Ok(()) => {
                    let confirmed = cell.displayed();
                    cell.confirm(confirmed)
                }
                Err(failure) => {
                    effects.push(notify_failure(&failure, "Failed to update score"));
                    cell.rollback()
                }
            };
            set_score(&mut state, suggestion_id, settled);
            state.mark_dirty();
        }
        Msg::PostClicked { suggestion_id } => {
            let Some(suggestion) = state.suggestion(suggestion_id) else {
                return (state, effects);
            };
            if suggestion.posted {
                return (state, effects);
            }
            let Some(post_id) = suggestion.generated_post_id else {
                effects.push(Effect::Notify(Notification::error(
                    "Could not determine generated post ID.",
                )));
                return (state, effects);
            };
            if !state.features(suggestion.project_id).can_post() {
                effects.push(Effect::Notify(Notification::error(
                    "Configure auto-submission settings before posting.",
                )));
                return (state, effects);
            }
            if state.pending_post_mut().insert(suggestion_id) {
                effects.push(Effect::PublishPost {
                    suggestion_id,
                    post_id,
                });
                state.mark_dirty();
            }
        }
        Msg::PostPublished {
            suggestion_id,
            result,
        } => {
            state.pending_post_mut().remove(&suggestion_id);
            match result {
                Ok(()) => {
                    if let Some(suggestion) = state.suggestion_mut(suggestion_id) {
                        suggestion.posted = true;
                    }
                    state.move_suggestion(suggestion_id, GroupId::Posted);
                    effects.push(Effect::Notify(Notification::success("Blog post published!")));
                }
                Err(failure) => {
                    effects.push(notify_failure(&failure, "Failed to post blog."));
                }
            }
            state.mark_dirty();
        }
        Msg::GenerateContentClicked { suggestion_id } => {
            let startable = matches!(
                state.content_phase(suggestion_id),
                ContentPhase::Idle | ContentPhase::Failed { .. }
            );
            if startable && state.suggestion(suggestion_id).is_some() {
                state.set_content_phase(suggestion_id, ContentPhase::Generating);
                effects.push(Effect::GenerateContent { suggestion_id });
                state.mark_dirty();
            }
        }
        Msg::ContentGenerated {
            suggestion_id,
            result,
        } => {
            let phase = match result {
                Ok(content) => ContentPhase::Ready(content),
                Err(failure) => {
                    let message = failure.message_or("Generation failed");
                    effects.push(Effect::Notify(Notification::error(message.clone())));
                    ContentPhase::Failed { message }
                }
            };
            state.set_content_phase(suggestion_id, phase);
            state.mark_dirty();
        }
        Msg::TabSelected(tab) => {
            if state.view_state().current_tab != tab {
                state.view_state_mut().current_tab = tab;
                effects.push(Effect::PersistViewState(state.view_state().clone()));
                state.mark_dirty();
            }
        }

        Msg::KeywordSubmitted { project_id, text } => {
            let text = text.trim().to_string();
            match project_id {
                _ if state.adding_keyword() => {}
                Some(project_id) if !text.is_empty() => {
                    state.set_adding_keyword(true);
                    effects.push(Effect::AddKeyword { project_id, text });
                    state.mark_dirty();
                }
                _ => {
                    effects.push(Effect::Notify(Notification::error(
                        "Keyword and project are required.",
                    )));
                }
            }
        }
        Msg::KeywordAdded { result } => {
            state.set_adding_keyword(false);
            match result {
                Ok(keyword) => {
                    if let Some(keyword) = keyword {
                        state.insert_keyword(keyword);
                        state.reconcile_keywords();
                    }
                    effects.push(Effect::Notify(Notification::success("Keyword added!")));
                }
                Err(failure) => {
                    effects.push(notify_failure(&failure, "Failed to add keyword."));
                }
            }
            state.mark_dirty();
        }
        Msg::KeywordUseClicked {
            project_id,
            keyword_id,
        } => {
            let Some(current) = state.keyword(keyword_id).map(|k| k.in_use) else {
                effects.push(Effect::Notify(Notification::error("Unknown keyword.")));
                return (state, effects);
            };
            if let Ok(desired) = state.keyword_use_cell(keyword_id, current).toggle() {
                if let Some(keyword) = state.keyword_mut(keyword_id) {
                    keyword.in_use = desired;
                }
                effects.push(Effect::ToggleKeywordUse {
                    project_id,
                    keyword_id,
                });
                state.mark_dirty();
            }
        }
        Msg::KeywordUseToggled { keyword_id, result } => {
            let Some(cell) = state.existing_keyword_use_cell(keyword_id) else {
                return (state, effects);
            };
            let settled = match result {
                Ok(server_value) => cell.confirm(server_value),
                Err(failure) => {
                    effects.push(notify_failure(&failure, "Failed to toggle"));
                    cell.rollback()
                }
            };
            if let Some(keyword) = state.keyword_mut(keyword_id) {
                keyword.in_use = settled;
            }
            state.mark_dirty();
        }
        Msg::KeywordFilterChanged(query) => {
            state.view_state_mut().keyword_filter = query;
            state.reconcile_keywords();
            effects.push(Effect::PersistViewState(state.view_state().clone()));
            state.mark_dirty();
        }
        Msg::KeywordSortChanged { sort, direction } => {
            state.view_state_mut().keyword_sort = Some((sort, direction));
            state.reconcile_keywords();
            effects.push(Effect::PersistViewState(state.view_state().clone()));
            state.mark_dirty();
        }

        Msg::CompetitorSubmitted { project_id, url } => {
            if state.adding_competitor() {
                return (state, effects);
            }
            let url = url.trim().to_string();
            match project_id {
                _ if url.is_empty() => {
                    effects.push(Effect::Notify(Notification::error("URL is required")));
                }
                None => {
                    effects.push(Effect::Notify(Notification::error(
                        "Project ID could not be determined",
                    )));
                }
                Some(project_id) => {
                    state.set_adding_competitor(true);
                    effects.push(Effect::AddCompetitor { project_id, url });
                    state.mark_dirty();
                }
            }
        }
        Msg::CompetitorAdded { result } => {
            state.set_adding_competitor(false);
            match result {
                Ok(competitor) => {
                    effects.push(Effect::Notify(Notification::success(format!(
                        "Added competitor {}.",
                        if competitor.name.is_empty() {
                            &competitor.url
                        } else {
                            &competitor.name
                        }
                    ))));
                    state.push_competitor(competitor);
                }
                Err(failure) => {
                    effects.push(notify_failure(&failure, "Failed to analyze competitor"));
                }
            }
            state.mark_dirty();
        }

        Msg::PricingPageSubmitted { project_id, url } => {
            let url = url.trim().to_string();
            match project_id {
                _ if url.is_empty() => {
                    effects.push(Effect::Notify(Notification::error("URL is required")));
                }
                None => {
                    effects.push(Effect::Notify(Notification::error(
                        "Project ID could not be determined",
                    )));
                }
                Some(project_id) => {
                    if state.begin_task(project_id, ProjectTask::PricingPage) {
                        effects.push(Effect::AddPricingPage { project_id, url });
                        state.mark_dirty();
                    }
                }
            }
        }
        Msg::PricingPageAdded { project_id, result } => {
            state.finish_task(project_id, ProjectTask::PricingPage);
            match result {
                Ok(()) => {
                    state.enable_pricing_agent(project_id);
                    effects.push(Effect::Notify(Notification::success(
                        "Pricing page added successfully",
                    )));
                }
                Err(failure) => {
                    effects.push(notify_failure(
                        &failure,
                        "Error analyzing pricing page. Please try again.",
                    ));
                }
            }
            state.mark_dirty();
        }
        Msg::PricingStrategyClicked {
            project_id,
            user_prompt,
        } => {
            if state.begin_task(project_id, ProjectTask::PricingStrategy) {
                effects.push(Effect::CreatePricingStrategy {
                    project_id,
                    strategy_name: DEFAULT_PRICING_STRATEGY.to_string(),
                    user_prompt: user_prompt.trim().to_string(),
                });
                state.mark_dirty();
            }
        }
        Msg::PricingStrategyCreated { project_id, result } => {
            state.finish_task(project_id, ProjectTask::PricingStrategy);
            effects.push(match result {
                Ok(()) => Effect::Notify(Notification::success("Pricing strategy created.")),
                Err(failure) => {
                    notify_failure(&failure, "Error creating strategy. Please try again.")
                }
            });
            state.mark_dirty();
        }

        Msg::IdeaSubmitted { project_id, idea } => {
            let idea = idea.trim().to_string();
            if !idea.is_empty() && state.begin_task(project_id, ProjectTask::TitleFromIdea) {
                effects.push(Effect::GenerateTitleFromIdea { project_id, idea });
                state.mark_dirty();
            }
        }
        Msg::TitleFromIdeaGenerated { project_id, result } => {
            state.finish_task(project_id, ProjectTask::TitleFromIdea);
            match result {
                Ok(suggestion) => {
                    effects.push(Effect::Notify(Notification::success(format!(
                        "Added suggestion: {}",
                        suggestion.title
                    ))));
                    state.insert_suggestion(suggestion);
                }
                Err(_) => {
                    effects.push(Effect::Notify(Notification::error(
                        "Failed to generate suggestion. Please try again.",
                    )));
                }
            }
            state.mark_dirty();
        }

        Msg::ProjectDetailsSubmitted {
            project_id,
            details,
        } => {
            if state.begin_task(project_id, ProjectTask::SaveDetails) {
                effects.push(Effect::UpdateProjectDetails {
                    project_id,
                    details,
                });
                state.mark_dirty();
            }
        }
        Msg::ProjectDetailsSaved { project_id, result } => {
            state.finish_task(project_id, ProjectTask::SaveDetails);
            effects.push(Effect::Notify(match result {
                Ok(()) => Notification::success("Project details updated successfully"),
                Err(_) => Notification::error("Failed to update project details"),
            }));
            state.mark_dirty();
        }

        Msg::Tick | Msg::NoOp => {}
    }

    (state, effects)
}

fn notify_failure(failure: &ActionFailure, fallback: &str) -> Effect {
    Effect::Notify(Notification::error(failure.message_or(fallback)))
}

fn set_score(state: &mut AppState, suggestion_id: crate::SuggestionId, score: Score) {
    if let Some(suggestion) = state.suggestion_mut(suggestion_id) {
        suggestion.score = score;
    }
}

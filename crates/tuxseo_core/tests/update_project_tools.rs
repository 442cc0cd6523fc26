use tuxseo_core::{
    update, ActionFailure, AppState, Effect, GroupId, Msg, Notification, ProjectDetails,
    ProjectTask, Suggestion,
};

#[test]
fn pricing_page_validates_then_unlocks_agent() {
    let (state, effects) = update(
        AppState::new(),
        Msg::PricingPageSubmitted {
            project_id: Some(4),
            url: "  ".to_string(),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::Notify(Notification::error("URL is required"))]
    );

    let (state, effects) = update(
        state,
        Msg::PricingPageSubmitted {
            project_id: None,
            url: "https://a.test/pricing".to_string(),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::Notify(Notification::error(
            "Project ID could not be determined"
        ))]
    );

    let (state, effects) = update(
        state,
        Msg::PricingPageSubmitted {
            project_id: Some(4),
            url: " https://a.test/pricing ".to_string(),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::AddPricingPage {
            project_id: 4,
            url: "https://a.test/pricing".to_string()
        }]
    );
    assert!(state.view().is_busy(4, ProjectTask::PricingPage));

    let (state, effects) = update(
        state,
        Msg::PricingPageSubmitted {
            project_id: Some(4),
            url: "https://a.test/pricing".to_string(),
        },
    );
    assert!(effects.is_empty());

    let (state, effects) = update(
        state,
        Msg::PricingPageAdded {
            project_id: 4,
            result: Ok(()),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::Notify(Notification::success(
            "Pricing page added successfully"
        ))]
    );
    let view = state.view();
    assert_eq!(view.pricing_agents, vec![4]);
    assert!(!view.is_busy(4, ProjectTask::PricingPage));
    assert!(!state.has_pending_work());
}

#[test]
fn pricing_page_failure_uses_server_message() {
    let (state, _) = update(
        AppState::new(),
        Msg::PricingPageSubmitted {
            project_id: Some(4),
            url: "https://a.test/pricing".to_string(),
        },
    );
    let (state, effects) = update(
        state,
        Msg::PricingPageAdded {
            project_id: 4,
            result: Err(ActionFailure::application("Could not read page")),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::Notify(Notification::error("Could not read page"))]
    );
    assert!(state.view().pricing_agents.is_empty());

    let (_, effects) = update(
        state,
        Msg::PricingPageAdded {
            project_id: 4,
            result: Err(ActionFailure::network("")),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::Notify(Notification::error(
            "Error analyzing pricing page. Please try again."
        ))]
    );
}

#[test]
fn pricing_strategy_uses_default_strategy_once() {
    let (state, effects) = update(
        AppState::new(),
        Msg::PricingStrategyClicked {
            project_id: 2,
            user_prompt: String::new(),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::CreatePricingStrategy {
            project_id: 2,
            strategy_name: "Alex Hormozi".to_string(),
            user_prompt: String::new()
        }]
    );

    let (state, effects) = update(
        state,
        Msg::PricingStrategyClicked {
            project_id: 2,
            user_prompt: String::new(),
        },
    );
    assert!(effects.is_empty());
    assert!(state.has_pending_work());

    let (state, effects) = update(
        state,
        Msg::PricingStrategyCreated {
            project_id: 2,
            result: Err(ActionFailure::network("")),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::Notify(Notification::error(
            "Error creating strategy. Please try again."
        ))]
    );
    assert!(!state.has_pending_work());
}

#[test]
fn idea_appends_one_suggestion() {
    let (state, effects) = update(
        AppState::new(),
        Msg::IdeaSubmitted {
            project_id: 1,
            idea: "   ".to_string(),
        },
    );
    assert!(effects.is_empty());
    assert!(!state.has_pending_work());

    let (state, effects) = update(
        state,
        Msg::IdeaSubmitted {
            project_id: 1,
            idea: " rust for seo ".to_string(),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::GenerateTitleFromIdea {
            project_id: 1,
            idea: "rust for seo".to_string()
        }]
    );

    let mut suggestion = Suggestion::bare(31, 1);
    suggestion.title = "Rust for SEO".to_string();
    let (state, effects) = update(
        state,
        Msg::TitleFromIdeaGenerated {
            project_id: 1,
            result: Ok(suggestion),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::Notify(Notification::success(
            "Added suggestion: Rust for SEO"
        ))]
    );
    assert_eq!(state.group_of(31), Some(GroupId::Active));
    assert!(!state.view().is_busy(1, ProjectTask::TitleFromIdea));
}

#[test]
fn idea_failure_shows_fixed_message() {
    let (state, _) = update(
        AppState::new(),
        Msg::IdeaSubmitted {
            project_id: 1,
            idea: "anything".to_string(),
        },
    );
    let (state, effects) = update(
        state,
        Msg::TitleFromIdeaGenerated {
            project_id: 1,
            result: Err(ActionFailure::application("quota")),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::Notify(Notification::error(
            "Failed to generate suggestion. Please try again."
        ))]
    );
    assert!(state.view().groups.iter().all(|group| group.suggestions.is_empty()));
}

#[test]
fn project_details_save_reports_outcome() {
    let details = ProjectDetails {
        key_features: "Fast".to_string(),
        language: "English".to_string(),
        ..ProjectDetails::default()
    };
    let (state, effects) = update(
        AppState::new(),
        Msg::ProjectDetailsSubmitted {
            project_id: 6,
            details: details.clone(),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::UpdateProjectDetails {
            project_id: 6,
            details
        }]
    );
    assert!(state.is_busy(6, ProjectTask::SaveDetails));

    let (state, effects) = update(
        state,
        Msg::ProjectDetailsSaved {
            project_id: 6,
            result: Err(ActionFailure::application("bad language")),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::Notify(Notification::error(
            "Failed to update project details"
        ))]
    );

    let (state, _) = update(
        state,
        Msg::ProjectDetailsSubmitted {
            project_id: 6,
            details: ProjectDetails::default(),
        },
    );
    let (state, effects) = update(
        state,
        Msg::ProjectDetailsSaved {
            project_id: 6,
            result: Ok(()),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::Notify(Notification::success(
            "Project details updated successfully"
        ))]
    );
    assert!(!state.has_pending_work());
}

use pretty_assertions::assert_eq;
use serde_json::json;
use tuxseo_engine::{
    ActionDispatcher, ActionError, ActionRequest, DispatchSettings, ErrorKind, PageContext,
    ProjectDetailsForm, ReqwestDispatcher, TuxSeoApi,
};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn page() -> PageContext {
    PageContext {
        hidden_field: Some("field-token".to_string()),
        cookie_header: Some("sessionid=s3ss; csrftoken=cookie-token".to_string()),
        meta_token: None,
    }
}

fn dispatcher(server: &MockServer, page: PageContext) -> ReqwestDispatcher {
    ReqwestDispatcher::new(&server.uri(), page, DispatchSettings::default()).expect("dispatcher")
}

#[tokio::test]
async fn post_carries_token_referer_and_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/keywords/toggle-use"))
        .and(header("X-CSRFToken", "field-token"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(json!({"project_id": 1, "keyword_id": 2})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success", "use": true})))
        .expect(1)
        .mount(&server)
        .await;

    let api = TuxSeoApi::new(std::sync::Arc::new(dispatcher(&server, page())));
    assert!(api.toggle_keyword_use(1, 2).await.expect("toggle"));

    let requests = server.received_requests().await.expect("recording");
    let referer = requests[0].headers.get("referer").expect("referer");
    assert!(referer.to_str().unwrap().starts_with(&server.uri()));
    let cookie = requests[0].headers.get("cookie").expect("cookie");
    assert_eq!(cookie.to_str().unwrap(), "sessionid=s3ss; csrftoken=cookie-token");
}

#[tokio::test]
async fn post_without_token_never_reaches_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dispatcher = dispatcher(&server, PageContext::default());
    let err = dispatcher
        .perform(ActionRequest::post_empty("/api/projects/1/toggle-auto-submission"))
        .await
        .unwrap_err();
    assert_eq!(err, ActionError::TokenMissing);
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[tokio::test]
async fn status_get_works_without_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/project/5/status/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"completed": false})))
        .mount(&server)
        .await;

    let api = TuxSeoApi::new(std::sync::Arc::new(dispatcher(&server, PageContext::default())));
    let status = api.project_status(5).await.expect("status");
    assert!(!status.completed);

    let requests = server.received_requests().await.expect("recording");
    assert!(requests[0].headers.get("x-csrftoken").is_none());
}

#[tokio::test]
async fn scan_error_envelope_surfaces_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/scan"))
        .and(body_json(json!({"url": "https://bad.example"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "error", "message": "Invalid URL"})),
        )
        .mount(&server)
        .await;

    let api = TuxSeoApi::new(std::sync::Arc::new(dispatcher(&server, page())));
    let err = api.scan("https://bad.example").await.unwrap_err();
    assert_eq!(
        err,
        ActionError::Application {
            message: "Invalid URL".to_string()
        }
    );
    assert_eq!(err.kind(), ErrorKind::Application);
}

#[tokio::test]
async fn non_2xx_is_network_failure_with_status_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/post-generated-blog-post"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let api = TuxSeoApi::new(std::sync::Arc::new(dispatcher(&server, page())));
    let err = api.post_generated_blog_post(12).await.unwrap_err();
    assert_eq!(
        err,
        ActionError::Network {
            status: Some(500),
            message: "Server error: 500".to_string()
        }
    );
}

#[tokio::test]
async fn validation_happens_before_dispatch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let api = TuxSeoApi::new(std::sync::Arc::new(dispatcher(&server, page())));
    assert!(matches!(api.scan("  ").await, Err(ActionError::Validation(_))));
    assert!(matches!(
        api.add_keyword(1, "").await,
        Err(ActionError::Validation(_))
    ));
    assert!(matches!(
        api.add_competitor(1, " ").await,
        Err(ActionError::Validation(_))
    ));
    assert!(matches!(
        api.add_pricing_page(1, "").await,
        Err(ActionError::Validation(_))
    ));
    assert!(matches!(
        api.generate_title_from_idea(1, "   ").await,
        Err(ActionError::Validation(_))
    ));
    assert!(matches!(
        api.update_title_score(1, 2).await,
        Err(ActionError::Validation(_))
    ));
}

#[tokio::test]
async fn form_bodies_are_url_encoded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scan/"))
        .and(header("Content-Type", "application/x-www-form-urlencoded"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
        .mount(&server)
        .await;

    let dispatcher = dispatcher(&server, page());
    dispatcher
        .perform(ActionRequest::post_form(
            "/scan/",
            vec![("url".to_string(), "https://a.test/?q=1&r=2".to_string())],
        ))
        .await
        .expect("form post");

    let requests = server.received_requests().await.expect("recording");
    assert_eq!(
        String::from_utf8_lossy(&requests[0].body),
        "url=https%3A%2F%2Fa.test%2F%3Fq%3D1%26r%3D2"
    );
}

#[tokio::test]
async fn user_settings_hit_query_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/user/settings"))
        .and(query_param("project_id", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "profile": {"has_pro_subscription": true},
            "project": {"has_auto_submission_setting": true}
        })))
        .mount(&server)
        .await;

    let api = TuxSeoApi::new(std::sync::Arc::new(dispatcher(&server, page())));
    let settings = api.user_settings(3).await.expect("settings");
    assert_eq!(settings.project, json!({"has_auto_submission_setting": true}));
}

#[tokio::test]
async fn pricing_endpoints_send_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/add-pricing-page"))
        .and(body_json(json!({"project_id": 4, "url": "https://a.test/pricing"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "message": "Pricing page added successfully"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/create-pricing-strategy"))
        .and(body_json(json!({
            "project_id": 4,
            "strategy_name": "Alex Hormozi",
            "user_prompt": ""
        })))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "status": "error",
            "message": "Add a pricing page first"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = TuxSeoApi::new(std::sync::Arc::new(dispatcher(&server, page())));
    api.add_pricing_page(4, " https://a.test/pricing ")
        .await
        .expect("pricing page");
    let err = api
        .create_pricing_strategy(4, "Alex Hormozi", "")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ActionError::Network {
            status: Some(400),
            message: "Add a pricing page first".to_string()
        }
    );
}

#[tokio::test]
async fn idea_reply_yields_one_suggestion() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate-title-from-idea"))
        .and(body_json(json!({"project_id": 2, "user_prompt": "rust for seo"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "suggestion": {
                "id": 31,
                "title": "Rust for SEO",
                "description": "Why it matters",
                "category": "GENERAL",
                "target_keywords": ["rust"],
                "suggested_meta_description": "Rust and SEO",
                "content_type": "SHARING"
            }
        })))
        .mount(&server)
        .await;

    let api = TuxSeoApi::new(std::sync::Arc::new(dispatcher(&server, page())));
    let suggestion = api
        .generate_title_from_idea(2, "rust for seo")
        .await
        .expect("idea");
    assert_eq!(suggestion.id, 31);
    assert_eq!(suggestion.title, "Rust for SEO");
    assert_eq!(suggestion.meta_description, "Rust and SEO");
}

#[tokio::test]
async fn project_details_are_form_encoded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/projects/8/update"))
        .and(header("Content-Type", "application/x-www-form-urlencoded"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
        .expect(1)
        .mount(&server)
        .await;

    let form = ProjectDetailsForm {
        key_features: "fast & small".to_string(),
        language: "English".to_string(),
        ..ProjectDetailsForm::default()
    };
    let api = TuxSeoApi::new(std::sync::Arc::new(dispatcher(&server, page())));
    api.update_project_details(8, &form).await.expect("details");

    let requests = server.received_requests().await.expect("recording");
    let body = String::from_utf8_lossy(&requests[0].body).into_owned();
    assert!(body.starts_with("key_features=fast+%26+small&target_audience_summary=&"));
    assert!(body.ends_with("&language=English"));
}

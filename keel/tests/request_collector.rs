use http::{Method, StatusCode};
use keel::collector::{REDACTED, RedirectRecord, RequestDataCollector};
use keel::http::{
    REDIRECTED_ATTRIBUTE, ROUTE_ATTRIBUTE, ROUTE_PARAMS_ATTRIBUTE, Request, Response, Session,
};
use keel::kernel::{
    ControllerSummary, ControllerTarget, EventSubscriber, Kernel, KernelEvent, RequestKind,
    ResponseEvent, controller_fn,
};
use serde_json::{Value, json};
use std::sync::Arc;

fn kernel_with(collector: &Arc<RequestDataCollector>) -> Kernel {
    let mut builder = Kernel::builder();
    builder.subscribe(collector.clone());
    builder.build()
}

fn redirecting() -> Arc<dyn keel::kernel::Controller> {
    controller_fn(ControllerTarget::parse("LoginController::check"), |_, _| async {
        let response = Response::builder(StatusCode::FOUND)
            .header("location", "/dashboard")
            .header("x-debug-token", "a1b2c3")
            .build()?;
        Ok::<_, keel::BoxError>(response)
    })
}

fn landing() -> Arc<dyn keel::kernel::Controller> {
    controller_fn(ControllerTarget::method("DashboardController", "index"), |_, _| async {
        Ok(Response::ok("dashboard"))
    })
}

#[test]
fn test_subscriptions() {
    let collector = RequestDataCollector::new();
    let table: Vec<_> = collector
        .subscriptions()
        .iter()
        .map(|s| (s.event, s.priority))
        .collect();
    assert_eq!(
        table,
        vec![(KernelEvent::Controller, 0), (KernelEvent::Response, 0)]
    );
    assert_eq!(collector.name(), "request");
}

#[test]
fn test_collect_redacts_secrets() {
    let collector = RequestDataCollector::new();
    let request = Request::builder(Method::POST, "/login")
        .header("php-auth-pw", "secret")
        .server("PHP_AUTH_PW", "secret")
        .server("SERVER_NAME", "localhost")
        .body_param("_password", "secret")
        .body_param("_username", "admin")
        .build()
        .unwrap();

    let profile = collector.collect(&request, &Response::ok("ok"));

    assert_eq!(profile.request_headers["php-auth-pw"], json!(REDACTED));
    assert_eq!(profile.request_server["PHP_AUTH_PW"], json!(REDACTED));
    assert_eq!(profile.request_server["SERVER_NAME"], json!("localhost"));
    assert_eq!(profile.request_request["_password"], json!(REDACTED));
    assert_eq!(profile.request_request["_username"], json!("admin"));
}

#[test]
fn test_collect_basic_fields() {
    let collector = RequestDataCollector::new();
    let request = Request::builder(Method::GET, "/blog/42")
        .header("accept", "text/html")
        .header("x-forwarded-for", "10.0.0.1")
        .header("x-forwarded-for", "10.0.0.2")
        .query("page", 2)
        .cookie("theme", "dark")
        .attribute(ROUTE_ATTRIBUTE, "blog_show")
        .attribute(ROUTE_PARAMS_ATTRIBUTE, json!({"id": "42"}))
        .format("json")
        .locale("fr")
        .content("{}")
        .build()
        .unwrap();
    let response = Response::builder(StatusCode::NOT_FOUND)
        .header("content-type", "application/json")
        .build()
        .unwrap();

    let profile = collector.collect(&request, &response);

    assert_eq!(profile.method, "GET");
    assert_eq!(profile.format, "json");
    assert_eq!(profile.content.as_deref(), Some("{}"));
    assert_eq!(profile.content_type, "application/json");
    assert_eq!(profile.status_code, 404);
    assert_eq!(profile.status_text, "Not Found");
    assert_eq!(profile.request_query["page"], json!(2));
    assert_eq!(profile.request_cookies["theme"], json!("dark"));
    assert_eq!(profile.request_headers["accept"], json!("text/html"));
    assert_eq!(
        profile.request_headers["x-forwarded-for"],
        json!(["10.0.0.1", "10.0.0.2"])
    );
    assert_eq!(profile.response_headers["content-type"], json!("application/json"));
    assert_eq!(profile.route, "blog_show");
    assert_eq!(profile.identifier(), "blog_show");
    assert_eq!(profile.route_params().get("id"), Some(&json!("42")));
    assert_eq!(profile.path_info, "/blog/42");
    assert_eq!(profile.locale, "fr");
    assert_eq!(profile.controller, ControllerSummary::unknown());
    assert!(profile.session_metadata.is_empty());
}

#[test]
fn test_streamed_content_is_not_collected() {
    let collector = RequestDataCollector::new();
    let request = Request::builder(Method::POST, "/upload")
        .streamed_content()
        .build()
        .unwrap();

    let profile = collector.collect(&request, &Response::ok(""));

    assert_eq!(profile.content, None);
    assert!(profile.route_params().is_empty());
}

#[test]
fn test_session_data_of_started_session() {
    let collector = RequestDataCollector::new();
    let session = Arc::new(Session::started());
    session.set("user", "admin");
    session.add_flash("notice", "welcome back");
    let request = Request::builder(Method::GET, "/")
        .session(session.clone())
        .build()
        .unwrap();

    let profile = collector.collect(&request, &Response::ok(""));

    let metadata = session.metadata();
    assert_eq!(
        profile.session_metadata["Created"],
        json!(metadata.created.to_rfc2822())
    );
    assert_eq!(
        profile.session_metadata["Last used"],
        json!(metadata.last_used.to_rfc2822())
    );
    assert_eq!(profile.session_metadata["Lifetime"], json!(0));
    assert_eq!(profile.session_attributes["user"], json!("admin"));
    assert_eq!(profile.flashes["notice"], vec!["welcome back"]);
    // peeking leaves the flashes in place
    assert_eq!(session.peek_all_flashes().len(), 1);
}

#[test]
fn test_unstarted_session_is_ignored() {
    let collector = RequestDataCollector::new();
    let session = Arc::new(Session::new());
    session.set("user", "admin");
    let request = Request::builder(Method::GET, "/")
        .session(session)
        .build()
        .unwrap();

    let profile = collector.collect(&request, &Response::ok(""));

    assert!(profile.session_metadata.is_empty());
    assert!(profile.session_attributes.is_empty());
}

#[tokio::test]
async fn test_controller_summary_from_kernel() {
    let collector = Arc::new(RequestDataCollector::new());
    let kernel = kernel_with(&collector);
    let request = Arc::new(
        Request::builder(Method::GET, "/dashboard")
            .controller(landing())
            .build()
            .unwrap(),
    );

    let response = kernel.handle(request.clone(), RequestKind::Main).await.unwrap();
    let profile = collector.collect(&request, &response);

    match &profile.controller {
        ControllerSummary::Detailed {
            class,
            method,
            file,
            line,
        } => {
            assert_eq!(class, "DashboardController");
            assert_eq!(method.as_deref(), Some("index"));
            assert!(file.as_deref().unwrap().ends_with("request_collector.rs"));
            assert!(line.unwrap() > 0);
        }
        other => panic!("unexpected summary: {other:?}"),
    }
    assert_eq!(profile.identifier(), "DashboardController::index()");

    // the remembered controller is consumed by the first collect
    let again = collector.collect(&request, &response);
    assert_eq!(again.controller, ControllerSummary::unknown());
}

#[tokio::test]
async fn test_redirect_round_trip() {
    let collector = Arc::new(RequestDataCollector::new());
    let kernel = kernel_with(&collector);
    let session = Arc::new(Session::started());

    let login = Arc::new(
        Request::builder(Method::POST, "/login")
            .attribute(ROUTE_ATTRIBUTE, "login_check")
            .session(session.clone())
            .controller(redirecting())
            .build()
            .unwrap(),
    );
    let response = kernel.handle(login.clone(), RequestKind::Main).await.unwrap();
    assert!(response.is_redirect());
    let first = collector.collect(&login, &response);
    assert!(first.redirect.is_none());
    assert!(!login.has_attribute(REDIRECTED_ATTRIBUTE));

    let dashboard = Arc::new(
        Request::builder(Method::GET, "/dashboard")
            .session(session.clone())
            .controller(landing())
            .build()
            .unwrap(),
    );
    let response = kernel
        .handle(dashboard.clone(), RequestKind::Main)
        .await
        .unwrap();
    assert_eq!(dashboard.attribute(REDIRECTED_ATTRIBUTE), Some(Value::Bool(true)));

    let second = collector.collect(&dashboard, &response);

    assert_eq!(
        second.redirect,
        Some(RedirectRecord {
            token: Some("a1b2c3".to_string()),
            route: "login_check".to_string(),
            method: "POST".to_string(),
            controller: ControllerSummary::Detailed {
                class: "LoginController".to_string(),
                method: Some("check".to_string()),
                file: None,
                line: None,
            },
            status_code: 302,
            status_text: "Found".to_string(),
        })
    );
    assert!(session.get(keel::collector::REDIRECT_SESSION_KEY).is_none());
}

#[tokio::test]
async fn test_sub_request_is_not_marked_redirected() {
    let collector = RequestDataCollector::new();
    let session = Arc::new(Session::started());
    session.set(keel::collector::REDIRECT_SESSION_KEY, json!({}));
    let request = Arc::new(Request::builder(Method::GET, "/").session(session).build().unwrap());

    collector.on_kernel_response(&ResponseEvent::new(
        request.clone(),
        RequestKind::Sub,
        Arc::new(Response::ok("")),
    ));
    assert!(!request.has_attribute(REDIRECTED_ATTRIBUTE));

    collector.on_kernel_response(&ResponseEvent::new(
        request.clone(),
        RequestKind::Main,
        Arc::new(Response::ok("")),
    ));
    assert!(request.has_attribute(REDIRECTED_ATTRIBUTE));
}

#[test]
fn test_profile_serializes_to_json() {
    let collector = RequestDataCollector::new();
    let request = Request::builder(Method::GET, "/")
        .attribute(ROUTE_ATTRIBUTE, "home")
        .build()
        .unwrap();

    let profile = collector.collect(&request, &Response::ok("home"));
    let json = serde_json::to_value(&profile).unwrap();

    assert_eq!(json["route"], json!("home"));
    assert_eq!(json["status_code"], json!(200));
    assert_eq!(json["controller"], json!("n/a"));
    assert!(json.get("redirect").is_none());

    let back: keel::collector::RequestProfile = serde_json::from_value(json).unwrap();
    assert_eq!(back, profile);
}

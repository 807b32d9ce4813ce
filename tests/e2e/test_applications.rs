use crate::e2e::helpers;

use cf_driver::error::{AppError, EXIT_REMOTE_FAILURE};
use helpers::TestContext;
use pretty_assertions::assert_eq;
use serde_json::json;
use test_context::test_context;

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_list_apps_skipping_those_without_details(ctx: &TestContext) {
    ctx.fake.add_app("alpha");
    ctx.fake.add_app("broken");
    ctx.fake.add_app("gamma");
    ctx.fake
        .state
        .lock()
        .broken_summaries
        .insert("broken".to_string());

    let output = ctx.run(&["apps"]).await;

    assert!(output.result.is_ok());
    let apps = output.json();
    let names: Vec<&str> = apps
        .as_array()
        .unwrap()
        .iter()
        .map(|app| app["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["alpha", "gamma"]);
    assert_eq!(apps[0]["urls"], json!(["alpha.cfapps.io"]));
    assert_eq!(apps[0]["buildpack"], json!("java"));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_list_nothing_for_an_empty_space(ctx: &TestContext) {
    let output = ctx.run(&["apps"]).await;

    assert!(output.result.is_ok());
    assert_eq!(output.json(), json!([]));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_show_a_single_app(ctx: &TestContext) {
    let id = ctx.fake.add_app("demo");

    let output = ctx.run(&["app", "demo"]).await;

    assert!(output.result.is_ok());
    let app = output.json();
    assert_eq!(app["id"], json!(id));
    assert_eq!(app["state"], json!("STARTED"));
    assert_eq!(app["running_instances"], json!(1));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_set_env_vars_one_at_a_time_in_order(ctx: &TestContext) {
    ctx.fake.add_app("demo");

    let output = ctx
        .run(&["set-env", "demo", "A=1", "B=2", "C=3"])
        .await;

    assert!(output.result.is_ok());
    let state = ctx.fake.state.lock();
    assert_eq!(state.env_writes, vec!["A", "A,B", "A,B,C"]);
    assert_eq!(state.env_max_in_flight, 1);
    drop(state);

    let app = ctx.fake.app("demo").unwrap();
    assert_eq!(app.env.get("C"), Some(&json!("3")));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_stop_setting_env_at_first_rejection(ctx: &TestContext) {
    ctx.fake.add_app("demo");
    ctx.fake
        .state
        .lock()
        .rejected_env_keys
        .insert("B".to_string());

    let output = ctx
        .run(&["set-env", "demo", "A=1", "B=2", "C=3"])
        .await;

    let err = output.result.unwrap_err();
    assert!(matches!(err, AppError::Rejected(_)));
    assert_eq!(err.exit_code(), EXIT_REMOTE_FAILURE);
    assert_eq!(ctx.fake.state.lock().env_writes, vec!["A"]);

    let app = ctx.fake.app("demo").unwrap();
    assert!(app.env.contains_key("A"));
    assert!(!app.env.contains_key("C"));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_unset_env_vars_and_show_environment(ctx: &TestContext) {
    ctx.fake.add_app("demo");
    let set = ctx.run(&["set-env", "demo", "KEEP=yes", "DROP=no"]).await;
    assert!(set.result.is_ok());

    let unset = ctx.run(&["unset-env", "demo", "DROP", "NEVER_SET"]).await;
    assert!(unset.result.is_ok());

    let output = ctx.run(&["env", "demo"]).await;
    assert!(output.result.is_ok());
    let env = output.json();
    assert_eq!(env["user_provided"], json!({ "KEEP": "yes" }));
    assert_eq!(env["application"]["VCAP_APPLICATION"]["name"], json!("demo"));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_create_and_start_an_app_on_first_push(ctx: &TestContext) {
    let output = ctx.run(&["push", "fresh"]).await;

    assert!(output.result.is_ok());
    let app = ctx.fake.app("fresh").expect("app was not created");
    assert_eq!(
        output.json(),
        json!({ "action": "created", "app_id": app.id })
    );
    assert_eq!(app.state, "STARTED");
    assert_eq!(ctx.fake.state.lock().state_changes, vec!["fresh:STARTED"]);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_update_and_restart_an_existing_app_on_push(ctx: &TestContext) {
    let id = ctx.fake.add_app("demo");

    let output = ctx.run(&["push", "demo"]).await;

    assert!(output.result.is_ok());
    assert_eq!(output.json(), json!({ "action": "updated", "app_id": id }));
    let app = ctx.fake.app("demo").unwrap();
    assert_eq!(app.updates, 1);
    assert_eq!(
        ctx.fake.state.lock().state_changes,
        vec!["demo:STOPPED", "demo:STARTED"]
    );
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_start_and_restart_an_app(ctx: &TestContext) {
    ctx.fake.add_app("demo");

    assert!(ctx.run(&["start", "demo"]).await.result.is_ok());
    assert!(ctx.run(&["restart", "demo"]).await.result.is_ok());

    assert_eq!(
        ctx.fake.state.lock().state_changes,
        vec!["demo:STARTED", "demo:STOPPED", "demo:STARTED"]
    );
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_delete_an_app(ctx: &TestContext) {
    ctx.fake.add_app("demo");

    let output = ctx.run(&["delete", "demo"]).await;

    assert!(output.result.is_ok());
    assert!(ctx.fake.app("demo").is_none());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_fail_to_delete_an_unknown_app(ctx: &TestContext) {
    let output = ctx.run(&["delete", "ghost"]).await;

    let err = output.result.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(err.exit_code(), EXIT_REMOTE_FAILURE);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_print_routes_one_per_line(ctx: &TestContext) {
    ctx.fake.add_app("demo");
    ctx.fake.add_app("api");

    let output = ctx.run(&["routes"]).await;

    assert!(output.result.is_ok());
    assert_eq!(
        output.stdout,
        "demo.cfapps.io -> demo\napi.cfapps.io -> api\n"
    );
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_list_service_instances(ctx: &TestContext) {
    let output = ctx.run(&["services"]).await;

    assert!(output.result.is_ok());
    let services = output.json();
    assert_eq!(services[0]["name"], json!("my-db"));
    assert_eq!(services[0]["kind"], json!("managed_service_instance"));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_show_the_configured_space(ctx: &TestContext) {
    let space_id = ctx.fake.state.lock().space_id;

    let output = ctx.run(&["space"]).await;

    assert!(output.result.is_ok());
    assert_eq!(
        output.json(),
        json!({
            "id": space_id,
            "name": "dev",
            "organization": "FrameworksAndRuntimes"
        })
    );
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_print_a_one_time_ssh_code(ctx: &TestContext) {
    let output = ctx.run(&["ssh-code"]).await;

    assert!(output.result.is_ok());
    assert_eq!(output.stdout, format!("{}\n", helpers::fake_cf::SSH_CODE));
}

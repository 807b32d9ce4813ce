use crate::e2e::helpers;

use cf_driver::error::{AppError, EXIT_CONFIG_FAILURE, EXIT_REMOTE_FAILURE};
use helpers::fake_cf::USERNAME;
use helpers::TestContext;
use pretty_assertions::assert_eq;
use test_context::test_context;

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_cache_refresh_token_after_password_login(ctx: &TestContext) {
    ctx.fake
        .state
        .lock()
        .issue_refresh_tokens
        .extend(["rtk-123".to_string(), "rtk-456".to_string()]);
    ctx.fake.add_app("demo");

    // First run has no cache and logs in with the password
    let first = ctx.run(&["apps"]).await;
    assert!(first.result.is_ok());
    assert_eq!(ctx.cached_token().as_deref(), Some("rtk-123"));
    assert_eq!(ctx.fake.grants(), vec![format!("password:{}", USERNAME)]);

    // Second run needs no password at all
    let second = ctx
        .run_with(&ctx.config_without_password(), &["apps"])
        .await;
    assert!(second.result.is_ok());
    assert_eq!(
        ctx.fake.grants(),
        vec![
            format!("password:{}", USERNAME),
            "refresh_token:rtk-123".to_string()
        ]
    );

    // UAA rotated the token; the new one replaces the cached one
    assert_eq!(ctx.cached_token().as_deref(), Some("rtk-456"));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_prefer_cached_token_over_password(ctx: &TestContext) {
    ctx.write_cached_token("rtk-seeded");
    ctx.fake.accept_refresh_token("rtk-seeded");

    let output = ctx.run(&["space"]).await;

    assert!(output.result.is_ok());
    assert_eq!(
        ctx.fake.grants(),
        vec!["refresh_token:rtk-seeded".to_string()]
    );
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_fail_without_token_or_password(ctx: &TestContext) {
    let output = ctx
        .run_with(&ctx.config_without_password(), &["apps"])
        .await;

    let err = output.result.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    assert_eq!(err.exit_code(), EXIT_CONFIG_FAILURE);
    assert!(ctx.fake.grants().is_empty());
    assert!(!ctx.token_path().exists());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_not_write_cache_when_password_is_rejected(ctx: &TestContext) {
    let config = ctx.config_with(&[("CF_PASSWORD", "wrong")]);

    let output = ctx.run_with(&config, &["apps"]).await;

    assert!(matches!(output.result, Err(AppError::Unauthorized(_))));
    assert!(!ctx.token_path().exists());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_fall_back_to_password_when_cache_is_malformed(ctx: &TestContext) {
    std::fs::create_dir_all(ctx.token_path().parent().unwrap()).unwrap();
    std::fs::write(ctx.token_path(), "{ not json").unwrap();
    ctx.fake
        .state
        .lock()
        .issue_refresh_tokens
        .push_back("rtk-fresh".to_string());

    let output = ctx.run(&["services"]).await;

    assert!(output.result.is_ok());
    assert_eq!(ctx.fake.grants(), vec![format!("password:{}", USERNAME)]);
    assert_eq!(ctx.cached_token().as_deref(), Some("rtk-fresh"));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_persist_token_even_when_operation_fails(ctx: &TestContext) {
    ctx.fake
        .state
        .lock()
        .issue_refresh_tokens
        .push_back("rtk-after-failure".to_string());

    let output = ctx.run(&["app", "missing"]).await;

    let err = output.result.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(err.exit_code(), EXIT_REMOTE_FAILURE);
    assert_eq!(ctx.cached_token().as_deref(), Some("rtk-after-failure"));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_renew_with_rotated_refresh_tokens_when_access_tokens_expire(
    ctx: &TestContext,
) {
    ctx.fake.state.lock().expires_in = 0;
    ctx.fake.add_app("demo");

    let output = ctx.run(&["apps"]).await;
    assert!(output.result.is_ok());

    let grants = ctx.fake.grants();
    assert!(grants.len() > 1);
    assert_eq!(grants[0], format!("password:{}", USERNAME));
    assert!(grants[1..]
        .iter()
        .all(|grant| grant.starts_with("refresh_token:rtk-generated-")));

    // Every grant succeeded, so the last one issued is the latest token
    assert_eq!(
        ctx.cached_token(),
        Some(format!("rtk-generated-{}", grants.len()))
    );
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_renew_once_when_access_token_is_rejected(ctx: &TestContext) {
    ctx.fake.state.lock().reject_next_api_calls = 1;

    let output = ctx.run(&["space"]).await;

    assert!(output.result.is_ok());
    let grants = ctx.fake.grants();
    assert_eq!(grants.len(), 2);
    assert!(grants[1].starts_with("refresh_token:"));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_give_up_after_a_second_rejection(ctx: &TestContext) {
    ctx.fake.state.lock().reject_next_api_calls = 2;

    let output = ctx.run(&["space"]).await;

    assert!(matches!(output.result, Err(AppError::Unauthorized(_))));
}

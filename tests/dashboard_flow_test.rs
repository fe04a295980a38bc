// tests/dashboard_flow_test.rs
//! End-to-end client flows against a mocked backend.

mod common;

use common::mock_backend::{PASSWORD, USER_CPF, USER_NAME};
use common::MockBackend;
use httpmock::prelude::*;
use serde_json::json;

use eventstaff_lib::api::{ApiError, ListParams};
use eventstaff_lib::attendance::ClockType;
use eventstaff_lib::forms::FormState;
use eventstaff_lib::routes::Route;
use eventstaff_lib::session::auth::SignInRequest;
use eventstaff_lib::session::SessionPhase;

fn credentials() -> FormState<SignInRequest> {
    FormState::new(SignInRequest {
        cpf: USER_CPF.to_string(),
        password: PASSWORD.to_string(),
    })
}

#[tokio::test]
async fn test_session_survives_restart_until_server_rejects_it() {
    let backend = MockBackend::start().await;
    let data_dir = tempfile::tempdir().unwrap();

    let ctx = backend.client(data_dir.path());
    assert_eq!(ctx.navigator.current(), Route::SignIn);
    let user = ctx.auth.sign_in(&mut credentials()).await.unwrap();
    assert_eq!(user.name, USER_NAME);
    drop(ctx);

    // Restart: the persisted session is restored and the guard lets us in.
    let ctx = backend.client(data_dir.path());
    assert_eq!(ctx.session.phase(), SessionPhase::SignedIn);
    assert_eq!(ctx.navigator.current(), Route::Dashboard);
    assert_eq!(ctx.navigator.navigate(Route::Companies), Route::Companies);

    backend
        .server
        .mock_async(|when, then| {
            when.method(GET).path("/companies");
            then.status(401);
        })
        .await;
    let err = ctx
        .api
        .list_companies(&ListParams::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
    assert_eq!(ctx.navigator.current(), Route::SignIn);
    drop(ctx);

    // The expiry was persisted too.
    let ctx = backend.client(data_dir.path());
    assert_eq!(ctx.session.phase(), SessionPhase::SignedOut);
    assert_eq!(ctx.navigator.navigate(Route::Events), Route::SignIn);
}

#[tokio::test]
async fn test_attendance_log_is_kept_per_day_across_restarts() {
    let backend = MockBackend::start().await;
    let data_dir = tempfile::tempdir().unwrap();

    let ctx = backend.client(data_dir.path());
    ctx.attendance.clock_in(41, "Ana").unwrap();
    ctx.attendance.clock_in(41, "Bia").unwrap();
    ctx.attendance.clock_out(41, "Ana").unwrap();
    drop(ctx);

    let ctx = backend.client(data_dir.path());
    let entries = ctx.attendance.entries(41).unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].name, "Ana");
    assert_eq!(entries[0].kind, ClockType::Out);
    assert_eq!(ctx.attendance.present(41).unwrap(), vec!["Bia".to_string()]);
    assert!(ctx.attendance.entries(42).unwrap().is_empty());
}

#[tokio::test]
async fn test_worker_picker_lists_active_workers_for_the_session() {
    let backend = MockBackend::start().await;
    let workers = backend
        .server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/workers")
                .query_param("q", "")
                .query_param("page", "1")
                .query_param("status", "active")
                .header("cookie", "session=live");
            then.status(200).json_body(json!({
                "data": [
                    { "id": 1, "name": "Ana", "cpf": "52998224725" },
                    { "id": 2, "name": "Bia", "cpf": "11144477735" }
                ],
                "meta": { "current_page": 1, "last_page": 1 }
            }));
        })
        .await;
    let data_dir = tempfile::tempdir().unwrap();
    let ctx = backend.client(data_dir.path());
    ctx.auth.sign_in(&mut credentials()).await.unwrap();

    let picker = ctx.worker_picker();
    picker.open();
    for _ in 0..50 {
        if !picker.items().is_empty() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }

    workers.assert_async().await;
    assert_eq!(picker.items().len(), 2);
    assert_eq!(picker.select(2).map(|w| w.name), Some("Bia".to_string()));
}

//! End-to-end flows against a real PostgreSQL database. Each test skips
//! itself unless `TEST_DATABASE_URL` is set.

use actix_web::{http::StatusCode, test};
use chrono::{Duration, Utc};
use fake::{Fake, faker::name::en::FirstName};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use serial_test::serial;

#[macro_use]
mod common;

const ADMIN_PASSWORD: &str = "admin-secret";
const MEMBER_PASSWORD: &str = "member-secret";

macro_rules! send {
    ($app:expr, $method:ident, $uri:expr, $token:expr) => {{
        let req = test::TestRequest::$method()
            .uri(&$uri)
            .insert_header(common::bearer(&$token))
            .to_request();
        test::call_service(&$app, req).await
    }};
    ($app:expr, $method:ident, $uri:expr, $token:expr, $json:expr) => {{
        let req = test::TestRequest::$method()
            .uri(&$uri)
            .insert_header(common::bearer(&$token))
            .set_json($json)
            .to_request();
        test::call_service(&$app, req).await
    }};
}

/// Runs first-time setup and returns the admin token
macro_rules! setup_admin {
    ($app:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/auth/setup")
            .set_json(json!({
                "username": "admin",
                "email": "admin@example.com",
                "fullName": "Site Admin",
                "password": ADMIN_PASSWORD
            }))
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let data: Value = common::success_data(resp).await;
        data["token"].as_str().unwrap().to_string()
    }};
}

/// Admin creates an account, the new user redeems the reset token and logs in.
/// Evaluates to `(user id, token, first name)`.
macro_rules! create_member {
    ($app:expr, $admin_token:expr) => {{
        let first: String = FirstName().fake();
        let number: u32 = (10_000..99_999).fake();
        let username = format!("member{}", number);

        let resp = send!(
            $app,
            post,
            "/api/users",
            $admin_token,
            json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "fullName": format!("{} Tester", first),
                "role": "user"
            })
        );
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = common::success_data(resp).await;
        let user_id = created["user"]["id"].as_i64().unwrap();
        let reset_token = created["resetToken"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri("/api/auth/reset-password")
            .set_json(json!({ "token": reset_token, "newPassword": MEMBER_PASSWORD }))
            .to_request();
        assert_eq!(test::call_service(&$app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "username": username, "password": MEMBER_PASSWORD }))
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let login: Value = common::success_data(resp).await;
        assert_eq!(login["mustResetPassword"], false);

        (user_id, login["token"].as_str().unwrap().to_string(), first)
    }};
}

macro_rules! create_task {
    ($app:expr, $token:expr, $body:expr) => {{
        let resp = send!($app, post, "/api/tasks", $token, $body);
        assert_eq!(resp.status(), StatusCode::CREATED);
        let task: Value = common::success_data(resp).await;
        task
    }};
}

#[actix_web::test]
#[serial]
async fn test_setup_login_and_api_key() {
    let Some(state) = common::database_state().await else {
        return;
    };
    let app = test_app!(state);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/auth/status").to_request(),
    )
    .await;
    let status: Value = common::success_data(resp).await;
    assert_eq!(status["initialized"], false);

    let admin_token = setup_admin!(app);

    // setup only works once
    let req = test::TestRequest::post()
        .uri("/api/auth/setup")
        .set_json(json!({
            "username": "second",
            "email": "second@example.com",
            "fullName": "Second Admin",
            "password": "another-secret"
        }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::CONFLICT
    );

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "username": "admin", "password": "wrong-password" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    // email login is case-insensitive
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "username": "ADMIN@example.com", "password": ADMIN_PASSWORD }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let resp = send!(app, post, "/api/auth/api-key", admin_token);
    let key: Value = common::success_data(resp).await;
    let api_key = key["apiKey"].as_str().unwrap().to_string();
    assert!(api_key.starts_with("pont_"));

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header(("X-API-Key", api_key))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let me: Value = common::success_data(resp).await;
    assert_eq!(me["username"], "admin");
    assert_eq!(me["role"], "admin");
    assert!(me.get("password").is_none());
    assert!(me.get("apiKey").is_none());
}

#[actix_web::test]
#[serial]
async fn test_concurrent_setup_creates_one_admin() {
    let Some(state) = common::database_state().await else {
        return;
    };
    let app = test_app!(state);

    let setup = |username: &str| {
        test::TestRequest::post()
            .uri("/api/auth/setup")
            .set_json(json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "fullName": "Racing Admin",
                "password": ADMIN_PASSWORD
            }))
            .to_request()
    };
    let (first, second) = futures_util::future::join(
        test::call_service(&app, setup("first")),
        test::call_service(&app, setup("second")),
    )
    .await;

    let mut statuses = vec![first.status(), second.status()];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::CONFLICT]);

    let admins: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(state.pool.get_ref())
        .await
        .unwrap();
    assert_eq!(admins, 1);
}

#[actix_web::test]
#[serial]
async fn test_recovery_rotates_the_key() {
    let Some(state) = common::database_state().await else {
        return;
    };
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/auth/setup")
        .set_json(json!({
            "username": "admin",
            "email": "admin@example.com",
            "fullName": "Site Admin",
            "password": ADMIN_PASSWORD
        }))
        .to_request();
    let setup: Value = common::success_data(test::call_service(&app, req).await).await;
    let original_key = setup["recoveryKey"].as_str().unwrap().to_string();

    let recover = |key: &str, password: &str| {
        test::TestRequest::post()
            .uri("/api/auth/recover")
            .set_json(json!({
                "usernameOrEmail": "admin",
                "recoveryKey": key,
                "newPassword": password
            }))
            .to_request()
    };

    let resp = test::call_service(&app, recover(&original_key, "recovered-1")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let rotated: Value = common::success_data(resp).await;
    let new_key = rotated["recoveryKey"].as_str().unwrap().to_string();
    assert_ne!(new_key, original_key);

    // the used key is spent, the replacement works
    let resp = test::call_service(&app, recover(&original_key, "recovered-2")).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let resp = test::call_service(&app, recover(&new_key, "recovered-3")).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "username": "admin", "password": "recovered-3" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
#[serial]
async fn test_new_user_gets_personal_project() {
    let Some(state) = common::database_state().await else {
        return;
    };
    let app = test_app!(state);
    let admin_token = setup_admin!(app);
    let (user_id, token, first) = create_member!(app, admin_token);

    let resp = send!(app, get, "/api/projects", token);
    let projects: Vec<Value> = common::success_data(resp).await;
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0]["isPersonal"], true);
    assert_eq!(projects[0]["ownerId"], user_id);
    assert_eq!(
        projects[0]["name"],
        format!("Personal Project - {}", first)
    );

    // listing again does not create a second one
    let resp = send!(app, get, "/api/projects", token);
    let again: Vec<Value> = common::success_data(resp).await;
    assert_eq!(again.len(), 1);

    let task = create_task!(app, token, json!({ "name": "Inbox zero", "source": "manual" }));
    assert_eq!(task["projectId"], projects[0]["id"]);
    assert_eq!(task["color"], "#3B82F6");

    // the personal project cannot be deleted or deactivated
    let uri = format!("/api/projects/{}", projects[0]["id"]);
    let resp = send!(app, delete, uri, token);
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let resp = send!(app, put, uri, token, json!({ "isActive": false }));
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = send!(app, get, "/api/projects", token);
    let still_listed: Vec<Value> = common::success_data(resp).await;
    assert_eq!(still_listed.len(), 1);
    assert_eq!(still_listed[0]["isActive"], true);

    // renaming is still fine
    let resp = send!(app, put, uri, token, json!({ "description": "Just me" }));
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
#[serial]
async fn test_deleted_projects_take_no_new_tasks() {
    let Some(state) = common::database_state().await else {
        return;
    };
    let app = test_app!(state);
    let admin_token = setup_admin!(app);
    let (_, token, _) = create_member!(app, admin_token);

    let resp = send!(app, post, "/api/projects", token, json!({ "name": "Side quest" }));
    assert_eq!(resp.status(), StatusCode::CREATED);
    let project: Value = common::success_data(resp).await;
    let task = create_task!(app, token, json!({ "name": "Sketch", "source": "manual" }));

    let uri = format!("/api/projects/{}", project["id"]);
    assert_eq!(send!(app, delete, uri, token).status(), StatusCode::OK);

    let resp = send!(
        app,
        post,
        "/api/tasks",
        token,
        json!({ "name": "Too late", "source": "manual", "projectId": project["id"] })
    );
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let task_uri = format!("/api/tasks/{}", task["id"]);
    let resp = send!(app, put, task_uri, token, json!({ "projectId": project["id"] }));
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = send!(app, get, "/api/tasks/abc", token);
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = common::json_body(resp).await;
    assert_eq!(body["success"], false);
}

#[actix_web::test]
#[serial]
async fn test_starting_a_timer_stops_the_running_one() {
    let Some(state) = common::database_state().await else {
        return;
    };
    let app = test_app!(state);
    let admin_token = setup_admin!(app);
    let (_, token, _) = create_member!(app, admin_token);

    let first = create_task!(app, token, json!({ "name": "Write report", "source": "manual" }));
    let second = create_task!(app, token, json!({ "name": "Review code", "source": "manual" }));

    let resp = send!(
        app,
        post,
        "/api/time-entries/start",
        token,
        json!({ "taskId": first["id"] })
    );
    assert_eq!(resp.status(), StatusCode::CREATED);
    let first_entry: Value = common::success_data(resp).await;
    assert_eq!(first_entry["isRunning"], true);

    let resp = send!(
        app,
        post,
        "/api/time-entries/start",
        token,
        json!({ "taskId": second["id"], "notes": "after lunch" })
    );
    assert_eq!(resp.status(), StatusCode::CREATED);
    let second_entry: Value = common::success_data(resp).await;
    assert_eq!(second_entry["task"]["id"], second["id"]);

    let resp = send!(app, get, "/api/time-entries/running", token);
    let running: Vec<Value> = common::success_data(resp).await;
    assert_eq!(running.len(), 1);
    assert_eq!(running[0]["id"], second_entry["id"]);

    let uri = format!("/api/time-entries/{}", first_entry["id"]);
    let resp = send!(app, get, uri, token);
    let stopped: Value = common::success_data(resp).await;
    assert_eq!(stopped["isRunning"], false);
    assert!(stopped["endTime"].is_string());

    let uri = format!("/api/time-entries/{}/stop", second_entry["id"]);
    assert_eq!(send!(app, post, uri, token).status(), StatusCode::OK);
    assert_eq!(send!(app, post, uri, token).status(), StatusCode::BAD_REQUEST);

    let start = Utc::now() - Duration::hours(3);
    let resp = send!(
        app,
        post,
        "/api/time-entries",
        token,
        json!({
            "taskId": first["id"],
            "startTime": start.to_rfc3339(),
            "endTime": (start - Duration::minutes(5)).to_rfc3339()
        })
    );
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = send!(
        app,
        post,
        "/api/time-entries",
        token,
        json!({
            "taskId": first["id"],
            "startTime": start.to_rfc3339(),
            "endTime": (start + Duration::minutes(90)).to_rfc3339()
        })
    );
    assert_eq!(resp.status(), StatusCode::CREATED);
    let manual: Value = common::success_data(resp).await;
    assert_eq!(manual["duration"], 5400);

    let resp = send!(app, delete, "/api/time-entries", token);
    let deleted: Value = common::success_data(resp).await;
    assert_eq!(deleted["deleted"], 3);
}

#[actix_web::test]
#[serial]
async fn test_team_projects_follow_membership() {
    let Some(state) = common::database_state().await else {
        return;
    };
    let app = test_app!(state);
    let admin_token = setup_admin!(app);
    let (member_id, member_token, _) = create_member!(app, admin_token);
    let (_, outsider_token, _) = create_member!(app, admin_token);

    let resp = send!(
        app,
        post,
        "/api/teams",
        admin_token,
        json!({ "name": "Platform", "description": "Core services" })
    );
    assert_eq!(resp.status(), StatusCode::CREATED);
    let team: Value = common::success_data(resp).await;

    let uri = format!("/api/teams/{}/members", team["id"]);
    let resp = send!(app, post, uri, admin_token, json!({ "userId": member_id }));
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = send!(
        app,
        post,
        "/api/projects",
        admin_token,
        json!({ "name": "Billing revamp", "teamId": team["id"] })
    );
    assert_eq!(resp.status(), StatusCode::CREATED);
    let project: Value = common::success_data(resp).await;

    let resp = send!(app, get, "/api/projects", member_token);
    let visible: Vec<Value> = common::success_data(resp).await;
    assert!(visible.iter().any(|p| p["id"] == project["id"]));
    assert_eq!(visible[0]["isPersonal"], true);

    let personal_teams_uri = format!("/api/projects/{}/teams", visible[0]["id"]);
    assert_eq!(
        send!(app, post, personal_teams_uri, member_token, json!({ "teamId": team["id"] })).status(),
        StatusCode::BAD_REQUEST
    );

    let project_uri = format!("/api/projects/{}", project["id"]);
    assert_eq!(
        send!(app, get, project_uri, member_token).status(),
        StatusCode::OK
    );
    assert_eq!(
        send!(app, put, project_uri, member_token, json!({ "name": "Mine now" })).status(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        send!(app, get, project_uri, outsider_token).status(),
        StatusCode::FORBIDDEN
    );

    // members can put tasks in the shared project, outsiders cannot
    create_task!(
        app,
        member_token,
        json!({ "name": "Invoice PDFs", "source": "manual", "projectId": project["id"] })
    );
    let resp = send!(
        app,
        post,
        "/api/tasks",
        outsider_token,
        json!({ "name": "Sneaky", "source": "manual", "projectId": project["id"] })
    );
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let team_uri = format!("/api/teams/{}", team["id"]);
    assert_eq!(
        send!(app, get, team_uri, outsider_token).status(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        send!(app, delete, team_uri, member_token).status(),
        StatusCode::FORBIDDEN
    );

    let unbind_uri = format!(
        "/api/projects/{}/teams/{}",
        project["id"],
        team["id"].as_i64().unwrap() + 100
    );
    assert_eq!(
        send!(app, delete, unbind_uri, admin_token).status(),
        StatusCode::NOT_FOUND
    );

    // deleting the team drops the binding, so the member loses access
    assert_eq!(
        send!(app, delete, team_uri, admin_token).status(),
        StatusCode::OK
    );
    assert_eq!(
        send!(app, get, project_uri, member_token).status(),
        StatusCode::FORBIDDEN
    );
}

#[actix_web::test]
#[serial]
async fn test_completing_a_task_closes_items_and_timers() {
    let Some(state) = common::database_state().await else {
        return;
    };
    let app = test_app!(state);
    let admin_token = setup_admin!(app);
    let (_, token, _) = create_member!(app, admin_token);

    let task = create_task!(
        app,
        token,
        json!({ "name": "Ship release", "source": "manual", "estimatedHours": 2 })
    );
    let items_uri = format!("/api/tasks/{}/items", task["id"]);
    for title in ["Changelog", "Tag", "Announce"] {
        let resp = send!(app, post, items_uri, token, json!({ "title": title }));
        assert_eq!(resp.status(), StatusCode::CREATED);
    }
    let resp = send!(app, post, items_uri, token, json!({ "title": "   " }));
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = send!(
        app,
        post,
        "/api/time-entries/start",
        token,
        json!({ "taskId": task["id"] })
    );
    assert_eq!(resp.status(), StatusCode::CREATED);

    let uri = format!("/api/tasks/{}/complete", task["id"]);
    let resp = send!(app, post, uri, token);
    let completed: Value = common::success_data(resp).await;
    assert_eq!(completed["isCompleted"], true);

    let resp = send!(app, get, items_uri, token);
    let items: Vec<Value> = common::success_data(resp).await;
    assert_eq!(items.len(), 3);
    assert!(items.iter().all(|item| item["completed"] == true));

    let resp = send!(app, get, "/api/time-entries/running", token);
    let running: Vec<Value> = common::success_data(resp).await;
    assert!(running.is_empty());

    // completed tasks take no more time
    let resp = send!(
        app,
        post,
        "/api/time-entries/start",
        token,
        json!({ "taskId": task["id"] })
    );
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let uri = format!("/api/tasks/{}/reopen", task["id"]);
    let resp = send!(app, post, uri, token);
    let reopened: Value = common::success_data(resp).await;
    assert_eq!(reopened["isCompleted"], false);
    assert!(reopened["completedAt"].is_null());
}

#[actix_web::test]
#[serial]
async fn test_reports() {
    let Some(state) = common::database_state().await else {
        return;
    };
    let app = test_app!(state);
    let admin_token = setup_admin!(app);
    let (_, token, _) = create_member!(app, admin_token);

    let task = create_task!(app, token, json!({ "name": "Research", "source": "manual" }));
    let start = Utc::now() - Duration::hours(2);
    let resp = send!(
        app,
        post,
        "/api/time-entries",
        token,
        json!({
            "taskId": task["id"],
            "startTime": start.to_rfc3339(),
            "endTime": (start + Duration::minutes(30)).to_rfc3339()
        })
    );
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = send!(app, get, "/api/reports/dashboard", token);
    let dashboard: Value = common::success_data(resp).await;
    assert_eq!(dashboard["activeTasks"], 1);
    assert!(dashboard["weekTime"].as_i64().unwrap() + dashboard["monthTime"].as_i64().unwrap() >= 1800);

    let resp = send!(app, get, "/api/reports/time-by-task", token);
    let by_task: Vec<Value> = common::success_data(resp).await;
    assert_eq!(by_task.len(), 1);
    assert_eq!(by_task[0]["totalTime"], 1800);

    assert_eq!(
        send!(app, get, "/api/reports/daily", token).status(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        send!(
            app,
            get,
            "/api/reports/daily?startDate=2025-03-10&endDate=2025-03-01",
            token
        )
        .status(),
        StatusCode::BAD_REQUEST
    );

    let resp = send!(
        app,
        get,
        "/api/reports/daily?startDate=2025-03-01&endDate=2025-03-03",
        token
    );
    let daily: Vec<Value> = common::success_data(resp).await;
    assert_eq!(daily.len(), 3);
    assert_eq!(daily[0]["date"], "2025-03-01");
    assert!(daily.iter().all(|day| day["totalTime"] == 0));
}

#[actix_web::test]
#[serial]
async fn test_repair_moves_orphan_tasks() {
    let Some(state) = common::database_state().await else {
        return;
    };
    let app = test_app!(state);
    let admin_token = setup_admin!(app);
    let (member_id, member_token, _) = create_member!(app, admin_token);

    // a legacy row from before tasks required a project
    sqlx::query(
        "INSERT INTO tasks (name, color, source, user_id, created_at) VALUES ($1, $2, $3, $4, NOW())",
    )
    .bind("Legacy task")
    .bind("#3B82F6")
    .bind("import")
    .bind(member_id as i32)
    .execute(state.pool.get_ref())
    .await
    .unwrap();

    assert_eq!(
        send!(app, post, "/api/admin/repair-orphans", member_token).status(),
        StatusCode::FORBIDDEN
    );

    let resp = send!(app, post, "/api/admin/repair-orphans", admin_token);
    let summary: Value = common::success_data(resp).await;
    assert_eq!(summary["usersProcessed"], 2);
    assert_eq!(summary["projectsCreated"], 2);
    assert_eq!(summary["tasksMigrated"], 1);

    let resp = send!(app, post, "/api/admin/repair-orphans", admin_token);
    let again: Value = common::success_data(resp).await;
    assert_eq!(again["projectsCreated"], 0);
    assert_eq!(again["tasksMigrated"], 0);
}

#[actix_web::test]
#[serial]
async fn test_settings_and_whatsapp_are_admin_managed() {
    let Some(state) = common::database_state().await else {
        return;
    };
    let app = test_app!(state);
    let admin_token = setup_admin!(app);
    let (_, member_token, _) = create_member!(app, admin_token);

    let resp = send!(app, get, "/api/notification-settings", member_token);
    let defaults: Value = common::success_data(resp).await;
    assert_eq!(defaults["id"], 0);
    assert_eq!(defaults["dailyReportTime"], "18:00");

    assert_eq!(
        send!(
            app,
            put,
            "/api/notification-settings",
            member_token,
            json!({ "enableDailyReport": true })
        )
        .status(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        send!(
            app,
            put,
            "/api/notification-settings",
            admin_token,
            json!({ "dailyReportTime": "25:00" })
        )
        .status(),
        StatusCode::BAD_REQUEST
    );

    let resp = send!(
        app,
        put,
        "/api/notification-settings",
        admin_token,
        json!({ "enableDailyReport": true, "dailyReportTime": "07:30" })
    );
    let saved: Value = common::success_data(resp).await;
    assert_ne!(saved["id"], 0);
    assert_eq!(saved["weeklyReportDay"], 5);

    assert_eq!(
        send!(app, get, "/api/whatsapp/integration", admin_token).status(),
        StatusCode::NOT_FOUND
    );

    let integration = json!({
        "instanceName": "timeflow",
        "apiUrl": "https://evolution.example.com",
        "apiKey": "gateway-key",
        "phoneNumber": "5511999999999",
        "authorizedNumbers": "[\"5511999999999@c.us\"]"
    });
    assert_eq!(
        send!(app, post, "/api/whatsapp/integration", member_token, &integration).status(),
        StatusCode::FORBIDDEN
    );

    let resp = send!(app, post, "/api/whatsapp/integration", admin_token, &integration);
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = common::success_data(resp).await;
    assert_eq!(created["hasApiKey"], true);
    assert!(created.get("apiKey").is_none());
    assert_eq!(created["responseMode"], "individual");

    assert_eq!(
        send!(app, post, "/api/whatsapp/integration", admin_token, &integration).status(),
        StatusCode::CONFLICT
    );

    let resp = send!(app, get, "/api/whatsapp/logs?limit=10", admin_token);
    let logs: Vec<Value> = common::success_data(resp).await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["logType"], "config");

    let uri = format!("/api/whatsapp/integration/{}", created["id"]);
    let resp = send!(app, put, uri, admin_token, json!({ "responseMode": "group" }));
    let updated: Value = common::success_data(resp).await;
    assert_eq!(updated["responseMode"], "group");

    // each change leaves its own config row, newest first
    let resp = send!(app, get, "/api/whatsapp/logs", admin_token);
    let logs: Vec<Value> = common::success_data(resp).await;
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0]["message"], "Integration updated");
    assert_eq!(logs[0]["logType"], "config");
    assert!(logs[0]["metadata"].as_str().unwrap().contains("\"userId\":1"));

    let missing = format!("/api/whatsapp/integration/{}", created["id"].as_i64().unwrap() + 1);
    let resp = send!(app, put, missing, admin_token, json!({ "responseMode": "individual" }));
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    assert_eq!(
        send!(app, delete, uri, admin_token).status(),
        StatusCode::OK
    );
    let resp = send!(app, get, "/api/whatsapp/logs", admin_token);
    let logs: Vec<Value> = common::success_data(resp).await;
    assert!(logs.is_empty());
}

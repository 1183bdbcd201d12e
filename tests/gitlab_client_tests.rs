//! GitLab client integration tests with mock server

mod common;

use common::{TOKEN, test_client, test_config};
use serde_json::json;
use tanuki_provider::auth::TokenProvider;
use tanuki_provider::config::{GitLabConfig, TokenKind};
use tanuki_provider::error::GitLabError;
use tanuki_provider::gitlab::{GitLabClient, RemoveGroupMemberOptions};
use tanuki_provider::util::encode_segment;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_get_request_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v4/user"))
        .and(header("PRIVATE-TOKEN", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "username": "root",
            "name": "Administrator"
        })))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let user = client.users().current().await.unwrap();

    assert_eq!(user.id, 1);
    assert_eq!(user.username, "root");
}

#[tokio::test]
async fn test_job_token_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v4/user"))
        .and(header("JOB-TOKEN", "ci-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 2,
            "username": "ci"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = GitLabConfig {
        url: mock_server.uri(),
        max_retries: 0,
        ..Default::default()
    };
    let auth = TokenProvider::new("ci-token", TokenKind::Job).unwrap();
    let client = GitLabClient::new(&config, Box::new(auth)).unwrap();

    assert_eq!(client.users().current().await.unwrap().username, "ci");
}

#[tokio::test]
async fn test_find_users_by_username() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v4/users"))
        .and(query_param("username", "alice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 7, "username": "alice"}
        ])))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let users = client.users().find_by_username("alice").await.unwrap();

    assert_eq!(users.len(), 1);
    assert_eq!(users[0].id, 7);
}

#[tokio::test]
async fn test_delete_with_query_flags() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v4/groups/my%2Fgroup/members/7"))
        .and(query_param("skip_subresources", "true"))
        .and(query_param("unassign_issuables", "false"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let options = RemoveGroupMemberOptions {
        skip_subresources: true,
        unassign_issuables: false,
    };
    let result = client.group_members().remove("my/group", 7, options).await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_unauthorized_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v4/user"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "401 Unauthorized"
        })))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let result = client.users().current().await;

    assert!(matches!(result, Err(GitLabError::Unauthorized)));
}

#[tokio::test]
async fn test_forbidden_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v4/projects/123/approvals"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "message": "403 Forbidden"
        })))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let result = client.project_approvals().get(123).await;

    assert!(matches!(result, Err(GitLabError::Forbidden { .. })));
}

#[tokio::test]
async fn test_not_found_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v4/groups/42/members/7"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "404 Not found"
        })))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let err = client.group_members().get("42", 7).await.unwrap_err();

    assert!(matches!(err, GitLabError::NotFound { .. }));
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_conflict_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v4/groups/42/members"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "Member already exists"
        })))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let body = json!({"user_id": 7, "access_level": 30, "expires_at": ""});
    let result: Result<serde_json::Value, _> = client.post("/groups/42/members", &body).await;

    let err = result.unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(err.to_string(), "GitLab API error (HTTP 409): Member already exists");
}

#[tokio::test]
async fn test_rate_limited_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v4/user"))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_json(json!({"message": "Rate limit exceeded"}))
                .insert_header("Retry-After", "30"),
        )
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let result = client.users().current().await;

    assert!(matches!(
        result,
        Err(GitLabError::RateLimited { retry_after: 30 })
    ));
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v4/user"))
        .respond_with(ResponseTemplate::new(502).set_body_json(json!({
            "message": "Bad Gateway"
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v4/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "username": "root"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = GitLabConfig {
        max_retries: 1,
        ..test_config(&mock_server)
    };
    let auth = TokenProvider::private(TOKEN).unwrap();
    let client = GitLabClient::new(&config, Box::new(auth)).unwrap();

    assert_eq!(client.users().current().await.unwrap().id, 1);
}

#[tokio::test]
async fn test_server_error_without_retries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v4/user"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "message": "Internal Server Error"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let result = client.users().current().await;

    assert!(matches!(result, Err(GitLabError::Api { status: 500, .. })));
}

#[tokio::test]
async fn test_invalid_json_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v4/user"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not valid json"))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let result = client.users().current().await;

    assert!(matches!(result, Err(GitLabError::InvalidResponse(_))));
}

#[tokio::test]
async fn test_environment_name_encoding() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(
            "/api/v4/projects/group%2Fapp/protected_environments/review%2Ffeature",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "review/feature",
            "deploy_access_levels": []
        })))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let env = client
        .protected_environments()
        .get("group/app", "review/feature")
        .await
        .unwrap();

    assert_eq!(env.name, "review/feature");
    assert_eq!(encode_segment("review/feature"), "review%2Ffeature");
}

#[tokio::test]
async fn test_api_error_with_detailed_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v4/projects/1/protected_environments"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": {
                "deploy_access_levels": ["is invalid"]
            }
        })))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let body = json!({"name": "production"});
    let result: Result<serde_json::Value, _> =
        client.post("/projects/1/protected_environments", &body).await;

    match result {
        Err(GitLabError::Api {
            status: 400,
            message,
        }) => {
            assert!(message.contains("deploy_access_levels"));
        }
        _ => panic!("Expected Api error with status 400"),
    }
}

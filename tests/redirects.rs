//! Download-redirect resolution and renamed-resource handling.

use ghrest::{Error, GitHubClient};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SIGNED_URL: &str = "https://cdn.example.com/logs/9.txt?sig=abc";

fn client(server: &MockServer) -> GitHubClient {
    GitHubClient::builder()
        .base_url(server.uri())
        .build()
        .unwrap()
}

fn counting_client(server: &MockServer) -> GitHubClient {
    GitHubClient::builder()
        .base_url(server.uri())
        .rate_limit_redirectional_endpoints(true)
        .build()
        .unwrap()
}

async fn mount_job_logs(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/repos/o/r/actions/jobs/9/logs"))
        .respond_with(template)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_job_logs_returns_location_without_following() {
    let mock_server = MockServer::start().await;
    mount_job_logs(
        &mock_server,
        ResponseTemplate::new(302).insert_header("Location", SIGNED_URL),
    )
    .await;

    let (url, response) = client(&mock_server)
        .actions()
        .get_workflow_job_logs(&CancellationToken::new(), "o", "r", 9, 1)
        .await
        .unwrap();

    assert_eq!(url.as_str(), SIGNED_URL);
    assert_eq!(response.status().as_u16(), 302);
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_job_logs_counting_mode() {
    let mock_server = MockServer::start().await;
    mount_job_logs(
        &mock_server,
        ResponseTemplate::new(302).insert_header("Location", SIGNED_URL),
    )
    .await;

    let (url, response) = counting_client(&mock_server)
        .actions()
        .get_workflow_job_logs(&CancellationToken::new(), "o", "r", 9, 0)
        .await
        .unwrap();

    assert_eq!(url.as_str(), SIGNED_URL);
    assert_eq!(response.status().as_u16(), 302);
}

#[tokio::test]
async fn test_counting_mode_surfaces_rate_limits() {
    let mock_server = MockServer::start().await;
    mount_job_logs(
        &mock_server,
        ResponseTemplate::new(403)
            .set_body_json(json!({"message": "API rate limit exceeded"}))
            .insert_header("X-RateLimit-Remaining", "0"),
    )
    .await;

    let err = counting_client(&mock_server)
        .actions()
        .get_workflow_job_logs(&CancellationToken::new(), "o", "r", 9, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::RateLimited(_)), "{err:?}");

    let err = client(&mock_server)
        .actions()
        .get_workflow_job_logs(&CancellationToken::new(), "o", "r", 9, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnexpectedStatus { .. }), "{err:?}");
}

#[tokio::test]
async fn test_run_logs_follow_permanent_redirect() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/o/r/actions/runs/5/logs"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("Location", "/repositories/1/actions/runs/5/logs"),
        )
        .expect(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repositories/1/actions/runs/5/logs"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", SIGNED_URL))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    let cancel = CancellationToken::new();

    let (url, _) = client
        .actions()
        .get_workflow_run_logs(&cancel, "o", "r", 5, 1)
        .await
        .unwrap();
    assert_eq!(url.as_str(), SIGNED_URL);

    let err = client
        .actions()
        .get_workflow_run_logs(&cancel, "o", "r", 5, 0)
        .await
        .unwrap_err();
    let Error::TooManyRedirects { max_redirects, response } = &err else {
        panic!("expected TooManyRedirects, got {err:?}");
    };
    assert_eq!(*max_redirects, 0);
    assert_eq!(response.status().as_u16(), 301);
}

#[tokio::test]
async fn test_redirect_without_location() {
    let mock_server = MockServer::start().await;
    mount_job_logs(&mock_server, ResponseTemplate::new(302)).await;

    let err = client(&mock_server)
        .actions()
        .get_workflow_job_logs(&CancellationToken::new(), "o", "r", 9, 0)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidLocation { .. }), "{err:?}");
}

#[tokio::test]
async fn test_get_branch_follows_rename() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/o/r/branches/master"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("Location", "/repos/o/r/branches/main")
                .set_body_json(json!({"message": "Moved Permanently"})),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/o/r/branches/main"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"name": "main", "protected": true, "commit": {"sha": "abc"}})),
        )
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    let cancel = CancellationToken::new();

    let (branch, response) = client
        .repositories()
        .get_branch(&cancel, "o", "r", "master", 1)
        .await
        .unwrap();
    assert_eq!(branch.name.as_deref(), Some("main"));
    assert_eq!(branch.commit.unwrap().sha.as_deref(), Some("abc"));
    assert_eq!(response.status().as_u16(), 200);

    let err = client
        .repositories()
        .get_branch(&cancel, "o", "r", "master", 0)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TooManyRedirects { .. }), "{err:?}");
}

#[tokio::test]
async fn test_regular_endpoints_follow_redirects() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/old/r"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/repos/new/r"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/new/r"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"full_name": "new/r"})))
        .mount(&mock_server)
        .await;

    let (repo, response) = client(&mock_server)
        .repositories()
        .get(&CancellationToken::new(), "old", "r")
        .await
        .unwrap();

    assert_eq!(repo.full_name.as_deref(), Some("new/r"));
    assert_eq!(response.url().path(), "/repos/new/r");
}

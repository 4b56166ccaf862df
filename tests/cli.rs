use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::tempdir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn stockroom(config_dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("stockroom").unwrap();
    cmd.env_remove("STOCKROOM_API_TOKEN")
        .arg("--config-dir")
        .arg(config_dir);
    cmd
}

fn one_brand_page() -> serde_json::Value {
    json!({
        "data": [{"id": 1, "name": "Acme"}],
        "links": [
            {"url": null, "label": "&laquo; Previous", "active": false},
            {"url": "http://localhost/api/brands/paginated?page=1", "label": "1", "active": true},
            {"url": null, "label": "Next &raquo;", "active": false}
        ],
        "from": 1,
        "to": 1,
        "total": 1
    })
}

#[test]
fn help_lists_commands() {
    Command::cargo_bin("stockroom")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("warehouse"))
        .stdout(predicate::str::contains("browse"));
}

#[test]
fn config_set_then_show() {
    let dir = tempdir().unwrap();

    stockroom(dir.path())
        .args(["config", "set", "api_url", "http://stock.test:8000/"])
        .assert()
        .success();
    stockroom(dir.path())
        .args(["config", "set", "search_debounce_ms", "250"])
        .assert()
        .success();

    stockroom(dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("API URL: http://stock.test:8000"))
        .stdout(predicate::str::contains("Search debounce: 250ms"));
}

#[test]
fn config_set_rejects_unknown_key() {
    let dir = tempdir().unwrap();
    stockroom(dir.path())
        .args(["config", "set", "colour", "blue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("known keys"));
}

#[test]
fn invalid_resource_name_is_rejected() {
    let dir = tempdir().unwrap();
    stockroom(dir.path())
        .args(["--api-url", "http://127.0.0.1:9", "list", "../etc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid resource name"));
}

#[tokio::test(flavor = "multi_thread")]
async fn list_prints_table_and_footer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/brands/paginated"))
        .and(query_param("page", "1"))
        .and(query_param("query", "ac"))
        .respond_with(ResponseTemplate::new(200).set_body_json(one_brand_page()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    stockroom(dir.path())
        .args(["--api-url", &server.uri(), "list", "brands", "--search", "ac"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Acme"))
        .stdout(predicate::str::contains("Showing 1 to 1 of 1 results"));
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_without_terminal_needs_yes() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/brands/1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    stockroom(dir.path())
        .args(["--api-url", &server.uri(), "delete", "brands", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_with_yes_deletes_and_reloads() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/brands/1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/brands/paginated"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [], "total": 0})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    stockroom(dir.path())
        .args(["--api-url", &server.uri(), "--yes", "delete", "brands", "1"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Deleted successfully"));
}

#[tokio::test(flavor = "multi_thread")]
async fn create_reports_field_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/customers/store"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "The email has already been taken.",
            "errors": {"email": ["The email has already been taken."]}
        })))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    stockroom(dir.path())
        .args([
            "--api-url",
            &server.uri(),
            "create",
            "customers",
            "-f",
            "name=Ann",
            "-f",
            "email=taken@example.com",
        ])
        .assert()
        .failure()
        .stdout(predicate::str::contains("The email has already been taken."));
}

#[tokio::test(flavor = "multi_thread")]
async fn export_writes_pdf_into_output_dir() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/brands/pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4".to_vec()))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    stockroom(dir.path())
        .args(["--api-url", &server.uri(), "export", "brands", "--output-dir"])
        .arg(out.path())
        .assert()
        .success();

    assert_eq!(
        std::fs::read(out.path().join("brands.pdf")).unwrap(),
        b"%PDF-1.4"
    );
}

use std::io::{Cursor, Write};
use std::path::PathBuf;
use tempfile::{NamedTempFile, TempDir};
use webwalk::handlers::*;
use webwalk::{CliOptions, command_argument_builder};
use webwalk_core::{ConfigError, MirrorMode};
use webwalk_scanner::Credentials;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

fn parse(args: &[&str]) -> CliOptions {
    let matches = command_argument_builder()
        .try_get_matches_from(args)
        .unwrap();
    CliOptions::from_matches(&matches)
}

fn options(url: &str) -> CliOptions {
    CliOptions {
        url: url.to_string(),
        spaces_per_indent: 3,
        timeout: 10,
        ..CliOptions::default()
    }
}

// ============================================================================
// Argument parsing
// ============================================================================

#[test]
fn test_defaults() {
    let options = parse(&["webwalk", "http://example.com"]);

    assert_eq!(options.url, "http://example.com");
    assert_eq!(options.depth, 0);
    assert_eq!(options.spaces_per_indent, 3);
    assert_eq!(options.timeout, 10);
    assert_eq!(options.verbose, 0);
    assert!(options.excludes.is_empty());
    assert!(!options.indent);
    assert!(!options.no_warnings);
}

#[test]
fn test_repeated_patterns_and_counted_verbosity() {
    let options = parse(&[
        "webwalk",
        "-e",
        "/tmp/",
        "--exclude",
        r"\.iso$",
        "-i",
        "docs",
        "-f",
        r"\.tar\.bz2$",
        "-vvv",
        "-I",
        "-R",
        "-s",
        "2",
        "-d",
        "4",
        "http://example.com/",
    ]);

    assert_eq!(options.excludes, vec!["/tmp/", r"\.iso$"]);
    assert_eq!(options.includes, vec!["docs"]);
    assert_eq!(options.filters, vec![r"\.tar\.bz2$"]);
    assert_eq!(options.verbose, 3);
    assert!(options.indent);
    assert!(options.relative);
    assert_eq!(options.spaces_per_indent, 2);
    assert_eq!(options.depth, 4);
}

#[test]
fn test_spaces_per_indent_is_bounded() {
    let options = parse(&["webwalk", "-s", "32", "http://example.com/"]);
    assert_eq!(options.spaces_per_indent, 32);

    assert!(command_argument_builder()
        .try_get_matches_from(["webwalk", "-s", "1000", "http://example.com/"])
        .is_err());
}

#[test]
fn test_url_is_required() {
    assert!(command_argument_builder()
        .try_get_matches_from(["webwalk"])
        .is_err());
}

// ============================================================================
// Credentials
// ============================================================================

#[test]
fn test_no_credentials() {
    let credentials = resolve_credentials(&options("http://e.com"), Cursor::new(""), Vec::new())
        .unwrap();
    assert!(credentials.is_none());
}

#[test]
fn test_password_on_command_line() {
    let mut options = options("http://e.com");
    options.username = Some("joe".to_string());
    options.password = Some("secret".to_string());

    let credentials = resolve_credentials(&options, Cursor::new(""), Vec::new())
        .unwrap()
        .unwrap();

    assert_eq!(credentials.username, "joe");
    assert_eq!(credentials.password, "secret");
}

#[test]
fn test_password_file_is_trimmed() -> Result<(), Box<dyn std::error::Error>> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "  from-file  ")?;
    let mut options = options("http://e.com");
    options.username = Some("joe".to_string());
    options.password_file = Some(file.path().to_path_buf());

    let credentials = resolve_credentials(&options, Cursor::new(""), Vec::new())?.unwrap();

    assert_eq!(credentials.password, "from-file");
    Ok(())
}

#[test]
fn test_password_and_password_file_are_exclusive() {
    let file = NamedTempFile::new().unwrap();
    let mut options = options("http://e.com");
    options.username = Some("joe".to_string());
    options.password = Some("secret".to_string());
    options.password_file = Some(file.path().to_path_buf());

    let err = resolve_credentials(&options, Cursor::new(""), Vec::new()).unwrap_err();

    assert!(err.to_string().contains("mutually exclusive"));
}

#[test]
fn test_missing_password_file() {
    let mut options = options("http://e.com");
    options.username = Some("joe".to_string());
    options.password_file = Some(PathBuf::from("/definitely/not/here/password"));

    let err = resolve_credentials(&options, Cursor::new(""), Vec::new()).unwrap_err();

    assert!(err.to_string().starts_with("password file does not exist"));
}

#[test]
fn test_password_without_username() {
    let mut options = options("http://e.com");
    options.password = Some("secret".to_string());

    let err = resolve_credentials(&options, Cursor::new(""), Vec::new()).unwrap_err();

    assert_eq!(
        err.to_string(),
        "username must be specified when a password is specified"
    );
}

#[test]
fn test_prompts_for_password() {
    let mut options = options("http://e.com");
    options.username = Some("joe".to_string());
    let mut prompt = Vec::new();

    let credentials = resolve_credentials(&options, Cursor::new("typed pass\n"), &mut prompt)
        .unwrap()
        .unwrap();

    assert_eq!(credentials.password, "typed pass");
    assert_eq!(String::from_utf8(prompt).unwrap(), "Password for joe? ");
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_depth_zero_is_unbounded() {
    let config = build_config(&options("http://e.com")).unwrap();
    assert_eq!(config.policy.max_depth(), None);

    let mut bounded = options("http://e.com");
    bounded.depth = 2;
    let config = build_config(&bounded).unwrap();
    assert_eq!(config.policy.max_depth(), Some(2));
}

#[test]
fn test_render_options_carried_over() {
    let mut options = options("http://e.com");
    options.indent = true;
    options.relative = true;
    options.spaces_per_indent = 5;
    options.verbose = 2;
    options.no_warnings = true;

    let config = build_config(&options).unwrap();

    assert!(config.render.indent);
    assert!(config.render.relative);
    assert_eq!(config.render.spaces_per_indent, 5);
    assert_eq!(config.render.verbosity, 2);
    assert!(!config.warnings_enabled);
}

#[test]
fn test_bad_pattern_is_fatal() {
    let mut options = options("http://e.com");
    options.filters = vec!["[".to_string()];

    let err = build_config(&options).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::InvalidPattern { .. })
    ));
}

#[test]
fn test_replicate_and_copy_together_is_fatal() {
    let dir = TempDir::new().unwrap();
    let mut options = options("http://e.com");
    options.replicate = Some(dir.path().to_path_buf());
    options.copy = Some(dir.path().to_path_buf());

    let err = build_config(&options).unwrap_err();

    assert_eq!(
        err.to_string(),
        "cannot specify concurrent copy and replication operations"
    );
}

#[test]
fn test_copy_directory_must_exist() {
    let dir = TempDir::new().unwrap();
    let mut options = options("http://e.com");
    options.copy = Some(dir.path().join("missing"));

    let err = build_config(&options).unwrap_err();

    assert!(err.to_string().starts_with("copy directory does not exist"));

    options.copy = Some(dir.path().to_path_buf());
    let config = build_config(&options).unwrap();
    assert_eq!(config.mirror.unwrap().mode(), MirrorMode::Copy);
}

#[test]
fn test_expand_path_tilde() {
    let plain = PathBuf::from("/tmp/mirror");
    assert_eq!(expand_path(&plain), plain);

    let expanded = expand_path(&PathBuf::from("~/mirror"));
    assert!(!expanded.to_string_lossy().starts_with('~'));
    assert!(expanded.ends_with("mirror"));
}

// ============================================================================
// Running
// ============================================================================

#[tokio::test]
async fn test_run_reports_summary() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(
                r#"<a href="/a.html">a</a><a href="/missing.html">m</a>"#,
                "text/html",
            ),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/a.html"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
        .mount(&server)
        .await;

    let mut options = options(&format!("{}/", server.uri()));
    options.no_warnings = true;

    let summary = run(&options, None).await.unwrap();

    assert_eq!(summary.visited, 3);
    assert_eq!(summary.reported, 2);
    assert_eq!(summary.missing, 1);
}

#[tokio::test]
async fn test_run_fails_before_walking_on_bad_config() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut options = options(&format!("{}/", server.uri()));
    options.excludes = vec!["(".to_string()];

    assert!(run(&options, None).await.is_err());
}

#[tokio::test]
async fn test_run_uses_resolved_credentials() {
    let server = MockServer::start().await;
    // base64("joe:secret")
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("authorization", "Basic am9lOnNlY3JldA=="))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<p>private</p>", "text/html"))
        .expect(1)
        .mount(&server)
        .await;

    let mut options = options(&format!("{}/", server.uri()));
    options.username = Some("joe".to_string());
    options.no_warnings = true;

    let summary = run(&options, Some(Credentials::new("joe", "secret")))
        .await
        .unwrap();

    assert_eq!(summary.visited, 1);
    assert_eq!(summary.reported, 1);
    assert_eq!(summary.failed, 0);
}

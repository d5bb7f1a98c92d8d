//! Option records survive a trip through the query string.
//!
//! The encoder's output is parsed back with `serde_qs`, an independent
//! implementation of the same `key=value&...` format.

use ghrest::{
    add_options, encode_query, ListCursorOptions, ListOptions, Pagination,
    PullRequestListOptions,
};
use tokio_test::{assert_err, assert_ok};

#[test]
fn test_list_options_round_trip() {
    let options = ListOptions::for_page(7, 100);
    let query = assert_ok!(encode_query(&options));
    assert_eq!(query, "page=7&per_page=100");

    let parsed: ListOptions = assert_ok!(serde_qs::from_str(&query));
    assert_eq!(parsed, options);
}

#[test]
fn test_cursor_options_round_trip() {
    let options = ListCursorOptions {
        per_page: 50,
        after: "Y3Vyc29yOnYyOpK5".to_string(),
        cursor: "v1_12345".to_string(),
        ..ListCursorOptions::default()
    };
    let query = assert_ok!(encode_query(&options));
    assert!(!query.contains("before"));
    assert!(!query.contains("first"));

    let parsed: ListCursorOptions = assert_ok!(serde_qs::from_str(&query));
    assert_eq!(parsed, options);
}

#[test]
fn test_string_filters_round_trip_with_escaping() {
    let options = PullRequestListOptions {
        state: Some("open".into()),
        head: Some("octocat:feature/new thing".into()),
        ..PullRequestListOptions::default()
    };
    let query = assert_ok!(encode_query(&options));
    assert!(query.contains("head=octocat%3Afeature%2Fnew%20thing"), "{query}");

    let parsed: PullRequestListOptions = assert_ok!(serde_qs::from_str(&query));
    assert_eq!(parsed.state, options.state);
    assert_eq!(parsed.head, options.head);
    assert_eq!(parsed.list, ListOptions::default());
}

#[test]
fn test_default_options_leave_path_alone() {
    let path = assert_ok!(add_options("repos/o/r/pulls", Some(&PullRequestListOptions::default())));
    assert_eq!(path, "repos/o/r/pulls");

    let path = assert_ok!(add_options::<ListOptions>("repos/o/r/pulls", None));
    assert_eq!(path, "repos/o/r/pulls");
}

#[test]
fn test_options_append_to_existing_query() {
    let path = assert_ok!(add_options("search/code?q=x", Some(&ListOptions::for_page(2, 0))));
    assert_eq!(path, "search/code?q=x&page=2");
}

#[test]
fn test_nested_records_are_rejected() {
    #[derive(serde::Serialize)]
    struct Nested {
        inner: ListOptions,
    }

    let err = assert_err!(encode_query(&Nested {
        inner: ListOptions::for_page(1, 1),
    }));
    assert!(err.to_string().contains("inner"), "{err}");
}

#[test]
fn test_prev_only_link_header() {
    let pagination = Pagination::from_link_header(
        r#"<https://api.github.com/repos/o/r/issues?page=2>; rel="prev""#,
    );

    assert_eq!(pagination.prev_page, 2);
    assert_eq!(pagination.next_page, 0);
    assert_eq!(pagination.last_page, 0);
    assert_eq!(pagination.first_page, 0);
}

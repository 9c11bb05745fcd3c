//! Ordering and failure-isolation tests for `search_and_print_page`.
//!
//! Validates the central invariant of the composite tool:
//!   sections appear in search-result order, one per result, no matter
//!   which branches finish first or fail.

mod common;

use std::sync::Arc;

use mcp_websearch_server::tools::{SearchAndPrintPageTool, Tool};
use mcp_websearch_server::oracle::ContentOracle;
use serde_json::json;

use common::{item, FakePages, FakeSearch, FixedReply, RejectMarker};

const SEPARATOR: &str = "################";

fn sections(output: &str) -> Vec<&str> {
    output
        .split(SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn titles(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|l| l.strip_prefix("# "))
        .map(str::to_string)
        .collect()
}

fn args() -> serde_json::Value {
    json!({ "query": "rust", "context": "ownership" })
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn reverse_completion_still_renders_in_search_order() {
    let n = 5;
    let mut pages = FakePages::default();
    for i in 1..=n {
        // Result 1 is slowest, result 5 fastest.
        pages = pages.page(&item(i).url, ((n + 1 - i) * 40) as u64, &format!("body of page {i}"));
    }

    let tool = SearchAndPrintPageTool::new(
        FakeSearch::with((1..=n).map(item).collect()),
        Arc::new(pages),
        ContentOracle::new(Arc::new(FixedReply("START: 1, END: 1"))),
        n,
    );

    let out = tool.invoke(args()).await.unwrap();
    assert_eq!(
        titles(&out),
        vec!["Page 1", "Page 2", "Page 3", "Page 4", "Page 5"]
    );
    for (i, section) in sections(&out).iter().enumerate() {
        assert!(section.contains(&format!("body of page {}", i + 1)), "section {i}: {section}");
    }
}

#[tokio::test]
async fn one_failing_fetch_does_not_abort_the_batch() {
    let mut pages = FakePages::default();
    for i in [1, 2, 4, 5] {
        pages = pages.page(&item(i).url, 5, &format!("content {i}"));
    }

    let tool = SearchAndPrintPageTool::new(
        FakeSearch::with((1..=5).map(item).collect()),
        Arc::new(pages),
        ContentOracle::new(Arc::new(FixedReply("START: 1, END: 1"))),
        5,
    );

    let out = tool.invoke(args()).await.unwrap();
    let sections = sections(&out);
    assert_eq!(sections.len(), 5);
    assert_eq!(sections[2], "# Page 3\n[https://site3.example/]");
    for (idx, i) in [(0, 1), (1, 2), (3, 4), (4, 5)] {
        assert!(sections[idx].ends_with(&format!("content {i}")), "{}", sections[idx]);
    }
}

#[tokio::test]
async fn malformed_oracle_reply_degrades_to_empty_excerpt() {
    let mut pages = FakePages::default();
    for i in 1..=3 {
        pages = pages.page(&item(i).url, 0, &format!("content {i}"));
    }

    let tool = SearchAndPrintPageTool::new(
        FakeSearch::with((1..=3).map(item).collect()),
        Arc::new(pages),
        ContentOracle::new(Arc::new(RejectMarker("content 2"))),
        3,
    );

    let out = tool.invoke(args()).await.unwrap();
    let sections = sections(&out);
    assert_eq!(sections.len(), 3);
    assert!(sections[0].ends_with("content 1"));
    assert_eq!(sections[1], "# Page 2\n[https://site2.example/]");
    assert!(sections[2].ends_with("content 3"));
}

#[tokio::test]
async fn result_count_is_capped() {
    let mut pages = FakePages::default();
    for i in 1..=8 {
        pages = pages.page(&item(i).url, 0, "x");
    }

    let tool = SearchAndPrintPageTool::new(
        FakeSearch::with((1..=8).map(item).collect()),
        Arc::new(pages),
        ContentOracle::new(Arc::new(FixedReply("START: 0, END: 0"))),
        4,
    );

    let out = tool.invoke(args()).await.unwrap();
    assert_eq!(titles(&out).len(), 4);
}

#[tokio::test]
async fn output_has_no_trailing_whitespace() {
    let tool = SearchAndPrintPageTool::new(
        FakeSearch::with(vec![item(1)]),
        Arc::new(FakePages::default().page(&item(1).url, 0, "only line")),
        ContentOracle::new(Arc::new(FixedReply("START: 1, END: 1"))),
        4,
    );

    let out = tool.invoke(args()).await.unwrap();
    assert_eq!(out, "# Page 1\n[https://site1.example/]\n\nonly line\n\n################");
}

#[tokio::test]
async fn no_search_results_yields_empty_output() {
    let tool = SearchAndPrintPageTool::new(
        FakeSearch::with(Vec::new()),
        Arc::new(FakePages::default()),
        ContentOracle::new(Arc::new(FixedReply("START: 0, END: 0"))),
        4,
    );

    assert_eq!(tool.invoke(args()).await.unwrap(), "");
}

#[tokio::test]
async fn search_failure_fails_the_tool() {
    let tool = SearchAndPrintPageTool::new(
        FakeSearch::failing(),
        Arc::new(FakePages::default()),
        ContentOracle::new(Arc::new(FixedReply("START: 0, END: 0"))),
        4,
    );

    assert!(tool.invoke(args()).await.is_err());
}

#[tokio::test]
async fn repeated_runs_are_identical() {
    let build = || {
        let mut pages = FakePages::default();
        for i in 1..=4 {
            pages = pages.page(&item(i).url, (i * 7 % 20) as u64, &format!("a\nb{i}\nc"));
        }
        SearchAndPrintPageTool::new(
            FakeSearch::with((1..=4).map(item).collect()),
            Arc::new(pages),
            ContentOracle::new(Arc::new(FixedReply("START: 2, END: 3"))),
            4,
        )
    };

    let a = build().invoke(args()).await.unwrap();
    let b = build().invoke(args()).await.unwrap();
    assert_eq!(a, b, "same inputs must render byte-identical output");
}

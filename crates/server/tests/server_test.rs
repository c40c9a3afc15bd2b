//! # Server Endpoint Tests
//!
//! Integration tests for the `askdb-server` endpoints: the UI page, the health
//! check, and the `/query` contract with succeeding and failing chains.

mod common;

use anyhow::Result;
use askdb::{
    constants::{EXAMPLE_QUESTION, FALLBACK_ANSWER},
    PromptError, SqlDatabaseChainBuilder,
};
use askdb_test_utils::{FailingChain, MockAiProvider, MockStorage, StaticChain};
use common::TestApp;
use std::sync::Arc;

#[tokio::test]
async fn test_root_and_health_check_endpoints() -> Result<()> {
    let app = TestApp::spawn_with_chain(Arc::new(StaticChain::new("unused"))).await?;

    // --- Root serves the UI with the example question ---
    let root_response = app.client.get(format!("{}/", app.address)).send().await?;
    assert!(root_response.status().is_success());
    let content_type = root_response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/html"));
    let page = root_response.text().await?;
    assert!(page.contains(EXAMPLE_QUESTION));
    assert!(page.contains("id=\"question\""));
    assert!(page.contains("id=\"answer\""));
    assert!(!page.contains("{{"));

    // --- Health check ---
    let health_response = app
        .client
        .get(format!("{}/health", app.address))
        .send()
        .await?;
    assert!(health_response.status().is_success());
    assert_eq!("OK", health_response.text().await?);

    Ok(())
}

#[tokio::test]
async fn test_query_returns_chain_answer() -> Result<()> {
    let chain = StaticChain::new("Category A: 120 tons; Category B: 80 tons");
    let app = TestApp::spawn_with_chain(Arc::new(chain.clone())).await?;

    let answer = app.ask(EXAMPLE_QUESTION).await?;

    assert_eq!(answer, "Category A: 120 tons; Category B: 80 tons");
    let prompts = chain.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains(EXAMPLE_QUESTION));
    Ok(())
}

#[tokio::test]
async fn test_query_failure_returns_fallback_with_ok_status() -> Result<()> {
    let chain = FailingChain::new(|| PromptError::StorageQueryFailed("boom".to_string()));
    let app = TestApp::spawn_with_chain(Arc::new(chain)).await?;

    // `ask` fails unless the status is 2xx.
    assert_eq!(app.ask("").await?, FALLBACK_ANSWER);
    assert_eq!(app.ask("'; DROP TABLE emissions; --").await?, FALLBACK_ANSWER);
    Ok(())
}

#[tokio::test]
async fn test_missing_question_field_is_an_empty_question() -> Result<()> {
    let chain = StaticChain::new("fine");
    let app = TestApp::spawn_with_chain(Arc::new(chain.clone())).await?;

    let response = app
        .client
        .post(format!("{}/query", app.address))
        .json(&serde_json::json!({}))
        .send()
        .await?;

    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["result"]["answer"], "fine");
    assert!(chain.prompts()[0].trim_end().ends_with("The question:"));
    Ok(())
}

#[tokio::test]
async fn test_query_malformed_json_is_rejected_before_the_handler() -> Result<()> {
    let chain = StaticChain::new("unused");
    let app = TestApp::spawn_with_chain(Arc::new(chain.clone())).await?;

    let response = app
        .client
        .post(format!("{}/query", app.address))
        .header("Content-Type", "application/json")
        .body(r#"{"question": "unterminated"#)
        .send()
        .await?;

    // Axum's `Json` extractor rejects syntactically invalid JSON with 400.
    assert_eq!(400, response.status().as_u16());
    assert!(chain.prompts().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_query_through_sql_chain_with_mocks() -> Result<()> {
    let sql = "SELECT \"category\", SUM(\"tons\") AS total FROM emissions WHERE \"year\" = 2022 GROUP BY \"category\" LIMIT 3";

    let ai = MockAiProvider::new();
    ai.add_response("SQLQuery:", sql);
    ai.add_response("SQLResult:", "Category A: 120 tons; Category B: 80 tons");

    let storage = MockStorage::new("CREATE TABLE \"emissions\" (\n\t\"category\" TEXT,\n\t\"year\" INTEGER,\n\t\"tons\" NUMERIC\n)");
    storage.add_result(sql, r#"[{"category":"A","total":120},{"category":"B","total":80}]"#);

    let chain = SqlDatabaseChainBuilder::new()
        .ai_provider(Box::new(ai.clone()))
        .storage_provider(Box::new(storage))
        .verbose(true)
        .build()?;
    let app = TestApp::spawn_with_chain(Arc::new(chain)).await?;

    let answer = app.ask(EXAMPLE_QUESTION).await?;

    assert_eq!(answer, "Category A: 120 tons; Category B: 80 tons");
    let calls = ai.get_calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].0.contains("at most 3 results"));
    assert!(calls[1].1.contains("SQLResult: [{\"category\":\"A\",\"total\":120}"));
    Ok(())
}

//! # Prompt Templates
//!
//! This module contains the prompt templates used by the `QueryHandler` and the
//! `SqlDatabaseChain`. Placeholders are written as `{name}` and filled in a
//! single pass by [`render`], so substituted text is never escaped, altered or
//! re-scanned for placeholders of its own.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(?P<key>[a-z_]+)\}").expect("placeholder regex is valid"));

/// The instruction wrapped around every user question before it reaches the chain.
///
/// Placeholders: `{question}`
pub const QUESTION_TEMPLATE: &str = "
Given an input question, first create a syntactically correct Postgresql query without ```sql formatting in the query.
Run the query then look at the results of the query.
Interpret the results and return an answer.
The question: {question}
";

/// The system prompt for the SQL generation step of the chain.
///
/// Placeholders: `{dialect}`, `{top_k}`, `{table_info}`
pub const SQL_CHAIN_SYSTEM_PROMPT: &str = r#"You are a {dialect} expert. Given an input question, first create a syntactically correct {dialect} query to run, then look at the results of the query and return the answer to the input question.
Unless the user specifies in the question a specific number of examples to obtain, query for at most {top_k} results using the LIMIT clause as per {dialect}. You can order the results to return the most informative data in the database.
Never query for all columns from a table. You must query only the columns that are needed to answer the question. Wrap each column name in double quotes (") to denote them as delimited identifiers.
Pay attention to use only the column names you can see in the tables below. Be careful to not query for columns that do not exist. Also, pay attention to which column is in which table.
Pay attention to use CURRENT_DATE function to get the current date, if the question involves "today".

Use the following format:

Question: Question here
SQLQuery: SQL Query to run
SQLResult: Result of the SQLQuery
Answer: Final answer here

Only use the following tables:
{table_info}"#;

/// The user prompt for the SQL generation step.
///
/// Placeholders: `{input}`
pub const SQL_CHAIN_USER_PROMPT: &str = "Question: {input}\nSQLQuery:";

/// The user prompt for the answer step. It replays the whole transcript so the
/// model can read the query result and finish the `Answer:` line.
///
/// Placeholders: `{input}`, `{sql}`, `{sql_result}`
pub const SQL_CHAIN_ANSWER_PROMPT: &str =
    "Question: {input}\nSQLQuery: {sql}\nSQLResult: {sql_result}\nAnswer:";

/// Fills the `{key}` placeholders of `template` with the matching values.
///
/// Placeholders without a value are left untouched.
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            let key = &caps["key"];
            values
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value).to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Interpolates a user question into [`QUESTION_TEMPLATE`].
pub fn format_question(question: &str) -> String {
    render(QUESTION_TEMPLATE, &[("question", question)])
}

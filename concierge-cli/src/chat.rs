//! Interactive client for a running concierge server.

use anyhow::Result;
use concierge_rag::AgentResult;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

pub fn print_answer(result: &AgentResult) {
    println!("\n✅ Intent: {}", result.intent);
    println!("💬 Answer: {}", result.answer);
    if let Some(confidence) = result.confidence {
        println!("📊 Confidence: {}", format_confidence(confidence));
    }
    println!("🔄 Fallback: {}\n", result.used_fallback);
}

fn format_confidence(confidence: f32) -> String {
    format!("{confidence:.4}")
}

/// What to do with one line of input.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Quit,
    Skip,
    Question(&'a str),
}

fn classify_input(line: &str) -> Input<'_> {
    let trimmed = line.trim();
    if trimmed.eq_ignore_ascii_case("exit") {
        Input::Quit
    } else if trimmed.is_empty() {
        Input::Skip
    } else {
        Input::Question(trimmed)
    }
}

/// Report whether a history write succeeded, logging the failure.
fn remember(outcome: rustyline::Result<bool>) -> bool {
    match outcome {
        Ok(added) => added,
        Err(e) => {
            warn!(error = %e, "could not record question in history");
            false
        }
    }
}

async fn post_question(client: &reqwest::Client, endpoint: &str, question: &str) -> Result<AgentResult> {
    let response = client.post(endpoint).json(&json!({ "question": question })).send().await?;
    if !response.status().is_success() {
        let status = response.status();
        let message = response
            .json::<ErrorBody>()
            .await
            .map(|body| body.error)
            .unwrap_or_else(|_| status.to_string());
        anyhow::bail!("{message}");
    }
    Ok(response.json::<AgentResult>().await?)
}

pub async fn run(base_url: &str) -> Result<()> {
    let endpoint = format!("{}/ask", base_url.trim_end_matches('/'));
    let client = reqwest::Client::new();
    let mut editor = DefaultEditor::new()?;

    println!("🤖 Concierge interactive tester");
    println!("Make sure the server is running on {base_url}");
    println!("Type your questions below (or \"exit\" to quit)\n");

    loop {
        let line = match editor.readline("💬 Your question: ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };

        let question = match classify_input(&line) {
            Input::Quit => break,
            Input::Skip => continue,
            Input::Question(question) => question,
        };
        remember(editor.add_history_entry(question));

        match post_question(&client, &endpoint, question).await {
            Ok(result) => print_answer(&result),
            Err(e) => println!("\n❌ Error: {e}\n"),
        }
    }

    println!("\n👋 Goodbye!");
    Ok(())
}

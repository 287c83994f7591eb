//! Ask a question.

use anyhow::Result;
use cinegraph::rag::AnswerOutcome;
use cinegraph::AppContext;
use colored::Colorize;
use std::path::Path;

use super::load_config;

pub async fn run(config_path: Option<&Path>, query: &str, json: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let ctx = AppContext::open(config).await?;

    let answer = ctx.rag().answer(query).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&answer)?);
    } else {
        println!("{} {}", "Q:".blue().bold(), answer.question);
        println!();
        for directive in &answer.directives {
            println!("{}", directive.token().magenta());
        }
        let text = answer.display_text();
        match answer.outcome {
            AnswerOutcome::Answered => println!("{}", text),
            AnswerOutcome::Failed => println!("{}", text.red()),
            AnswerOutcome::NoData | AnswerOutcome::EmptyQuery => println!("{}", text.yellow()),
        }

        if !answer.context.is_empty() {
            println!();
            println!(
                "{} {}",
                "Sources:".dimmed(),
                answer.context.titles().join(", ").dimmed()
            );
        }
    }

    ctx.close().await;
    Ok(())
}

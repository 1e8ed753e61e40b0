//! Interactive loop over stdin.

use std::sync::Arc;

use colored::Colorize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use twin_rag::{IndicatifProgress, RagPipeline};

use crate::render_answer;

/// What to do with one line of input.
#[derive(Debug, PartialEq, Eq)]
pub enum Input<'a> {
    Skip,
    Quit,
    Question(&'a str),
}

pub fn classify(line: &str) -> Input<'_> {
    let line = line.trim();
    if line.is_empty() {
        Input::Skip
    } else if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
        Input::Quit
    } else {
        Input::Question(line)
    }
}

pub fn banner(backend: &str, model: &str) {
    println!("{}", "=".repeat(60));
    println!("{}", "Digital Twin".blue().bold());
    println!("store: {backend}   model: {model}");
    println!("Ask about experience, skills or goals. Type 'exit' or 'quit' to leave.");
    println!("{}", "=".repeat(60));
}

/// Reads questions until `exit`/`quit` or end of input.
pub async fn run(pipeline: &RagPipeline, top_k: usize) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(format!("\n{} ", "You:".green().bold()).as_bytes()).await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };

        match classify(&line) {
            Input::Skip => continue,
            Input::Quit => break,
            Input::Question(q) => {
                let answer = pipeline
                    .clone()
                    .with_progress(Arc::new(IndicatifProgress::spinner()))
                    .answer_with(q, top_k)
                    .await;
                println!("\n{} {}", "Digital Twin:".cyan().bold(), render_answer(&answer));
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_words_are_case_insensitive() {
        assert_eq!(classify("exit"), Input::Quit);
        assert_eq!(classify("  QUIT \n"), Input::Quit);
        assert_eq!(classify("Exit"), Input::Quit);
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert_eq!(classify(""), Input::Skip);
        assert_eq!(classify(" \t"), Input::Skip);
    }

    #[test]
    fn questions_are_trimmed() {
        assert_eq!(classify(" Where do you work? "), Input::Question("Where do you work?"));
        assert_eq!(classify("exiting soon?"), Input::Question("exiting soon?"));
    }
}

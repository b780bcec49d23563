//! Interactive question loop.

use std::future::Future;
use std::io::Write;
use std::path::Path;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use docent_chat::ConversationAgent;
use docent_core::types::Role;

const PROMPT: &str = "Question: ";
const FAREWELL: &str = "Goodbye!";

/// Ingest a file and print the outcome. Returns whether it succeeded.
pub async fn ingest_and_report<W: Write>(agent: &ConversationAgent, path: &Path, out: &mut W) -> std::io::Result<bool> {
    match agent.update_knowledge(path).await {
        Ok(report) => {
            writeln!(
                out,
                "Knowledge base updated with {} ({} chunks)",
                report.source, report.chunks
            )?;
            Ok(true)
        }
        Err(e) => {
            writeln!(out, "Error: {}", e)?;
            Ok(false)
        }
    }
}

async fn print_history<W: Write>(agent: &ConversationAgent, session_id: &str, out: &mut W) -> std::io::Result<()> {
    match agent.history(session_id).await {
        Ok(turns) if turns.is_empty() => writeln!(out, "(no history)"),
        Ok(turns) => {
            for turn in turns {
                let speaker = match turn.role {
                    Role::User => "You",
                    Role::Assistant => "Docent",
                };
                writeln!(out, "{}: {}", speaker, turn.content)?;
            }
            Ok(())
        }
        Err(e) => writeln!(out, "Error: {}", e),
    }
}

/// Read questions line by line until an empty line, EOF or Ctrl-C.
///
/// `/ingest PATH` adds a document, `/history` prints the session so far.
/// Failed questions print the error and the loop continues.
pub async fn run<R, W>(agent: &ConversationAgent, session_id: &str, input: R, out: &mut W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    run_until(agent, session_id, input, out, tokio::signal::ctrl_c()).await
}

/// `run`, stopping as soon as `interrupt` completes, including while a
/// question or ingestion is in flight.
pub async fn run_until<R, W, I>(
    agent: &ConversationAgent,
    session_id: &str,
    input: R,
    out: &mut W,
    interrupt: I,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
    I: Future,
{
    let mut lines = input.lines();
    tokio::pin!(interrupt);

    loop {
        write!(out, "{}", PROMPT)?;
        out.flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = &mut interrupt => {
                writeln!(out)?;
                None
            }
        };

        let question = match line {
            Some(l) if !l.trim().is_empty() => l,
            _ => break,
        };

        if let Some(path) = question.trim().strip_prefix("/ingest ") {
            let mut report = Vec::new();
            let interrupted = tokio::select! {
                result = ingest_and_report(agent, Path::new(path.trim()), &mut report) => {
                    result?;
                    false
                }
                _ = &mut interrupt => true,
            };
            out.write_all(&report)?;
            if interrupted {
                writeln!(out)?;
                break;
            }
            continue;
        }
        if question.trim() == "/history" {
            print_history(agent, session_id, out).await?;
            continue;
        }

        let answer = tokio::select! {
            answer = agent.invoke(session_id, &question) => Some(answer),
            _ = &mut interrupt => None,
        };
        match answer {
            Some(Ok(answer)) => writeln!(out, "{}", answer)?,
            Some(Err(e)) => writeln!(out, "Error: {}", e)?,
            None => {
                writeln!(out)?;
                break;
            }
        }
    }

    writeln!(out, "{}", FAREWELL)?;
    Ok(())
}

//! Interactive rewrite session.
//!
//! Lines read from stdin are instructions for the model, except these
//! commands:
//!
//! - `:show` prints the current content
//! - `:edit` replaces the content with the following lines, up to a line `.`
//! - `:export` writes the DOCX file
//! - `:retry` runs the baseline rewrite again after it failed
//! - `:reset` drops the content and extracts the document again
//! - `:quit` ends the session

use std::path::Path;

use console::style;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use super::llm_client;
use crate::cli::helpers::{
    error, load_document, preview, spinner, success, upload_blocking, warning, write_export,
};
use crate::config::Config;
use crate::llm::LlmClient;
use crate::models::UploadedDocument;
use crate::session::{Session, SessionError};

const PREVIEW_CHARS: usize = 500;

/// A line of user input.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Show,
    Edit,
    Export,
    Retry,
    Reset,
    Quit,
    Help,
    Unknown(&'a str),
    Instruction(&'a str),
    Blank,
}

fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();
    match line {
        "" => Input::Blank,
        ":show" => Input::Show,
        ":edit" => Input::Edit,
        ":export" => Input::Export,
        ":retry" => Input::Retry,
        ":reset" => Input::Reset,
        ":quit" | ":q" => Input::Quit,
        ":help" => Input::Help,
        cmd if cmd.starts_with(':') => Input::Unknown(cmd),
        instruction => Input::Instruction(instruction),
    }
}

fn print_help() {
    eprintln!("{}", style("Commands:").bold());
    eprintln!("  :show     print the current content");
    eprintln!("  :edit     replace the content (finish with a line containing only '.')");
    eprintln!("  :export   write the DOCX file");
    eprintln!("  :retry    run the baseline rewrite again");
    eprintln!("  :reset    start over from the extracted text");
    eprintln!("  :quit     leave the session");
    eprintln!("Any other line is sent to the model as an instruction.");
}

/// Report a failed step; the session keeps its previous state.
fn report(e: &SessionError) {
    if e.is_warning() {
        eprintln!("{} {}", warning(), e);
    } else {
        eprintln!("{} {}", error(), e);
    }
}

/// Extract the document, then run the baseline rewrite.
async fn start(
    session: Session,
    client: &LlmClient,
    doc: UploadedDocument,
) -> anyhow::Result<Session> {
    let pb = spinner(format!("Extracting text from {}...", doc.filename()));
    let outcome = upload_blocking(session, doc).await;
    pb.finish_and_clear();
    let (mut session, result) = outcome?;

    match result {
        Ok(extraction) => {
            eprintln!(
                "{} Extracted {} chars via {}",
                success(),
                extraction.char_count(),
                extraction.method
            );
            eprintln!("{}", style(preview(&extraction.text, PREVIEW_CHARS)).dim());
            baseline(&mut session, client).await;
        }
        Err(e) => report(&e),
    }

    Ok(session)
}

/// Run the baseline rewrite on the current extraction, if still needed.
async fn baseline(session: &mut Session, client: &LlmClient) {
    let pb = spinner(format!("Rewriting with {}...", client.config().model));
    let result = session.ensure_baseline(client).await;
    pb.finish_and_clear();

    match result {
        Ok(true) => {
            eprintln!("{} Baseline rewrite ready", success());
            println!("{}", session.content());
        }
        Ok(false) if session.state().has_baseline() => {
            eprintln!("{} Baseline already done", warning())
        }
        Ok(false) if session.extraction().is_none() => {
            eprintln!("{} No document extracted; use :reset", warning())
        }
        Ok(false) => eprintln!("{} No text was extracted; nothing to rewrite", warning()),
        Err(e) => {
            report(&e);
            eprintln!("{}", style("Use :retry to try the rewrite again").dim());
        }
    }
}

/// Read an edit buffer terminated by a line containing only `.`.
async fn read_edit_buffer(lines: &mut Lines<BufReader<Stdin>>) -> anyhow::Result<String> {
    let mut buffer = Vec::new();
    while let Some(line) = lines.next_line().await? {
        if line.trim_end() == "." {
            break;
        }
        buffer.push(line);
    }
    Ok(buffer.join("\n"))
}

/// Run an interactive session on one document.
pub async fn cmd_session(
    config: &Config,
    file: &Path,
    mime: Option<&str>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let client = llm_client(config)?;
    let doc = load_document(file, mime)?;
    let mut session = start(Session::from_config(config), &client, doc.clone()).await?;
    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("{} ", style(format!("[{}]>", session.state())).cyan());
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_input(&line) {
            Input::Blank => {}
            Input::Quit => break,
            Input::Help => print_help(),
            Input::Unknown(cmd) => eprintln!("{} Unknown command {}", warning(), cmd),
            Input::Show => {
                if session.content().is_empty() {
                    eprintln!("{} No content yet", warning());
                } else {
                    println!("{}", session.content());
                }
            }
            Input::Edit => {
                eprintln!("{}", style("Enter new content, end with a line '.'").dim());
                let text = read_edit_buffer(&mut lines).await?;
                match session.edit(text) {
                    Ok(()) => eprintln!("{} Content replaced", success()),
                    Err(e) => report(&e),
                }
            }
            Input::Export => match session.export() {
                Ok(exported) => write_export(&exported, output)?,
                Err(e) => report(&e),
            },
            Input::Retry => baseline(&mut session, &client).await,
            Input::Reset => {
                session = start(session, &client, doc.clone()).await?;
            }
            Input::Instruction(instruction) => {
                let pb = spinner("Applying instruction...");
                let result = session.apply_instruction(&client, instruction).await;
                pb.finish_and_clear();
                match result {
                    Ok(()) => println!("{}", session.content()),
                    Err(e) => report(&e),
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input(":show"), Input::Show);
        assert_eq!(parse_input("  :edit "), Input::Edit);
        assert_eq!(parse_input(":q"), Input::Quit);
        assert_eq!(parse_input(":retry"), Input::Retry);
        assert_eq!(parse_input(":frobnicate"), Input::Unknown(":frobnicate"));
        assert_eq!(parse_input("   "), Input::Blank);
        assert_eq!(
            parse_input("Make it more concise"),
            Input::Instruction("Make it more concise")
        );
    }
}

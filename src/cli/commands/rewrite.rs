//! One-shot rewrite command.

use std::path::Path;

use console::style;

use super::llm_client;
use crate::cli::helpers::{load_document, spinner, success, upload_blocking, warning, write_export};
use crate::config::Config;
use crate::session::Session;

/// Extract, rewrite, apply each instruction in order, then export.
pub async fn cmd_rewrite(
    config: &Config,
    file: &Path,
    mime: Option<&str>,
    instructions: &[String],
    output: Option<&Path>,
    print: bool,
) -> anyhow::Result<()> {
    let client = llm_client(config)?;
    let doc = load_document(file, mime)?;
    let session = Session::from_config(config);

    let pb = spinner(format!("Extracting text from {}...", doc.filename()));
    let outcome = upload_blocking(session, doc).await;
    pb.finish_and_clear();
    let (mut session, result) = outcome?;

    let chars = match result {
        Ok(extraction) => extraction.char_count(),
        Err(e) if e.is_warning() => {
            eprintln!("{} {}", warning(), e);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    eprintln!("{} Extracted {} chars", success(), chars);

    let pb = spinner(format!("Rewriting with {}...", config.llm.model));
    let result = session.ensure_baseline(&client).await;
    pb.finish_and_clear();
    if !result? {
        eprintln!("{} No text was extracted; nothing to rewrite", warning());
        return Ok(());
    }
    eprintln!("{} Baseline rewrite ready", success());

    for (i, instruction) in instructions.iter().enumerate() {
        let pb = spinner(format!(
            "Applying instruction {}/{}: {}",
            i + 1,
            instructions.len(),
            instruction
        ));
        let result = session.apply_instruction(&client, instruction).await;
        pb.finish_and_clear();
        result?;
        eprintln!("{} {}", success(), style(instruction).dim());
    }

    let exported = session.export()?;
    write_export(&exported, output)?;

    if print {
        println!("{}", session.content());
    }

    Ok(())
}

//! Text extraction command.

use std::path::Path;

use console::style;
use serde::Serialize;

use crate::cli::helpers::{load_document, spinner, upload_blocking, warning};
use crate::config::Config;
use crate::extract::ExtractionMethod;
use crate::session::Session;

#[derive(Serialize)]
struct ExtractOutput<'a> {
    filename: &'a str,
    mime_type: &'a str,
    kind: &'static str,
    method: ExtractionMethod,
    page_count: Option<usize>,
    char_count: usize,
    text: &'a str,
}

/// Print the extracted text of a document.
pub async fn cmd_extract(
    config: &Config,
    file: &Path,
    mime: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let doc = load_document(file, mime)?;
    let session = Session::from_config(config);

    let pb = spinner(format!("Extracting text from {}...", doc.filename()));
    let outcome = upload_blocking(session, doc).await;
    pb.finish_and_clear();
    let (session, result) = outcome?;

    let extraction = match result {
        Ok(extraction) => extraction,
        Err(e) if e.is_warning() => {
            eprintln!("{} {}", warning(), e);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let Some(doc) = session.document() else {
        anyhow::bail!("document missing after upload");
    };

    if json {
        let output = ExtractOutput {
            filename: doc.filename(),
            mime_type: doc.mime_type(),
            kind: doc.kind().as_str(),
            method: extraction.method,
            page_count: extraction.page_count,
            char_count: extraction.char_count(),
            text: &extraction.text,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        eprintln!(
            "{} {} chars via {}",
            style("→").dim(),
            extraction.char_count(),
            extraction.method
        );
        println!("{}", extraction.text);
    }

    Ok(())
}

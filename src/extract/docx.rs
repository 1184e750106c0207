//! Word document text.

use docx_rs::{DocumentChild, Paragraph, ParagraphChild, Run, RunChild};

use super::ExtractionError;

/// Text of each top-level body paragraph, in document order.
///
/// Paragraphs inside tables are not part of the body and are skipped. Empty
/// paragraphs are kept so blank lines survive the join.
pub fn paragraphs(bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
    let docx = docx_rs::read_docx(bytes).map_err(|e| ExtractionError::Docx(e.to_string()))?;

    Ok(docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(para) => Some(paragraph_text(para)),
            _ => None,
        })
        .collect())
}

/// Body text of a DOCX file: paragraphs joined with newlines, trimmed.
pub fn extract_docx(bytes: &[u8]) -> Result<String, ExtractionError> {
    Ok(paragraphs(bytes)?.join("\n").trim().to_string())
}

fn paragraph_text(para: &Paragraph) -> String {
    let mut text = String::new();
    push_children(&para.children, &mut text);
    text
}

fn push_children(children: &[ParagraphChild], text: &mut String) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => push_run(run, text),
            ParagraphChild::Hyperlink(link) => push_children(&link.children, text),
            _ => {}
        }
    }
}

fn push_run(run: &Run, text: &mut String) {
    for rc in &run.children {
        match rc {
            RunChild::Text(t) => text.push_str(&t.text),
            RunChild::Tab(_) => text.push('\t'),
            RunChild::Break(_) => text.push('\n'),
            _ => {}
        }
    }
}

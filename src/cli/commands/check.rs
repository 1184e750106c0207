//! Environment check command.

use console::style;

use super::llm_client;
use crate::cli::helpers::{error, spinner, success, warning};
use crate::config::Config;
use crate::llm::API_KEY_VARS;
use crate::ocr::{check_binary, OcrBackend, OcrBackendType, TesseractBackend};

const TOOLS: [(&str, &str); 3] = [
    ("pdftotext", "poppler-utils"),
    ("pdftoppm", "poppler-utils"),
    ("tesseract", "tesseract-ocr"),
];

/// Report tool, OCR backend and credential status.
pub async fn cmd_check(config: &Config, probe: bool) -> anyhow::Result<()> {
    println!("\n{}", style("External Tools:").cyan());
    for (tool, package) in TOOLS {
        if check_binary(tool) {
            println!("  {:<15} {}", tool, style("✓ found").green());
        } else {
            println!(
                "  {:<15} {} {}",
                tool,
                style("✗ not found").red(),
                style(format!("(install {})", package)).dim()
            );
        }
    }

    println!("\n{}", style("OCR Backend:").cyan());
    let backend = config.extraction.ocr_backend;
    match backend {
        OcrBackendType::Tesseract => {
            let tesseract = TesseractBackend::with_config(config.extraction.ocr_config());
            let status = if tesseract.is_available() {
                style("✓ available").green()
            } else {
                style("✗ not available").red()
            };
            println!("  {:<15} {}", backend.as_str(), status);
            if !tesseract.is_available() {
                println!("                  {}", style(tesseract.availability_hint()).dim());
            }
        }
        OcrBackendType::Ocrs => {
            if cfg!(feature = "ocr-ocrs") {
                println!(
                    "  {:<15} {}",
                    backend.as_str(),
                    style("○ models load (or download) on first use").yellow()
                );
            } else {
                println!(
                    "  {:<15} {}",
                    backend.as_str(),
                    style("✗ not compiled in (rebuild with --features ocr-ocrs)").red()
                );
            }
        }
    }

    println!("\n{}", style("Rewrite API:").cyan());
    println!("  {:<15} {}", "endpoint", config.llm.endpoint);
    println!("  {:<15} {}", "model", config.llm.model);
    if config.llm.has_api_key() {
        println!("  {:<15} {}", "credential", style("✓ set").green());
    } else {
        println!(
            "  {:<15} {} {}",
            "credential",
            style("✗ missing").red(),
            style(format!("(set {} or {})", API_KEY_VARS[0], API_KEY_VARS[1])).dim()
        );
    }

    if probe {
        let client = llm_client(config)?;
        let pb = spinner(format!("Listing models at {}...", config.llm.endpoint));
        let result = client.list_models().await;
        pb.finish_and_clear();

        match result {
            Ok(models) => {
                let found = models.iter().any(|m| m == &config.llm.model);
                eprintln!("{} API reachable, {} models", success(), models.len());
                if !found {
                    eprintln!(
                        "{} Model {} not in the provider's list",
                        warning(),
                        config.llm.model
                    );
                }
            }
            Err(e) => eprintln!("{} {}", error(), e),
        }
    }

    println!();
    Ok(())
}

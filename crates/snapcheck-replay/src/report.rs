//! Self-contained HTML report for a replay run

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use snapcheck_core::{Result, VerificationResult};
use std::path::Path;
use tracing::info;

const STYLE: &str = "body { font-family: sans-serif; padding: 20px; }
    .page { border: 1px solid #ccc; margin-bottom: 20px; padding: 10px; }
    .pass { color: green; font-weight: bold; }
    .fail { color: red; font-weight: bold; }
    img { margin-top: 10px; max-width: 100%; }";

/// Renders verification results as one HTML document with inlined screenshots
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    title: String,
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new("snapcheck Verification Report")
    }
}

impl ReportBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    /// Render the report; screenshots are read from disk and inlined
    pub fn render(&self, results: &[VerificationResult]) -> Result<String> {
        let passed = results.iter().filter(|r| r.pass).count();
        let title = escape_html(&self.title);

        let mut html = format!(
            "<!DOCTYPE html>\n<html>\n<head>\n  <meta charset=\"utf-8\">\n  <title>{title}</title>\n  <style>\n    {STYLE}\n  </style>\n</head>\n<body>\n  <h1>{title}</h1>\n  <p>Generated {}. {} of {} pages passed.</p>\n",
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
            passed,
            results.len(),
        );

        for result in results {
            html.push_str(&self.render_page(result)?);
        }

        html.push_str("</body>\n</html>\n");
        Ok(html)
    }

    fn render_page(&self, result: &VerificationResult) -> Result<String> {
        let status = if result.pass {
            "<span class=\"pass\">PASS</span>"
        } else {
            "<span class=\"fail\">FAIL</span>"
        };

        let detail = if result.pass {
            "<p><strong>Verification:</strong> All baseline elements matched. Visible content, locators and text values are identical.</p>".to_string()
        } else {
            format!(
                "<p><strong>Reason:</strong> {}</p>",
                escape_html(result.failure_reason.as_deref().unwrap_or("unknown"))
            )
        };

        let image = match &result.artifact_path {
            Some(path) => format!("\n    <img src=\"{}\" />", embed_png(path)?),
            None => String::new(),
        };

        Ok(format!(
            "  <div class=\"page\">\n    <h2>Page {} - {}</h2>\n    <p><strong>URL:</strong> {}</p>\n    {}{}\n  </div>\n",
            result.snapshot.ordinal(),
            status,
            escape_html(&result.snapshot.url),
            detail,
            image
        ))
    }

    /// Render and write the report
    pub fn write(&self, path: &Path, results: &[VerificationResult]) -> Result<()> {
        let html = self.render(results)?;
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, html)?;
        info!("Report generated: {}", path.display());
        Ok(())
    }
}

fn embed_png(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(bytes)))
}

pub(crate) fn escape_html(text: &str) -> String {
    v_htmlescape::escape(text).to_string()
}

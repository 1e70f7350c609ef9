//! Render a request trace file to a standalone HTML page

use super::print_toast;
use crate::config::Settings;
use crate::remote::HttpTemplateSource;
use anyhow::{Context, Result};
use console::style;
use serde_json::Value;
use stagepanel_common::{EmbeddedTemplates, Notification, RequestTab, RequestTabRender};
use std::fs;
use std::path::{Path, PathBuf};

pub struct RenderOptions {
    pub trace: PathBuf,
    pub output: Option<PathBuf>,
    pub server: Option<String>,
    pub open: bool,
}

pub async fn run(opts: RenderOptions) -> Result<()> {
    let content = fs::read_to_string(&opts.trace)
        .with_context(|| format!("Failed to read trace file {}", opts.trace.display()))?;
    let trace: Value = serde_json::from_str(&content).context("Trace file is not valid JSON")?;
    let settings = Settings::load()?;

    let rendered = match &opts.server {
        Some(server) => {
            let source = HttpTemplateSource::new(server)?;
            RequestTab::new(source).render(Some(trace), &settings).await
        }
        None => RequestTab::new(EmbeddedTemplates).render(Some(trace), &settings).await,
    }
    .context("Failed to render request tab")?;

    let RequestTabRender::Shown {
        id,
        html,
        threshold_exceeded,
    } = rendered
    else {
        println!("Trace is empty, nothing to render.");
        return Ok(());
    };

    let output = opts
        .output
        .unwrap_or_else(|| default_output(&opts.trace));
    fs::write(&output, page(&id, &html))
        .with_context(|| format!("Failed to write {}", output.display()))?;

    print_toast(&Notification::success(format!(
        "Request tab written to {}",
        style(output.display()).cyan()
    )));
    if threshold_exceeded {
        println!(
            "{}",
            style("One or more metrics exceeded your thresholds.").yellow()
        );
    }

    if opts.open {
        if let Err(e) = open::that(&output) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    Ok(())
}

/// `trace.json` -> `trace.html` next to it
fn default_output(trace: &Path) -> PathBuf {
    trace.with_extension("html")
}

/// Wrap the rendered tab in a minimal standalone document
fn page(id: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Request tab</title>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 1.5rem; color: #333; }}
        table {{ border-collapse: collapse; width: 100%; margin-bottom: 1rem; }}
        th, td {{ text-align: left; padding: 0.35rem 0.6rem; border-bottom: 1px solid #eee; vertical-align: top; }}
        .metric-value {{ white-space: pre-line; font-family: monospace; }}
        .threshold-exceeded {{ background: #fee2e2; color: #991b1b; }}
        .progress {{ display: flex; height: 1.5rem; margin-bottom: 1rem; font-size: 0.75rem; }}
        .progress-bar {{ overflow: hidden; white-space: nowrap; color: #fff; padding: 0.2rem; }}
        .network {{ background: #2563eb; }}
        .server {{ background: #16a34a; }}
        .dom-processing {{ background: #ca8a04; }}
        .page-rendering {{ background: #9333ea; }}
    </style>
</head>
<body>
<div id="stagemonitor-request" data-render-id="{}">
{}</div>
</body>
</html>
"#,
        id, body
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output() {
        assert_eq!(
            default_output(Path::new("/tmp/traces/checkout.json")),
            PathBuf::from("/tmp/traces/checkout.html")
        );
    }

    #[test]
    fn test_page_wraps_body() {
        let html = page("abc", "<div class=\"request-tab\"></div>");
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains(r#"data-render-id="abc""#));
        assert!(html.contains("<div class=\"request-tab\"></div>"));
    }
}

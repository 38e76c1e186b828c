use crate::model::RunBundle;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::mpsc as std_mpsc;
use std::sync::OnceLock;
use std::time::Duration;

static CLIPBOARD_SENDER: OnceLock<std_mpsc::Sender<String>> = OnceLock::new();

pub fn export_file_name(run_id: &str) -> String {
    let prefix: String = run_id.chars().take(8).collect();
    format!("modeleval-run-{prefix}.json")
}

/// Write the committed run (detail, summary, attempts) as pretty JSON into `dir`.
pub fn export_run_json(bundle: &RunBundle, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(export_file_name(&bundle.run.id));
    let body = serde_json::to_string_pretty(bundle).context("serialize run snapshot")?;
    std::fs::write(&path, body).with_context(|| format!("write {}", path.display()))?;
    tracing::info!(run_id = %bundle.run.id, path = %path.display(), "run exported");
    Ok(path)
}

/// Clipboard writes run on one background thread. Each clipboard handle is held briefly
/// after writing so Linux clipboard managers can pick the contents up.
fn clipboard_sender() -> &'static std_mpsc::Sender<String> {
    CLIPBOARD_SENDER.get_or_init(|| {
        let (tx, rx) = std_mpsc::channel::<String>();
        std::thread::spawn(move || {
            for text in rx {
                match arboard::Clipboard::new() {
                    Ok(mut clipboard) => {
                        if let Err(e) = clipboard.set_text(&text) {
                            tracing::warn!(error = %e, "clipboard write failed");
                            continue;
                        }
                        std::thread::sleep(Duration::from_secs(2));
                    }
                    Err(e) => tracing::warn!(error = %e, "clipboard unavailable"),
                }
            }
        });
        tx
    })
}

/// Queue `text` for the clipboard without blocking the UI thread.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    clipboard_sender()
        .send(text.to_string())
        .map_err(|_| anyhow::anyhow!("clipboard worker stopped"))
}

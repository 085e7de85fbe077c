use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use bytes::Bytes;
use chrono::Utc;
use colored::Colorize;

use qrv_decode::{crop_bytes, rgba_to_png, ScanReader};
use qrv_ledger::{FsKvStore, ResultLedger};
use qrv_session::{
    CreateReceipt, NoticeCenter, ScanResult, ScanSession, Severity, RETENTION_DAYS,
};
use qrv_store::FsBlobStore;
use qrv_types::{time, ScanId};

use crate::cli::*;
use crate::config::Config;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = Config::resolve(cli.data_dir);
    let store = Arc::new(FsBlobStore::new(config.blob_root()));
    let ledger = ResultLedger::new(Arc::new(FsKvStore::new(config.ledger_root())));
    let mut session = ScanSession::new(store, ledger);
    session.bootstrap().await;

    let format = cli.format;
    let outcome = match cli.command {
        Command::Scan(args) => cmd_scan(&mut session, args, &format).await,
        Command::Paste(_) => cmd_paste(&mut session, &format).await,
        Command::List(args) => cmd_list(&session, args, &format),
        Command::Show(args) => cmd_show(&mut session, args, &format),
        Command::Copy(args) => cmd_copy(&session, args, &format),
        Command::Delete(args) => cmd_delete(&mut session, args, &format).await,
        Command::Clear(args) => cmd_clear(&mut session, args, &format).await,
        Command::Prune(args) => cmd_prune(&mut session, args, &format).await,
    };
    session.teardown();
    outcome
}

async fn cmd_scan(
    session: &mut ScanSession,
    args: ScanArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let raw = std::fs::read(&args.image)
        .with_context(|| format!("failed to read {}", args.image.display()))?;
    let bytes = match args.crop {
        Some(region) => crop_bytes(&raw, region)?,
        None => Bytes::from(raw),
    };
    decode_and_store(session, bytes, format).await
}

async fn cmd_paste(session: &mut ScanSession, format: &OutputFormat) -> anyhow::Result<()> {
    let mut clipboard = arboard::Clipboard::new().context("clipboard unavailable")?;
    let image = match clipboard.get_image() {
        Ok(image) => image,
        Err(arboard::Error::ContentNotAvailable) => {
            print_miss(format, "the clipboard does not contain an image", None);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    let png = rgba_to_png(image.width as u32, image.height as u32, &image.bytes)?;
    decode_and_store(session, png, format).await
}

/// Decode shared by `scan` and `paste`: run the reader, persist a hit, and
/// report. A miss is an outcome, not an error, so the process still exits
/// zero.
async fn decode_and_store(
    session: &mut ScanSession,
    bytes: Bytes,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let reader = ScanReader::new();
    let capture = match reader.scan(&bytes) {
        Ok(capture) => capture,
        Err(e) if e.is_not_found() => {
            print_miss(
                format,
                "no QR code found",
                Some("focus on the code region with --crop X,Y,WxH"),
            );
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let dimensions = capture.dimensions;
    let receipt = session.create_result(capture.decoded, bytes, Some(dimensions)).await;
    let Some(result) = session.get(&receipt.id).cloned() else {
        anyhow::bail!("stored result is missing right after create");
    };

    match format {
        OutputFormat::Json => {
            let mut doc = result_json(&result);
            doc["found"] = serde_json::json!(true);
            doc["durability"] = serde_json::json!({
                "blobStored": receipt.durability.blob_stored,
                "ledgerSaved": receipt.durability.ledger_saved,
            });
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        OutputFormat::Text => {
            let record = &result.record;
            println!(
                "{} decoded {} as {}",
                "✓".green().bold(),
                record.format.cyan(),
                record.id.short_id().yellow(),
            );
            println!("  {}{}", record.text, link_tag(record.is_link()));
            println!(
                "  {}  {}x{}",
                time::format_local(record.timestamp).dimmed(),
                dimensions.width,
                dimensions.height,
            );

            let mut notices = NoticeCenter::new();
            durability_notices(&mut notices, &receipt);
            render_notices(&mut notices);
        }
    }
    Ok(())
}

fn cmd_list(session: &ScanSession, args: ListArgs, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let items: Vec<serde_json::Value> = session.results().iter().map(result_json).collect();
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
        OutputFormat::Text => {
            if session.is_empty() {
                println!("No scan results.");
                return Ok(());
            }
            for result in session.results() {
                let record = &result.record;
                let id = if args.full {
                    record.id.to_string()
                } else {
                    record.id.short_id()
                };
                let text = if args.full {
                    record.text.clone()
                } else {
                    one_line(&record.text, 60)
                };
                println!(
                    "{}  {}  {}{}",
                    id.yellow(),
                    time::format_local(record.timestamp).dimmed(),
                    text,
                    link_tag(record.is_link()),
                );
            }
            println!("\n{} result(s)", session.len().to_string().bold());
        }
    }
    Ok(())
}

fn cmd_show(session: &mut ScanSession, args: ShowArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let id = find_result(session, &args.id)?.record.id.clone();
    session.select(&id);
    let Some(result) = session.selected() else {
        anyhow::bail!("result {id} is no longer in the list");
    };

    let exported = match &args.export {
        Some(path) => {
            let Some(bytes) = session.resolve_image(&result.image_url) else {
                anyhow::bail!("image bytes are not available for this result");
            };
            std::fs::write(path, &bytes)
                .with_context(|| format!("failed to write {}", path.display()))?;
            Some(path.clone())
        }
        None => None,
    };

    let record = &result.record;
    match format {
        OutputFormat::Json => {
            let mut doc = result_json(result);
            if let Some(geometry) = record.geometry() {
                doc["cornersPercent"] = serde_json::json!(geometry.as_percentages());
            }
            if let Some(path) = &exported {
                doc["exportedTo"] = serde_json::json!(path.display().to_string());
            }
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        OutputFormat::Text => {
            println!("{}  {}", record.id.short_id().yellow().bold(), record.format.cyan());
            println!("  id:       {}", record.id);
            println!("  text:     {}{}", record.text, link_tag(record.is_link()));
            println!("  scanned:  {}", time::format_local(record.timestamp));
            if let Some(dims) = record.dimensions {
                let size = session
                    .resolve_image(&result.image_url)
                    .map(|b| b.len())
                    .unwrap_or(0);
                println!("  image:    {}x{}, {} bytes", dims.width, dims.height, size);
            }
            if let Some(geometry) = record.geometry() {
                let corners: Vec<String> = geometry
                    .as_percentages()
                    .iter()
                    .map(|p| format!("({:.1}%, {:.1}%)", p.x, p.y))
                    .collect();
                println!("  corners:  {}", corners.join(", "));
            }
            if let Some(path) = &exported {
                println!(
                    "{} exported image to {}",
                    "✓".green(),
                    path.display().to_string().bold(),
                );
            }
        }
    }
    Ok(())
}

fn cmd_copy(session: &ScanSession, args: CopyArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let result = find_result(session, &args.id)?;
    let text = result.record.text.clone();
    let mut clipboard = arboard::Clipboard::new().context("clipboard unavailable")?;
    clipboard.set_text(text)?;

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({ "copied": true, "id": result.record.id.as_str() })
            );
        }
        OutputFormat::Text => {
            // The confirmation is transient feedback, shown through the
            // notice layer with a short window.
            let mut notices = NoticeCenter::new();
            notices.publish_with_ttl(
                "copied to clipboard",
                Severity::Success,
                Some(Duration::from_secs(2)),
            );
            render_notices(&mut notices);
        }
    }
    Ok(())
}

async fn cmd_delete(
    session: &mut ScanSession,
    args: DeleteArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let id = find_result(session, &args.id)?.record.id.clone();
    session.delete_one(&id).await;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "deleted": true, "id": id.as_str() }));
        }
        OutputFormat::Text => {
            println!("{} deleted {}", "✓".green(), id.short_id().yellow());
        }
    }
    Ok(())
}

async fn cmd_clear(
    session: &mut ScanSession,
    args: ClearArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    if session.is_empty() {
        println!("Nothing to clear.");
        return Ok(());
    }
    if !args.yes && !confirm(&format!("delete all {} result(s)?", session.len()))? {
        println!("aborted");
        return Ok(());
    }

    let report = session.delete_all().await;
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({ "removed": report.removed, "kept": report.kept })
            );
        }
        OutputFormat::Text => {
            println!(
                "{} removed {} result(s)",
                "✓".green().bold(),
                report.removed.to_string().bold(),
            );
        }
    }
    Ok(())
}

async fn cmd_prune(
    session: &mut ScanSession,
    args: PruneArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let cutoff = Utc::now() - chrono::Duration::days(RETENTION_DAYS);
    let stale = session.stale_count(cutoff);
    if stale == 0 {
        match format {
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({ "removed": 0, "kept": session.len() })
                );
            }
            OutputFormat::Text => {
                println!("Nothing to prune, all results are within {RETENTION_DAYS} days.");
            }
        }
        return Ok(());
    }
    if !args.yes
        && !confirm(&format!(
            "delete {stale} result(s) older than {RETENTION_DAYS} days?"
        ))?
    {
        println!("aborted");
        return Ok(());
    }

    let report = session.prune_stale().await;
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({ "removed": report.removed, "kept": report.kept })
            );
        }
        OutputFormat::Text => {
            println!(
                "{} removed {} stale result(s), kept {}",
                "✓".green().bold(),
                report.removed.to_string().bold(),
                report.kept,
            );
        }
    }
    Ok(())
}

// ---- Helpers ----

/// Look up a result by exact id or unique id prefix.
fn find_result<'a>(session: &'a ScanSession, needle: &str) -> anyhow::Result<&'a ScanResult> {
    if let Some(result) = session.get(&ScanId::new(needle)) {
        return Ok(result);
    }
    let matches: Vec<&ScanResult> = session
        .results()
        .iter()
        .filter(|r| r.record.id.as_str().starts_with(needle))
        .collect();
    match matches.len() {
        0 => anyhow::bail!("no result matches id {needle}"),
        1 => Ok(matches[0]),
        n => anyhow::bail!("id {needle} is ambiguous, {n} results match"),
    }
}

/// A result in the shape the persisted document uses, for `--format json`.
fn result_json(result: &ScanResult) -> serde_json::Value {
    let record = &result.record;
    serde_json::json!({
        "id": record.id.as_str(),
        "text": record.text,
        "format": record.format,
        "timestamp": time::to_rfc3339(record.timestamp),
        "isLink": record.is_link(),
        "resultPoints": record.points,
        "imageDimensions": record.dimensions,
    })
}

fn link_tag(is_link: bool) -> String {
    if is_link {
        format!(" {}", "[link]".blue())
    } else {
        String::new()
    }
}

/// Flatten to a single display line, truncating with an ellipsis.
fn one_line(text: &str, max: usize) -> String {
    let flat = text.replace(['\r', '\n'], " ");
    if flat.chars().count() <= max {
        flat
    } else {
        let cut: String = flat.chars().take(max).collect();
        format!("{cut}...")
    }
}

fn durability_notices(notices: &mut NoticeCenter, receipt: &CreateReceipt) {
    if !receipt.durability.blob_stored {
        notices.publish(
            "image not persisted, this result will not survive a restart",
            Severity::Warning,
        );
    }
    if !receipt.durability.ledger_saved {
        notices.publish(
            "metadata not persisted, this result will not survive a restart",
            Severity::Warning,
        );
    }
}

fn render_notices(notices: &mut NoticeCenter) {
    for notice in notices.active() {
        let tag = match notice.severity {
            Severity::Success => "✓".green().bold(),
            Severity::Info => "i".blue(),
            Severity::Warning => "!".yellow().bold(),
            Severity::Error => "✗".red().bold(),
        };
        println!("{} {}", tag, notice.message);
    }
}

fn print_miss(format: &OutputFormat, reason: &str, hint: Option<&str>) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({ "found": false, "reason": reason })
            );
        }
        OutputFormat::Text => {
            println!("{} {}", "✗".red(), reason);
            if let Some(hint) = hint {
                println!("  hint: {hint}");
            }
        }
    }
}

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    use std::io::Write;
    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    use qrv_decode::Decoded;
    use qrv_ledger::MemoryKvStore;
    use qrv_store::MemoryBlobStore;
    use qrv_types::QR_CODE_FORMAT;

    async fn session_with(texts: &[&str]) -> ScanSession {
        let store = Arc::new(MemoryBlobStore::new());
        let ledger = ResultLedger::new(Arc::new(MemoryKvStore::new()));
        let mut session = ScanSession::new(store, ledger);
        session.bootstrap().await;
        for text in texts {
            session
                .create_result(
                    Decoded {
                        text: text.to_string(),
                        format: QR_CODE_FORMAT.to_string(),
                        points: None,
                    },
                    Bytes::from_static(b"img"),
                    None,
                )
                .await;
        }
        session
    }

    #[tokio::test]
    async fn find_result_accepts_full_ids_and_unique_prefixes() {
        let session = session_with(&["one"]).await;
        let full = session.results()[0].record.id.to_string();

        assert_eq!(find_result(&session, &full).unwrap().record.text, "one");
        assert_eq!(find_result(&session, &full[..8]).unwrap().record.text, "one");
    }

    #[tokio::test]
    async fn find_result_rejects_unknown_and_ambiguous_ids() {
        let session = session_with(&["one", "two"]).await;

        // Ids are hex strings, so a z-prefix can never match.
        assert!(find_result(&session, "zzzzzzzz").is_err());
        // The empty prefix matches every result.
        assert!(find_result(&session, "").is_err());
    }

    #[tokio::test]
    async fn result_json_uses_wire_field_names() {
        let session = session_with(&["https://example.com"]).await;
        let doc = result_json(&session.results()[0]);

        assert_eq!(doc["text"], "https://example.com");
        assert_eq!(doc["format"], "QR_CODE");
        assert_eq!(doc["isLink"], true);
        assert!(doc["timestamp"].as_str().unwrap().ends_with('Z'));
        assert!(doc["resultPoints"].is_null());
        assert!(doc["imageDimensions"].is_null());
    }

    #[test]
    fn one_line_flattens_and_truncates() {
        assert_eq!(one_line("short", 10), "short");
        assert_eq!(one_line("a\nb\rc", 10), "a b c");
        assert_eq!(one_line("abcdefghij", 5), "abcde...");
    }

    #[test]
    fn durability_warnings_match_the_failed_store() {
        let mut notices = NoticeCenter::new();
        let receipt = CreateReceipt {
            id: ScanId::new("a1"),
            durability: qrv_session::Durability {
                blob_stored: false,
                ledger_saved: true,
            },
        };
        durability_notices(&mut notices, &receipt);

        let active = notices.active();
        assert_eq!(active.len(), 1);
        assert!(active[0].message.contains("image not persisted"));
        assert_eq!(active[0].severity, Severity::Warning);
    }
}

//! CLI output formatting.
//!
//! # Display Contract
//!
//! Every image slot (original or converted) is shown the same way: a header
//! line with its role and file name, then indented context lines. Sizes are
//! raw byte counts so they can be compared at a glance and grepped.
//!
//! ## Info
//!
//! ```text
//! Original: dawn.png
//!     Type: image/png
//!     Size: 482113 bytes
//!     Dimensions: 800x600
//!     Aspect ratio: 1.3333
//! ```
//!
//! ## Convert
//!
//! ```text
//! 001 dawn.png → out/dawn.webp
//!     Original: 800x600, 482113 bytes
//!     Converted: 400x300, 20117 bytes (quality 75)
//!     Saved ~96%
//! 002 notes.txt
//!     Rejected: Please upload a valid image file ...
//!
//! Converted 1, rejected 1, failed 0
//! ```
//!
//! ## Sweep
//!
//! ```text
//! Quality sweep: dawn.png at 800x600
//!       1  3120 bytes
//!      25  9877 bytes
//!     ...
//!     100  161024 bytes
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for
//! testability and, where the CLI needs one, a `print_*` wrapper that writes
//! to stdout. Format functions are pure: no I/O, no side effects.

use crate::batch::{BatchEvent, BatchSummary};
use crate::imaging::{Dimensions, SweepPoint};
use crate::session::{ImageDetails, Phase, Session};
use std::io::Write;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `WxH, N bytes`
fn size_summary(details: &ImageDetails) -> String {
    format!("{}, {} bytes", details.dimensions(), details.size)
}

/// The savings line, shown only when the output is smaller than the input.
pub fn savings_line(percent: Option<u32>) -> Option<String> {
    percent.map(|p| format!("Saved ~{}%", p))
}

// ============================================================================
// Single image
// ============================================================================

/// Format one image slot with all of its metadata.
pub fn format_details(role: &str, details: &ImageDetails) -> Vec<String> {
    let ratio = crate::imaging::calculations::aspect_ratio(details.width, details.height);
    vec![
        format!("{}: {}", role, details.name),
        format!("{}Type: {}", indent(1), details.mime),
        format!("{}Size: {} bytes", indent(1), details.size),
        format!("{}Dimensions: {}", indent(1), details.dimensions()),
        format!("{}Aspect ratio: {:.4}", indent(1), ratio),
    ]
}

/// Format the full state of an interactive session.
pub fn format_status(session: &Session) -> Vec<String> {
    let processing = match session.phase() {
        Phase::Idle => return vec!["No image loaded".to_string()],
        Phase::Loaded { processing } => processing,
    };

    let mut lines = Vec::new();
    if let Some(original) = session.original() {
        lines.extend(format_details("Original", original));
    }

    let target = session.target().map(|t| t.to_string()).unwrap_or_default();
    let lock = if session.is_locked() { "on" } else { "off" };
    lines.push(format!(
        "Target: {} (aspect lock {}, quality {})",
        target,
        lock,
        session.quality()
    ));

    if processing {
        lines.push("Converting...".to_string());
    } else if let Some(converted) = session.converted() {
        lines.push(format!("Converted: {}", converted.name));
        lines.push(format!("{}{}", indent(1), size_summary(converted)));
        if let Some(line) = savings_line(session.savings_percent()) {
            lines.push(format!("{}{}", indent(1), line));
        }
    } else if session.is_stale() {
        lines.push("Converted: pending".to_string());
    } else {
        lines.push("Converted: none".to_string());
    }
    lines
}

// ============================================================================
// Batch
// ============================================================================

/// Format a single batch progress event as display lines.
pub fn format_batch_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::Converted { index, report } => {
            let mut lines = vec![
                format!(
                    "{} {} → {}",
                    format_index(*index),
                    report.original.name,
                    report.output.display()
                ),
                format!("{}Original: {}", indent(1), size_summary(&report.original)),
                format!("{}Converted: {}", indent(1), size_summary(&report.converted)),
            ];
            if let Some(line) = savings_line(report.savings_percent) {
                lines.push(format!("{}{}", indent(1), line));
            }
            lines
        }
        BatchEvent::Rejected {
            index,
            source,
            reason,
        } => vec![
            format!("{} {}", format_index(*index), source.display()),
            format!("{}Rejected: {}", indent(1), reason),
        ],
        BatchEvent::Failed {
            index,
            source,
            reason,
        } => vec![
            format!("{} {}", format_index(*index), source.display()),
            format!("{}Failed: {}", indent(1), reason),
        ],
    }
}

pub fn format_batch_summary(summary: &BatchSummary) -> Vec<String> {
    vec![
        String::new(),
        format!(
            "Converted {}, rejected {}, failed {}",
            summary.converted, summary.rejected, summary.failed
        ),
    ]
}

// ============================================================================
// Sweep
// ============================================================================

/// Format a quality sweep as a two-column table.
pub fn format_sweep(name: &str, target: Dimensions, points: &[SweepPoint]) -> Vec<String> {
    let mut lines = vec![format!("Quality sweep: {} at {}", name, target)];
    lines.extend(
        points
            .iter()
            .map(|p| format!("{}{:>3}  {} bytes", indent(1), p.quality, p.size)),
    );
    lines
}

// ============================================================================
// Printing
// ============================================================================

/// Write lines to any writer, one per line.
pub fn write_lines(out: &mut impl Write, lines: &[String]) -> std::io::Result<()> {
    for line in lines {
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

pub fn print_details(role: &str, details: &ImageDetails) {
    for line in format_details(role, details) {
        println!("{}", line);
    }
}

pub fn print_sweep(name: &str, target: Dimensions, points: &[SweepPoint]) {
    for line in format_sweep(name, target, points) {
        println!("{}", line);
    }
}

pub fn print_batch_summary(summary: &BatchSummary) {
    for line in format_batch_summary(summary) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::ConversionReport;
    use crate::handles::HandleStore;
    use crate::imaging::backend::tests::MockBackend;
    use crate::test_helpers::png_source;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn details(name: &str, width: u32, height: u32, size: u64, mime: &str) -> ImageDetails {
        let mut handles = HandleStore::new();
        ImageDetails {
            handle: handles.issue(Arc::from(vec![0u8])),
            size,
            name: name.to_string(),
            width,
            height,
            mime: mime.to_string(),
        }
    }

    fn loaded_session() -> Session {
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 800,
            height: 600,
        }]);
        let mut session = Session::default();
        session.upload(&backend, png_source("dawn.png")).unwrap();
        session
    }

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1000), "1000");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn savings_line_only_when_present() {
        assert_eq!(savings_line(Some(96)).as_deref(), Some("Saved ~96%"));
        assert_eq!(savings_line(None), None);
    }

    #[test]
    fn details_lines() {
        let d = details("dawn.png", 800, 600, 482113, "image/png");
        let lines = format_details("Original", &d);
        assert_eq!(
            lines,
            vec![
                "Original: dawn.png",
                "    Type: image/png",
                "    Size: 482113 bytes",
                "    Dimensions: 800x600",
                "    Aspect ratio: 1.3333",
            ]
        );
    }

    #[test]
    fn status_idle() {
        assert_eq!(format_status(&Session::default()), vec!["No image loaded"]);
    }

    #[test]
    fn status_loaded_before_first_conversion() {
        let session = loaded_session();
        let lines = format_status(&session);
        assert!(lines.contains(&"Target: 800x600 (aspect lock on, quality 75)".to_string()));
        assert_eq!(lines.last().unwrap(), "Converted: pending");
    }

    #[test]
    fn status_while_processing() {
        let mut session = loaded_session();
        session.request_conversion().unwrap();
        assert_eq!(format_status(&session).last().unwrap(), "Converting...");
    }

    #[test]
    fn status_with_output_shows_savings() {
        let backend = MockBackend::new();
        let mut session = loaded_session();
        session.set_width(10).unwrap();
        session.refresh(&backend);

        let lines = format_status(&session);
        assert!(lines.contains(&"Converted: dawn.webp".to_string()));
        assert!(lines.iter().any(|l| l.trim_start().starts_with("Saved ~")));
    }

    #[test]
    fn batch_converted_event() {
        let event = BatchEvent::Converted {
            index: 1,
            report: ConversionReport {
                source: PathBuf::from("in/dawn.png"),
                output: PathBuf::from("out/dawn.webp"),
                original: details("dawn.png", 800, 600, 1000, "image/png"),
                converted: details("dawn.webp", 400, 300, 250, "image/webp"),
                savings_percent: Some(75),
            },
        };
        assert_eq!(
            format_batch_event(&event),
            vec![
                "001 dawn.png → out/dawn.webp",
                "    Original: 800x600, 1000 bytes",
                "    Converted: 400x300, 250 bytes",
                "    Saved ~75%",
            ]
        );
    }

    #[test]
    fn batch_converted_event_without_savings() {
        let event = BatchEvent::Converted {
            index: 2,
            report: ConversionReport {
                source: PathBuf::from("tiny.gif"),
                output: PathBuf::from("tiny.webp"),
                original: details("tiny.gif", 1, 1, 40, "image/gif"),
                converted: details("tiny.webp", 1, 1, 44, "image/webp"),
                savings_percent: None,
            },
        };
        let lines = format_batch_event(&event);
        assert_eq!(lines.len(), 3);
        assert!(!lines.iter().any(|l| l.contains("Saved")));
    }

    #[test]
    fn batch_rejected_and_failed_events() {
        let rejected = BatchEvent::Rejected {
            index: 3,
            source: PathBuf::from("notes.txt"),
            reason: "not an image".to_string(),
        };
        assert_eq!(
            format_batch_event(&rejected),
            vec!["003 notes.txt", "    Rejected: not an image"]
        );

        let failed = BatchEvent::Failed {
            index: 4,
            source: PathBuf::from("broken.png"),
            reason: "Decode failed".to_string(),
        };
        assert_eq!(format_batch_event(&failed)[1], "    Failed: Decode failed");
    }

    #[test]
    fn batch_summary_line() {
        let summary = BatchSummary {
            converted: 2,
            rejected: 1,
            failed: 0,
            events: Vec::new(),
        };
        assert_eq!(
            format_batch_summary(&summary),
            vec!["", "Converted 2, rejected 1, failed 0"]
        );
    }

    #[test]
    fn sweep_table() {
        let points = [
            SweepPoint {
                quality: 1,
                size: 300,
            },
            SweepPoint {
                quality: 100,
                size: 9000,
            },
        ];
        let target = Dimensions {
            width: 64,
            height: 48,
        };
        assert_eq!(
            format_sweep("a.png", target, &points),
            vec![
                "Quality sweep: a.png at 64x48",
                "      1  300 bytes",
                "    100  9000 bytes",
            ]
        );
    }

    #[test]
    fn write_lines_to_buffer() {
        let mut buf = Vec::new();
        write_lines(&mut buf, &["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "a\nb\n");
    }
}

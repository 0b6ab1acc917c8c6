use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use rust_xlsxwriter::{Format, Workbook};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::youtube::VideoRecord;

pub const DEFAULT_REPORT_FILE: &str = "youtube_videos_evaluated.xlsx";

/// Longest string an xlsx cell accepts
const MAX_CELL_CHARS: usize = 32_767;

const HEADERS: [&str; 5] = ["Title", "Description", "Channel", "Link", "Qualitative analysis"];

/// Probe whether another process holds `path` open by opening it for append.
/// A missing file is not in use. The check never creates the file.
pub fn file_in_use(path: &Path) -> bool {
    match OpenOptions::new().append(true).open(path) {
        Ok(_) => false,
        Err(e) if e.kind() == ErrorKind::NotFound => false,
        Err(_) => true,
    }
}

/// `<stem>_<YYYYMMDD_HHMMSS>.<ext>` in the same directory as `path`
pub fn timestamped_path(path: &Path, now: DateTime<Local>) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "report".to_string());
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_else(|| "xlsx".to_string());

    path.with_file_name(format!("{}_{}.{}", stem, now.format("%Y%m%d_%H%M%S"), ext))
}

/// Where the report will actually be written
pub fn resolve_output_path(path: &Path, now: DateTime<Local>) -> PathBuf {
    if file_in_use(path) {
        let renamed = timestamped_path(path, now);
        warn!(
            target_file = %path.display(),
            renamed = %renamed.display(),
            "report file is in use, writing to a new file"
        );
        renamed
    } else {
        path.to_path_buf()
    }
}

fn truncate_cell(text: &str) -> &str {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Write one row per video under a header row. Returns the path written.
pub fn save_report(videos: &[VideoRecord], path: &Path) -> Result<PathBuf> {
    let output = resolve_output_path(path, Local::now());

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let bold = Format::new().set_bold();

    for (col, header) in HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }

    for (i, video) in videos.iter().enumerate() {
        let row = u32::try_from(i + 1)
            .map_err(|_| Error::Report("too many rows for one worksheet".to_string()))?;
        let cells = [
            video.title.as_str(),
            video.description.as_str(),
            video.channel.as_str(),
            video.link.as_str(),
            video.qualitative_analysis.as_deref().unwrap_or(""),
        ];
        for (col, value) in cells.iter().enumerate() {
            worksheet.write_string(row, col as u16, truncate_cell(value))?;
        }
    }

    workbook.save(&output)?;
    info!(file = %output.display(), rows = videos.len(), "report saved");
    Ok(output)
}

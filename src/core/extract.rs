//! Pure extraction of supported-CPU tables from release-notes markup.
//!
//! The Microsoft pages carry one `<table>` whose rows are
//! `Manufacturer | Brand | Model (| ...)`; trailing columns and header rows
//! are not data. Everything here is synchronous string work so the pipeline
//! can test it without a server.

use crate::utils::error::{EtlError, Result};
use chrono::NaiveDate;
use regex::Regex;

/// One data row of a supported-CPU table, cells already cleaned but not yet
/// interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCpuRow {
    pub manufacturer: String,
    pub brand: String,
    pub model_key: String,
}

/// Remove trademark glyphs and numbered footnote markers, then collapse the
/// remaining whitespace.
pub fn strip_noise(text: &str) -> String {
    let footnote = Regex::new(r"\[\d+\]").unwrap();
    let cleaned = footnote.replace_all(text, "");
    let cleaned = cleaned.replace(['®', '™'], "");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&reg;", "®")
        .replace("&trade;", "™")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

fn cell_text(cell_markup: &str) -> String {
    let tags = Regex::new(r"(?is)<[^>]+>").unwrap();
    let text = tags.replace_all(cell_markup, "");
    strip_noise(&decode_entities(&text))
}

/// Extract the data rows of every table on the page. Header rows (`<th>`
/// cells) and rows with fewer than three cells are skipped; columns beyond
/// the third are discarded.
pub fn extract_cpu_rows(html: &str) -> Vec<RawCpuRow> {
    let row_re = Regex::new(r"(?is)<tr[^>]*>(.*?)</tr>").unwrap();
    let cell_re = Regex::new(r"(?is)<(t[dh])[^>]*>(.*?)</t[dh]>").unwrap();

    let mut rows = Vec::new();
    for row in row_re.captures_iter(html) {
        let row_markup = &row[1];

        let mut cells = Vec::new();
        let mut is_header = false;
        for cell in cell_re.captures_iter(row_markup) {
            if cell[1].eq_ignore_ascii_case("th") {
                is_header = true;
                break;
            }
            cells.push(cell_text(&cell[2]));
        }
        if is_header || cells.len() < 3 {
            continue;
        }

        rows.push(RawCpuRow {
            manufacturer: cells[0].clone(),
            brand: cells[1].clone(),
            model_key: cells[2].clone(),
        });
    }
    rows
}

/// Document date from the page-metadata block, e.g.
/// `<ul class="metadata page-metadata"...><local-time datetime="2024-03-01T...">`.
/// Absent or unparseable metadata yields `None`; the date only decorates the
/// snapshot filename.
pub fn extract_document_date(html: &str) -> Option<NaiveDate> {
    let meta_re =
        Regex::new(r#"(?is)<ul[^>]*class="[^"]*page-metadata[^"]*"[^>]*>(.*?)</ul>"#).unwrap();
    let date_re = Regex::new(r"\d{4}-\d{2}-\d{2}").unwrap();

    let metadata = meta_re.captures(html)?;
    let found = date_re.find(metadata.get(1)?.as_str())?;
    NaiveDate::parse_from_str(found.as_str(), "%Y-%m-%d").ok()
}

/// Snapshot file stem from the page URL slug:
/// `.../windows-11-24h2-supported-intel-processors` → `windows-11-24h2-intel`.
///
/// The first Windows 11 list lives at `windows-11-supported-<vendor>-processors`
/// with no release token; it is pinned to `windows-11-21h1-<vendor>`.
pub fn file_stem_from_url(url: &str) -> Result<String> {
    let slug = url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();
    let parts: Vec<&str> = slug.split('-').collect();

    if parts.len() >= 6 {
        return Ok(format!(
            "{}-{}-{}-{}",
            parts[0], parts[1], parts[2], parts[4]
        ));
    }

    if parts.len() >= 2 {
        if let Some(vendor) = parts.iter().find(|p| **p == "intel" || **p == "amd") {
            return Ok(format!("{}-{}-21h1-{}", parts[0], parts[1], vendor));
        }
    }

    Err(EtlError::ProcessingError {
        message: format!("Cannot derive a snapshot filename from URL: {}", url),
    })
}

//! Fetched document payloads: data URI encoding and page counting.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use lopdf::Document;
use once_cell::sync::Lazy;
use regex::bytes::Regex;

const PDF_MAGIC: &[u8] = b"%PDF";
const PDF_MIME: &str = "application/pdf";
const FALLBACK_MIME: &str = "application/octet-stream";

static PAGE_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/Count\s+(\d{1,6})").expect("valid page count pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPayload {
    pub data_uri: String,
    pub mime: &'static str,
    pub byte_len: usize,
    pub page_count: u32,
}

impl DocumentPayload {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mime = sniff_mime(bytes);
        Self {
            data_uri: to_data_uri(bytes, mime),
            mime,
            byte_len: bytes.len(),
            page_count: count_pages(bytes),
        }
    }
}

pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(PDF_MAGIC) {
        PDF_MIME
    } else {
        FALLBACK_MIME
    }
}

pub fn to_data_uri(bytes: &[u8], mime: &str) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Number of pages in the document's page tree. Falls back to scanning for
/// the largest `/Count` entry when the bytes do not parse as a PDF, and to a
/// single page when neither finds anything.
pub fn count_pages(bytes: &[u8]) -> u32 {
    match Document::load_mem(bytes) {
        Ok(document) => {
            let pages = u32::try_from(document.get_pages().len()).unwrap_or(u32::MAX);
            if pages > 0 {
                return pages;
            }
            scan_page_count(bytes)
        }
        Err(err) => {
            tracing::debug!(error = %err, "page tree unreadable, scanning for /Count");
            scan_page_count(bytes)
        }
    }
}

fn scan_page_count(bytes: &[u8]) -> u32 {
    PAGE_COUNT
        .captures_iter(bytes)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| std::str::from_utf8(m.as_bytes()).ok()?.parse::<u32>().ok())
        .max()
        .unwrap_or(1)
        .max(1)
}

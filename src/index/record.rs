use serde::{Deserialize, Serialize};

use crate::remote::FetchError;

pub const PLACEHOLDER_ID: &str = "this-is-demo-file";
const PLACEHOLDER_URL: &str = "http://localhost:5173/140A015N0000000000100.pdf";
const PLACEHOLDER_TITLE: &str = "File for testing only.";

/// One row of the gazette index. Column names follow the upstream CSV header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "URL", default)]
    pub url: String,
    #[serde(rename = "วันที่", default)]
    pub date: String,
    #[serde(rename = "เรื่อง", default)]
    pub title: String,
    #[serde(rename = "เล่ม", default)]
    pub volume: String,
    #[serde(rename = "ตอน", default)]
    pub part: String,
    #[serde(rename = "ประเภท", default)]
    pub category: String,
    #[serde(rename = "หน้า", default)]
    pub page: String,
    #[serde(rename = "เล่มที่", default)]
    pub volume_number: String,
    #[serde(skip)]
    pub draft: bool,
}

impl Record {
    pub fn placeholder() -> Self {
        Self {
            id: PLACEHOLDER_ID.to_string(),
            url: PLACEHOLDER_URL.to_string(),
            date: "0".to_string(),
            title: PLACEHOLDER_TITLE.to_string(),
            volume: "0".to_string(),
            part: "0".to_string(),
            category: "0".to_string(),
            page: "0".to_string(),
            volume_number: "0".to_string(),
            draft: false,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.id == PLACEHOLDER_ID
    }

    /// Last path segment of the document URL, e.g. `140A015N0000000000100.pdf`.
    pub fn file_name(&self) -> &str {
        file_name_of(&self.url)
    }

    /// File name without its extension; the key used against the draft set.
    pub fn file_stem(&self) -> &str {
        file_stem_of(self.file_name())
    }

    /// Name of the companion markdown note (`.pdf` swapped for `.md`).
    pub fn markdown_name(&self) -> String {
        let name = self.file_name();
        match name.strip_suffix(".pdf") {
            Some(stem) => format!("{stem}.md"),
            None => format!("{name}.md"),
        }
    }
}

pub fn file_name_of(url: &str) -> &str {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    without_query
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(without_query)
}

pub fn file_stem_of(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}

/// Parses the raw index CSV. The header row is required and every row must
/// carry the same number of fields; unknown columns are ignored.
pub fn parse_records(raw: &str) -> Result<Vec<Record>, FetchError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .trim(csv::Trim::Headers)
        .from_reader(raw.trim_start_matches('\u{feff}').as_bytes());

    let mut records = Vec::new();
    for (line, row) in reader.deserialize::<Record>().enumerate() {
        let record =
            row.map_err(|err| FetchError::Parse(format!("csv row {}: {err}", line + 1)))?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const SAMPLE: &str = "id,URL,วันที่,เรื่อง,เล่ม,ตอน,ประเภท,หน้า,เล่มที่\n\
        a1,https://example.org/pdf/140/A/001.pdf,1 มกราคม 2566,ประกาศกระทรวงการคลัง,140,1 ก,ก,1,1\n\
        a2,https://example.org/pdf/140/A/002.pdf,2 มกราคม 2566,พระราชบัญญัติงบประมาณ,140,2 ก,ก,5,2\n";

    #[test]
    fn parses_thai_headers_in_column_order() {
        let records = parse_records(SAMPLE).expect("parse");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "a1");
        assert_eq!(records[0].title, "ประกาศกระทรวงการคลัง");
        assert_eq!(records[1].part, "2 ก");
        assert_eq!(records[1].volume_number, "2");
        assert!(!records[0].draft);
    }

    #[test]
    fn missing_columns_default_to_empty() {
        let records = parse_records("id,URL\nx,https://example.org/x.pdf\n").expect("parse");
        assert_eq!(records[0].title, "");
        assert_eq!(records[0].category, "");
    }

    #[test]
    fn malformed_rows_surface_as_parse_errors() {
        let raw = "id,URL\nx,https://example.org/x.pdf,extra\n";
        assert_matches!(parse_records(raw), Err(FetchError::Parse(_)));
    }

    #[test]
    fn derives_file_names_from_urls() {
        let mut record = Record::placeholder();
        assert_eq!(record.file_name(), "140A015N0000000000100.pdf");
        assert_eq!(record.file_stem(), "140A015N0000000000100");
        assert_eq!(record.markdown_name(), "140A015N0000000000100.md");

        record.url = "https://example.org/a/b/doc.pdf?download=1".into();
        assert_eq!(record.file_name(), "doc.pdf");
    }
}

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tokio::runtime::Runtime;

use crate::app::App;
use crate::config::AppConfig;
use crate::index::{IndexOptions, Record};
use crate::remote::{self, GazetteSource, HttpGazetteSource};
use crate::search::filter_by_title;
use crate::tutorial::SessionFlagStore;

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Literal, case-sensitive title filter
    #[arg()]
    pub query: Option<String>,
    /// Limit the number of records printed
    #[arg(long)]
    pub limit: Option<usize>,
    /// Only print records that have a draft note
    #[arg(long)]
    pub drafts_only: bool,
}

#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    /// Record id as listed by `ratchaview list`
    #[arg()]
    pub id: String,
    /// Directory the document and draft note are written to
    #[arg(long, default_value = ".")]
    pub out: PathBuf,
}

pub fn run_tui(config: Arc<AppConfig>) -> Result<()> {
    let source = HttpGazetteSource::new(config.sources.clone())?;
    let mut app = App::new(config, Arc::new(source), Arc::new(SessionFlagStore::new()))?;
    app.run()
}

pub fn list_records(config: Arc<AppConfig>, args: ListArgs) -> Result<()> {
    let source = HttpGazetteSource::new(config.sources.clone())?;
    let output = runtime()?.block_on(run_list(&source, &config.index, &args))?;
    print!("{output}");
    Ok(())
}

pub fn fetch_record(config: Arc<AppConfig>, args: FetchArgs) -> Result<()> {
    let source = HttpGazetteSource::new(config.sources.clone())?;
    let written = runtime()?.block_on(run_fetch(
        &source,
        &config.index,
        config.viewer.demo_document.as_ref(),
        &args,
    ))?;
    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}

fn runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting async runtime")
}

async fn run_list(
    source: &dyn GazetteSource,
    options: &IndexOptions,
    args: &ListArgs,
) -> Result<String> {
    let index = remote::load_index(source, options)
        .await
        .context("loading gazette index")?;
    let query = args.query.as_deref().unwrap_or("");
    let records = filter_by_title(index.records(), query)
        .into_iter()
        .filter(|record| !args.drafts_only || record.draft)
        .take(args.limit.unwrap_or(usize::MAX))
        .collect::<Vec<_>>();
    Ok(format_records(&records))
}

async fn run_fetch(
    source: &dyn GazetteSource,
    options: &IndexOptions,
    demo_document: Option<&PathBuf>,
    args: &FetchArgs,
) -> Result<Vec<PathBuf>> {
    let index = remote::load_index(source, options)
        .await
        .context("loading gazette index")?;
    let record = index
        .find(&args.id)
        .cloned()
        .with_context(|| format!("record {} is not in the loaded index", args.id))?;

    fs::create_dir_all(&args.out)
        .with_context(|| format!("creating output directory {}", args.out.display()))?;

    let bytes = remote::fetch_document_bytes(source, &record, demo_document)
        .await
        .with_context(|| format!("fetching {}", record.file_name()))?;
    let mut written = vec![write_output(&args.out, record.file_name(), &bytes)?];
    tracing::info!(id = %record.id, bytes = bytes.len(), "document saved");

    if record.draft {
        match remote::fetch_draft_note(source, &record).await {
            Ok(markdown) => {
                let name = record.markdown_name();
                written.push(write_output(&args.out, &name, markdown.as_bytes())?);
            }
            Err(err) => tracing::warn!(%err, id = %record.id, "draft note unavailable"),
        }
    }
    Ok(written)
}

fn write_output(dir: &Path, name: &str, contents: &[u8]) -> Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, contents).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

fn format_records(records: &[&Record]) -> String {
    if records.is_empty() {
        return "No matches found.\n".to_string();
    }
    let mut out = String::new();
    for record in records {
        let mut headline = format!("{}  {}", record.id, record.title);
        if record.draft {
            headline.push_str("  [DRAFT]");
        }
        let _ = writeln!(&mut out, "{headline}");
        if !record.is_placeholder() {
            let _ = writeln!(
                &mut out,
                "    {}  {}  {}",
                record.date,
                record.category,
                record.file_name()
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::testing::FakeSource;
    use crate::remote::FetchError;
    use tempfile::TempDir;

    type TestResult<T = ()> = Result<T>;

    const CSV: &str = "id,URL,วันที่,เรื่อง,ประเภท\n\
        1,https://example.org/pdf/a.pdf,1 มกราคม 2566,ประกาศ หนึ่ง,ก\n\
        2,https://example.org/pdf/b.pdf,2 มกราคม 2566,พระราชบัญญัติ รัฐสภา,ข\n";

    fn source() -> FakeSource {
        let mut source = FakeSource {
            csv: Some(Ok(CSV.into())),
            drafts: Some(Ok(["b.md"].into_iter().collect())),
            ..FakeSource::default()
        };
        source
            .documents
            .insert("b.pdf".into(), Ok(b"%PDF-1.4 /Count 2".to_vec()));
        source
            .notes
            .insert("b.md".into(), Ok("# ร่าง พ.ร.บ.".into()));
        source
    }

    #[tokio::test]
    async fn list_filters_by_title_and_marks_drafts() -> TestResult {
        let args = ListArgs {
            query: Some("รัฐสภา".into()),
            limit: None,
            drafts_only: false,
        };
        let output = run_list(&source(), &IndexOptions::default(), &args).await?;
        assert!(output.contains("2  พระราชบัญญัติ รัฐสภา  [DRAFT]"));
        assert!(output.contains("b.pdf"));
        assert!(!output.contains("ประกาศ หนึ่ง"));
        Ok(())
    }

    #[tokio::test]
    async fn list_respects_limit_and_draft_filter() -> TestResult {
        let args = ListArgs {
            query: None,
            limit: Some(1),
            drafts_only: false,
        };
        let output = run_list(&source(), &IndexOptions::default(), &args).await?;
        assert!(output.contains("File for testing only."));
        assert_eq!(output.lines().count(), 1);

        let args = ListArgs {
            query: Some("ประกาศ".into()),
            limit: None,
            drafts_only: true,
        };
        let output = run_list(&source(), &IndexOptions::default(), &args).await?;
        assert_eq!(output, "No matches found.\n");
        Ok(())
    }

    #[tokio::test]
    async fn fetch_writes_document_and_draft_note() -> TestResult {
        let temp = TempDir::new()?;
        let args = FetchArgs {
            id: "2".into(),
            out: temp.path().join("out"),
        };
        let written = run_fetch(&source(), &IndexOptions::default(), None, &args).await?;
        assert_eq!(written.len(), 2);
        assert_eq!(fs::read(args.out.join("b.pdf"))?, b"%PDF-1.4 /Count 2");
        assert_eq!(fs::read_to_string(args.out.join("b.md"))?, "# ร่าง พ.ร.บ.");
        Ok(())
    }

    #[tokio::test]
    async fn fetch_copies_demo_document_bytes_unchanged() -> TestResult {
        let temp = TempDir::new()?;
        let demo = temp.path().join("demo.pdf");
        let bytes = b"%PDF-1.5\n\x00\xff binary body".to_vec();
        fs::write(&demo, &bytes)?;
        let source = source();
        let placeholder = Record::placeholder();
        let args = FetchArgs {
            id: placeholder.id.clone(),
            out: temp.path().join("out"),
        };
        let written = run_fetch(&source, &IndexOptions::default(), Some(&demo), &args).await?;
        assert_eq!(written, vec![args.out.join(placeholder.file_name())]);
        assert_eq!(fs::read(&written[0])?, bytes);
        assert_eq!(source.document_calls(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn fetch_reports_missing_documents() -> TestResult {
        let temp = TempDir::new()?;
        let mut source = source();
        source.documents.insert(
            "a.pdf".into(),
            Err(FetchError::Http {
                status: 404,
                body: "not found".into(),
            }),
        );
        let args = FetchArgs {
            id: "1".into(),
            out: temp.path().to_path_buf(),
        };
        let err = run_fetch(&source, &IndexOptions::default(), None, &args)
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("not found"));

        let args = FetchArgs {
            id: "missing".into(),
            out: temp.path().to_path_buf(),
        };
        let err = run_fetch(&source, &IndexOptions::default(), None, &args)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not in the loaded index"));
        Ok(())
    }
}

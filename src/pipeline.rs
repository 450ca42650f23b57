use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::assets::{resolve_assets, AssetStore};
use crate::config::Settings;
use crate::error::Result;
use crate::fetch::PageFetcher;
use crate::identity::IdentityKey;
use crate::parser;
use crate::prompt;
use crate::record::ContentRecord;
use crate::render::{self, Locale};
use crate::translate::{translate_record, Translator};

/// Everything a run needs to know about where and when it runs.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub base_dir: PathBuf,
    pub collection_dir: PathBuf,
    pub page_url: String,
    pub date: NaiveDate,
}

impl RunContext {
    pub fn new(settings: &Settings, date: NaiveDate) -> Self {
        RunContext {
            base_dir: settings.output_dir.clone(),
            collection_dir: settings.collection_dir(),
            page_url: settings.page_url.clone(),
            date,
        }
    }

    pub fn date_str(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    pub fn run_dir(&self, key: &IdentityKey) -> PathBuf {
        self.base_dir.join(key.dir_name(self.date))
    }

    pub fn doc_name(&self, locale: Locale) -> String {
        format!("daily_view_{}_{}.md", self.date_str(), locale.code())
    }

    pub fn prompt_name(&self) -> String {
        format!("ai_prompt_{}.txt", self.date_str())
    }

    /// Both dated documents present means the day is already done.
    pub fn is_complete(&self, run_dir: &Path) -> bool {
        Locale::BOTH
            .iter()
            .all(|l| run_dir.join(self.doc_name(*l)).is_file())
    }

    /// Link to a collected image as seen from a run directory. Images outside
    /// the base directory are linked by absolute path.
    fn asset_link(&self, path: &Path) -> String {
        let path = absolute_or_same(path);
        match path.strip_prefix(absolute_or_same(&self.base_dir)) {
            Ok(rel) => {
                let parts: Vec<String> = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                format!("../{}", parts.join("/"))
            }
            Err(_) => path.display().to_string(),
        }
    }
}

fn absolute_or_same(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed {
        run_dir: PathBuf,
        en_path: PathBuf,
        zh_path: PathBuf,
    },
    AlreadyDone {
        run_dir: PathBuf,
    },
}

/// Today's page, parsed and keyed.
pub struct DailyPage {
    pub record: ContentRecord,
    pub key: IdentityKey,
}

pub async fn fetch_daily<F: PageFetcher>(ctx: &RunContext, fetcher: &F) -> Result<DailyPage> {
    println!("Fetching page...");
    let html = fetcher.fetch_page(&ctx.page_url).await?;

    println!("Parsing content...");
    let record = parser::parse_page(&html)?;
    let key = IdentityKey::derive(&record);
    println!(
        "   Gate: {} [{}]",
        record.title.as_deref().unwrap_or("Unknown"),
        key.label()
    );
    info!(gate = ?key.gate(), line = ?key.line(), "identity derived");

    Ok(DailyPage { record, key })
}

/// fetch → parse → identity → duplicate check → assets → translate → render → write.
///
/// Only the page fetch happens before the duplicate check.
pub async fn run<F, T, S>(
    ctx: &RunContext,
    fetcher: &F,
    translator: &T,
    store: &S,
) -> Result<RunOutcome>
where
    F: PageFetcher,
    T: Translator,
    S: AssetStore,
{
    let DailyPage { mut record, key } = fetch_daily(ctx, fetcher).await?;

    let run_dir = ctx.run_dir(&key);
    if ctx.is_complete(&run_dir) {
        println!("Already generated: {}", run_dir.display());
        info!(dir = %run_dir.display(), "duplicate run skipped");
        return Ok(RunOutcome::AlreadyDone { run_dir });
    }
    translator.ensure_ready()?;
    fs::create_dir_all(&run_dir)?;
    println!("   Directory: {}", run_dir.display());

    println!("Resolving images...");
    let assets = resolve_assets(&record, &key, fetcher, store).await;
    record.glyph_link = assets.glyph.as_deref().map(|p| ctx.asset_link(p));
    record.mandala_link = assets.mandala.as_deref().map(|p| ctx.asset_link(p));

    println!("Translating to Traditional Chinese...");
    let translated = translate_record(&record, translator).await;

    println!("Writing documents...");
    let mut written = Vec::with_capacity(2);
    for locale in Locale::BOTH {
        let source = if locale.is_source() { &record } else { &translated };
        let sections = render::layout(source, locale, ctx.date);
        debug!(
            locale = locale.code(),
            sections = ?sections.iter().map(|s| s.kind).collect::<Vec<_>>(),
            "rendered"
        );
        let markdown = render::to_markdown(&sections);

        let dated = run_dir.join(ctx.doc_name(locale));
        fs::write(&dated, &markdown)?;
        println!("   {}", dated.display());

        let alias = ctx.base_dir.join(format!("latest_{}.md", locale.code()));
        let alias_record = render::rebase_for_alias(source);
        let alias_sections = render::layout(&alias_record, locale, ctx.date);
        fs::write(&alias, render::to_markdown(&alias_sections))?;
        println!("   {}", alias.display());
        written.push(dated);
    }

    let prompt_text = prompt::prompt_artifact(&record);
    fs::write(run_dir.join(ctx.prompt_name()), &prompt_text)?;
    fs::write(ctx.base_dir.join("latest_ai_prompt.txt"), &prompt_text)?;

    let zh_path = written.pop().unwrap_or_default();
    let en_path = written.pop().unwrap_or_default();
    info!(dir = %run_dir.display(), "daily view written");
    Ok(RunOutcome::Completed {
        run_dir,
        en_path,
        zh_path,
    })
}

// ── Tests ──

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use similar::TextDiff;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::fields::{MapOptions, map_item};
use crate::mediawiki::{MediaWikiClient, NS_MAIN, WikiWriteApi, has_api_code, normalize_title};
use crate::records::{ItemCatalog, load_item_export};
use crate::report::PageResult;
use crate::retry::{RetryExecutor, Sleeper};
use crate::template::{Template, replace_all};

pub const ITEM_SYNC_SUMMARY: &str = "Automatically updating Infobox from game data";
pub const ITEM_CREATE_SUMMARY: &str = "Automatically creating item page from game data";
pub const DEFAULT_GAME_NAME: &str = "Abiotic Factor";

#[derive(Debug, Clone)]
pub struct ItemSyncOptions {
    pub template: String,
    pub summary: String,
    pub dry_run: bool,
    pub map: MapOptions,
}

impl ItemSyncOptions {
    pub fn from_config(config: &SyncConfig, dry_run: bool) -> Self {
        Self {
            template: config.item_template().to_string(),
            summary: ITEM_SYNC_SUMMARY.to_string(),
            dry_run,
            map: MapOptions {
                clear_stale_list_params: config.sync.clear_stale_list_params,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemSyncReport {
    pub success: bool,
    pub dry_run: bool,
    pub discovered: usize,
    pub edited: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub missing_records: Vec<String>,
    pub errors: Vec<String>,
    pub pages: Vec<PageResult>,
    pub retries: usize,
    pub request_count: usize,
}

pub fn sync_items(
    config: &SyncConfig,
    export_dir: &Path,
    dry_run: bool,
) -> Result<ItemSyncReport> {
    let catalog = load_item_export(&config.items_file(export_dir))?;
    let mut client = MediaWikiClient::connect(config, dry_run)?;
    let mut executor = RetryExecutor::new(config.retry_policy());
    sync_items_with_api(
        &catalog,
        &ItemSyncOptions::from_config(config, dry_run),
        &mut client,
        &mut executor,
    )
}

/// Rewrite every occurrence of the item template on every main-namespace page
/// that uses it, one edit per page. Pages are visited once, in title order.
pub fn sync_items_with_api<A: WikiWriteApi, S: Sleeper>(
    catalog: &ItemCatalog,
    options: &ItemSyncOptions,
    api: &mut A,
    executor: &mut RetryExecutor<S>,
) -> Result<ItemSyncReport> {
    let mut report = ItemSyncReport {
        success: true,
        dry_run: options.dry_run,
        discovered: 0,
        edited: 0,
        unchanged: 0,
        skipped: 0,
        missing_records: Vec::new(),
        errors: Vec::new(),
        pages: Vec::new(),
        retries: 0,
        request_count: 0,
    };
    let retries_before = executor.retries();

    let discovered = api
        .pages_using_template(&options.template, None)
        .with_context(|| format!("failed to list pages using {}", options.template))?;
    let mut seen = BTreeSet::new();
    let mut titles = Vec::new();
    for page in discovered {
        if !seen.insert(normalize_title(&page.title)) {
            continue;
        }
        if page.namespace != NS_MAIN {
            debug!(title = %page.title, namespace = page.namespace, "skipping page outside main namespace");
            report.skipped += 1;
            report.pages.push(
                PageResult::new(page.title, "skipped")
                    .with_detail(format!("namespace {}", page.namespace)),
            );
            continue;
        }
        titles.push(page.title);
    }
    titles.sort();
    report.discovered = titles.len();
    info!(template = %options.template, pages = titles.len(), "item sync started");

    for title in titles {
        let Some(record) = catalog.lookup(&title) else {
            warn!(title = %title, "no item record for page");
            report.skipped += 1;
            report.missing_records.push(title.clone());
            report
                .pages
                .push(PageResult::new(title, "skipped").with_detail("no matching item record"));
            continue;
        };

        let current = match api.get_page_contents(std::slice::from_ref(&title)) {
            Ok(mut pages) if !pages.is_empty() => pages.swap_remove(0).content,
            Ok(_) => {
                report.skipped += 1;
                report
                    .pages
                    .push(PageResult::new(title, "skipped").with_detail("page has no content"));
                continue;
            }
            Err(error) => {
                record_error(&mut report, title, &error);
                continue;
            }
        };

        let (updated, occurrences) = replace_all(&current, &options.template, |template| {
            map_item(record, template, options.map);
        });
        if occurrences == 0 {
            report.skipped += 1;
            report.pages.push(
                PageResult::new(title, "skipped").with_detail("template not found in page source"),
            );
            continue;
        }
        if updated == current {
            report.unchanged += 1;
            report.pages.push(PageResult::new(title, "unchanged"));
            continue;
        }

        if options.dry_run {
            let diff = TextDiff::from_lines(&current, &updated)
                .unified_diff()
                .context_radius(1)
                .header(&title, &title)
                .to_string();
            report.edited += 1;
            report
                .pages
                .push(PageResult::new(title, "would_update").with_detail(diff));
            continue;
        }

        let label = format!("edit {title}");
        match executor.run(&label, || api.edit_page(&title, &updated, &options.summary)) {
            Ok(()) => {
                info!(title = %title, occurrences, "updated item page");
                report.edited += 1;
                report.pages.push(PageResult::new(title, "updated"));
            }
            Err(error) => record_error(&mut report, title, &error),
        }
    }

    report.retries = executor.retries() - retries_before;
    report.request_count = api.request_count();
    Ok(report)
}

#[derive(Debug, Clone)]
pub struct CreateItemsOptions {
    pub template: String,
    pub game_name: String,
    pub summary: String,
    pub dry_run: bool,
}

impl CreateItemsOptions {
    pub fn from_config(config: &SyncConfig, dry_run: bool) -> Self {
        Self {
            template: config.item_template().to_string(),
            game_name: config
                .sync
                .game_name
                .clone()
                .unwrap_or_else(|| DEFAULT_GAME_NAME.to_string()),
            summary: ITEM_CREATE_SUMMARY.to_string(),
            dry_run,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateItemsReport {
    pub success: bool,
    pub dry_run: bool,
    pub created: usize,
    pub existing: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
    pub pages: Vec<PageResult>,
    pub request_count: usize,
}

pub fn create_item_pages(
    config: &SyncConfig,
    export_dir: &Path,
    dry_run: bool,
) -> Result<CreateItemsReport> {
    let catalog = load_item_export(&config.items_file(export_dir))?;
    let mut client = MediaWikiClient::connect(config, dry_run)?;
    let mut executor = RetryExecutor::new(config.retry_policy());
    create_item_pages_with_api(
        &catalog,
        &CreateItemsOptions::from_config(config, dry_run),
        &mut client,
        &mut executor,
    )
}

pub fn item_stub(template: &str, name: &str, game_name: &str) -> String {
    let mut infobox = Template::new_multiline(template);
    infobox.set("name", name);
    format!(
        "{}\n\n'''{name}''' is an [[item]] in ''[[{game_name}]]''.\n\n{{{{craftingSection|{name}}}}}\n",
        infobox.render()
    )
}

/// Save a stub page for every named item whose page does not exist yet.
/// Existing pages are never touched: existence is checked against the wiki's
/// canonical titles and every save is create-only.
pub fn create_item_pages_with_api<A: WikiWriteApi, S: Sleeper>(
    catalog: &ItemCatalog,
    options: &CreateItemsOptions,
    api: &mut A,
    executor: &mut RetryExecutor<S>,
) -> Result<CreateItemsReport> {
    let mut report = CreateItemsReport {
        success: true,
        dry_run: options.dry_run,
        created: 0,
        existing: 0,
        skipped: 0,
        errors: Vec::new(),
        pages: Vec::new(),
        request_count: 0,
    };

    let mut seen = BTreeSet::new();
    let mut names = Vec::new();
    for (key, record) in catalog.iter() {
        let name = record.name.as_deref().map(normalize_title).unwrap_or_default();
        if name.is_empty() {
            report.skipped += 1;
            report
                .pages
                .push(PageResult::new(key, "skipped").with_detail("item record has no name"));
            continue;
        }
        if seen.insert(name.clone()) {
            names.push(name);
        }
    }

    let existing = api
        .existing_titles(&names)
        .context("failed to check which item pages exist")?;

    for name in names {
        if existing.contains(&name) {
            debug!(title = %name, "item page already exists");
            report.existing += 1;
            report
                .pages
                .push(PageResult::new(name, "skipped").with_detail("page exists"));
            continue;
        }
        if options.dry_run {
            report.created += 1;
            report.pages.push(PageResult::new(name, "would_create"));
            continue;
        }

        let text = item_stub(&options.template, &name, &options.game_name);
        let label = format!("create {name}");
        match executor.run(&label, || api.create_page(&name, &text, &options.summary)) {
            Ok(()) => {
                info!(title = %name, "created item page");
                report.created += 1;
                report.pages.push(PageResult::new(name, "created"));
            }
            Err(error) if has_api_code(&error, "articleexists") => {
                debug!(title = %name, "item page appeared before save");
                report.existing += 1;
                report
                    .pages
                    .push(PageResult::new(name, "skipped").with_detail("page exists"));
            }
            Err(error) => {
                let detail = format!("{error:#}");
                warn!(title = %name, error = %detail, "item page creation failed");
                report.success = false;
                report.errors.push(format!("{name}: {detail}"));
                report
                    .pages
                    .push(PageResult::new(name, "error").with_detail(detail));
            }
        }
    }

    report.request_count = api.request_count();
    Ok(report)
}

fn record_error(report: &mut ItemSyncReport, title: String, error: &anyhow::Error) {
    let detail = format!("{error:#}");
    warn!(title = %title, error = %detail, "item page sync failed");
    report.success = false;
    report.errors.push(format!("{title}: {detail}"));
    report
        .pages
        .push(PageResult::new(title, "error").with_detail(detail));
}

//! Generated recipe pages: paginate the recipe export, reconcile the desired
//! pages against the ones already on the wiki, then save and delete.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::mediawiki::{MediaWikiClient, WikiReadApi, WikiWriteApi, normalize_title};
use crate::recipes::{RecipePage, RecipePageSettings, render_recipe_pages};
use crate::reconcile::{observe_pages, reconcile};
use crate::records::{RecipeRecord, load_recipe_export};
use crate::report::PageResult;
use crate::retry::{RetryExecutor, Sleeper};

pub const RECIPE_SYNC_SUMMARY: &str = "Automatically updating recipes data";

#[derive(Debug, Clone)]
pub struct RecipeSyncOptions {
    pub settings: RecipePageSettings,
    /// Namespace the generated pages live in. Discovery never looks outside it.
    pub namespace: i32,
    pub summary: String,
    pub dry_run: bool,
}

impl RecipeSyncOptions {
    pub fn from_config(config: &SyncConfig, namespace: i32, dry_run: bool) -> Result<Self> {
        Ok(Self {
            settings: config.recipe_page_settings()?,
            namespace,
            summary: RECIPE_SYNC_SUMMARY.to_string(),
            dry_run,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeSyncReport {
    pub success: bool,
    pub dry_run: bool,
    pub recipes: usize,
    pub desired_pages: usize,
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unexpected: Vec<String>,
    pub errors: Vec<String>,
    pub pages: Vec<PageResult>,
    pub retries: usize,
    pub request_count: usize,
}

pub fn sync_recipes(
    config: &SyncConfig,
    export_dir: &Path,
    dry_run: bool,
) -> Result<RecipeSyncReport> {
    let recipes = load_recipe_export(&config.recipes_file(export_dir))?;
    let mut client = MediaWikiClient::connect(config, dry_run)?;
    let namespace = resolve_data_namespace(config, &mut client)?;
    let options = RecipeSyncOptions::from_config(config, namespace, dry_run)?;
    let mut executor = RetryExecutor::new(config.retry_policy());
    sync_recipes_with_api(&recipes, &options, &mut client, &mut executor)
}

/// Id of the data namespace: a `[wiki].custom_namespaces` entry wins,
/// otherwise the wiki's siteinfo is asked. A name neither knows is an error.
pub fn resolve_data_namespace<A: WikiReadApi>(config: &SyncConfig, api: &mut A) -> Result<i32> {
    let name = config.data_namespace();
    if let Some(id) = config.data_namespace_id() {
        return Ok(id);
    }
    let resolved = api
        .namespace_id(name)
        .with_context(|| format!("failed to look up namespace {name}"))?;
    match resolved {
        Some(id) => {
            debug!(namespace = name, id, "resolved data namespace from siteinfo");
            Ok(id)
        }
        None => bail!(
            "namespace {name} is not defined on the wiki; declare it under [[wiki.custom_namespaces]] or fix [sync].data_namespace"
        ),
    }
}

/// Render the desired recipe pages without touching the wiki.
pub fn plan_recipe_pages(config: &SyncConfig, export_dir: &Path) -> Result<Vec<RecipePage>> {
    let recipes = load_recipe_export(&config.recipes_file(export_dir))?;
    render_recipe_pages(&recipes, &config.recipe_page_settings()?)
}

pub fn sync_recipes_with_api<A: WikiWriteApi, S: Sleeper>(
    recipes: &[RecipeRecord],
    options: &RecipeSyncOptions,
    api: &mut A,
    executor: &mut RetryExecutor<S>,
) -> Result<RecipeSyncReport> {
    let pages = render_recipe_pages(recipes, &options.settings)?;
    let mut report = RecipeSyncReport {
        success: true,
        dry_run: options.dry_run,
        recipes: recipes.len(),
        desired_pages: pages.len(),
        created: 0,
        updated: 0,
        deleted: 0,
        unexpected: Vec::new(),
        errors: Vec::new(),
        pages: Vec::new(),
        retries: 0,
        request_count: 0,
    };
    let retries_before = executor.retries();

    let existing = api
        .pages_using_template(&options.settings.template, Some(options.namespace))
        .with_context(|| {
            format!(
                "failed to list pages using {}",
                options.settings.template
            )
        })?;
    let observed = observe_pages(
        existing
            .into_iter()
            .map(|page| normalize_title(&page.title)),
        &options.settings.page_prefix,
    );
    for title in &observed.unexpected {
        warn!(title = %title, "page uses the recipe template but is not a generated page; leaving it alone");
    }
    report.unexpected = observed.unexpected;

    let plan = reconcile(pages.iter().map(|page| page.index), observed.by_index);
    info!(
        recipes = recipes.len(),
        create = plan.create.len(),
        update = plan.update.len(),
        delete = plan.delete.len(),
        "recipe sync planned"
    );
    let creating = plan.create.iter().copied().collect::<BTreeSet<_>>();

    for page in &pages {
        let is_new = creating.contains(&page.index);
        if options.dry_run {
            let action = if is_new { "would_create" } else { "would_update" };
            count_save(&mut report, is_new);
            report.pages.push(
                PageResult::new(page.title.clone(), action)
                    .with_detail(format!("{} recipes", page.recipe_count)),
            );
            continue;
        }

        let label = format!("save {}", page.title);
        match executor.run(&label, || {
            api.edit_page(&page.title, &page.body, &options.summary)
        }) {
            Ok(()) => {
                let action = if is_new { "created" } else { "updated" };
                info!(title = %page.title, recipes = page.recipe_count, action, "saved recipe page");
                count_save(&mut report, is_new);
                report.pages.push(PageResult::new(page.title.clone(), action));
            }
            Err(error) => record_error(&mut report, &page.title, &error),
        }
    }

    for (index, title) in plan.delete {
        if options.dry_run {
            report.deleted += 1;
            report.pages.push(
                PageResult::new(title, "would_delete").with_detail(format!("stale chunk {index}")),
            );
            continue;
        }

        let label = format!("delete {title}");
        match executor.run(&label, || api.delete_page(&title, &options.summary)) {
            Ok(()) => {
                info!(title = %title, "deleted stale recipe page");
                report.deleted += 1;
                report.pages.push(PageResult::new(title, "deleted"));
            }
            Err(error) => record_error(&mut report, &title, &error),
        }
    }

    report.retries = executor.retries() - retries_before;
    report.request_count = api.request_count();
    Ok(report)
}

#[derive(Debug, Clone, Serialize)]
pub struct PurgeReport {
    pub success: bool,
    pub purged: usize,
    pub errors: Vec<String>,
    pub pages: Vec<PageResult>,
    pub retries: usize,
    pub request_count: usize,
}

pub fn purge_recipe_list_pages(config: &SyncConfig) -> Result<PurgeReport> {
    let mut client = MediaWikiClient::connect(config, false)?;
    let mut executor = RetryExecutor::new(config.retry_policy());
    purge_recipe_list_pages_with_api(config.recipe_list_template(), &mut client, &mut executor)
}

/// Purge every page transcluding `template` so it re-renders against the
/// freshly generated recipe data.
pub fn purge_recipe_list_pages_with_api<A: WikiWriteApi, S: Sleeper>(
    template: &str,
    api: &mut A,
    executor: &mut RetryExecutor<S>,
) -> Result<PurgeReport> {
    let retries_before = executor.retries();
    let pages = api
        .pages_using_template(template, None)
        .with_context(|| format!("failed to list pages using {template}"))?;

    let mut report = PurgeReport {
        success: true,
        purged: 0,
        errors: Vec::new(),
        pages: Vec::new(),
        retries: 0,
        request_count: 0,
    };
    for page in pages {
        let label = format!("purge {}", page.title);
        match executor.run(&label, || api.purge_page(&page.title)) {
            Ok(()) => {
                info!(title = %page.title, "purged page");
                report.purged += 1;
                report.pages.push(PageResult::new(page.title, "purged"));
            }
            Err(error) => {
                let detail = format!("{error:#}");
                warn!(title = %page.title, error = %detail, "purge failed");
                report.success = false;
                report.errors.push(format!("{}: {detail}", page.title));
                report
                    .pages
                    .push(PageResult::new(page.title, "error").with_detail(detail));
            }
        }
    }

    report.retries = executor.retries() - retries_before;
    report.request_count = api.request_count();
    Ok(report)
}

fn count_save(report: &mut RecipeSyncReport, is_new: bool) {
    if is_new {
        report.created += 1;
    } else {
        report.updated += 1;
    }
}

fn record_error(report: &mut RecipeSyncReport, title: &str, error: &anyhow::Error) {
    let detail = format!("{error:#}");
    warn!(title = %title, error = %detail, "recipe page sync failed");
    report.success = false;
    report.errors.push(format!("{title}: {detail}"));
    report
        .pages
        .push(PageResult::new(title, "error").with_detail(detail));
}

#[cfg(test)]
mod tests {
    use super::{
        RECIPE_SYNC_SUMMARY, RecipeSyncOptions, purge_recipe_list_pages_with_api,
        resolve_data_namespace, sync_recipes_with_api,
    };
    use crate::config::{CustomNamespace, SyncConfig};
    use crate::mediawiki::WikiApiError;
    use crate::mock::{MockApi, NS_DATA};
    use crate::recipes::RecipePageSettings;
    use crate::records::RecipeRecord;
    use crate::retry::tests::test_executor;

    fn recipes(count: usize) -> Vec<RecipeRecord> {
        (0..count)
            .map(|index| RecipeRecord {
                result_item: format!("Item {index}"),
                ..RecipeRecord::default()
            })
            .collect()
    }

    fn options(dry_run: bool) -> RecipeSyncOptions {
        RecipeSyncOptions {
            settings: RecipePageSettings::default(),
            namespace: NS_DATA,
            summary: RECIPE_SYNC_SUMMARY.to_string(),
            dry_run,
        }
    }

    fn generated(index: usize) -> (String, String) {
        (
            format!("Data:Recipes/{index}"),
            "{{ItemRecipe|resultItem=Old}}".to_string(),
        )
    }

    fn api_with_generated(indices: &[usize]) -> MockApi {
        let mut api = MockApi::default();
        api.pages.extend(indices.iter().map(|index| generated(*index)));
        api
    }

    #[test]
    fn hundred_twenty_recipes_over_four_pages_updates_three_and_deletes_one() {
        let mut api = api_with_generated(&[0, 1, 2, 3]);
        let mut executor = test_executor(3);

        let report =
            sync_recipes_with_api(&recipes(120), &options(false), &mut api, &mut executor)
                .expect("sync");

        assert!(report.success);
        assert_eq!(report.desired_pages, 3);
        assert_eq!((report.created, report.updated, report.deleted), (0, 3, 1));
        assert_eq!(
            api.edited_titles(),
            vec!["Data:Recipes/0", "Data:Recipes/1", "Data:Recipes/2"]
        );
        assert_eq!(api.deleted, vec!["Data:Recipes/3".to_string()]);
        assert_eq!(api.pages["Data:Recipes/2"].matches("{{ItemRecipe").count(), 20);
        assert!(api.pages["Data:Recipes/0"].contains("resultItem=Item 49|"));
        assert!(!api.pages["Data:Recipes/0"].contains("resultItem=Item 50|"));
        assert!(api.edits.iter().all(|(_, _, summary)| summary == RECIPE_SYNC_SUMMARY));
    }

    #[test]
    fn missing_pages_are_created_and_unchanged_pages_still_saved() {
        let mut api = api_with_generated(&[0]);
        let mut executor = test_executor(3);

        let first =
            sync_recipes_with_api(&recipes(60), &options(false), &mut api, &mut executor)
                .expect("first");
        assert_eq!((first.created, first.updated, first.deleted), (1, 1, 0));
        assert_eq!(first.pages[1].action, "created");

        let second =
            sync_recipes_with_api(&recipes(60), &options(false), &mut api, &mut executor)
                .expect("second");
        assert_eq!((second.created, second.updated, second.deleted), (0, 2, 0));
        assert_eq!(api.edits.len(), 4);
    }

    #[test]
    fn unexpected_titles_are_never_touched() {
        let mut api = api_with_generated(&[0]);
        api.pages.insert(
            "Data:Recipes".to_string(),
            "Usage: {{ItemRecipe|resultItem=Example}}".to_string(),
        );
        api.pages.insert(
            "Data:Recipes/007".to_string(),
            "{{ItemRecipe|resultItem=Bond}}".to_string(),
        );
        api.pages.insert(
            "Sandbox".to_string(),
            "{{ItemRecipe|resultItem=Main}}".to_string(),
        );
        let mut executor = test_executor(3);

        let report =
            sync_recipes_with_api(&[], &options(false), &mut api, &mut executor).expect("sync");

        assert_eq!(
            report.unexpected,
            vec!["Data:Recipes".to_string(), "Data:Recipes/007".to_string()]
        );
        assert_eq!(api.deleted, vec!["Data:Recipes/0".to_string()]);
        assert!(api.edits.is_empty());
        assert!(api.pages.contains_key("Data:Recipes/007"));
        assert!(api.pages.contains_key("Sandbox"));
    }

    #[test]
    fn dry_run_plans_without_writing() {
        let mut api = api_with_generated(&[0, 5]);
        let mut executor = test_executor(3);

        let report =
            sync_recipes_with_api(&recipes(51), &options(true), &mut api, &mut executor)
                .expect("sync");

        assert!(api.edits.is_empty());
        assert!(api.deleted.is_empty());
        let actions = report
            .pages
            .iter()
            .map(|page| (page.title.as_str(), page.action.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(
            actions,
            vec![
                ("Data:Recipes/0", "would_update"),
                ("Data:Recipes/1", "would_create"),
                ("Data:Recipes/5", "would_delete"),
            ]
        );
    }

    #[test]
    fn failed_delete_is_reported_after_retries() {
        let mut api = api_with_generated(&[0, 1]);
        for _ in 0..3 {
            api.fail_next(
                "Data:Recipes/1",
                WikiApiError::Transient {
                    detail: "timed out".to_string(),
                },
            );
        }
        let mut executor = test_executor(3);

        let report =
            sync_recipes_with_api(&recipes(10), &options(false), &mut api, &mut executor)
                .expect("sync");

        assert!(!report.success);
        assert_eq!(report.updated, 1);
        assert_eq!(report.deleted, 0);
        assert_eq!(report.retries, 2);
        assert!(report.errors[0].contains("Data:Recipes/1"));
        assert!(report.errors[0].contains("timed out"));
    }

    #[test]
    fn purge_retries_rate_limits_until_done() {
        let mut api = MockApi::with_pages([
            ("Recipes", "{{Recipes}}"),
            ("Crafting Bench", "== Recipes ==\n{{Recipes|station=Crafting Bench}}"),
            ("Rock", "{{Item}}"),
        ]);
        api.fail_next("Recipes", WikiApiError::Http { status: 429 });
        api.fail_next("Recipes", WikiApiError::Http { status: 429 });
        let mut executor = test_executor(5);

        let report =
            purge_recipe_list_pages_with_api("Recipes", &mut api, &mut executor).expect("purge");

        assert!(report.success);
        assert_eq!(report.purged, 2);
        assert_eq!(report.retries, 2);
        assert_eq!(
            api.purged,
            vec!["Crafting Bench".to_string(), "Recipes".to_string()]
        );
    }

    #[test]
    fn default_config_only_discovers_pages_in_the_data_namespace() {
        let config = SyncConfig::default();
        let mut api = MockApi::with_pages([
            ("Rock", "{{ItemRecipe|resultItem=Rock}}"),
            ("Stick", "{{ItemRecipe|resultItem=Stick}}"),
            ("Data:Recipes/0", "{{ItemRecipe|resultItem=Old}}"),
        ]);
        let namespace = resolve_data_namespace(&config, &mut api).expect("resolve");
        assert_eq!(namespace, NS_DATA);

        let options = RecipeSyncOptions::from_config(&config, namespace, false).expect("options");
        let mut executor = test_executor(3);
        let report =
            sync_recipes_with_api(&recipes(3), &options, &mut api, &mut executor).expect("sync");

        assert!(report.success);
        assert!(report.unexpected.is_empty());
        assert_eq!(report.updated, 1);
        assert!(api.deleted.is_empty());
        assert_eq!(api.edited_titles(), vec!["Data:Recipes/0"]);
        assert_eq!(api.pages["Rock"], "{{ItemRecipe|resultItem=Rock}}");
    }

    #[test]
    fn configured_namespace_id_skips_the_siteinfo_lookup() {
        let mut config = SyncConfig::default();
        config.sync.data_namespace = Some("Recipes".to_string());
        config.wiki.custom_namespaces = vec![CustomNamespace {
            name: "Recipes".to_string(),
            id: 3100,
        }];
        let mut api = MockApi::default();

        assert_eq!(resolve_data_namespace(&config, &mut api).expect("resolve"), 3100);
        assert_eq!(api.request_count, 0);
    }

    #[test]
    fn unknown_data_namespace_fails_instead_of_widening_discovery() {
        let mut config = SyncConfig::default();
        config.sync.data_namespace = Some("Recipes".to_string());
        let mut api = MockApi::with_pages([("Rock", "{{ItemRecipe|resultItem=Rock}}")]);

        let error = resolve_data_namespace(&config, &mut api).expect_err("must fail");
        assert!(error.to_string().contains("namespace Recipes is not defined"));
    }
}

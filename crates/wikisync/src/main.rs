use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::{CommandFactory, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use wikisync_core::config::{SyncConfig, ValueSource, load_config, resolve_config_path};
use wikisync_core::item_sync::{CreateItemsReport, ItemSyncReport, create_item_pages, sync_items};
use wikisync_core::recipe_sync::{
    PurgeReport, RecipeSyncReport, plan_recipe_pages, purge_recipe_list_pages, sync_recipes,
};
use wikisync_core::report::PageResult;

#[derive(Debug, Parser)]
#[command(
    name = "wikisync",
    version,
    about = "Sync exported game data into wiki item infoboxes and generated recipe pages"
)]
struct Cli {
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[arg(long, global = true, value_name = "PATH", help = "Directory holding Items.json and Recipes.json")]
    export_dir: Option<PathBuf>,
    #[arg(long, global = true, help = "Report planned writes without editing the wiki")]
    dry_run: bool,
    #[arg(long, global = true, help = "Print the report as JSON")]
    json: bool,
    #[arg(long, global = true, help = "Print resolved configuration sources")]
    diagnostics: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Update item infoboxes on every page using the item template")]
    Items,
    #[command(about = "Regenerate the paginated recipe data pages")]
    Recipes,
    #[command(name = "create-items", about = "Create stub pages for items without a page")]
    CreateItems,
    #[command(name = "purge-recipes", about = "Purge pages using the recipe list template")]
    PurgeRecipes,
    #[command(name = "plan-recipes", about = "Show recipe pagination without contacting the wiki")]
    PlanRecipes,
}

#[derive(Debug)]
struct Runtime {
    config: SyncConfig,
    config_path: PathBuf,
    config_source: ValueSource,
    export_dir: Option<PathBuf>,
    dry_run: bool,
    json: bool,
    diagnostics: bool,
}

impl Runtime {
    fn export_dir(&self) -> Result<PathBuf> {
        let (dir, source) = self.config.export_dir(self.export_dir.as_deref())?;
        if self.diagnostics {
            println!("export_dir: {} ({})", normalize_path(&dir), source.as_str());
        }
        Ok(dir)
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("wikisync=info,wikisync_core=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        let mut command = Cli::command();
        command.print_help()?;
        println!();
        return Ok(());
    };

    let (config_path, config_source) = resolve_config_path(cli.config.as_deref());
    let runtime = Runtime {
        config: load_config(&config_path)?,
        config_path,
        config_source,
        export_dir: cli.export_dir,
        dry_run: cli.dry_run,
        json: cli.json,
        diagnostics: cli.diagnostics,
    };
    if runtime.diagnostics {
        println!(
            "config_path: {} ({})",
            normalize_path(&runtime.config_path),
            runtime.config_source.as_str()
        );
    }

    tracing::debug!(command = ?command, dry_run = runtime.dry_run, "running command");
    match command {
        Commands::Items => run_items(&runtime),
        Commands::Recipes => run_recipes(&runtime),
        Commands::CreateItems => run_create_items(&runtime),
        Commands::PurgeRecipes => run_purge_recipes(&runtime),
        Commands::PlanRecipes => run_plan_recipes(&runtime),
    }
}

fn run_items(runtime: &Runtime) -> Result<()> {
    let report = sync_items(&runtime.config, &runtime.export_dir()?, runtime.dry_run)?;
    conclude(runtime.json, &report, report.success, "item sync", print_item_report)
}

fn run_recipes(runtime: &Runtime) -> Result<()> {
    let report = sync_recipes(&runtime.config, &runtime.export_dir()?, runtime.dry_run)?;
    conclude(runtime.json, &report, report.success, "recipe sync", print_recipe_report)
}

fn run_create_items(runtime: &Runtime) -> Result<()> {
    let report = create_item_pages(&runtime.config, &runtime.export_dir()?, runtime.dry_run)?;
    conclude(runtime.json, &report, report.success, "item page creation", print_create_report)
}

fn run_purge_recipes(runtime: &Runtime) -> Result<()> {
    if runtime.dry_run {
        println!("purge recipes");
        println!("template: {}", runtime.config.recipe_list_template());
        println!("dry_run: yes (nothing purged)");
        return Ok(());
    }
    let report = purge_recipe_list_pages(&runtime.config)?;
    conclude(runtime.json, &report, report.success, "purge", print_purge_report)
}

fn run_plan_recipes(runtime: &Runtime) -> Result<()> {
    let pages = plan_recipe_pages(&runtime.config, &runtime.export_dir()?)?;
    if runtime.json {
        return print_json(&pages);
    }
    println!("recipe plan");
    println!("pages: {}", pages.len());
    println!(
        "recipes: {}",
        pages.iter().map(|page| page.recipe_count).sum::<usize>()
    );
    for page in &pages {
        println!("  {}: {} recipes", page.title, page.recipe_count);
    }
    Ok(())
}

fn print_item_report(report: &ItemSyncReport) {
    println!("item sync");
    println!("dry_run: {}", format_flag(report.dry_run));
    println!("discovered: {}", report.discovered);
    println!("edited: {}", report.edited);
    println!("unchanged: {}", report.unchanged);
    println!("skipped: {}", report.skipped);
    println!("missing_records: {}", report.missing_records.len());
    println!("retries: {}", report.retries);
    println!("request_count: {}", report.request_count);
    print_pages(&report.pages);
    print_errors(&report.errors);
}

fn print_recipe_report(report: &RecipeSyncReport) {
    println!("recipe sync");
    println!("dry_run: {}", format_flag(report.dry_run));
    println!("recipes: {}", report.recipes);
    println!("desired_pages: {}", report.desired_pages);
    println!("created: {}", report.created);
    println!("updated: {}", report.updated);
    println!("deleted: {}", report.deleted);
    println!("retries: {}", report.retries);
    println!("request_count: {}", report.request_count);
    if !report.unexpected.is_empty() {
        println!("unexpected:");
        for title in &report.unexpected {
            println!("  - {title}");
        }
    }
    print_pages(&report.pages);
    print_errors(&report.errors);
}

fn print_create_report(report: &CreateItemsReport) {
    println!("create items");
    println!("dry_run: {}", format_flag(report.dry_run));
    println!("created: {}", report.created);
    println!("existing: {}", report.existing);
    println!("skipped: {}", report.skipped);
    println!("request_count: {}", report.request_count);
    print_pages(&report.pages);
    print_errors(&report.errors);
}

fn print_purge_report(report: &PurgeReport) {
    println!("purge recipes");
    println!("purged: {}", report.purged);
    println!("retries: {}", report.retries);
    println!("request_count: {}", report.request_count);
    print_errors(&report.errors);
}

fn print_pages(pages: &[PageResult]) {
    let changed = pages
        .iter()
        .filter(|page| page.action != "unchanged")
        .collect::<Vec<_>>();
    if changed.is_empty() {
        return;
    }
    println!("pages:");
    for page in changed {
        match &page.detail {
            Some(detail) if detail.contains('\n') => {
                println!("  - {} [{}]", page.title, page.action);
                for line in detail.lines() {
                    println!("      {line}");
                }
            }
            Some(detail) => println!("  - {} [{}] {detail}", page.title, page.action),
            None => println!("  - {} [{}]", page.title, page.action),
        }
    }
}

fn print_errors(errors: &[String]) {
    if errors.is_empty() {
        return;
    }
    println!("errors:");
    for error in errors {
        println!("  - {error}");
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn conclude<T: Serialize>(
    json: bool,
    report: &T,
    success: bool,
    operation: &str,
    print_text: fn(&T),
) -> Result<()> {
    if json {
        print_json(report)?;
    } else {
        print_text(report);
    }
    finish(success, operation)
}

fn finish(success: bool, operation: &str) -> Result<()> {
    if !success {
        bail!("{operation} finished with errors");
    }
    Ok(())
}

fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn format_flag(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

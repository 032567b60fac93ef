pub mod config;
pub mod fields;
pub mod item_sync;
pub mod mediawiki;
pub mod recipe_sync;
pub mod recipes;
pub mod reconcile;
pub mod records;
pub mod report;
pub mod retry;
pub mod template;

#[cfg(test)]
mod mock;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::mediawiki::normalize_title;

/// One entry of the item export. Numeric fields are non-negative or absent;
/// the exporter already drops most zero values.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    pub row_name: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub flavor_text: Option<String>,
    pub category: Option<String>,

    pub weight: Option<f64>,
    pub stack_size: Option<f64>,

    pub durability: Option<f64>,
    pub repair_item: Option<String>,
    pub repair_amount: Option<f64>,

    pub decay_limit: Option<f64>,
    pub decay_to_item: Option<String>,

    pub battery_capacity: Option<f64>,

    pub liquid_capacity: Option<f64>,
    #[serde(default)]
    pub allowed_liquids: Vec<String>,

    pub research_material: Option<String>,

    #[serde(default)]
    pub scrap_results: Vec<ScrapResult>,

    pub gear_slot: Option<String>,
    pub gear_armor: Option<f64>,
    pub gear_capacity: Option<f64>,
    pub gear_weight_reduction: Option<f64>,

    pub weapon_type: Option<String>,
    pub weapon_damage: Option<f64>,
    pub weapon_ammo_item: Option<String>,
    pub weapon_ammo_count: Option<f64>,
    pub weapon_secondary_action: Option<String>,

    pub consumable_hunger_fill: Option<f64>,
    pub consumable_fatigue_fill: Option<f64>,
    #[serde(alias = "consumableThirst")]
    pub consumable_thirst_fill: Option<f64>,
    pub consumable_radiation: Option<f64>,
    #[serde(default)]
    pub consumable_applies_status: Vec<String>,
    #[serde(default)]
    pub consumable_removes_status: Vec<String>,

    pub cooking_is_cookware: Option<bool>,
    pub cooking_raw_item: Option<String>,
    pub cooking_cooked_item: Option<String>,
    pub cooking_burned_item: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScrapResult {
    pub item: Option<String>,
    pub chance_to_drop: Option<f64>,
    pub quantity_min: Option<f64>,
    pub quantity_max: Option<f64>,
}

/// One entry of the recipe export. Recipes have no identity of their own:
/// their position in the export decides which generated page holds them.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecipeRecord {
    pub row_name: Option<String>,
    pub result_item: String,
    pub result_amount: Option<f64>,
    pub required_station: Option<String>,
    pub craft_duration: Option<f64>,
    #[serde(default)]
    pub ingredients: Vec<IngredientRecord>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IngredientRecord {
    #[serde(default)]
    pub ingredient_item: String,
    /// Older exports name the ingredient `item`.
    pub item: Option<String>,
    /// Current exports reuse `resultAmount` for the ingredient count; it wins
    /// over `amount` when a row carries both.
    pub result_amount: Option<f64>,
    pub amount: Option<f64>,
}

impl RecipeRecord {
    pub fn result_amount_or_default(&self) -> f64 {
        self.result_amount.unwrap_or(1.0)
    }

    pub fn craft_duration_or_default(&self) -> f64 {
        self.craft_duration.unwrap_or(0.0)
    }
}

impl IngredientRecord {
    pub fn item_name(&self) -> &str {
        if self.ingredient_item.is_empty() {
            self.item.as_deref().unwrap_or_default()
        } else {
            &self.ingredient_item
        }
    }

    pub fn amount_or_default(&self) -> f64 {
        self.result_amount.or(self.amount).unwrap_or(1.0)
    }
}

/// Item export keyed by identifier, with a secondary index by display name so
/// wiki page titles resolve either way.
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    by_key: BTreeMap<String, ItemRecord>,
    key_by_title: BTreeMap<String, String>,
}

impl ItemCatalog {
    pub fn from_records(records: BTreeMap<String, ItemRecord>) -> Self {
        let mut key_by_title = BTreeMap::new();
        for (key, record) in &records {
            if let Some(name) = record.name.as_deref() {
                let title = normalize_title(name);
                if !title.is_empty() {
                    key_by_title.entry(title).or_insert_with(|| key.clone());
                }
            }
        }
        Self {
            by_key: records,
            key_by_title,
        }
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// Resolve a page title: exact export key first, then item name.
    pub fn lookup(&self, title: &str) -> Option<&ItemRecord> {
        let title = normalize_title(title);
        if let Some(record) = self.by_key.get(&title) {
            return Some(record);
        }
        self.key_by_title
            .get(&title)
            .and_then(|key| self.by_key.get(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ItemRecord)> {
        self.by_key
            .iter()
            .map(|(key, record)| (key.as_str(), record))
    }
}

pub fn parse_item_export(content: &str) -> Result<ItemCatalog> {
    let records: BTreeMap<String, ItemRecord> =
        serde_json::from_str(content).context("failed to decode item export")?;
    Ok(ItemCatalog::from_records(records))
}

pub fn parse_recipe_export(content: &str) -> Result<Vec<RecipeRecord>> {
    serde_json::from_str(content).context("failed to decode recipe export")
}

pub fn load_item_export(path: &Path) -> Result<ItemCatalog> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read item export {}", path.display()))?;
    parse_item_export(&content).with_context(|| format!("invalid item export {}", path.display()))
}

pub fn load_recipe_export(path: &Path) -> Result<Vec<RecipeRecord>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read recipe export {}", path.display()))?;
    parse_recipe_export(&content)
        .with_context(|| format!("invalid recipe export {}", path.display()))
}

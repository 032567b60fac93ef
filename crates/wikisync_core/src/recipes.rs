//! Recipe pagination: the recipe export is split into fixed-size chunks and
//! each chunk becomes one generated `Data:Recipes/<n>` page.
//!
//! Page identity comes from position, so callers must hand in the export in
//! a stable order between runs.

use anyhow::{Result, bail};
use serde::Serialize;

use crate::fields::format_decimal;
use crate::records::RecipeRecord;
use crate::template::Template;

pub const DEFAULT_RECIPES_PER_PAGE: usize = 50;
pub const DEFAULT_RECIPE_PAGE_PREFIX: &str = "Data:Recipes/";
pub const DEFAULT_RECIPE_TEMPLATE: &str = "ItemRecipe";

const PAGE_BODY_HEADER: &str = "This page is generated using a script! DO NOT EDIT manually!

Please refer to [[Data:Recipes]] for additional information.

== Recipes ==
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk<'a, T> {
    pub index: usize,
    pub records: &'a [T],
}

/// Chunk `i` covers `[i * capacity, min((i + 1) * capacity, len))`.
pub fn paginate<T>(records: &[T], capacity: usize) -> Result<Vec<Chunk<'_, T>>> {
    if capacity == 0 {
        bail!("page capacity must be at least 1");
    }
    Ok(records
        .chunks(capacity)
        .enumerate()
        .map(|(index, records)| Chunk { index, records })
        .collect())
}

#[derive(Debug, Clone)]
pub struct RecipePageSettings {
    pub template: String,
    pub page_prefix: String,
    pub recipes_per_page: usize,
}

impl Default for RecipePageSettings {
    fn default() -> Self {
        Self {
            template: DEFAULT_RECIPE_TEMPLATE.to_string(),
            page_prefix: DEFAULT_RECIPE_PAGE_PREFIX.to_string(),
            recipes_per_page: DEFAULT_RECIPES_PER_PAGE,
        }
    }
}

impl RecipePageSettings {
    pub fn page_title(&self, index: usize) -> String {
        format!("{}{index}", self.page_prefix)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipePage {
    pub index: usize,
    pub title: String,
    pub recipe_count: usize,
    pub body: String,
}

pub fn render_recipe(recipe: &RecipeRecord, template_name: &str) -> String {
    let mut template = Template::new(template_name);
    template.set("resultItem", &recipe.result_item);
    template.set(
        "resultAmount",
        &format_decimal(recipe.result_amount_or_default()),
    );
    template.set(
        "requiredStation",
        recipe.required_station.as_deref().unwrap_or(""),
    );
    template.set(
        "craftDuration",
        &format_decimal(recipe.craft_duration_or_default()),
    );
    for (index, ingredient) in recipe.ingredients.iter().enumerate() {
        let position = index + 1;
        template.set(
            &format!("ingredient{position}Item"),
            ingredient.item_name(),
        );
        template.set(
            &format!("ingredient{position}Amount"),
            &format_decimal(ingredient.amount_or_default()),
        );
    }
    template.render()
}

pub fn render_page_body(rendered_recipes: &[String]) -> String {
    format!("{PAGE_BODY_HEADER}\n{}\n", rendered_recipes.join("\n"))
}

/// Desired generated pages in chunk order; empty when there are no recipes.
pub fn render_recipe_pages(
    recipes: &[RecipeRecord],
    settings: &RecipePageSettings,
) -> Result<Vec<RecipePage>> {
    let chunks = paginate(recipes, settings.recipes_per_page)?;
    Ok(chunks
        .into_iter()
        .map(|chunk| {
            let rendered = chunk
                .records
                .iter()
                .map(|recipe| render_recipe(recipe, &settings.template))
                .collect::<Vec<_>>();
            RecipePage {
                index: chunk.index,
                title: settings.page_title(chunk.index),
                recipe_count: chunk.records.len(),
                body: render_page_body(&rendered),
            }
        })
        .collect())
}

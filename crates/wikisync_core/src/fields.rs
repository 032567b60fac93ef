//! The item infobox schema: which record fields land in which template
//! parameters, and how each value is rendered.
//!
//! The parameter names are the contract with the wiki's display templates and
//! must stay stable.

use crate::records::ItemRecord;
use crate::template::Template;

/// `""` for zero or absent, the decimal form otherwise. The infobox shows an
/// empty field as "not applicable", so zero and missing data look the same.
pub fn format_number(value: Option<f64>) -> String {
    match value {
        Some(number) if number != 0.0 => format_decimal(number),
        _ => String::new(),
    }
}

/// Shortest decimal rendering: `5.0` renders as `5`, `0.25` as `0.25`.
pub fn format_decimal(number: f64) -> String {
    number.to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Absent,
    Text(String),
    Number(f64),
    List(Vec<String>),
    Flag(bool),
}

impl FieldValue {
    fn text(value: &Option<String>) -> Self {
        value.clone().map_or(Self::Absent, Self::Text)
    }

    fn number(value: Option<f64>) -> Self {
        value.map_or(Self::Absent, Self::Number)
    }

    fn list(values: &[String]) -> Self {
        if values.is_empty() {
            Self::Absent
        } else {
            Self::List(values.to_vec())
        }
    }

    fn flag(value: Option<bool>) -> Self {
        value.map_or(Self::Absent, Self::Flag)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Numbers rendered as-is, zero included.
    Plain,
    /// Numbers go through [`format_number`].
    ZeroSuppressed,
}

impl Format {
    pub fn render(self, value: &FieldValue) -> String {
        match value {
            FieldValue::Absent => String::new(),
            FieldValue::Text(text) => text.clone(),
            FieldValue::Number(number) => match self {
                Self::Plain => format_decimal(*number),
                Self::ZeroSuppressed => format_number(Some(*number)),
            },
            FieldValue::List(values) => values.join(", "),
            FieldValue::Flag(true) => "True".to_string(),
            FieldValue::Flag(false) => "False".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Always written; absent values become `""`.
    Always,
    /// Written only when the record carries the field at all.
    WhenPresent,
}

#[derive(Clone, Copy)]
pub struct ItemField {
    pub param: &'static str,
    pub extract: fn(&ItemRecord) -> FieldValue,
    pub format: Format,
    pub presence: Presence,
}

/// A list field expanded into 1-based indexed parameters
/// `{prefix}{i}{column}`.
#[derive(Clone, Copy)]
pub struct IndexedField {
    pub prefix: &'static str,
    pub columns: &'static [&'static str],
    pub rows: fn(&ItemRecord) -> Vec<Vec<String>>,
}

#[derive(Clone, Copy)]
pub enum FieldSpec {
    Scalar(ItemField),
    Indexed(IndexedField),
}

const fn always(
    param: &'static str,
    extract: fn(&ItemRecord) -> FieldValue,
    format: Format,
) -> FieldSpec {
    FieldSpec::Scalar(ItemField {
        param,
        extract,
        format,
        presence: Presence::Always,
    })
}

use Format::{Plain, ZeroSuppressed};

pub const ITEM_SCHEMA: &[FieldSpec] = &[
    always("name", |item| FieldValue::text(&item.name), Plain),
    always("description", |item| FieldValue::text(&item.description), Plain),
    always("flavorText", |item| FieldValue::text(&item.flavor_text), Plain),
    FieldSpec::Scalar(ItemField {
        param: "category",
        extract: |item| FieldValue::text(&item.category),
        format: Plain,
        presence: Presence::WhenPresent,
    }),
    // Status
    always("weight", |item| FieldValue::number(item.weight), ZeroSuppressed),
    always("stackSize", |item| FieldValue::number(item.stack_size), ZeroSuppressed),
    // Durability
    always("durability", |item| FieldValue::number(item.durability), ZeroSuppressed),
    always("repairItem", |item| FieldValue::text(&item.repair_item), Plain),
    always("repairAmount", |item| FieldValue::number(item.repair_amount), ZeroSuppressed),
    // Decay
    always("decayLimit", |item| FieldValue::number(item.decay_limit), ZeroSuppressed),
    always("decayToItem", |item| FieldValue::text(&item.decay_to_item), Plain),
    // Battery and liquids
    always("batteryCapacity", |item| FieldValue::number(item.battery_capacity), ZeroSuppressed),
    always("liquidCapacity", |item| FieldValue::number(item.liquid_capacity), ZeroSuppressed),
    always("allowedLiquids", |item| FieldValue::list(&item.allowed_liquids), Plain),
    always("researchMaterial", |item| FieldValue::text(&item.research_material), Plain),
    FieldSpec::Indexed(IndexedField {
        prefix: "scrapResults",
        columns: &["Item", "AmountMin", "AmountMax"],
        rows: |item| {
            item.scrap_results
                .iter()
                .map(|scrap| {
                    vec![
                        scrap.item.clone().unwrap_or_default(),
                        format_number(scrap.quantity_min),
                        format_number(scrap.quantity_max),
                    ]
                })
                .collect()
        },
    }),
    // Gear
    always("gearSlot", |item| FieldValue::text(&item.gear_slot), Plain),
    always("gearArmor", |item| FieldValue::number(item.gear_armor), Plain),
    always("gearCapacity", |item| FieldValue::number(item.gear_capacity), Plain),
    always(
        "gearWeightReduction",
        |item| FieldValue::number(item.gear_weight_reduction),
        ZeroSuppressed,
    ),
    // Weapon
    always("weaponType", |item| FieldValue::text(&item.weapon_type), Plain),
    always("weaponDamage", |item| FieldValue::number(item.weapon_damage), ZeroSuppressed),
    always("weaponAmmoItem", |item| FieldValue::text(&item.weapon_ammo_item), Plain),
    always(
        "weaponAmmoCount",
        |item| FieldValue::number(item.weapon_ammo_count),
        ZeroSuppressed,
    ),
    always(
        "weaponSecondaryAction",
        |item| FieldValue::text(&item.weapon_secondary_action),
        Plain,
    ),
    // Consumable
    always(
        "consumableHungerFill",
        |item| FieldValue::number(item.consumable_hunger_fill),
        ZeroSuppressed,
    ),
    always(
        "consumableFatigueFill",
        |item| FieldValue::number(item.consumable_fatigue_fill),
        ZeroSuppressed,
    ),
    always(
        "consumableThirstFill",
        |item| FieldValue::number(item.consumable_thirst_fill),
        ZeroSuppressed,
    ),
    always(
        "consumableRadiation",
        |item| FieldValue::number(item.consumable_radiation),
        Plain,
    ),
    FieldSpec::Indexed(IndexedField {
        prefix: "consumableAppliesStatus",
        columns: &[""],
        rows: |item| {
            item.consumable_applies_status
                .iter()
                .map(|status| vec![status.clone()])
                .collect()
        },
    }),
    FieldSpec::Indexed(IndexedField {
        prefix: "consumableRemovesStatus",
        columns: &[""],
        rows: |item| {
            item.consumable_removes_status
                .iter()
                .map(|status| vec![status.clone()])
                .collect()
        },
    }),
    // Cooking
    always(
        "cookingIsCookware",
        |item| FieldValue::flag(item.cooking_is_cookware),
        Plain,
    ),
    always("cookingRawItem", |item| FieldValue::text(&item.cooking_raw_item), Plain),
    always("cookingCookedItem", |item| FieldValue::text(&item.cooking_cooked_item), Plain),
    always("cookingBurnedItem", |item| FieldValue::text(&item.cooking_burned_item), Plain),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct MapOptions {
    /// Blank indexed parameters left over from a longer previous list.
    pub clear_stale_list_params: bool,
}

/// Write every schema field of `item` into `template`.
pub fn map_item(item: &ItemRecord, template: &mut Template, options: MapOptions) {
    for spec in ITEM_SCHEMA {
        match spec {
            FieldSpec::Scalar(field) => {
                let value = (field.extract)(item);
                if field.presence == Presence::WhenPresent && value == FieldValue::Absent {
                    continue;
                }
                template.set(field.param, &field.format.render(&value));
            }
            FieldSpec::Indexed(field) => {
                let rows = (field.rows)(item);
                for (row_index, row) in rows.iter().enumerate() {
                    for (column, value) in field.columns.iter().zip(row) {
                        template.set(&indexed_param(field.prefix, row_index + 1, column), value);
                    }
                }
                if options.clear_stale_list_params {
                    clear_indices_beyond(template, field, rows.len());
                }
            }
        }
    }
}

pub fn indexed_param(prefix: &str, index: usize, column: &str) -> String {
    format!("{prefix}{index}{column}")
}

/// Parse `{prefix}{i}{column}` back into its 1-based index.
pub fn parse_indexed_param(name: &str, field: &IndexedField) -> Option<usize> {
    let rest = name.strip_prefix(field.prefix)?;
    let digits = rest.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let (number, column) = rest.split_at(digits);
    if !field.columns.contains(&column) {
        return None;
    }
    number.parse().ok()
}

fn clear_indices_beyond(template: &mut Template, field: &IndexedField, len: usize) {
    let stale = template
        .param_names()
        .filter(|name| parse_indexed_param(name, field).is_some_and(|index| index > len))
        .map(ToString::to_string)
        .collect::<Vec<_>>();
    for name in stale {
        template.set(&name, "");
    }
}

/// Every scalar parameter name in schema order; indexed families excluded.
pub fn scalar_params() -> impl Iterator<Item = &'static str> {
    ITEM_SCHEMA.iter().filter_map(|spec| match spec {
        FieldSpec::Scalar(field) => Some(field.param),
        FieldSpec::Indexed(_) => None,
    })
}

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

/// Declares a closed enumeration whose wire values are fixed strings.
macro_rules! closed_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($variant:ident => $wire:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $wire)] $variant),+
        }

        impl $name {
            /// Every member, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }

            /// Exact match against the wire value, ignoring surrounding whitespace.
            pub fn parse(s: &str) -> Option<Self> {
                match s.trim() {
                    $($wire => Some($name::$variant),)+
                    _ => None,
                }
            }

            pub fn wire_values() -> Vec<&'static str> {
                Self::ALL.iter().map(|v| v.as_str()).collect()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

closed_enum! {
    /// Recipe category.
    pub enum Category {
        MainCourse => "Hauptspeise",
        Salad => "Salat",
        Dessert => "Dessert",
        Soup => "Suppe",
        SideDish => "Beilage",
        Breakfast => "Frühstück",
        Snack => "Snack",
    }
}

closed_enum! {
    /// Dietary and character tags a recipe may carry.
    pub enum Tag {
        Vegetarian => "Vegetarisch",
        Vegan => "Vegan",
        GlutenFree => "Glutenfrei",
        LactoseFree => "Laktosefrei",
        Quick => "Schnell",
        Healthy => "Gesund",
        Spicy => "Würzig",
        Sweet => "Süß",
    }
}

closed_enum! {
    pub enum Difficulty {
        Easy => "Einfach",
        Medium => "Mittel",
        Hard => "Schwer",
    }
}

/// Treat an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Untrusted recipe as produced by one extraction attempt.
///
/// Every field is loosely typed so that a partially filled answer still
/// deserializes; the validator decides what is acceptable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDraft {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub cooking_time: Option<JsonValue>,
    #[serde(default)]
    pub servings: Option<JsonValue>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default, rename = "sourceUrl", alias = "sourceLocator")]
    pub source_locator: Option<String>,
    #[serde(default, rename = "imageUrl", alias = "imageReference")]
    pub image_reference: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ingredients: Vec<DraftIngredient>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub instructions: Vec<DraftInstruction>,
}

impl RecipeDraft {
    /// True when the draft carries no recipe content at all.
    pub fn is_blank(&self) -> bool {
        let blank = |s: &Option<String>| s.as_deref().map(str::trim).unwrap_or("").is_empty();
        blank(&self.title)
            && self.ingredients.iter().all(|i| blank(&i.name))
            && self.instructions.iter().all(|i| blank(&i.description))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftIngredient {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub amount: Option<JsonValue>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub component: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftInstruction {
    /// Advisory only; the validator renumbers.
    #[serde(default)]
    pub step_number: Option<JsonValue>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Recipe after schema enforcement and instruction renumbering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedRecipe {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub tags: Vec<Tag>,
    pub cooking_time: u32,
    pub servings: u32,
    pub difficulty: Option<Difficulty>,
    #[serde(rename = "sourceUrl")]
    pub source_locator: Option<String>,
    #[serde(rename = "imageUrl")]
    pub image_reference: Option<String>,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<Instruction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub amount: Option<u32>,
    pub unit: Option<String>,
    pub notes: Option<String>,
    /// Free-text group label such as "Teig" or "Füllung".
    pub component: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instruction {
    pub step_number: u32,
    pub description: String,
}

/// Ingredients sharing one component label.
#[derive(Debug, Clone, PartialEq)]
pub struct IngredientGroup<'a> {
    /// `None` is the implicit default group.
    pub component: Option<&'a str>,
    pub ingredients: Vec<&'a Ingredient>,
}

impl ValidatedRecipe {
    /// Group ingredients by component in first-appearance order, with the
    /// implicit default group first when it exists.
    pub fn ingredient_groups(&self) -> Vec<IngredientGroup<'_>> {
        let mut groups: Vec<IngredientGroup<'_>> = Vec::new();
        for ingredient in &self.ingredients {
            let component = ingredient.component.as_deref();
            match groups.iter_mut().find(|g| g.component == component) {
                Some(group) => group.ingredients.push(ingredient),
                None => groups.push(IngredientGroup {
                    component,
                    ingredients: vec![ingredient],
                }),
            }
        }
        groups.sort_by_key(|g| g.component.is_some());
        groups
    }

    /// Ingredient names, used as hints for image enhancement.
    pub fn ingredient_names(&self) -> Vec<String> {
        self.ingredients.iter().map(|i| i.name.clone()).collect()
    }
}

impl From<ValidatedRecipe> for RecipeDraft {
    fn from(recipe: ValidatedRecipe) -> Self {
        RecipeDraft {
            title: Some(recipe.title),
            description: Some(recipe.description),
            category: Some(recipe.category.as_str().to_string()),
            tags: recipe.tags.iter().map(|t| t.as_str().to_string()).collect(),
            cooking_time: Some(JsonValue::from(recipe.cooking_time)),
            servings: Some(JsonValue::from(recipe.servings)),
            difficulty: recipe.difficulty.map(|d| d.as_str().to_string()),
            source_locator: recipe.source_locator,
            image_reference: recipe.image_reference,
            ingredients: recipe
                .ingredients
                .into_iter()
                .map(|i| DraftIngredient {
                    name: Some(i.name),
                    amount: i.amount.map(JsonValue::from),
                    unit: i.unit,
                    notes: i.notes,
                    component: i.component,
                })
                .collect(),
            instructions: recipe
                .instructions
                .into_iter()
                .map(|i| DraftInstruction {
                    step_number: Some(JsonValue::from(i.step_number)),
                    description: Some(i.description),
                })
                .collect(),
        }
    }
}

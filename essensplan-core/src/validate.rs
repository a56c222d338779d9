//! Schema enforcement for untrusted recipe drafts.
//!
//! Closed enumerations are matched exactly; unknown values are reported,
//! never dropped. Numeric fields are coerced. Instructions are renumbered.

use serde_json::Value as JsonValue;

use crate::error::ValidationError;
use crate::types::{
    Category, Difficulty, Ingredient, Instruction, RecipeDraft, Tag, ValidatedRecipe,
};

/// Validate a draft, collecting every problem rather than stopping at the first.
pub fn validate(draft: &RecipeDraft) -> Result<ValidatedRecipe, Vec<ValidationError>> {
    let mut errors = Vec::new();

    let title = non_blank(draft.title.as_deref()).unwrap_or_default();
    if title.is_empty() {
        errors.push(ValidationError::new("title", "is required"));
    }

    let category = match non_blank(draft.category.as_deref()) {
        None => {
            errors.push(ValidationError::new("category", "is required"));
            None
        }
        Some(value) => {
            let parsed = Category::parse(&value);
            if parsed.is_none() {
                errors.push(unknown_value("category", &value, &Category::wire_values()));
            }
            parsed
        }
    };

    let mut tags: Vec<Tag> = Vec::new();
    for (i, raw) in draft.tags.iter().enumerate() {
        match Tag::parse(raw) {
            Some(tag) if !tags.contains(&tag) => tags.push(tag),
            Some(_) => {}
            None => errors.push(unknown_value(
                &format!("tags[{}]", i),
                raw,
                &Tag::wire_values(),
            )),
        }
    }

    let difficulty = match non_blank(draft.difficulty.as_deref()) {
        None => None,
        Some(value) => {
            let parsed = Difficulty::parse(&value);
            if parsed.is_none() {
                errors.push(unknown_value(
                    "difficulty",
                    &value,
                    &Difficulty::wire_values(),
                ));
            }
            parsed
        }
    };

    let mut ingredients = Vec::new();
    for (i, raw) in draft.ingredients.iter().enumerate() {
        let Some(name) = non_blank(raw.name.as_deref()) else {
            continue;
        };
        let amount = match parse_amount(raw.amount.as_ref()) {
            Ok(amount) => amount,
            Err(message) => {
                errors.push(ValidationError::new(
                    format!("ingredients[{}].amount", i),
                    message,
                ));
                None
            }
        };
        ingredients.push(Ingredient {
            name,
            amount,
            unit: non_blank(raw.unit.as_deref()),
            notes: non_blank(raw.notes.as_deref()),
            component: non_blank(raw.component.as_deref()),
        });
    }

    // The extractor's step numbers are advisory; input order is authoritative.
    let instructions: Vec<Instruction> = draft
        .instructions
        .iter()
        .filter_map(|i| non_blank(i.description.as_deref()))
        .zip(1u32..)
        .map(|(description, step_number)| Instruction {
            step_number,
            description,
        })
        .collect();

    let (Some(category), true) = (category, errors.is_empty()) else {
        return Err(errors);
    };

    Ok(ValidatedRecipe {
        title,
        description: non_blank(draft.description.as_deref()).unwrap_or_default(),
        category,
        tags,
        cooking_time: coerce_count(draft.cooking_time.as_ref()),
        servings: coerce_count(draft.servings.as_ref()),
        difficulty,
        source_locator: non_blank(draft.source_locator.as_deref()),
        image_reference: non_blank(draft.image_reference.as_deref()),
        ingredients,
        instructions,
    })
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn unknown_value(field: &str, value: &str, allowed: &[&str]) -> ValidationError {
    ValidationError::new(
        field,
        format!(
            "unknown value \"{}\" (allowed: {})",
            value.trim(),
            allowed.join(", ")
        ),
    )
}

/// Coerce a loosely typed count to a non-negative integer.
///
/// Numbers are rounded; strings contribute their leading digits ("45 Minuten"
/// is 45). Anything else, including negatives, becomes 0.
fn coerce_count(value: Option<&JsonValue>) -> u32 {
    match value {
        Some(JsonValue::Number(n)) => match n.as_f64() {
            Some(f) if f.is_finite() && f > 0.0 => f.round().min(u32::MAX as f64) as u32,
            _ => 0,
        },
        Some(JsonValue::String(s)) => {
            let digits: String = s
                .trim()
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            digits.parse().unwrap_or(0)
        }
        _ => 0,
    }
}

/// Parse an ingredient amount. Blank or unparseable amounts become `None`;
/// negative or fractional amounts are an error.
fn parse_amount(value: Option<&JsonValue>) -> Result<Option<u32>, String> {
    let parsed = match value {
        None | Some(JsonValue::Null) => None,
        Some(JsonValue::Number(n)) => n.as_f64(),
        Some(JsonValue::String(s)) => parse_amount_str(s),
        Some(_) => None,
    };

    match parsed {
        None => Ok(None),
        Some(f) if !f.is_finite() => Ok(None),
        Some(f) if f < 0.0 => Err(format!("must not be negative, got {}", f)),
        Some(f) if f.fract() != 0.0 => Err(format!("must be a whole number, got {}", f)),
        Some(f) if f > f64::from(u32::MAX) => Err(format!("is too large, got {}", f)),
        Some(f) => Ok(Some(f as u32)),
    }
}

fn parse_amount_str(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Some((num, den)) = s.split_once('/') {
        let num: f64 = num.trim().parse().ok()?;
        let den: f64 = den.trim().parse().ok()?;
        return (den != 0.0).then(|| num / den);
    }
    // German recipes write decimals with a comma.
    s.replace(',', ".").parse().ok()
}

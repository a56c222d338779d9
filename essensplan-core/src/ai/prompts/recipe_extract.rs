//! Prompt templates for extracting structured recipes.

use crate::types::{Category, Difficulty, Tag};

pub const RECIPE_FROM_LOCATOR_PROMPT_NAME: &str = "recipe_from_locator";
pub const RECIPE_FROM_IMAGE_PROMPT_NAME: &str = "recipe_from_image";

/// Text accompanying the image in a vision extraction request.
pub const IMAGE_INPUT_TEXT: &str = "Extract the recipe shown in this image.";

fn shared_rules() -> String {
    format!(
        r#"Rules:
- Read ingredients and their amounts exactly; put the number in "amount" as a whole number (use null and keep the quantity in "notes" when it is a fraction such as "1/2" or "1,5"), the unit in "unit" and remarks such as "optional" or "nach Geschmack" in "notes"
- If ingredients are split into parts of the dish (e.g. dough and filling), put that part's name in "component", otherwise null
- Estimate cooking time in minutes and the number of servings realistically
- category must be one of: {categories}
- tags may only contain: {tags}
- difficulty must be one of: {difficulties}
- Write clear, numbered, step-by-step instructions
- Keep the recipe's own language for titles, descriptions and instructions
- Do not include citations or links in any text field"#,
        categories = Category::wire_values().join(", "),
        tags = Tag::wire_values().join(", "),
        difficulties = Difficulty::wire_values().join(", "),
    )
}

pub fn render_locator_instructions() -> String {
    format!(
        r#"You are a recipe expert. You extract structured recipe data from web pages.

{rules}
- Find the recipe content at the given URL; if the page holds several recipes, pick the one that best matches the page
- If the page shows a photo of the finished dish, put its absolute URL in "imageUrl", otherwise null
- Set "sourceUrl" to exactly the URL given as input"#,
        rules = shared_rules()
    )
}

pub fn render_locator_input(uri: &str) -> String {
    format!("Visit this URL and extract the recipe: {}", uri)
}

pub fn render_image_instructions() -> String {
    format!(
        r#"You are a recipe expert. You read recipes from photos: handwritten cards, printed cookbook pages or screenshots.

{rules}
- Set "imageUrl" and "sourceUrl" to null; they cannot be known from an image
- If the image does not show a recipe, return an empty title, no ingredients and no instructions"#,
        rules = shared_rules()
    )
}

//! AI prompt templates.

pub mod image_enhance;
pub mod recipe_extract;

pub use image_enhance::{render_enhance_instructions, render_enhance_prompt, IMAGE_ENHANCE_PROMPT_NAME};
pub use recipe_extract::{
    render_image_instructions, render_locator_input, render_locator_instructions,
    IMAGE_INPUT_TEXT, RECIPE_FROM_IMAGE_PROMPT_NAME, RECIPE_FROM_LOCATOR_PROMPT_NAME,
};

//! Prompt templates for re-rendering a recipe photo.

pub const IMAGE_ENHANCE_PROMPT_NAME: &str = "image_enhance";

pub fn render_enhance_instructions() -> String {
    r#"You are a food photographer creating pictures of recipes for cookbooks and food blogs.
- Improve the image for an appealing presentation
- Use high-quality lighting and an attractive composition
- Add relevant ingredients and garnishes
- If the image is a photo of a cookbook page, isolate the picture of the dish (without text)"#
        .to_string()
}

/// Build the user prompt from optional hints. Blank hints are ignored.
pub fn render_enhance_prompt(title: Option<&str>, ingredients: &[String]) -> String {
    let mut prompt = String::from("Verbessere das folgende Bild.");

    if let Some(title) = title.map(str::trim).filter(|t| !t.is_empty()) {
        prompt.push_str(&format!(" Das Gericht heißt \"{}\".", title));
    }

    let names: Vec<&str> = ingredients
        .iter()
        .map(|i| i.trim())
        .filter(|i| !i.is_empty())
        .collect();
    if !names.is_empty() {
        prompt.push_str(&format!(" Die Zutaten sind: {}.", names.join(", ")));
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_without_hints() {
        assert_eq!(render_enhance_prompt(None, &[]), "Verbessere das folgende Bild.");
    }

    #[test]
    fn test_prompt_with_hints() {
        let prompt = render_enhance_prompt(
            Some(" Kaiserschmarrn "),
            &["Eier".to_string(), " ".to_string(), "Mehl".to_string()],
        );
        assert_eq!(
            prompt,
            "Verbessere das folgende Bild. Das Gericht heißt \"Kaiserschmarrn\". Die Zutaten sind: Eier, Mehl."
        );
    }

    #[test]
    fn test_blank_title_ignored() {
        assert_eq!(
            render_enhance_prompt(Some("   "), &[]),
            "Verbessere das folgende Bild."
        );
    }
}

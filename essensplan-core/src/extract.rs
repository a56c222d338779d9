//! Extraction coordinator: one capability call per import attempt.

use serde_json::{json, Value as JsonValue};
use tracing::Instrument;

use crate::ai::prompts::{
    render_image_instructions, render_locator_input, render_locator_instructions,
    IMAGE_INPUT_TEXT, RECIPE_FROM_IMAGE_PROMPT_NAME, RECIPE_FROM_LOCATOR_PROMPT_NAME,
};
use crate::ai::{AiClient, AiRequest, Tool};
use crate::error::ExtractError;
use crate::source::ImportSource;
use crate::types::{Category, Difficulty, RecipeDraft, Tag};

const SCHEMA_NAME: &str = "recipe";

/// Strict JSON schema the capability must answer in.
///
/// Enumerations are generated from the closed enums so the contract and the
/// validator cannot drift apart.
pub fn recipe_schema() -> JsonValue {
    let nullable_string = json!({ "type": ["string", "null"] });
    let mut difficulties: Vec<JsonValue> = Difficulty::wire_values()
        .into_iter()
        .map(JsonValue::from)
        .collect();
    difficulties.push(JsonValue::Null);

    json!({
        "type": "object",
        "additionalProperties": false,
        "required": [
            "title", "description", "category", "tags", "cookingTime", "servings",
            "difficulty", "sourceUrl", "imageUrl", "ingredients", "instructions"
        ],
        "properties": {
            "title": { "type": "string" },
            "description": { "type": "string" },
            "category": { "type": "string", "enum": Category::wire_values() },
            "tags": {
                "type": "array",
                "items": { "type": "string", "enum": Tag::wire_values() }
            },
            "cookingTime": { "type": "integer", "description": "Minutes" },
            "servings": { "type": "integer" },
            "difficulty": { "type": ["string", "null"], "enum": difficulties },
            "sourceUrl": nullable_string,
            "imageUrl": nullable_string,
            "ingredients": {
                "type": "array",
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "required": ["name", "amount", "unit", "notes", "component"],
                    "properties": {
                        "name": { "type": "string" },
                        "amount": { "type": ["integer", "null"] },
                        "unit": nullable_string,
                        "notes": nullable_string,
                        "component": nullable_string
                    }
                }
            },
            "instructions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "required": ["stepNumber", "description"],
                    "properties": {
                        "stepNumber": { "type": "integer" },
                        "description": { "type": "string" }
                    }
                }
            }
        }
    })
}

/// Extract a recipe draft from a normalized source.
///
/// Capability failures and empty answers are fatal for the attempt. Partially
/// filled drafts are returned as-is; the validator judges them. Never retries
/// on its own beyond what the client is configured for.
pub async fn extract(ai: &dyn AiClient, source: &ImportSource) -> Result<RecipeDraft, ExtractError> {
    let span = tracing::info_span!("extract", kind = ?source.kind());

    async move {
        let (prompt_name, request) = build_request(source);
        let response = ai.complete(prompt_name, request).await?;

        tracing::info!(
            prompt_name,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "Extraction call completed"
        );

        let text = response.text.unwrap_or_default();
        let mut draft = parse_draft(&text)?;
        apply_provenance(&mut draft, source);

        if draft.is_blank() {
            return Err(ExtractError::Nothing(
                "no recipe content was recognized".to_string(),
            ));
        }

        tracing::debug!(
            title = draft.title.as_deref().unwrap_or(""),
            ingredients = draft.ingredients.len(),
            instructions = draft.instructions.len(),
            has_image = draft.image_reference.is_some(),
            "Extracted draft"
        );

        Ok(draft)
    }
    .instrument(span)
    .await
}

fn build_request(source: &ImportSource) -> (&'static str, AiRequest) {
    match source {
        ImportSource::Locator(uri) => (
            RECIPE_FROM_LOCATOR_PROMPT_NAME,
            AiRequest::new(render_locator_instructions())
                .with_text(render_locator_input(uri))
                .with_tool(Tool::WebSearch)
                .with_json_schema(SCHEMA_NAME, recipe_schema()),
        ),
        ImportSource::Image { image, .. } => (
            RECIPE_FROM_IMAGE_PROMPT_NAME,
            AiRequest::new(render_image_instructions())
                .with_text(IMAGE_INPUT_TEXT)
                .with_image(image.encode())
                .with_json_schema(SCHEMA_NAME, recipe_schema()),
        ),
    }
}

fn parse_draft(text: &str) -> Result<RecipeDraft, ExtractError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ExtractError::Nothing("empty response".to_string()));
    }

    let value: JsonValue = serde_json::from_str(trimmed)
        .map_err(|e| ExtractError::Nothing(format!("response is not JSON: {}", e)))?;

    if !value.is_object() {
        return Err(ExtractError::Nothing(format!(
            "expected a JSON object, got {}",
            json_kind(&value)
        )));
    }

    serde_json::from_value(value)
        .map_err(|e| ExtractError::Nothing(format!("response does not match the recipe shape: {}", e)))
}

/// The capability's claims about provenance are not trusted.
fn apply_provenance(draft: &mut RecipeDraft, source: &ImportSource) {
    match source {
        ImportSource::Locator(uri) => {
            draft.source_locator = Some(uri.clone());
            draft.image_reference = draft
                .image_reference
                .take()
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty());
        }
        ImportSource::Image { .. } => {
            draft.source_locator = None;
            draft.image_reference = None;
        }
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{FakeAiClient, FakeReply, InputPart};
    use crate::source::DataUri;

    const LOCATOR: &str = "https://www.chefkoch.de/rezepte/1/Gulasch.html";

    fn gulasch_json() -> String {
        json!({
            "title": "Gulasch",
            "description": "Deftig",
            "category": "Hauptspeise",
            "tags": ["Würzig"],
            "cookingTime": 90,
            "servings": 4,
            "difficulty": "Mittel",
            "sourceUrl": "https://somewhere-else.example/",
            "imageUrl": "  https://img.example.com/gulasch.jpg ",
            "ingredients": [
                {"name": "Rindfleisch", "amount": 800, "unit": "g", "notes": null, "component": null}
            ],
            "instructions": [{"stepNumber": 1, "description": "Anbraten"}]
        })
        .to_string()
    }

    fn image_source() -> ImportSource {
        ImportSource::Image {
            image: DataUri::new("image/png", crate::image::sample_png()),
            origin_filename: None,
        }
    }

    #[tokio::test]
    async fn test_locator_extraction_pins_source() {
        let ai = FakeAiClient::new()
            .with_reply(RECIPE_FROM_LOCATOR_PROMPT_NAME, FakeReply::Text(gulasch_json()));

        let draft = extract(&ai, &ImportSource::Locator(LOCATOR.to_string()))
            .await
            .unwrap();

        assert_eq!(draft.source_locator.as_deref(), Some(LOCATOR));
        assert_eq!(
            draft.image_reference.as_deref(),
            Some("https://img.example.com/gulasch.jpg")
        );

        let calls = ai.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].request.tools, vec![Tool::WebSearch]);
        assert!(calls[0].request.input_text().contains(LOCATOR));
    }

    #[tokio::test]
    async fn test_image_extraction_clears_provenance() {
        let ai = FakeAiClient::new()
            .with_reply(RECIPE_FROM_IMAGE_PROMPT_NAME, FakeReply::Text(gulasch_json()));

        let draft = extract(&ai, &image_source()).await.unwrap();
        assert_eq!(draft.source_locator, None);
        assert_eq!(draft.image_reference, None);

        let request = &ai.calls()[0].request;
        assert!(request.tools.is_empty());
        assert!(matches!(
            &request.input[1],
            InputPart::InputImage { image_url, .. } if image_url.starts_with("data:image/png;base64,")
        ));
    }

    #[tokio::test]
    async fn test_unparseable_or_empty_output_is_nothing() {
        for reply in [
            FakeReply::Empty,
            FakeReply::Text("   ".into()),
            FakeReply::Text("null".into()),
            FakeReply::Text("[1, 2]".into()),
            FakeReply::Text("Here is your recipe: Gulasch".into()),
        ] {
            let ai = FakeAiClient::new().with_reply(RECIPE_FROM_IMAGE_PROMPT_NAME, reply.clone());
            let result = extract(&ai, &image_source()).await;
            assert!(
                matches!(result, Err(ExtractError::Nothing(_))),
                "reply {:?} gave {:?}",
                reply,
                result
            );
        }
    }

    #[tokio::test]
    async fn test_blank_recipe_is_nothing() {
        let blank = json!({"title": "", "ingredients": [], "instructions": []}).to_string();
        let ai = FakeAiClient::new().with_reply(RECIPE_FROM_IMAGE_PROMPT_NAME, FakeReply::Text(blank));
        let result = extract(&ai, &image_source()).await;
        assert!(matches!(result, Err(ExtractError::Nothing(_))));
    }

    #[tokio::test]
    async fn test_partial_draft_is_returned() {
        let partial = json!({"title": "Pfannkuchen", "category": "Brot"}).to_string();
        let ai = FakeAiClient::new()
            .with_reply(RECIPE_FROM_LOCATOR_PROMPT_NAME, FakeReply::Text(partial));
        let draft = extract(&ai, &ImportSource::Locator(LOCATOR.to_string()))
            .await
            .unwrap();
        assert_eq!(draft.category.as_deref(), Some("Brot"));
        assert!(draft.ingredients.is_empty());
    }

    #[tokio::test]
    async fn test_capability_failure_propagates() {
        let ai = FakeAiClient::new().with_reply(
            RECIPE_FROM_LOCATOR_PROMPT_NAME,
            FakeReply::Fail {
                status: 401,
                message: "Incorrect API key".into(),
            },
        );
        let result = extract(&ai, &ImportSource::Locator(LOCATOR.to_string())).await;
        match result {
            Err(ExtractError::Capability(e)) => assert!(e.is_unauthenticated()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_schema_enumerations_match_types() {
        let schema = recipe_schema();
        assert_eq!(schema["properties"]["category"]["enum"][5], "Frühstück");
        assert_eq!(
            schema["properties"]["tags"]["items"]["enum"]
                .as_array()
                .unwrap()
                .len(),
            Tag::ALL.len()
        );
        assert_eq!(schema["additionalProperties"], false);
    }
}

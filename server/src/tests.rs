//! Router tests: requests go through the full axum stack, including auth,
//! error mapping and the storage file service.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use essensplan_core::ai::prompts::{IMAGE_ENHANCE_PROMPT_NAME, RECIPE_FROM_LOCATOR_PROMPT_NAME};
use essensplan_core::image::sample_png;
use essensplan_core::{
    AiClient, AssetPipeline, EnhancementWorkflow, FakeAiClient, FakeReply, ImportService,
    LocalObjectStore, MemoryRecipeRepository, MockClient, DEFAULT_MAX_IMAGE_BYTES,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::util::ServiceExt;
use uuid::Uuid;

use crate::auth::StaticTokenVerifier;
use crate::state::UnconfiguredAi;
use crate::{app, AppState, STORAGE_ROUTE};

const TOKEN: &str = "test-token";
const OTHER_TOKEN: &str = "other-token";
const PUBLIC_HOST: &str = "http://localhost:3000";
const PAGE: &str = "https://www.chefkoch.de/rezepte/815/Zwiebelkuchen.html";
const PHOTO: &str = "https://img.chefkoch-cdn.de/zwiebelkuchen.png";

struct TestApp {
    router: Router,
    ai: Arc<FakeAiClient>,
    storage: TempDir,
}

impl TestApp {
    fn new() -> Self {
        let ai = Arc::new(FakeAiClient::new());
        Self::with_ai(ai.clone(), ai)
    }

    fn with_ai(fake: Arc<FakeAiClient>, ai: Arc<dyn AiClient>) -> Self {
        let storage = TempDir::new().unwrap();
        let store = Arc::new(LocalObjectStore::new(
            storage.path(),
            format!("{}{}", PUBLIC_HOST, STORAGE_ROUTE),
        ));
        let http = MockClient::new().with_bytes(PHOTO, sample_png());
        let assets = Arc::new(AssetPipeline::new(
            store,
            Arc::new(http),
            DEFAULT_MAX_IMAGE_BYTES,
            Duration::from_secs(3600),
        ));
        let repository = Arc::new(MemoryRecipeRepository::new());
        let sessions = StaticTokenVerifier::new()
            .with_token(TOKEN, Uuid::new_v4())
            .with_token(OTHER_TOKEN, Uuid::new_v4());

        let state = AppState {
            imports: Arc::new(ImportService::new(
                ai.clone(),
                assets.clone(),
                repository.clone(),
            )),
            enhancements: Arc::new(EnhancementWorkflow::new(ai.clone(), assets, repository)),
            ai,
            sessions: Arc::new(sessions),
            storage_root: storage.path().to_path_buf(),
        };

        Self {
            router: app(state),
            ai: fake,
            storage,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method(Method::PUT)
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method(Method::DELETE)
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Import the page and save it with its photo. Returns the created recipe.
    async fn saved_recipe(&self) -> Value {
        self.ai.push_reply(
            RECIPE_FROM_LOCATOR_PROMPT_NAME,
            FakeReply::Text(zwiebelkuchen_json(Some(PHOTO))),
        );
        let (status, preview) = self
            .post("/api/import", TOKEN, json!({"kind": "url", "content": PAGE}))
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, created) = self
            .post(
                "/api/recipes",
                TOKEN,
                json!({"recipe": preview["recipe"], "imageToken": preview["imageToken"]}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        created
    }

    fn stored_file(&self, image_url: &str) -> std::path::PathBuf {
        let prefix = format!("{}{}/", PUBLIC_HOST, STORAGE_ROUTE);
        self.storage
            .path()
            .join(image_url.strip_prefix(&prefix).unwrap())
    }
}

fn zwiebelkuchen_json(image_url: Option<&str>) -> String {
    json!({
        "title": "Zwiebelkuchen",
        "description": "Schwäbisch, mit Speck",
        "category": "Hauptspeise",
        "tags": ["Würzig"],
        "cookingTime": 90,
        "servings": 6,
        "difficulty": "Mittel",
        "sourceUrl": null,
        "imageUrl": image_url,
        "ingredients": [
            {"name": "Zwiebeln", "amount": 1, "unit": "kg", "notes": null, "component": null},
            {"name": "Speck", "amount": 150, "unit": "g", "notes": "gewürfelt", "component": null}
        ],
        "instructions": [
            {"stepNumber": 1, "description": "Zwiebeln dünsten"},
            {"stepNumber": 2, "description": "Backen"}
        ]
    })
    .to_string()
}

fn png_data_uri() -> String {
    format!("data:image/png;base64,{}", BASE64.encode(sample_png()))
}

#[tokio::test]
async fn test_missing_auth_header() {
    let app = TestApp::new();
    let (status, body) = app
        .send(
            Request::builder()
                .method(Method::POST)
                .uri("/api/import")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({"kind": "url", "content": PAGE}).to_string()))
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "MISSING_AUTH_HEADER");
    assert_eq!(app.ai.call_count(), 0);
}

#[tokio::test]
async fn test_invalid_token() {
    let app = TestApp::new();
    let (status, body) = app.get(&format!("/api/recipes/{}", Uuid::new_v4()), "nope").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_import_requires_content() {
    let app = TestApp::new();
    let (status, body) = app
        .post("/api/import", TOKEN, json!({"kind": "url", "content": "  "}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "MISSING_REQUIRED_FIELD");
    assert_eq!(body["error"]["message"], "content is required");
}

#[tokio::test]
async fn test_import_rejects_non_http_locator() {
    let app = TestApp::new();
    let (status, body) = app
        .post(
            "/api/import",
            TOKEN,
            json!({"kind": "url", "content": "ftp://chefkoch.de/rezept"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_FAILED");
    assert_eq!(body["error"]["details"][0]["field"], "content");
    assert_eq!(app.ai.call_count(), 0);
}

#[tokio::test]
async fn test_import_rejects_malformed_body() {
    let app = TestApp::new();
    let (status, body) = app
        .post("/api/import", TOKEN, json!({"kind": "fax", "content": PAGE}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn test_import_reports_validation_details() {
    let app = TestApp::new();
    let mut draft: Value = serde_json::from_str(&zwiebelkuchen_json(None)).unwrap();
    draft["category"] = json!("Brunch");
    app.ai
        .push_reply(RECIPE_FROM_LOCATOR_PROMPT_NAME, FakeReply::Text(draft.to_string()));

    let (status, body) = app
        .post("/api/import", TOKEN, json!({"kind": "url", "content": PAGE}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_FAILED");
    assert_eq!(body["error"]["details"][0]["field"], "category");
}

#[tokio::test]
async fn test_import_preview_then_save() {
    let app = TestApp::new();
    app.ai.push_reply(
        RECIPE_FROM_LOCATOR_PROMPT_NAME,
        FakeReply::Text(zwiebelkuchen_json(Some(PHOTO))),
    );

    let (status, preview) = app
        .post("/api/import", TOKEN, json!({"kind": "url", "content": PAGE}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(preview["recipe"]["sourceUrl"], PAGE);
    assert!(preview["image"]
        .as_str()
        .unwrap()
        .starts_with("data:image/png;base64,"));
    assert!(preview["imageToken"].is_string());

    // Nothing durable yet
    assert!(!app.storage.path().join("users").exists());

    let (status, created) = app
        .post(
            "/api/recipes",
            TOKEN,
            json!({"recipe": preview["recipe"], "imageToken": preview["imageToken"]}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["recipe"]["title"], "Zwiebelkuchen");
    assert!(created["recipe"]["imageUrl"].is_null());
    assert!(created.get("warnings").is_none());

    let image_url = created["imageUrl"].as_str().unwrap();
    assert!(app.stored_file(image_url).exists());

    // The committed image is served publicly
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri(image_url.strip_prefix(PUBLIC_HOST).unwrap())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let served = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(served.as_ref(), sample_png().as_slice());

    let id = created["id"].as_str().unwrap();
    let (status, fetched) = app.get(&format!("/api/recipes/{}", id), TOKEN).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["imageUrl"], image_url);

    // Another account cannot see it
    let (status, body) = app.get(&format!("/api/recipes/{}", id), OTHER_TOKEN).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_save_with_unknown_token_keeps_recipe() {
    let app = TestApp::new();
    let recipe: Value = serde_json::from_str(&zwiebelkuchen_json(None)).unwrap();

    let (status, created) = app
        .post(
            "/api/recipes",
            TOKEN,
            json!({"recipe": recipe, "imageToken": Uuid::new_v4()}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(created["imageUrl"].is_null());
    assert_eq!(created["warnings"][0]["code"], "IMAGE_COMMIT_FAILED");
}

#[tokio::test]
async fn test_discard_preview_image() {
    let app = TestApp::new();
    app.ai.push_reply(
        RECIPE_FROM_LOCATOR_PROMPT_NAME,
        FakeReply::Text(zwiebelkuchen_json(Some(PHOTO))),
    );
    let (_, preview) = app
        .post("/api/import", TOKEN, json!({"kind": "url", "content": PAGE}))
        .await;
    let token = preview["imageToken"].as_str().unwrap();

    // Only the owner can discard
    let uri = format!("/api/import/{}/discard", token);
    let (status, _) = app.post(&uri, OTHER_TOKEN, json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.post(&uri, TOKEN, json!({})).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.post(&uri, TOKEN, json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.post("/api/import/not-a-uuid/discard", TOKEN, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn test_delete_recipe_removes_image() {
    let app = TestApp::new();
    let created = app.saved_recipe().await;
    let file = app.stored_file(created["imageUrl"].as_str().unwrap());
    assert!(file.exists());

    let response = app
        .send(
            Request::builder()
                .method(Method::DELETE)
                .uri(format!("/api/recipes/{}", created["id"].as_str().unwrap()))
                .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.0, StatusCode::OK);
    assert_eq!(response.1["warnings"], json!([]));
    assert!(!file.exists());
}

#[tokio::test]
async fn test_stateless_enhance() {
    let app = TestApp::new();
    app.ai.push_reply(
        IMAGE_ENHANCE_PROMPT_NAME,
        FakeReply::Image(BASE64.encode(sample_png())),
    );

    let (status, body) = app
        .post(
            "/api/enhance",
            TOKEN,
            json!({
                "base64ImageData": png_data_uri(),
                "recipeTitle": "Zwiebelkuchen",
                "ingredients": ["Zwiebeln", "Speck"]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["enhancedImageData"]
        .as_str()
        .unwrap()
        .starts_with("data:image/jpeg;base64,"));

    let prompt = app.ai.calls()[0].request.input_text();
    assert!(prompt.contains("Das Gericht heißt \"Zwiebelkuchen\"."));
    assert!(prompt.contains("Die Zutaten sind: Zwiebeln, Speck."));
}

#[tokio::test]
async fn test_stateless_enhance_requires_image() {
    let app = TestApp::new();
    let (status, body) = app
        .post("/api/enhance", TOKEN, json!({"recipeTitle": "Zwiebelkuchen"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "MISSING_REQUIRED_FIELD");
    assert_eq!(body["error"]["message"], "base64ImageData is required");
    assert_eq!(app.ai.call_count(), 0);
}

#[tokio::test]
async fn test_stateless_enhance_without_generated_image() {
    let app = TestApp::new();
    app.ai
        .push_reply(IMAGE_ENHANCE_PROMPT_NAME, FakeReply::Text("Leider nicht".into()));

    let (status, body) = app
        .post("/api/enhance", TOKEN, json!({"base64ImageData": png_data_uri()}))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "AI_REQUEST_FAILED");
}

#[tokio::test]
async fn test_unconfigured_ai() {
    let app = TestApp::with_ai(Arc::new(FakeAiClient::new()), Arc::new(UnconfiguredAi));
    let (status, body) = app
        .post("/api/import", TOKEN, json!({"kind": "url", "content": PAGE}))
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "AI_NOT_CONFIGURED");
}

#[tokio::test]
async fn test_record_enhancement_confirm_replaces_image() {
    let app = TestApp::new();
    let created = app.saved_recipe().await;
    let id = created["id"].as_str().unwrap();
    let old_file = app.stored_file(created["imageUrl"].as_str().unwrap());

    app.ai.push_reply(
        IMAGE_ENHANCE_PROMPT_NAME,
        FakeReply::Image(BASE64.encode(sample_png())),
    );
    let (status, candidate) = app
        .post(&format!("/api/recipes/{}/image/enhance", id), TOKEN, json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(candidate["enhancedImageData"].is_string());
    let token = candidate["candidateToken"].as_str().unwrap();

    // Not saved until confirmed
    let (_, fetched) = app.get(&format!("/api/recipes/{}", id), TOKEN).await;
    assert_eq!(fetched["imageUrl"], created["imageUrl"]);

    let (status, confirmed) = app
        .post(
            &format!("/api/recipes/{}/image/enhance/{}/confirm", id, token),
            TOKEN,
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let new_url = confirmed["imageUrl"].as_str().unwrap();
    assert_ne!(new_url, created["imageUrl"].as_str().unwrap());
    assert!(app.stored_file(new_url).exists());
    assert!(!old_file.exists());

    let (_, fetched) = app.get(&format!("/api/recipes/{}", id), TOKEN).await;
    assert_eq!(fetched["imageUrl"], new_url);
}

#[tokio::test]
async fn test_record_enhancement_decline() {
    let app = TestApp::new();
    let created = app.saved_recipe().await;
    let id = created["id"].as_str().unwrap();

    app.ai.push_reply(
        IMAGE_ENHANCE_PROMPT_NAME,
        FakeReply::Image(BASE64.encode(sample_png())),
    );
    let (_, candidate) = app
        .post(&format!("/api/recipes/{}/image/enhance", id), TOKEN, json!({}))
        .await;
    let token = candidate["candidateToken"].as_str().unwrap();

    let (status, _) = app
        .post(
            &format!("/api/recipes/{}/image/enhance/{}/decline", id, token),
            TOKEN,
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app
        .post(
            &format!("/api/recipes/{}/image/enhance/{}/confirm", id, token),
            TOKEN,
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (_, fetched) = app.get(&format!("/api/recipes/{}", id), TOKEN).await;
    assert_eq!(fetched["imageUrl"], created["imageUrl"]);
}

#[tokio::test]
async fn test_enhance_record_without_image() {
    let app = TestApp::new();
    let recipe: Value = serde_json::from_str(&zwiebelkuchen_json(None)).unwrap();
    let (_, created) = app.post("/api/recipes", TOKEN, json!({"recipe": recipe})).await;

    let (status, body) = app
        .post(
            &format!("/api/recipes/{}/image/enhance", created["id"].as_str().unwrap()),
            TOKEN,
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_REQUEST");
    assert_eq!(app.ai.call_count(), 0);
}

#[tokio::test]
async fn test_cors_preflight() {
    let app = TestApp::new();
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/import")
                .header(header::ORIGIN, "https://essensplan.example")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
    let allowed = response.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS]
        .to_str()
        .unwrap();
    assert!(allowed.contains("authorization"));
    assert!(allowed.contains("apikey"));
}

#[test]
fn test_openapi_lists_every_route() {
    let spec = crate::api::openapi();
    let paths: Vec<&String> = spec.paths.paths.keys().collect();
    for expected in [
        "/api/import",
        "/api/import/{token}/discard",
        "/api/recipes",
        "/api/recipes/{id}",
        "/api/recipes/{id}/image",
        "/api/recipes/{id}/image/enhance",
        "/api/recipes/{id}/image/enhance/{token}/confirm",
        "/api/recipes/{id}/image/enhance/{token}/decline",
        "/api/enhance",
    ] {
        assert!(
            paths.iter().any(|p| p.as_str() == expected),
            "missing {}",
            expected
        );
    }
    assert!(spec
        .components
        .as_ref()
        .unwrap()
        .security_schemes
        .contains_key("bearer_auth"));
}

#[test]
fn test_openapi_lists_canonical_import_kinds() {
    let spec = serde_json::to_value(crate::api::openapi()).unwrap();
    let kinds = &spec["components"]["schemas"]["ImportKindTag"]["enum"];
    assert_eq!(kinds, &json!(["locator", "image"]));
}

#[tokio::test]
async fn test_import_accepts_canonical_and_alias_kinds() {
    let app = TestApp::new();
    for kind in ["locator", "url"] {
        app.ai.push_reply(
            RECIPE_FROM_LOCATOR_PROMPT_NAME,
            FakeReply::Text(zwiebelkuchen_json(None)),
        );
        let (status, body) = app
            .post("/api/import", TOKEN, json!({"kind": kind, "content": PAGE}))
            .await;
        assert_eq!(status, StatusCode::OK, "{}", kind);
        assert_eq!(body["kind"], "locator");
        assert_eq!(body["recipe"]["title"], "Zwiebelkuchen");
    }
}

#[tokio::test]
async fn test_replace_recipe_image() {
    let app = TestApp::new();
    let created = app.saved_recipe().await;
    let id = created["id"].as_str().unwrap();
    let old_file = app.stored_file(created["imageUrl"].as_str().unwrap());

    let (status, body) = app
        .put(
            &format!("/api/recipes/{}/image", id),
            TOKEN,
            json!({"base64ImageData": png_data_uri()}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let new_url = body["imageUrl"].as_str().unwrap();
    assert_ne!(new_url, created["imageUrl"].as_str().unwrap());
    assert!(app.stored_file(new_url).exists());
    assert!(!old_file.exists());
    assert!(body.get("warnings").is_none());

    let (_, fetched) = app.get(&format!("/api/recipes/{}", id), TOKEN).await;
    assert_eq!(fetched["imageUrl"], new_url);
}

#[tokio::test]
async fn test_replace_recipe_image_requires_data() {
    let app = TestApp::new();
    let created = app.saved_recipe().await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = app
        .put(&format!("/api/recipes/{}/image", id), TOKEN, json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "MISSING_REQUIRED_FIELD");

    let (status, body) = app
        .put(
            &format!("/api/recipes/{}/image", id),
            TOKEN,
            json!({"base64ImageData": format!("data:image/png;base64,{}", BASE64.encode("kein Bild"))}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_REQUEST");

    let (_, fetched) = app.get(&format!("/api/recipes/{}", id), TOKEN).await;
    assert_eq!(fetched["imageUrl"], created["imageUrl"]);
}

#[tokio::test]
async fn test_replace_image_of_foreign_recipe() {
    let app = TestApp::new();
    let created = app.saved_recipe().await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = app
        .put(
            &format!("/api/recipes/{}/image", id),
            OTHER_TOKEN,
            json!({"base64ImageData": png_data_uri()}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert!(app
        .stored_file(created["imageUrl"].as_str().unwrap())
        .exists());
}

#[tokio::test]
async fn test_remove_recipe_image() {
    let app = TestApp::new();
    let created = app.saved_recipe().await;
    let id = created["id"].as_str().unwrap();
    let file = app.stored_file(created["imageUrl"].as_str().unwrap());

    let (status, body) = app
        .delete(&format!("/api/recipes/{}/image", id), TOKEN)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["imageUrl"], Value::Null);
    assert_eq!(body["recipe"]["title"], "Zwiebelkuchen");
    assert!(!file.exists());

    let (_, fetched) = app.get(&format!("/api/recipes/{}", id), TOKEN).await;
    assert_eq!(fetched["imageUrl"], Value::Null);
}

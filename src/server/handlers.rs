use crate::{
    error::{Result, StudioError},
    models::{
        HistoryListResponse, HistoryQuery, HistoryWriteRequest, ImageGenerationRequest,
        ModelCatalog, StyleCatalog, WriteAck,
    },
    server::AppState,
};
use actix_web::{web, HttpResponse};
use serde_json::json;

fn log_server_error(context: &str, err: StudioError) -> StudioError {
    if !err.is_client_error() {
        log::error!("{} failed: {}", context, err);
    }
    err
}

pub async fn generate(
    state: web::Data<AppState>,
    body: web::Json<ImageGenerationRequest>,
) -> Result<HttpResponse> {
    let response = state
        .generation
        .generate(body.into_inner())
        .await
        .map_err(|e| log_server_error("Generation", e))?;
    Ok(HttpResponse::Ok().json(response))
}

pub async fn list_history(
    state: web::Data<AppState>,
    query: web::Query<HistoryQuery>,
) -> Result<HttpResponse> {
    let items = state
        .history
        .list(query.collection_id.as_deref())
        .await
        .map_err(|e| log_server_error("History read", e))?;
    Ok(HttpResponse::Ok().json(HistoryListResponse { items }))
}

pub async fn record_history(
    state: web::Data<AppState>,
    body: web::Json<HistoryWriteRequest>,
) -> Result<HttpResponse> {
    state
        .history
        .record(body.into_inner())
        .await
        .map_err(|e| log_server_error("History write", e))?;
    Ok(HttpResponse::Ok().json(WriteAck { ok: true }))
}

pub async fn models() -> HttpResponse {
    HttpResponse::Ok().json(ModelCatalog::supported())
}

pub async fn styles() -> HttpResponse {
    HttpResponse::Ok().json(StyleCatalog::presets())
}

pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    let history = match state.history.store() {
        Some(store) => {
            let healthy = store.health_check().await.unwrap_or_else(|e| {
                log::warn!("History store health check failed: {}", e);
                false
            });
            json!({ "backend": store.backend_name(), "healthy": healthy })
        }
        None => serde_json::Value::Null,
    };

    HttpResponse::Ok().json(json!({
        "status": "ok",
        "history": history,
        "mirror": state.history.is_mirroring(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        fal::InferenceProvider,
        models::{FalImageInput, FalImageOutput, HistoryItem},
        server::configure,
        services::{GenerationService, HistoryService},
        storage::MemoryHistoryStore,
    };
    use actix_web::{http::StatusCode, test, App};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    #[derive(Default)]
    struct StubProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl InferenceProvider for StubProvider {
        async fn run(&self, _route: &str, input: &FalImageInput) -> Result<FalImageOutput> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let images = (0..input.num_images)
                .map(|n| format!("\"https://fal/{}.png\"", n))
                .collect::<Vec<_>>()
                .join(",");
            serde_json::from_str(&format!("{{\"images\":[{}]}}", images))
                .map_err(|e| StudioError::ResponseError(e.to_string()))
        }
    }

    fn state(provider: Arc<StubProvider>, with_store: bool) -> AppState {
        let store = if with_store {
            Some(Arc::new(MemoryHistoryStore::new()) as Arc<dyn crate::storage::HistoryStore>)
        } else {
            None
        };
        AppState::new(GenerationService::new(provider), HistoryService::new(store))
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($state))
                    .configure(configure),
            )
            .await
        };
    }

    fn generate_body(model_id: &str) -> Value {
        json!({
            "prompt": "a lighthouse at dusk",
            "style": "Cinematic",
            "modelId": model_id,
            "aspect": "1:1",
            "resolution": 768,
            "cfg": 7,
            "steps": 30,
            "seed": 1234
        })
    }

    #[actix_web::test]
    async fn test_generate_ok() {
        let provider = Arc::new(StubProvider::default());
        let app = app!(state(provider.clone(), false));

        let req = test::TestRequest::post()
            .uri("/api/generate")
            .set_json(generate_body("flux-pro"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["images"].as_array().map(Vec::len), Some(4));
        assert_eq!(body["images"][0]["url"], "https://fal/0.png");
        assert_eq!(body["seed"], 1234);
        assert_eq!(body["width"], 768);
        assert_eq!(body["height"], 768);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[actix_web::test]
    async fn test_generate_unknown_model() {
        let provider = Arc::new(StubProvider::default());
        let app = app!(state(provider.clone(), false));

        let req = test::TestRequest::post()
            .uri("/api/generate")
            .set_json(generate_body("unknown-model"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Unsupported modelId: unknown-model");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[actix_web::test]
    async fn test_malformed_body_is_invalid_payload() {
        let app = app!(state(Arc::new(StubProvider::default()), true));

        let req = test::TestRequest::post()
            .uri("/api/history")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Invalid payload");
    }

    #[actix_web::test]
    async fn test_history_write_then_read() {
        let app = app!(state(Arc::new(StubProvider::default()), true));

        let req = test::TestRequest::post()
            .uri("/api/history")
            .set_json(json!({
                "collectionId": "abc123",
                "items": [{
                    "prompt": "a lighthouse at dusk",
                    "style": "Cinematic",
                    "modelId": "flux-pro",
                    "aspect": "1:1",
                    "seed": 1234,
                    "width": 768,
                    "height": 768,
                    "imageUrl": "https://fal/0.png"
                }]
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let ack: Value = test::read_body_json(resp).await;
        assert_eq!(ack, json!({ "ok": true }));

        let read = || {
            test::TestRequest::get()
                .uri("/api/history?collectionId=abc123")
                .to_request()
        };
        let first: HistoryListResponse =
            test::read_body_json(test::call_service(&app, read()).await).await;
        let second: HistoryListResponse =
            test::read_body_json(test::call_service(&app, read()).await).await;

        assert_eq!(first, second);
        assert_eq!(first.items.len(), 1);
        let item: &HistoryItem = &first.items[0];
        assert!(!item.id.is_empty());
        assert!(item.created_at > 0);
        assert_eq!(item.collection_id, "abc123");
        assert_eq!(item.model_id, "flux-pro");
        assert_eq!(item.style.as_deref(), Some("Cinematic"));
        assert_eq!((item.seed, item.width, item.height), (1234, 768, 768));
        assert_eq!(item.image_url, "https://fal/0.png");
    }

    #[actix_web::test]
    async fn test_history_read_without_store() {
        let app = app!(state(Arc::new(StubProvider::default()), false));

        let req = test::TestRequest::get()
            .uri("/api/history?collectionId=abc123")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "items": [] }));

        let req = test::TestRequest::get().uri("/api/history").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_history_write_status_codes() {
        for with_store in [false, true] {
            let app = app!(state(Arc::new(StubProvider::default()), with_store));
            let req = test::TestRequest::post()
                .uri("/api/history")
                .set_json(json!({ "collectionId": "abc123", "items": [] }))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }

        let app = app!(state(Arc::new(StubProvider::default()), false));
        let req = test::TestRequest::post()
            .uri("/api/history")
            .set_json(json!({
                "collectionId": "abc123",
                "items": [{ "prompt": "x", "imageUrl": "https://fal/0.png" }]
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_IMPLEMENTED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Database not configured");
    }

    #[actix_web::test]
    async fn test_catalog_and_health() {
        let app = app!(state(Arc::new(StubProvider::default()), true));

        let req = test::TestRequest::get().uri("/api/models").to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["models"].as_array().map(Vec::len), Some(3));

        let req = test::TestRequest::get().uri("/api/styles").to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["styles"][0], "Cinematic");

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["history"]["backend"], "memory");
        assert_eq!(body["mirror"], false);
    }
}

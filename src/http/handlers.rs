//! Verification endpoints.
//!
//! Each handler resolves its image slots, builds the engine payload and
//! relays the engine's answer. All slot resolution finishes before the
//! dispatch starts; the face pair is resolved concurrently and the first
//! failure cancels the other slot.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{Map, Value};
use std::future::Future;
use std::time::Instant;

use crate::error::{GatewayError, GatewayResult};
use crate::http::server::AppState;
use crate::image::slot::{CNIC_SLOT, FACE_CNIC_SLOT, SELFIE_SLOT, SHOP_SLOT};
use crate::observability::metrics;
use crate::upstream::payload::{cnic_request, face_request, shop_request};
use crate::upstream::{FACE_VERIFY_PATH, SHOP_VERIFY_PATH, VERIFY_CNIC_PATH};

/// POST /verify-cnic
pub async fn verify_cnic(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    relay("verify-cnic", async {
        let body = json_object(payload)?;
        let image = CNIC_SLOT.resolve(&body, &state.fetcher).await?;
        state.forward(VERIFY_CNIC_PATH, cnic_request(&image).into_json()).await
    })
    .await
}

/// POST /face-verify
pub async fn face_verify(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    relay("face-verify", async {
        let body = json_object(payload)?;
        let (cnic, selfie) = tokio::try_join!(
            FACE_CNIC_SLOT.resolve(&body, &state.fetcher),
            SELFIE_SLOT.resolve(&body, &state.fetcher),
        )?;
        state.forward(FACE_VERIFY_PATH, face_request(&cnic, &selfie).into_json()).await
    })
    .await
}

/// POST /shop-verify
pub async fn shop_verify(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    relay("shop-verify", async {
        let body = json_object(payload)?;
        let image = SHOP_SLOT.resolve(&body, &state.fetcher).await?;
        state.forward(SHOP_VERIFY_PATH, shop_request(&image).into_json()).await
    })
    .await
}

/// Turn the outcome into a response and record it.
async fn relay<F, T>(endpoint: &'static str, work: F) -> Response
where
    F: Future<Output = GatewayResult<T>>,
    T: IntoResponse,
{
    let started = Instant::now();
    let response = match work.await {
        Ok(upstream) => upstream.into_response(),
        Err(e) => e.into_response(),
    };
    metrics::record_request(endpoint, response.status().as_u16(), started);
    response
}

/// Accept only a JSON object body.
fn json_object(payload: Result<Json<Value>, JsonRejection>) -> GatewayResult<Map<String, Value>> {
    match payload {
        Ok(Json(Value::Object(map))) => Ok(map),
        Ok(Json(_)) => Err(GatewayError::BadRequest(
            "Request body must be a JSON object".to_string(),
        )),
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            Err(GatewayError::PayloadTooLarge(rejection.body_text()))
        }
        Err(rejection) => Err(GatewayError::BadRequest(format!(
            "Invalid JSON body: {}",
            rejection.body_text()
        ))),
    }
}

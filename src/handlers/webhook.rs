use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use tracing::{error, info, warn};

use crate::datetime::normalize_departure;
use crate::environment::AppState;
use crate::formatter::format_search_reply;
use crate::models::{
    StatusEndpoints, StatusResponse, TripSearchRequest, TripStatus, WebhookRequest,
    WebhookResponse,
};

/// The only intent this webhook fulfills.
const SEARCH_INTENT: &str = "TimVeXe";

const WEBHOOK_PATH: &str = "/api/webhook";

const REPLY_NOT_UNDERSTOOD: &str = "Xin lỗi, tôi chưa hiểu ý bạn.";
const REPLY_MISSING_ENDPOINTS: &str = "Vui lòng cho tôi biết điểm đi và điểm đến.";
const REPLY_GENERIC_FAILURE: &str = "Đã có lỗi xảy ra. Vui lòng thử lại.";

pub fn create_router(app_state: AppState) -> Router {
    // The method router answers non-POST methods on this path with 405 and
    // an Allow: POST header.
    Router::new()
        .route("/", get(handle_status))
        .route(WEBHOOK_PATH, post(handle_webhook))
        .with_state(app_state)
}

/// Root status probe for operators checking the deployment from a browser.
async fn handle_status() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "OK",
        message: "Webhook server đang hoạt động",
        endpoints: StatusEndpoints {
            webhook: WEBHOOK_PATH,
            method: "POST",
        },
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Internal failure modes of one fulfillment attempt. Translated to
/// user-facing text in exactly one place; detail stays in the logs.
#[derive(Debug, PartialEq)]
enum FulfillmentFailure {
    UnknownIntent,
    MissingEndpoints,
    UnknownLocation(String),
    BackendUnavailable,
}

impl FulfillmentFailure {
    fn into_reply(self) -> String {
        match self {
            Self::UnknownIntent => REPLY_NOT_UNDERSTOOD.to_string(),
            Self::MissingEndpoints => REPLY_MISSING_ENDPOINTS.to_string(),
            Self::UnknownLocation(name) => {
                format!("Xin lỗi, không tìm thấy địa điểm \"{name}\". Thử tên khác?")
            }
            Self::BackendUnavailable => REPLY_GENERIC_FAILURE.to_string(),
        }
    }
}

/// The platform treats any non-200 as a fulfillment outage and retries or
/// surfaces a transport error, so every outcome here is a 200 whose text is
/// the only thing that varies.
async fn handle_webhook(
    State(app_state): State<AppState>,
    payload: Result<Json<WebhookRequest>, JsonRejection>,
) -> Json<WebhookResponse> {
    let fulfillment_text = match payload {
        Ok(Json(request)) => match fulfill(&app_state, &request).await {
            Ok(reply) => reply,
            Err(failure) => failure.into_reply(),
        },
        Err(rejection) => {
            warn!(error = %rejection, "unreadable webhook payload");
            REPLY_GENERIC_FAILURE.to_string()
        }
    };
    Json(WebhookResponse { fulfillment_text })
}

async fn fulfill(
    app_state: &AppState,
    request: &WebhookRequest,
) -> Result<String, FulfillmentFailure> {
    let query_result = request
        .query_result
        .as_ref()
        .ok_or(FulfillmentFailure::UnknownIntent)?;
    let intent = query_result
        .intent
        .as_ref()
        .and_then(|intent| intent.display_name.as_deref())
        .unwrap_or_default();
    if intent != SEARCH_INTENT {
        info!(intent = %intent, "unhandled intent");
        return Err(FulfillmentFailure::UnknownIntent);
    }

    let parameters = &query_result.parameters;
    let origin = parameters.diem_di.as_ref().and_then(|param| param.as_text());
    let destination = parameters.diem_den.as_ref().and_then(|param| param.as_text());
    let (Some(origin), Some(destination)) = (origin, destination) else {
        return Err(FulfillmentFailure::MissingEndpoints);
    };

    // An unparseable departure expression means "no date constraint",
    // not a failure.
    let departure = parameters.thoi_gian.as_ref().and_then(normalize_departure);

    let start_location = app_state.locations.resolve(origin).await;
    let end_location = app_state.locations.resolve(destination).await;
    let (start_location, end_location) = match (start_location, end_location) {
        (Some(start), Some(end)) => (start, end),
        // Origin takes precedence when both sides failed.
        (None, _) => return Err(FulfillmentFailure::UnknownLocation(origin.to_string())),
        (_, None) => return Err(FulfillmentFailure::UnknownLocation(destination.to_string())),
    };
    info!(origin = start_location, destination = end_location, "locations resolved");

    let search_request = TripSearchRequest {
        start_location,
        end_location,
        status: TripStatus::OnSell,
        departure_date: departure.clone(),
    };
    let payload = app_state
        .trip_searcher
        .search(&search_request)
        .await
        .map_err(|error| {
            error!(error = %error, "trip search failed");
            FulfillmentFailure::BackendUnavailable
        })?;

    Ok(format_search_reply(
        origin,
        destination,
        departure.as_deref(),
        &payload,
        &app_state.config.backend_base_url,
    ))
}

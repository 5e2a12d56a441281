use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Inbound fulfillment request from the conversational platform. Every level
/// is optional so structurally off payloads still deserialize and fall
/// through to the default "did not understand" reply instead of a 4xx.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookRequest {
    #[serde(rename = "queryResult", default)]
    pub query_result: Option<QueryResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryResult {
    #[serde(default)]
    pub intent: Option<Intent>,
    #[serde(default)]
    pub parameters: IntentParameters,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Intent {
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IntentParameters {
    #[serde(rename = "diemDi", default)]
    pub diem_di: Option<ParamValue>,
    #[serde(rename = "diemDen", default)]
    pub diem_den: Option<ParamValue>,
    #[serde(rename = "thoiGian", default)]
    pub thoi_gian: Option<TimeExpression>,
}

/// One logical string parameter, in any of the shapes the platform sends it:
/// a bare string, an `{ "original": ... }` entity object, or an array where
/// only the first element counts.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Entity { original: String },
    Text(String),
    Many(Vec<ParamValue>),
    Other(Value),
}

impl ParamValue {
    /// The trimmed text of this parameter, or nothing when it is empty.
    pub fn as_text(&self) -> Option<&str> {
        let text = match self {
            ParamValue::Entity { original } => original,
            ParamValue::Text(value) => value,
            ParamValue::Many(values) => return values.first().and_then(ParamValue::as_text),
            ParamValue::Other(_) => return None,
        };
        let trimmed = text.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

/// The raw "when does the user want to depart" value. The platform has sent
/// this as a pre-resolved `date_time` object, a bare string in several
/// sub-formats, and an array mixing date-range descriptor objects with
/// literal timestamp strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TimeExpression {
    Resolved { date_time: String },
    Text(String),
    Candidates(Vec<Value>),
    Other(Value),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookResponse {
    #[serde(rename = "fulfillmentText")]
    pub fulfillment_text: String,
}

/// Body of the root status endpoint, for operators probing the deployment
/// by hand.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub endpoints: StatusEndpoints,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct StatusEndpoints {
    pub webhook: &'static str,
    pub method: &'static str,
}

/// A record from the remote location catalog. Records missing either field
/// are skipped when the alias map is built.
#[derive(Debug, Clone, Deserialize)]
pub struct LocationRecord {
    #[serde(rename = "locationId", default)]
    pub location_id: Option<i64>,
    #[serde(rename = "locationName", default)]
    pub location_name: Option<String>,
}

/// Both upstream services wrap their payload under one of a few conventional
/// keys, or return it bare.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ResponseEnvelope<T> {
    Result { result: T },
    Data { data: T },
    Plain(T),
}

impl<T> ResponseEnvelope<T> {
    pub fn into_inner(self) -> T {
        match self {
            ResponseEnvelope::Result { result } => result,
            ResponseEnvelope::Data { data } => data,
            ResponseEnvelope::Plain(payload) => payload,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TripSearchRequest {
    #[serde(rename = "startLocation")]
    pub start_location: i64,
    #[serde(rename = "endLocation")]
    pub end_location: i64,
    pub status: TripStatus,
    #[serde(rename = "departureDate", skip_serializing_if = "Option::is_none")]
    pub departure_date: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub enum TripStatus {
    #[serde(rename = "on_sell")]
    OnSell,
}

/// The backend returns either a list of trips or a single wrapped object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TripPayload {
    Many(Vec<Trip>),
    One(Trip),
}

/// One trip record. Numeric-ish fields stay raw `Value`s so a malformed
/// backend row cannot fail deserialization of the whole response; coercion
/// happens in the formatter.
#[derive(Debug, Clone, Deserialize)]
pub struct Trip {
    #[serde(rename = "tripId", default)]
    pub trip_id: Option<Value>,
    #[serde(rename = "operatorName", default)]
    pub operator_name: Option<String>,
    #[serde(rename = "departureTime", default)]
    pub departure_time: Option<String>,
    #[serde(rename = "arrivalEstimateTime", default)]
    pub arrival_estimate_time: Option<String>,
    #[serde(rename = "pricePerSeat", default)]
    pub price_per_seat: Option<Value>,
    #[serde(rename = "availableSeats", default)]
    pub available_seats: Option<Value>,
    #[serde(rename = "averageRating", default)]
    pub average_rating: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn param_value_reads_bare_string() {
        let value: ParamValue = serde_json::from_value(json!("Hà Nội")).unwrap();
        assert_eq!(value.as_text(), Some("Hà Nội"));
    }

    #[test]
    fn param_value_reads_entity_object() {
        let value: ParamValue =
            serde_json::from_value(json!({ "original": "Sài Gòn", "city": "TP.HCM" })).unwrap();
        assert_eq!(value.as_text(), Some("Sài Gòn"));
    }

    #[test]
    fn param_value_takes_first_array_element() {
        let value: ParamValue = serde_json::from_value(json!(["Đà Nẵng", "Huế"])).unwrap();
        assert_eq!(value.as_text(), Some("Đà Nẵng"));
    }

    #[test]
    fn param_value_empty_forms_yield_nothing() {
        let empty: ParamValue = serde_json::from_value(json!("   ")).unwrap();
        assert_eq!(empty.as_text(), None);

        let empty_list: ParamValue = serde_json::from_value(json!([])).unwrap();
        assert_eq!(empty_list.as_text(), None);

        let unknown_shape: ParamValue = serde_json::from_value(json!({ "city": "Huế" })).unwrap();
        assert_eq!(unknown_shape.as_text(), None);
    }

    #[test]
    fn envelope_unwraps_all_conventional_keys() {
        let keyed: ResponseEnvelope<Vec<i64>> =
            serde_json::from_value(json!({ "result": [1, 2] })).unwrap();
        assert_eq!(keyed.into_inner(), vec![1, 2]);

        let data: ResponseEnvelope<Vec<i64>> =
            serde_json::from_value(json!({ "data": [3] })).unwrap();
        assert_eq!(data.into_inner(), vec![3]);

        let bare: ResponseEnvelope<Vec<i64>> = serde_json::from_value(json!([4])).unwrap();
        assert_eq!(bare.into_inner(), vec![4]);
    }

    #[test]
    fn trip_payload_reads_list_and_single_object() {
        let many: TripPayload =
            serde_json::from_value(json!([{ "tripId": 1 }, { "tripId": 2 }])).unwrap();
        assert!(matches!(many, TripPayload::Many(ref trips) if trips.len() == 2));

        let one: TripPayload = serde_json::from_value(json!({ "tripId": "BX1" })).unwrap();
        assert!(matches!(one, TripPayload::One(_)));
    }

    #[test]
    fn trip_tolerates_malformed_numeric_fields() {
        let trip: Trip = serde_json::from_value(json!({
            "tripId": 7,
            "pricePerSeat": "not-a-price",
            "availableSeats": null,
        }))
        .unwrap();
        assert_eq!(trip.price_per_seat, Some(json!("not-a-price")));
        assert!(trip.operator_name.is_none());
    }

    #[test]
    fn webhook_request_tolerates_missing_levels() {
        let request: WebhookRequest = serde_json::from_value(json!({})).unwrap();
        assert!(request.query_result.is_none());

        let request: WebhookRequest =
            serde_json::from_value(json!({ "queryResult": { "parameters": {} } })).unwrap();
        let query_result = request.query_result.unwrap();
        assert!(query_result.intent.is_none());
        assert!(query_result.parameters.diem_di.is_none());
    }

    #[test]
    fn search_request_omits_absent_departure_date() {
        let request = TripSearchRequest {
            start_location: 1,
            end_location: 2,
            status: TripStatus::OnSell,
            departure_date: None,
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            json!({ "startLocation": 1, "endLocation": 2, "status": "on_sell" })
        );
    }
}

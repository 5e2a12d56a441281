//! Renders resolved trips into the Vietnamese reply text shown to the user.
//! Every field is rendered defensively: the backend has returned missing
//! operator names, stringly-typed numbers, and unparsable timestamps.

use chrono::{DateTime, FixedOffset};
use serde_json::Value;

use crate::models::{Trip, TripPayload};

const MAX_RENDERED_TRIPS: usize = 5;
const UNKNOWN_OPERATOR: &str = "Nhà xe không xác định";
const INVALID_DATE: &str = "ngày không hợp lệ";
const PRICE_NOT_NUMERIC: &str = "NaN";

/// Builds the full reply for a search result. The backend's ordering is
/// authoritative; trips are rendered in returned order, capped at
/// [`MAX_RENDERED_TRIPS`] with a trailing count of omitted ones.
pub fn format_search_reply(
    origin: &str,
    destination: &str,
    departure: Option<&str>,
    payload: &TripPayload,
    backend_base_url: &str,
) -> String {
    let trips: Vec<&Trip> = match payload {
        TripPayload::Many(list) => list.iter().collect(),
        // A single-object response without an identifier is not a usable trip.
        TripPayload::One(trip) if trip.trip_id.is_some() => vec![trip],
        TripPayload::One(_) => Vec::new(),
    };

    if trips.is_empty() {
        return format!(
            "😔 Không tìm thấy chuyến nào từ {origin} đến {destination}{}. Thử ngày khác?",
            departure_suffix(departure)
        );
    }

    let mut reply = format!(
        "🚌 Tìm thấy {} chuyến từ {origin} đến {destination}{}:\n\n",
        trips.len(),
        departure_suffix(departure)
    );
    for (index, trip) in trips.iter().take(MAX_RENDERED_TRIPS).enumerate() {
        render_trip(&mut reply, index + 1, trip, backend_base_url);
    }
    if trips.len() > MAX_RENDERED_TRIPS {
        reply.push_str(&format!(
            "... và {} chuyến khác.",
            trips.len() - MAX_RENDERED_TRIPS
        ));
    }
    reply
}

fn departure_suffix(departure: Option<&str>) -> String {
    departure
        .map(|timestamp| format!(" vào {}", format_display_time(timestamp)))
        .unwrap_or_default()
}

fn render_trip(reply: &mut String, position: usize, trip: &Trip, backend_base_url: &str) {
    let operator = trip
        .operator_name
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(UNKNOWN_OPERATOR);
    let departure = trip
        .departure_time
        .as_deref()
        .map(format_display_time)
        .unwrap_or_else(|| INVALID_DATE.to_string());
    let arrival = trip
        .arrival_estimate_time
        .as_deref()
        .map(format_display_time)
        .unwrap_or_else(|| INVALID_DATE.to_string());

    reply.push_str(&format!("{position}. 🚍 {operator}\n"));
    reply.push_str(&format!("   ⏰ {departure} → {arrival}\n"));
    reply.push_str(&format!(
        "   💰 {} VNĐ\n",
        format_price(trip.price_per_seat.as_ref())
    ));
    reply.push_str(&format!(
        "   🪑 {} chỗ trống\n",
        seat_count(trip.available_seats.as_ref())
    ));
    if let Some(rating) = numeric_value(trip.average_rating.as_ref()) {
        if rating > 0.0 {
            reply.push_str(&format!("   ⭐ {rating:.1}/5\n"));
        }
    }
    reply.push_str(&format!(
        "   🔗 Đặt vé: {}\n\n",
        booking_link(backend_base_url, trip.trip_id.as_ref())
    ));
}

/// `HH:MM DD/MM` in fixed UTC+7. Unparsable input renders an explicit marker
/// instead of failing the whole reply.
pub fn format_display_time(timestamp: &str) -> String {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(instant) => {
            let local = FixedOffset::east_opt(7 * 3600).expect("+07:00 is a valid offset");
            instant.with_timezone(&local).format("%H:%M %d/%m").to_string()
        }
        Err(_) => INVALID_DATE.to_string(),
    }
}

/// Prices are grouped with `.` thousands separators. A non-numeric price is
/// surfaced as an explicit marker, never silently rendered as 0.
fn format_price(value: Option<&Value>) -> String {
    match numeric_value(value) {
        Some(price) => group_thousands(price.round() as i64),
        None => PRICE_NOT_NUMERIC.to_string(),
    }
}

fn seat_count(value: Option<&Value>) -> i64 {
    numeric_value(value).map(|seats| seats as i64).unwrap_or(0)
}

fn numeric_value(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn group_thousands(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }
    if amount < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

fn booking_link(backend_base_url: &str, trip_id: Option<&Value>) -> String {
    let id = trip_id.map(display_id).unwrap_or_default();
    let base = backend_base_url.trim_end_matches('/');
    let base = base.strip_suffix("/api").unwrap_or(base);
    format!("{base}/booking?tripId={id}")
}

fn display_id(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

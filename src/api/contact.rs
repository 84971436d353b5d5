use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::db::AppState;

#[derive(Deserialize)]
pub struct QuickOrderRequest {
    pub name: String,
    pub part_name: String,
    pub vehicle_info: Option<String>,
    pub vin: Option<String>,
}

pub fn wa_link(number: &str, text: &str) -> String {
    format!("https://wa.me/{}?text={}", number, urlencoding::encode(text))
}

/// Build the WhatsApp deep link for a quick-order enquiry. Nothing is
/// sent from here; the client navigates to the URL and WhatsApp takes
/// over, with no delivery confirmation.
pub async fn whatsapp_link(
    State(state): State<AppState>,
    Json(payload): Json<QuickOrderRequest>,
) -> Json<Value> {
    let mut text = format!(
        "Hello, I am {} and I am looking for: {}",
        payload.name.trim(),
        payload.part_name.trim()
    );
    if let Some(vehicle) = payload.vehicle_info.as_deref().filter(|v| !v.trim().is_empty()) {
        text.push_str(&format!("\nVehicle: {}", vehicle.trim()));
    }
    if let Some(vin) = payload.vin.as_deref().filter(|v| !v.trim().is_empty()) {
        text.push_str(&format!("\nVIN: {}", vin.trim()));
    }

    Json(json!({ "url": wa_link(&state.config.whatsapp_number, &text) }))
}

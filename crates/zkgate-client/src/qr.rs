//! Proof transport: QR rendering and deep links.
//!
//! The proof JSON travels base64url-encoded in a `proof` query parameter;
//! the same link format carries `event_id` and, for quick check-in,
//! `admin_code`.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD as B64URL, Engine as _};
use qrcode::render::unicode;
use qrcode::QrCode;
use zkgate_types::{GateError, GateResult};

/// Build a deep link carrying one proof for one event.
pub fn proof_deep_link(base_url: &str, event_id: &str, proof_json: &str) -> String {
    format!(
        "{}?event_id={}&proof={}",
        base_url.trim_end_matches('/'),
        event_id,
        B64URL.encode(proof_json)
    )
}

/// Quick check-in link: opening it puts the device straight into host
/// mode for the event.
pub fn quick_checkin_link(base_url: &str, event_id: &str, admin_code: &str) -> String {
    format!(
        "{}?event_id={}&admin_code={}",
        base_url.trim_end_matches('/'),
        event_id,
        B64URL.encode(admin_code)
    )
}

/// Parameters recovered from a deep link.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeepLink {
    pub event_id: Option<String>,
    pub proof_json: Option<String>,
    pub admin_code: Option<String>,
}

pub fn parse_deep_link(url: &str) -> GateResult<DeepLink> {
    let query = match url.split_once('?') {
        Some((_, q)) => q,
        None => return Ok(DeepLink::default()),
    };

    let mut link = DeepLink::default();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        match key {
            "event_id" => link.event_id = Some(value.to_string()),
            "proof" => link.proof_json = Some(decode_b64_param(value)?),
            "admin_code" => link.admin_code = Some(decode_b64_param(value)?),
            _ => {}
        }
    }
    Ok(link)
}

fn decode_b64_param(value: &str) -> GateResult<String> {
    let bytes = B64URL
        .decode(value)
        .map_err(|e| GateError::Serialization(format!("deep link parameter: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|_| GateError::Serialization("deep link parameter is not UTF-8".into()))
}

/// Render a payload as a terminal-printable QR code.
pub fn qr_unicode(payload: &str) -> GateResult<String> {
    let code =
        QrCode::new(payload).map_err(|e| GateError::Internal(format!("qr encoding: {}", e)))?;
    Ok(code
        .render::<unicode::Dense1x2>()
        .dark_color(unicode::Dense1x2::Light)
        .light_color(unicode::Dense1x2::Dark)
        .build())
}

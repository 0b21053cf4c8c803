//! CID issuance and registration endpoints.
//!
//! `GET /cid` hands back the caller's existing identifier from its session
//! cookie when present, otherwise issues a fresh one and pins it as a
//! long-lived cookie. `POST /register-cid` walks the validation ladder in a
//! fixed order — presence, types, length caps, enum membership, CID
//! verification, `os` type — then resolves the site and forwards the
//! registration upstream.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::header::USER_AGENT;
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use herald_core::{ApiError, CidCodec, ClientFlag, ClientType};
use serde_json::{Value, json};
use tracing::warn;

use crate::routes::{reply_err, reply_ok, reply_ok_empty};
use crate::state::AppState;
use crate::upstream::RegistrationForward;

/// Session cookie carrying the issued CID.
const CID_COOKIE: &str = "cid";
/// Cookie lifetime: one year.
const CID_COOKIE_TTL: time::Duration = time::Duration::days(365);

/// Maximum accepted CID length.
const CID_MAX_LEN: usize = 255;
/// Maximum accepted `clientType` length.
const CLIENT_TYPE_MAX_LEN: usize = 8;

/// Handle `GET /cid`.
pub async fn get_cid(State(state): State<AppState>, jar: CookieJar) -> Response {
    if let Some(existing) = jar.get(CID_COOKIE) {
        return reply_ok(json!({"cid": existing.value()}));
    }

    match state.codec.issue(&state.ids) {
        Ok(cid) => {
            let value = cid.to_string();
            let cookie = Cookie::build((CID_COOKIE, value.clone()))
                .path("/")
                .max_age(CID_COOKIE_TTL)
                .build();
            (jar.add(cookie), reply_ok(json!({"cid": value}))).into_response()
        }
        Err(err) => {
            warn!(error = %err, "cid issuance failed");
            reply_err(&ApiError::cid_create())
        }
    }
}

/// A fully validated registration request.
#[derive(Debug, PartialEq, Eq)]
struct Registration {
    cid: String,
    manage_site_id: String,
    client_type: ClientType,
    client_flag: ClientFlag,
    os: Option<String>,
}

/// Walk the registration validation ladder in its fixed order.
fn validate_registration(body: &Value, codec: &CidCodec) -> Result<Registration, ApiError> {
    let cid = present(body, "cid");
    let manage_site_id = present(body, "manageSiteId");
    let client_type = present(body, "clientType");
    let client_flag = present(body, "clientFlag");

    // Presence
    let (Some(cid), Some(manage_site_id), Some(client_type), Some(client_flag)) =
        (cid, manage_site_id, client_type, client_flag)
    else {
        return Err(ApiError::params_missing());
    };

    // Types
    let (Some(cid), Some(manage_site_id), Some(client_type), Some(client_flag)) = (
        cid.as_str(),
        manage_site_id.as_str(),
        client_type.as_str(),
        client_flag.as_str(),
    ) else {
        return Err(ApiError::params_type());
    };

    // Length caps
    if cid.len() > CID_MAX_LEN || client_type.len() > CLIENT_TYPE_MAX_LEN {
        return Err(ApiError::params_length());
    }

    // Enum membership
    let client_type: ClientType = client_type.parse().map_err(|()| ApiError::client_type())?;
    let client_flag: ClientFlag = client_flag.parse().map_err(|()| ApiError::client_flag())?;

    // CID authenticity
    if !codec.verify(cid) {
        return Err(ApiError::cid_verify());
    }

    // `os` is optional but must be a string when supplied
    let os = match present(body, "os") {
        None => None,
        Some(os) => Some(os.as_str().ok_or_else(ApiError::os_type)?.to_owned()),
    };

    Ok(Registration {
        cid: cid.to_owned(),
        manage_site_id: manage_site_id.to_owned(),
        client_type,
        client_flag,
        os,
    })
}

fn present<'a>(value: &'a Value, field: &str) -> Option<&'a Value> {
    value.get(field).filter(|v| !v.is_null())
}

/// Handle `POST /register-cid`.
pub async fn register_cid(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Ok(Json(body)) = body else {
        return reply_err(&ApiError::params_missing());
    };

    let registration = match validate_registration(&body, &state.codec) {
        Ok(r) => r,
        Err(err) => return reply_err(&err),
    };

    let Some(site) = state.directory.resolve(&registration.manage_site_id) else {
        return reply_err(&ApiError::domain_not_found(&registration.manage_site_id));
    };

    let user_agent = headers.get(USER_AGENT).and_then(|v| v.to_str().ok());
    let forward = RegistrationForward {
        domain: &site.domain,
        cid: &registration.cid,
        user_agent,
        client_type: registration.client_type,
        client_flag: registration.client_flag,
        os: registration.os.as_deref(),
    };

    match state.forwarder.forward(forward).await {
        Ok(()) => reply_ok_empty(),
        Err(err) => {
            warn!(error = %err, site = %site.id, "registration forwarding failed");
            reply_err(&ApiError::register_cid("upstream registration failed"))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

//! Push validation, target matching, and fan-out.
//!
//! A push request addresses either an ordered sequence of peer targets
//! (unicast/multicast, code 2001) or exactly one broadcast target (code 2002),
//! never both. Validation reports the first problem it finds; once validation
//! passes, delivery is best-effort, fire-and-forget, at-most-once — the caller
//! sees success regardless of how many recipients were reached.

use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use herald_core::{
    ApiError, BroadcastTarget, ClientFlag, ClientType, IdentifierKind, P2PTarget, PushEnvelope,
};
use metrics::counter;
use serde_json::Value;
use tracing::warn;

use super::registry::{Attachment, ConnectionKey, ConnectionRegistry, DispatchReport};

/// A validated push request.
#[derive(Clone, Debug, PartialEq)]
pub enum PushRequest {
    /// Unicast/multicast: deliver to connections matching any target.
    Peers(Vec<P2PTarget>),
    /// Broadcast: deliver to every connection under one site.
    Broadcast(BroadcastTarget),
}

/// Validate a raw push body into a [`PushRequest`] plus its payload.
///
/// Mirrors the boundary's validation ladder: presence of `targets`/`data`,
/// then the `targets` shape, then per-target requirements.
pub fn validate(body: &Value) -> Result<(PushRequest, Value), ApiError> {
    let targets = present(body, "targets").ok_or_else(ApiError::params_missing)?;
    let data = present(body, "data").ok_or_else(ApiError::params_missing)?;

    let request = match targets {
        Value::Array(items) => {
            let mut parsed = Vec::with_capacity(items.len());
            for item in items {
                parsed.push(validate_peer_target(item)?);
            }
            PushRequest::Peers(parsed)
        }
        Value::Object(_) => PushRequest::Broadcast(BroadcastTarget {
            manage_site_id: required_string(targets, "manageSiteId")?,
        }),
        _ => return Err(ApiError::params_type()),
    };
    Ok((request, data.clone()))
}

fn validate_peer_target(item: &Value) -> Result<P2PTarget, ApiError> {
    if !item.is_object() {
        return Err(ApiError::params_type());
    }
    let manage_site_id = required_string(item, "manageSiteId")?;
    let user_id = optional_string(item, "userId")?;
    let cid = optional_string(item, "cid")?;
    if user_id.is_none() && cid.is_none() {
        // A target addressing nobody is malformed, not a silent no-op.
        return Err(ApiError::params_missing());
    }
    let client_flag = match optional_string(item, "clientFlag")? {
        Some(raw) => Some(ClientFlag::from_str(&raw).map_err(|()| ApiError::client_flag())?),
        None => None,
    };
    let client_type = match optional_string(item, "clientType")? {
        Some(raw) => Some(ClientType::from_str(&raw).map_err(|()| ApiError::client_type())?),
        None => None,
    };
    Ok(P2PTarget {
        manage_site_id,
        user_id,
        cid,
        client_flag,
        client_type,
    })
}

/// A field counts as present only when it exists and is not `null`.
fn present<'a>(value: &'a Value, field: &str) -> Option<&'a Value> {
    value.get(field).filter(|v| !v.is_null())
}

fn required_string(value: &Value, field: &str) -> Result<String, ApiError> {
    let raw = present(value, field).ok_or_else(ApiError::params_missing)?;
    let s = raw.as_str().ok_or_else(ApiError::params_type)?;
    if s.is_empty() {
        return Err(ApiError::params_missing());
    }
    Ok(s.to_owned())
}

fn optional_string(value: &Value, field: &str) -> Result<Option<String>, ApiError> {
    match present(value, field) {
        None => Ok(None),
        Some(raw) => Ok(Some(
            raw.as_str().ok_or_else(ApiError::params_type)?.to_owned(),
        )),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Matching & fan-out
// ─────────────────────────────────────────────────────────────────────────────

/// Whether connection `(key, attachment)` matches one peer target.
///
/// Site must agree, then exactly one identity discriminator is consulted —
/// `userId` when set, else `cid`. Target-side `clientFlag`/`clientType`, when
/// present, must equal the connection's own attachment values.
fn peer_matches(target: &P2PTarget, key: &ConnectionKey, attachment: &Attachment) -> bool {
    if attachment.manage_site_id.as_deref() != Some(target.manage_site_id.as_str()) {
        return false;
    }
    let identity_ok = if let Some(user_id) = &target.user_id {
        key.kind == IdentifierKind::UserId && key.identifier == *user_id
    } else if let Some(cid) = &target.cid {
        key.kind == IdentifierKind::Cid && key.identifier == *cid
    } else {
        false
    };
    if !identity_ok {
        return false;
    }
    if let Some(flag) = target.client_flag {
        if attachment.client_flag != Some(flag) {
            return false;
        }
    }
    if let Some(client_type) = target.client_type {
        if attachment.client_type != Some(client_type) {
            return false;
        }
    }
    true
}

/// Resolve a validated request against the registry and fan the envelope out.
///
/// A connection matching several targets of one push still receives the
/// message exactly once. Send failures evict the offending connection and
/// never abort delivery to the remaining matches.
pub fn route(registry: &ConnectionRegistry, request: &PushRequest, data: Value) -> DispatchReport {
    let timestamp = Utc::now().timestamp_millis();
    let envelope = match request {
        PushRequest::Peers(_) => PushEnvelope::peer(data, timestamp),
        PushRequest::Broadcast(_) => PushEnvelope::broadcast(data, timestamp),
    };
    let payload = match serde_json::to_string(&envelope) {
        Ok(json) => Arc::new(json),
        Err(e) => {
            warn!(error = %e, "failed to serialize push envelope");
            return DispatchReport::default();
        }
    };

    let report = match request {
        PushRequest::Peers(targets) => registry.dispatch(
            |key, attachment| targets.iter().any(|t| peer_matches(t, key, attachment)),
            &payload,
        ),
        PushRequest::Broadcast(target) => registry.dispatch(
            |_, attachment| {
                attachment.manage_site_id.as_deref() == Some(target.manage_site_id.as_str())
            },
            &payload,
        ),
    };

    counter!("ws_push_delivered_total").increment(report.delivered as u64);
    counter!("ws_push_dropped_total").increment(report.evicted as u64);
    report
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

//! Exception mechanism: structured metadata describing how an exception was
//! raised (signal, mach exception, errno, handled/synthetic flags).

use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use crate::utils::{get_bool, get_map, get_str, get_u64};

/// POSIX signal details under `meta.signal`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SignalInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_name: Option<String>,
}

/// Mach exception details under `meta.mach_exception`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MachExceptionInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcode: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Errno details under `meta.errno`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ErrnoInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// NSError domain/code under `meta.ns_error` (Cocoa).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NsErrorInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
}

/// Structured OS-level metadata for a mechanism.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MechanismMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<SignalInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mach_exception: Option<MachExceptionInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errno: Option<ErrnoInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ns_error: Option<NsErrorInfo>,
}

impl MechanismMeta {
    pub fn is_empty(&self) -> bool {
        self.signal.is_none()
            && self.mach_exception.is_none()
            && self.errno.is_none()
            && self.ns_error.is_none()
    }
}

/// How and why an exception was raised.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Mechanism {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_link: Option<String>,
    /// Whether the exception was handled by user code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handled: Option<bool>,
    /// Synthetic mechanisms carry an artificial exception type (signal
    /// names, generic crash markers) that must not participate in grouping.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synthetic: Option<bool>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "MechanismMeta::is_empty")]
    pub meta: MechanismMeta,
}

impl Mechanism {
    /// Normalizes a raw mechanism object, applying the legacy upgrade
    /// first. Never fails.
    pub fn from_value(raw: &Value) -> Mechanism {
        let raw = upgrade_legacy_mechanism(raw);
        let meta_raw = raw.get("meta").cloned().unwrap_or(Value::Null);

        Mechanism {
            ty: get_str(&raw, "type"),
            description: get_str(&raw, "description"),
            help_link: get_str(&raw, "help_link"),
            handled: get_bool(&raw, "handled"),
            synthetic: get_bool(&raw, "synthetic"),
            data: get_map(&raw, "data", None),
            meta: MechanismMeta {
                signal: meta_raw.get("signal").map(|s| SignalInfo {
                    number: get_u64(s, "number"),
                    code: get_u64(s, "code"),
                    name: get_str(s, "name"),
                    code_name: get_str(s, "code_name"),
                }),
                mach_exception: meta_raw.get("mach_exception").map(|m| MachExceptionInfo {
                    exception: get_u64(m, "exception"),
                    code: get_u64(m, "code"),
                    subcode: get_u64(m, "subcode"),
                    name: get_str(m, "name"),
                }),
                errno: meta_raw.get("errno").map(|e| ErrnoInfo {
                    number: get_u64(e, "number"),
                    name: get_str(e, "name"),
                }),
                ns_error: meta_raw.get("ns_error").map(|n| NsErrorInfo {
                    domain: get_str(n, "domain"),
                    code: n.get("code").and_then(Value::as_i64),
                }),
            },
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.synthetic == Some(true)
    }
}

/// Rewrites legacy mechanism payloads into the modern shape.
///
/// Early SDKs sent `posix_signal`, `mach_exception` and `relevant_address`
/// as top-level keys without a `type`. Those move into `meta` and `data`
/// under a `"generic"` type. Payloads that already carry a `type` pass
/// through untouched, which makes the upgrade idempotent.
pub fn upgrade_legacy_mechanism(raw: &Value) -> Value {
    let obj = match raw.as_object() {
        Some(obj) => obj,
        None => return raw.clone(),
    };
    if obj.get("type").and_then(Value::as_str).is_some_and(|t| !t.is_empty()) {
        return raw.clone();
    }

    let mut result = Map::new();
    result.insert("type".to_string(), json!("generic"));

    let mut meta = Map::new();
    if let Some(signal) = obj.get("posix_signal").and_then(Value::as_object) {
        let mut upgraded = Map::new();
        for (old_key, new_key) in [
            ("signal", "number"),
            ("code", "code"),
            ("name", "name"),
            ("code_name", "code_name"),
        ] {
            if let Some(v) = signal.get(old_key).filter(|v| !v.is_null()) {
                upgraded.insert(new_key.to_string(), v.clone());
            }
        }
        meta.insert("signal".to_string(), Value::Object(upgraded));
    }
    if let Some(mach) = obj.get("mach_exception").and_then(Value::as_object) {
        let mut upgraded = Map::new();
        for (old_key, new_key) in [
            ("exception", "exception"),
            ("code", "code"),
            ("subcode", "subcode"),
            ("exception_name", "name"),
        ] {
            if let Some(v) = mach.get(old_key).filter(|v| !v.is_null()) {
                upgraded.insert(new_key.to_string(), v.clone());
            }
        }
        meta.insert("mach_exception".to_string(), Value::Object(upgraded));
    }
    if !meta.is_empty() {
        result.insert("meta".to_string(), Value::Object(meta));
    }

    let mut data = Map::new();
    for key in ["relevant_address", "segv_reason"] {
        if let Some(v) = obj.get(key).filter(|v| !v.is_null()) {
            data.insert(key.to_string(), v.clone());
        }
    }
    if !data.is_empty() {
        result.insert("data".to_string(), Value::Object(data));
    }

    Value::Object(result)
}

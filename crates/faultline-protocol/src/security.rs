//! Browser security report interfaces: CSP, HPKP, Expect-CT and
//! Expect-Staple violations.
//!
//! CSP is the only strict interface here: a report without a recognizable
//! effective directive cannot be bucketed at all and fails normalization.

use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::error::ValidationError;
use crate::utils::{get_bool, get_str, get_u64};

/// The CSP keyword for local violations.
pub const CSP_SELF: &str = "'self'";

/// Directives a CSP report may legitimately carry.
const CSP_DIRECTIVES: &[&str] = &[
    "base-uri",
    "child-src",
    "connect-src",
    "default-src",
    "font-src",
    "form-action",
    "frame-ancestors",
    "frame-src",
    "img-src",
    "manifest-src",
    "media-src",
    "object-src",
    "plugin-types",
    "prefetch-src",
    "referrer",
    "script-src",
    "script-src-attr",
    "script-src-elem",
    "style-src",
    "style-src-attr",
    "style-src-elem",
    "upgrade-insecure-requests",
    "worker-src",
];

/// Reads a report field that may arrive in underscore or hyphenated form,
/// depending on whether the browser report was pre-normalized.
fn get_report_str(raw: &Value, key: &str) -> Option<String> {
    get_str(raw, key).or_else(|| get_str(raw, &key.replace('_', "-")))
}

/// Canonicalizes a CSP `blocked-uri` value:
///
/// - `""`, `self` and `'self'` all become the literal `'self'` token
/// - a bare scheme (`data`, `blob`) becomes a scheme-only URI (`data://`)
/// - `http`/`https` URIs are reduced to the hostname alone
/// - anything else keeps scheme and host, dropping path, query and fragment
pub fn normalize_csp_uri(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() || value == CSP_SELF || value == "self" {
        return CSP_SELF.to_string();
    }
    if !value.contains(':') {
        return format!("{}://", value.to_ascii_lowercase());
    }
    match Url::parse(value) {
        Ok(url) => {
            let scheme = url.scheme();
            let host = url.host_str().unwrap_or("");
            if scheme == "http" || scheme == "https" {
                host.to_string()
            } else if host.is_empty() {
                format!("{scheme}://")
            } else {
                format!("{scheme}://{host}")
            }
        }
        Err(_) => {
            let scheme = value.split(':').next().unwrap_or("");
            format!("{}://", scheme.to_ascii_lowercase())
        }
    }
}

/// A Content-Security-Policy violation report.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Csp {
    /// The single directive that was violated (first token only).
    pub effective_directive: String,
    /// The blocked URI after [`normalize_csp_uri`].
    pub normalized_blocked_uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_uri: Option<String>,
    /// The full violated directive including keywords, used to detect local
    /// script violations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violated_directive: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disposition: Option<String>,
}

impl Csp {
    /// Normalizes a CSP report. Fails when no known directive can be
    /// extracted; everything else degrades.
    pub fn from_value(raw: &Value) -> Result<Csp, ValidationError> {
        let directive = get_report_str(raw, "effective_directive")
            .or_else(|| get_report_str(raw, "violated_directive"))
            .ok_or(ValidationError::MissingField("effective_directive"))?;
        // Reports pack the full policy into the directive field; only the
        // first token names the directive itself.
        let effective_directive = directive
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        if !CSP_DIRECTIVES.contains(&effective_directive.as_str()) {
            return Err(ValidationError::UnknownDirective(effective_directive));
        }

        let blocked_uri = get_report_str(raw, "blocked_uri");
        let normalized_blocked_uri = normalize_csp_uri(blocked_uri.as_deref().unwrap_or(""));

        Ok(Csp {
            effective_directive,
            normalized_blocked_uri,
            blocked_uri,
            violated_directive: get_report_str(raw, "violated_directive"),
            document_uri: get_report_str(raw, "document_uri"),
            referrer: get_report_str(raw, "referrer"),
            source_file: get_report_str(raw, "source_file"),
            line_number: get_u64(raw, "line_number"),
            column_number: get_u64(raw, "column_number"),
            status_code: get_u64(raw, "status_code"),
            disposition: get_report_str(raw, "disposition"),
        })
    }

    /// For script-src violations blocked at the document itself, names the
    /// offending keyword (`unsafe-inline` or `unsafe-eval`). Those group by
    /// keyword rather than by URI.
    pub fn local_script_violation(&self) -> Option<&'static str> {
        if self.effective_directive != "script-src" || self.normalized_blocked_uri != CSP_SELF {
            return None;
        }
        let violated = self.violated_directive.as_deref()?;
        if violated.contains("'unsafe-inline'") {
            Some("unsafe-inline")
        } else if violated.contains("'unsafe-eval'") {
            Some("unsafe-eval")
        } else {
            None
        }
    }
}

/// An HTTP-Public-Key-Pins violation report.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Hpkp {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_subdomains: Option<bool>,
}

impl Hpkp {
    pub fn from_value(raw: &Value) -> Hpkp {
        Hpkp {
            hostname: get_report_str(raw, "hostname"),
            port: get_u64(raw, "port"),
            include_subdomains: get_bool(raw, "include-subdomains")
                .or_else(|| get_bool(raw, "include_subdomains")),
        }
    }
}

/// An Expect-CT violation report.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExpectCt {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
}

impl ExpectCt {
    pub fn from_value(raw: &Value) -> ExpectCt {
        ExpectCt {
            hostname: get_report_str(raw, "hostname"),
            port: get_u64(raw, "port"),
            date_time: get_report_str(raw, "date_time"),
        }
    }
}

/// An Expect-Staple violation report.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExpectStaple {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
}

impl ExpectStaple {
    pub fn from_value(raw: &Value) -> ExpectStaple {
        ExpectStaple {
            hostname: get_report_str(raw, "hostname"),
            port: get_u64(raw, "port"),
            date_time: get_report_str(raw, "date_time"),
        }
    }
}

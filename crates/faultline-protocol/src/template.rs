//! Server-side template interface: a single frame-shaped record pointing at
//! the template location that raised.

use serde::Serialize;
use serde_json::Value;

use crate::stacktrace::basename;
use crate::utils::{get_str, get_str_list, get_trimmed_str, get_u64, MAX_VALUE_LENGTH};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Template {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abs_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_line: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lineno: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pre_context: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub post_context: Vec<String>,
}

impl Template {
    /// Normalizes the `template` payload. Never fails.
    pub fn from_value(raw: &Value) -> Template {
        let abs_path = get_trimmed_str(raw, "abs_path", MAX_VALUE_LENGTH);
        let mut filename = get_trimmed_str(raw, "filename", MAX_VALUE_LENGTH);
        if filename.is_none() {
            filename = abs_path.as_deref().map(basename).map(str::to_string);
        }
        Template {
            filename,
            abs_path,
            context_line: get_str(raw, "context_line"),
            lineno: get_u64(raw, "lineno"),
            pre_context: get_str_list(raw, "pre_context"),
            post_context: get_str_list(raw, "post_context"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.filename.is_none() && self.context_line.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_template_fills_filename_from_abs_path() {
        let template = Template::from_value(&json!({
            "abs_path": "/srv/app/templates/index.html.erb",
            "context_line": "<%= user.name %>",
            "lineno": 4
        }));
        assert_eq!(template.filename.as_deref(), Some("index.html.erb"));
        assert_eq!(template.lineno, Some(4));
    }
}

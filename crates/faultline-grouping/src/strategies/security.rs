//! Browser security report grouping.
//!
//! All four report types group under the default variant only. Each hash
//! is salted with the report type (and the CSP directive) so a pin failure
//! and a CSP violation for the same host never collide.

use faultline_protocol::{Csp, ExpectCt, ExpectStaple, Hpkp};

use crate::component::GroupingComponent;
use crate::context::VariantKind;
use crate::strategies::StrategyOutput;

fn default_output(component: GroupingComponent) -> StrategyOutput {
    let mut output = StrategyOutput::default();
    output.variants.insert(VariantKind::Default, component);
    output
}

pub(crate) fn csp_variants(csp: &Csp) -> StrategyOutput {
    let mut violation = GroupingComponent::new("violation");
    let mut uri = GroupingComponent::new("uri");

    if let Some(keyword) = csp.local_script_violation() {
        violation.push(format!("'{keyword}'"));
        uri.push(csp.normalized_blocked_uri.as_str());
        uri.set_non_contributing("violation takes precedence");
    } else {
        uri.push(csp.normalized_blocked_uri.as_str());
    }

    let component = GroupingComponent::with_values(
        "csp",
        [
            csp.effective_directive.as_str().into(),
            violation.into(),
            uri.into(),
        ],
    );
    default_output(component)
}

fn hostname_report(id: &'static str, hostname: Option<&str>) -> StrategyOutput {
    let mut component = GroupingComponent::new(id);
    component.push(id);
    match hostname {
        Some(hostname) => component.push(hostname),
        None => component.set_non_contributing("ignored because hostname is missing"),
    }
    default_output(component)
}

pub(crate) fn hpkp_variants(hpkp: &Hpkp) -> StrategyOutput {
    hostname_report("hpkp", hpkp.hostname.as_deref())
}

pub(crate) fn expectct_variants(report: &ExpectCt) -> StrategyOutput {
    hostname_report("expectct", report.hostname.as_deref())
}

pub(crate) fn expectstaple_variants(report: &ExpectStaple) -> StrategyOutput {
    hostname_report("expectstaple", report.hostname.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_csp_groups_by_directive_and_uri() {
        let csp = Csp::from_value(&json!({
            "effective_directive": "img-src",
            "blocked_uri": "https://evil.example.com/pixel.gif"
        }))
        .unwrap();
        let output = csp_variants(&csp);
        let component = &output.variants[&VariantKind::Default];
        assert_eq!(
            component.flatten_values(),
            vec!["img-src", "evil.example.com"]
        );
    }

    #[test]
    fn test_local_script_violation_beats_uri() {
        let csp = Csp::from_value(&json!({
            "effective_directive": "script-src",
            "blocked_uri": "self",
            "violated_directive": "script-src 'unsafe-inline'"
        }))
        .unwrap();
        let output = csp_variants(&csp);
        let component = &output.variants[&VariantKind::Default];
        assert_eq!(
            component.flatten_values(),
            vec!["script-src", "'unsafe-inline'"]
        );
        let uri = component.find("uri").unwrap();
        assert!(!uri.contributes);
        assert_eq!(uri.hint.as_deref(), Some("violation takes precedence"));
    }

    #[test]
    fn test_hpkp_groups_by_hostname() {
        let hpkp = Hpkp::from_value(&json!({"hostname": "example.com"}));
        let output = hpkp_variants(&hpkp);
        assert_eq!(
            output.variants[&VariantKind::Default].flatten_values(),
            vec!["hpkp", "example.com"]
        );
    }

    #[test]
    fn test_expect_ct_without_hostname_does_not_contribute() {
        let report = ExpectCt::from_value(&json!({}));
        let output = expectct_variants(&report);
        assert!(!output.variants[&VariantKind::Default].contributes);
    }
}

//! Stacktrace strategy: aggregates frame components in original order,
//! suppresses recursion, and derives the per-variant and hierarchical
//! forms.

use faultline_protocol::{Frame, Stacktrace};

use crate::component::{ComponentValue, GroupingComponent};
use crate::context::{GroupingContext, VariantKind};
use crate::strategies::StrategyOutput;

/// Frames beyond this count (from the newest end) stop contributing; giant
/// stacks otherwise drown the crash site in noise.
const MAX_CONTRIBUTING_FRAMES: usize = 256;

/// Hierarchical mode emits this many depth-truncated levels at most,
/// including the unbounded `app-depth-max` level.
const MAX_HIERARCHICAL_LEVELS: usize = 5;

/// Two adjacent frames are the same recursive call iff all position fields
/// are pairwise equal. Anything less strict merges genuinely different
/// frames; anything stricter lets deep recursion fan out into one hash per
/// depth.
fn is_recursion(frame: &Frame, previous: &Frame) -> bool {
    frame.abs_path == previous.abs_path
        && frame.package == previous.package
        && frame.module == previous.module
        && frame.filename == previous.filename
        && frame.function == previous.function
        && frame.lineno == previous.lineno
        && frame.colno == previous.colno
}

/// Builds the stacktrace component for the variant scoped in `ctx`.
pub(crate) fn get_stacktrace_component(
    stacktrace: &Stacktrace,
    ctx: GroupingContext<'_>,
) -> GroupingComponent {
    let total = stacktrace.frames.len();
    let mut values: Vec<ComponentValue> = Vec::with_capacity(total);
    let mut previous: Option<&Frame> = None;

    for (idx, frame) in stacktrace.frames.iter().enumerate() {
        let mut frame_component = super::frame::get_frame_component(frame, ctx);

        if ctx.variant == VariantKind::App && frame.in_app != Some(true) {
            frame_component.set_non_contributing("non app frame");
        } else if previous.is_some_and(|prev| is_recursion(frame, prev)) {
            frame_component.set_non_contributing("ignored due to recursion");
        } else if total > MAX_CONTRIBUTING_FRAMES && idx < total - MAX_CONTRIBUTING_FRAMES {
            frame_component.set_non_contributing("frame beyond stacktrace size limit");
        }

        values.push(frame_component.into());
        previous = Some(frame);
    }

    let mut component = GroupingComponent::with_values("stacktrace", values);
    if !component
        .subcomponents()
        .any(GroupingComponent::contributes_to_hash)
    {
        component.set_non_contributing(match ctx.variant {
            VariantKind::App => "ignored because it contains no contributing in-app frames",
            _ => "ignored because it contains no contributing frames",
        });
    }
    component
}

/// Runs the stacktrace strategy for all variants: `system` + `app` in flat
/// mode, plus depth-truncated levels in hierarchical mode.
pub(crate) fn stacktrace_variants(
    stacktrace: &Stacktrace,
    ctx: GroupingContext<'_>,
) -> StrategyOutput {
    let mut output = StrategyOutput::default();
    let system = get_stacktrace_component(stacktrace, ctx.with_variant(VariantKind::System));

    if ctx.config.hierarchical_grouping {
        output.hierarchical = get_stacktrace_hierarchy(&system);
    }

    let app = get_stacktrace_component(stacktrace, ctx.with_variant(VariantKind::App));
    output.variants.insert(VariantKind::System, system);
    output.variants.insert(VariantKind::App, app);
    output
}

/// Derives the depth-truncated hierarchy from the system component.
///
/// Level N keeps the N newest contributing frames; the final level
/// (`app-depth-max`) keeps them all. The returned list is ordered
/// most-specific first (fewest frames, the deepest call site), which is
/// the order group lookup walks when failing over to a coarser hash.
fn get_stacktrace_hierarchy(system: &GroupingComponent) -> Vec<(String, GroupingComponent)> {
    // Indices of contributing frame components, newest last.
    let contributing: Vec<usize> = system
        .values
        .iter()
        .enumerate()
        .filter_map(|(idx, value)| match value {
            ComponentValue::Nested(frame) if frame.contributes_to_hash() => Some(idx),
            _ => None,
        })
        .collect();
    if contributing.is_empty() {
        return Vec::new();
    }

    let mut levels = Vec::new();
    for depth in 1..MAX_HIERARCHICAL_LEVELS {
        if depth >= contributing.len() {
            break;
        }
        let keep: Vec<usize> = contributing
            .iter()
            .rev()
            .take(depth)
            .copied()
            .collect();
        let mut level = system.clone();
        for (idx, value) in level.values.iter_mut().enumerate() {
            if let ComponentValue::Nested(frame) = value {
                if frame.contributes && !keep.contains(&idx) {
                    frame.set_non_contributing("beyond depth limit of this level");
                }
            }
        }
        levels.push((format!("app-depth-{depth}"), level));
    }
    levels.push(("app-depth-max".to_string(), system.clone()));
    levels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GroupingConfig;
    use faultline_protocol::Event;
    use serde_json::json;

    fn make_stacktrace(frames: serde_json::Value) -> Stacktrace {
        Stacktrace::from_value(&json!({ "frames": frames }))
    }

    #[test]
    fn test_recursion_detected_on_identical_adjacent_frames() {
        let config = GroupingConfig::default();
        let event = Event::from_value(&json!({"platform": "python"})).unwrap();
        let ctx = GroupingContext::new(&config, &event);
        let frame = json!({"filename": "a.py", "function": "f", "lineno": 3, "colno": 1});
        let stacktrace = make_stacktrace(json!([frame, frame, frame]));

        let component =
            get_stacktrace_component(&stacktrace, ctx.with_variant(VariantKind::System));
        let hints: Vec<Option<&str>> = component
            .subcomponents()
            .map(|frame| frame.hint.as_deref())
            .collect();
        assert_eq!(hints[0], None);
        assert_eq!(hints[1], Some("ignored due to recursion"));
        assert_eq!(hints[2], Some("ignored due to recursion"));
    }

    #[test]
    fn test_recursion_suppression_keeps_hash_stable() {
        let config = GroupingConfig::default();
        let event = Event::from_value(&json!({"platform": "python"})).unwrap();
        let ctx = GroupingContext::new(&config, &event);
        let frame = json!({"filename": "a.py", "function": "f", "lineno": 3});

        let twice = get_stacktrace_component(
            &make_stacktrace(json!([frame, frame])),
            ctx.with_variant(VariantKind::System),
        );
        let many = get_stacktrace_component(
            &make_stacktrace(json!([frame, frame, frame, frame, frame])),
            ctx.with_variant(VariantKind::System),
        );
        assert_eq!(twice.flatten_values(), many.flatten_values());
    }

    #[test]
    fn test_adjacent_frames_differing_by_line_are_not_recursion() {
        let config = GroupingConfig::default();
        let event = Event::from_value(&json!({"platform": "python"})).unwrap();
        let ctx = GroupingContext::new(&config, &event);
        let stacktrace = make_stacktrace(json!([
            {"filename": "a.py", "function": "f", "lineno": 3},
            {"filename": "a.py", "function": "f", "lineno": 4}
        ]));
        let component =
            get_stacktrace_component(&stacktrace, ctx.with_variant(VariantKind::System));
        assert!(component
            .subcomponents()
            .all(|frame| frame.contributes));
    }

    #[test]
    fn test_app_variant_restricts_to_in_app_frames() {
        let config = GroupingConfig::default();
        let event = Event::from_value(&json!({"platform": "python"})).unwrap();
        let ctx = GroupingContext::new(&config, &event);
        let stacktrace = make_stacktrace(json!([
            {"filename": "lib.py", "function": "inner", "in_app": false},
            {"filename": "app.py", "function": "outer", "in_app": true}
        ]));

        let app = get_stacktrace_component(&stacktrace, ctx.with_variant(VariantKind::App));
        let frames: Vec<&GroupingComponent> = app.subcomponents().collect();
        assert!(!frames[0].contributes);
        assert_eq!(frames[0].hint.as_deref(), Some("non app frame"));
        assert!(frames[1].contributes);
    }

    #[test]
    fn test_app_variant_without_in_app_frames_does_not_contribute() {
        let config = GroupingConfig::default();
        let event = Event::from_value(&json!({"platform": "python"})).unwrap();
        let ctx = GroupingContext::new(&config, &event);
        let stacktrace = make_stacktrace(json!([
            {"filename": "lib.py", "function": "inner", "in_app": false}
        ]));

        let app = get_stacktrace_component(&stacktrace, ctx.with_variant(VariantKind::App));
        assert!(!app.contributes);
        assert!(app.hint.as_deref().unwrap().contains("no contributing"));
    }

    #[test]
    fn test_hierarchy_orders_most_specific_first() {
        let config = GroupingConfig::mobile_2021_02_12();
        let event = Event::from_value(&json!({"platform": "native"})).unwrap();
        let ctx = GroupingContext::new(&config, &event);
        let stacktrace = make_stacktrace(json!([
            {"function": "main", "in_app": true},
            {"function": "dispatch", "in_app": true},
            {"function": "crash", "in_app": true}
        ]));

        let output = stacktrace_variants(&stacktrace, ctx);
        let names: Vec<&str> = output
            .hierarchical
            .iter()
            .map(|(name, _)| name.as_str())
            .collect();
        assert_eq!(names, vec!["app-depth-1", "app-depth-2", "app-depth-max"]);

        // Depth 1 keeps only the newest frame.
        let (_, depth_one) = &output.hierarchical[0];
        assert_eq!(depth_one.flatten_values(), vec!["crash"]);
        let (_, depth_max) = &output.hierarchical[2];
        assert_eq!(
            depth_max.flatten_values(),
            vec!["main", "dispatch", "crash"]
        );
    }
}

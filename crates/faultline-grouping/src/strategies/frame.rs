//! Frame strategy: sub-components for module, filename, function and
//! context line, combined with fixed precedence rules.

use faultline_protocol::{basename, Frame};

use crate::component::{ComponentValue, GroupingComponent, TreeLabel};
use crate::context::GroupingContext;
use crate::strategies::platform::{
    behavior_family, clean_java_module, clean_ruby_function, is_java_lambda_module,
    is_ruby_block_function, is_unhashable_javascript_function, strip_filename_version,
    trim_native_function, PlatformFamily,
};

/// True when the path looks like it was loaded over the network rather than
/// from a bundle on disk. URL-origin frames churn with every deploy.
fn has_url_origin(abs_path: Option<&str>, allow_file_origin: bool) -> bool {
    let path = match abs_path {
        Some(path) => path,
        None => return false,
    };
    if path.starts_with("http:")
        || path.starts_with("https:")
        || path.starts_with("applewebdata:")
    {
        return true;
    }
    if path.starts_with("file:") {
        return !allow_file_origin;
    }
    false
}

fn get_filename_component(frame: &Frame, javascript_fuzzing: bool) -> GroupingComponent {
    let filename = match frame.filename.as_deref() {
        Some(filename) => filename,
        None => return GroupingComponent::new("filename"),
    };
    // Only the platform-independent basename is stable enough to hash.
    let filename = basename(filename).to_ascii_lowercase();
    let mut component =
        GroupingComponent::with_values("filename", [ComponentValue::from(filename.as_str())]);

    if has_url_origin(frame.abs_path.as_deref(), javascript_fuzzing) {
        component.set_non_contributing("ignored because frame points to a URL");
    } else if filename == "<anonymous>" {
        component.set_non_contributing("anonymous filename discarded");
    } else if filename == "[native code]" {
        component.set_non_contributing("native code indicated by filename");
    } else if let Some(stripped) = strip_filename_version(&filename) {
        component.values = vec![ComponentValue::from(stripped)];
        component.set_hint("stripped version number from filename");
    }
    component
}

fn get_module_component(frame: &Frame, platform: Option<&str>) -> GroupingComponent {
    let module = match frame.module.as_deref() {
        Some(module) => module,
        None => return GroupingComponent::new("module"),
    };
    let mut component =
        GroupingComponent::with_values("module", [ComponentValue::from(module)]);

    match platform {
        // Some bundlers write the abs_path into the module field; that is a
        // path, not a module, and paths are handled by the filename rules.
        Some("javascript") => {
            if module.contains('/')
                && frame
                    .abs_path
                    .as_deref()
                    .is_some_and(|path| path.ends_with(module))
            {
                component.set_non_contributing("ignored bad javascript module");
            }
        }
        Some("java") => {
            if is_java_lambda_module(module) {
                component.set_non_contributing("ignored java lambda class");
            } else if let Some(cleaned) = clean_java_module(module) {
                component.values = vec![ComponentValue::from(cleaned)];
                component.set_hint("removed codegen marker");
            }
        }
        _ => {}
    }
    component
}

fn get_function_component(
    frame: &Frame,
    platform: Option<&str>,
    ctx: GroupingContext<'_>,
) -> GroupingComponent {
    let config = ctx.config;
    let family = behavior_family(platform);

    let raw = if config.legacy_function_logic {
        frame.raw_function.as_deref().or(frame.function.as_deref())
    } else {
        frame.function.as_deref().or(frame.raw_function.as_deref())
    };
    // Native frames with no symbolicated function still have the raw
    // symbol to fall back to.
    let raw = raw.or_else(|| {
        if family == PlatformFamily::Native {
            frame.symbol.as_deref()
        } else {
            None
        }
    });

    let function = match raw {
        Some(function) => function,
        None => return GroupingComponent::new("function"),
    };

    let mut component =
        GroupingComponent::with_values("function", [ComponentValue::from(function)]);

    match platform {
        Some("ruby") => {
            if is_ruby_block_function(function) {
                component.values = vec![ComponentValue::from("block")];
                component.set_hint("ruby block");
            } else if let Some(cleaned) = clean_ruby_function(function) {
                component.values = vec![ComponentValue::from(cleaned)];
                component.set_hint("removed generated erb template suffix");
            }
        }
        Some("php") => {
            if function.starts_with("[Anonymous") {
                component.set_non_contributing("ignored anonymous function");
            } else if config.php_detect_anonymous_classes
                && function.starts_with("class@anonymous")
            {
                // class@anonymous\x00/path/to/file.php:42 varies per file
                // position; only the stable prefix groups.
                if let Some(prefix) = function.split('\u{0}').next() {
                    if prefix != function {
                        component.values = vec![ComponentValue::from(prefix)];
                        component.set_hint("truncated anonymous class");
                    }
                }
            }
        }
        Some("java") => {
            if function.starts_with("lambda$") {
                component.set_non_contributing("ignored java lambda function");
            }
        }
        _ => match family {
            PlatformFamily::Native => {
                if function == "<redacted>" || function == "<unknown>" {
                    component.set_non_contributing("ignored unknown function");
                } else if config.native_fuzzing {
                    let trimmed = trim_native_function(function);
                    if trimmed != function {
                        component.values = vec![ComponentValue::from(trimmed)];
                        component.set_hint("isolated native symbol");
                    }
                }
            }
            // Unhashable javascript functions (anonymous names, closure
            // markers) discard the whole frame instead; nothing to trim
            // here.
            PlatformFamily::Javascript | PlatformFamily::Other => {}
        },
    }
    component
}

fn get_contextline_component(frame: &Frame, platform: Option<&str>, ctx: GroupingContext<'_>) -> GroupingComponent {
    let raw_line = match frame.context_line.as_deref() {
        Some(line) => line,
        None => return GroupingComponent::new("context-line"),
    };
    // Collapse all interior whitespace; indentation and tab width are not
    // part of the crash identity.
    let line = raw_line.split_whitespace().collect::<Vec<_>>().join(" ");
    if line.is_empty() {
        return GroupingComponent::new("context-line");
    }

    let mut component =
        GroupingComponent::with_values("context-line", [ComponentValue::from(line)]);
    if raw_line.len() > 120 {
        component.values.clear();
        component.set_non_contributing("discarded because line too long");
    } else if behavior_family(platform) == PlatformFamily::Javascript {
        let url_origin = if ctx.config.with_context_line_file_origin_bug {
            has_url_origin(frame.abs_path.as_deref(), true)
        } else {
            frame.function.is_none() && has_url_origin(frame.abs_path.as_deref(), false)
        };
        if url_origin {
            component.set_non_contributing("discarded because from URL origin");
        }
    }
    component
}

/// Builds the component for one frame in the currently scoped variant.
pub(crate) fn get_frame_component(
    frame: &Frame,
    ctx: GroupingContext<'_>,
) -> GroupingComponent {
    let platform = frame.platform_or(ctx.event_platform());
    let config = ctx.config;
    let family = behavior_family(platform);

    let module_component = get_module_component(frame, platform);
    let mut filename_component = get_filename_component(frame, config.javascript_fuzzing);
    if module_component.contributes_to_hash() && filename_component.contributes {
        filename_component.set_non_contributing("module takes precedence");
    }

    let mut context_line_component = None;
    if config.is_contextline_platform(platform) {
        context_line_component = Some(get_contextline_component(frame, platform, ctx));
    }

    let function_component = get_function_component(frame, platform, ctx);

    // Safari reports [native code] frames for builtin calls that Chrome
    // omits; hashing them would split groups per browser.
    let mut frame_contributes = true;
    let mut frame_hint = None;
    if frame.abs_path.as_deref() == Some("[native code]") {
        frame_contributes = false;
        frame_hint = Some("native code indicated by filename".to_string());
    } else if config.javascript_fuzzing
        && family == PlatformFamily::Javascript
        && frame
            .function
            .as_deref()
            .is_some_and(is_unhashable_javascript_function)
    {
        frame_contributes = false;
        frame_hint = Some("ignored low quality javascript frame".to_string());
    }

    if config.discard_native_filename
        && family == PlatformFamily::Native
        && function_component.contributes_to_hash()
        && filename_component.contributes
    {
        // Native function names already carry the full namespace; the
        // filename only destabilizes grouping across builds.
        filename_component.set_non_contributing("discarded native filename for grouping stability");
    }

    let mut values: Vec<ComponentValue> = Vec::new();
    let mut package_component = None;
    if config.use_package_fallback && frame.package.is_some() {
        let package = basename(frame.package.as_deref().unwrap_or_default()).to_ascii_lowercase();
        let mut component =
            GroupingComponent::with_values("package", [ComponentValue::from(package)]);
        let anything_else_contributes = module_component.contributes_to_hash()
            || filename_component.contributes_to_hash()
            || function_component.contributes_to_hash()
            || context_line_component
                .as_ref()
                .is_some_and(GroupingComponent::contributes_to_hash);
        if anything_else_contributes {
            component.set_non_contributing("ignored because function takes precedence");
        } else {
            component.set_hint("used as fallback because function name is not available");
        }
        package_component = Some(component);
    }

    let tree_label = if ctx.config.hierarchical_grouping {
        let label = TreeLabel {
            function: function_component.flatten_values().into_iter().next(),
            package: frame.package.as_deref().map(basename).map(str::to_string),
        };
        if label.is_empty() {
            None
        } else {
            Some(label)
        }
    } else {
        None
    };

    values.push(module_component.into());
    values.push(filename_component.into());
    values.push(function_component.into());
    if let Some(component) = context_line_component {
        values.push(component.into());
    }
    if let Some(component) = package_component {
        values.push(component.into());
    }

    let mut component = GroupingComponent::with_values("frame", values);
    component.tree_label = tree_label;
    if !frame_contributes {
        component.contributes = false;
        component.hint = frame_hint;
    }
    component
}

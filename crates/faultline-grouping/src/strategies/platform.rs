//! Platform families and per-platform symbol cleanup.
//!
//! Function and module names carry compiler- and runtime-generated noise
//! (lambda counters, proxy class hashes, template arguments) that differs
//! per occurrence of the same logical crash. These helpers strip that noise
//! before the names enter a hash.

use once_cell::sync::Lazy;
use regex::Regex;

/// Coarse behavior buckets; grouping heuristics act per family rather than
/// per platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformFamily {
    Native,
    Javascript,
    Other,
}

pub fn behavior_family(platform: Option<&str>) -> PlatformFamily {
    match platform {
        Some("objc" | "cocoa" | "swift" | "native" | "c") => PlatformFamily::Native,
        Some("javascript" | "node") => PlatformFamily::Javascript,
        _ => PlatformFamily::Other,
    }
}

// OpenJDK reflection accessors: GeneratedMethodAccessor4521 and friends.
static JAVA_REFLECT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:sun\.reflect|jdk\.internal\.reflect)\.Generated(?:SerializationConstructor|Constructor|Method)Accessor\d+",
    )
    .unwrap()
});

// Spring/CGLIB and javassist proxy classes carry a per-process hex suffix.
static JAVA_CGLIB_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\$(?:FastClass|Enhancer)By[A-Za-z]+\$\$[0-9a-fA-F]+").unwrap()
});
static JAVA_JAVASSIST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_\$\$_javassist_?\d*").unwrap());

// mymodule$$Lambda$4/1239412043 or mymodule$$Lambda$4
static JAVA_LAMBDA_MODULE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\$Lambda\$\d+(?:[/.]0x[0-9a-fA-F]+|[/.]\d+)?").unwrap());

// Clojure anonymous fns compile to myapp.core$fn__12345.
static CLOJURE_FN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\$+fn)__\d+").unwrap());

// ERB templates compile method names with a generated numeric suffix.
static RUBY_ERB_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"__\d{4,}_\d{4,}$").unwrap());

// Versioned path segments: v1.2.3/, 4.2/, deadbeef1/, full sha1/md5 dirs.
static FILENAME_VERSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:v?(?:\d+\.)*\d+|[a-f0-9]{7,8}|[a-f0-9]{32}|[a-f0-9]{40})/").unwrap()
});

/// Strips generated markers from a Java module (class) name. Returns `None`
/// when nothing changed.
pub(crate) fn clean_java_module(module: &str) -> Option<String> {
    let mut cleaned = JAVA_REFLECT_RE
        .replace_all(module, "sun.reflect.GeneratedAccessor")
        .into_owned();
    cleaned = JAVA_CGLIB_RE
        .replace_all(&cleaned, |_: &regex::Captures| "$$<auto>".to_string())
        .into_owned();
    cleaned = JAVA_JAVASSIST_RE
        .replace_all(&cleaned, |_: &regex::Captures| "_$$_javassist".to_string())
        .into_owned();
    cleaned = CLOJURE_FN_RE.replace_all(&cleaned, "${1}").into_owned();
    if cleaned != module {
        Some(cleaned)
    } else {
        None
    }
}

/// True for Java modules that are lambda classes; those names are unstable
/// across JVM runs and cannot participate in hashing at all.
pub(crate) fn is_java_lambda_module(module: &str) -> bool {
    JAVA_LAMBDA_MODULE_RE.is_match(module)
}

/// Strips the generated ERB suffix from a Ruby method name. Returns `None`
/// when nothing changed.
pub(crate) fn clean_ruby_function(function: &str) -> Option<String> {
    let cleaned = RUBY_ERB_RE.replace(function, "").into_owned();
    if cleaned != function {
        Some(cleaned)
    } else {
        None
    }
}

/// Ruby block frames: `block in foo`, `block (2 levels) in foo`.
pub(crate) fn is_ruby_block_function(function: &str) -> bool {
    function.starts_with("block ")
}

/// Strips a leading version directory from a lowercased filename. Returns
/// `None` when nothing changed.
pub(crate) fn strip_filename_version(filename: &str) -> Option<String> {
    let cleaned = FILENAME_VERSION_RE.replace(filename, "").into_owned();
    if cleaned != filename {
        Some(cleaned)
    } else {
        None
    }
}

/// JavaScript function values that hold no identity whatsoever, including
/// SpiderMonkey nested-closure names (`outer/inner/<`). Frames carrying
/// these are dropped from hashing entirely rather than hashed into a
/// garbage bucket.
pub(crate) fn is_unhashable_javascript_function(function: &str) -> bool {
    matches!(
        function,
        "?" | "<anonymous>" | "<anonymous function>" | "Anonymous function" | "[native code]" | "eval"
    ) || function.ends_with("/<")
}

/// Trims a native symbol for hashing: the Objective-C thunk prefix, a
/// trailing `const` qualifier and the argument list all vary with
/// symbolication quality, not with the crash site.
pub(crate) fn trim_native_function(function: &str) -> String {
    let mut trimmed = function
        .strip_prefix("@objc ")
        .unwrap_or(function)
        .trim()
        .to_string();
    if let Some(stripped) = trimmed.strip_suffix(" const") {
        trimmed = stripped.to_string();
    }
    if trimmed.ends_with(')') {
        if let Some(open) = find_matching_open_paren(&trimmed) {
            let prefix = trimmed[..open].trim_end();
            // `operator()` keeps its parens; stripping them would merge it
            // with the surrounding scope name.
            if !prefix.is_empty() && !prefix.ends_with("operator") {
                trimmed = prefix.to_string();
            }
        }
    }
    trimmed
}

/// Finds the opening paren matching the final closing paren, scanning
/// backwards with nesting depth.
fn find_matching_open_paren(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, ch) in s.char_indices().rev() {
        match ch {
            ')' => depth += 1,
            '(' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

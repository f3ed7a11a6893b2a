use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::ManifestError;
use crate::types::TaskDef;

// Allow expect here as the regex is compile-time verified to be valid.
#[allow(clippy::expect_used)]
fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").expect("static pattern"))
}

/// Literal `{{name}}` token replacement — no conditionals, no loops.
/// Values supplied in `args` win over a param's declared default;
/// a placeholder with neither is a fatal error at dispatch time.
pub fn substitute(
    task_name: &str,
    task: &TaskDef,
    args: &BTreeMap<String, String>,
) -> Result<String, ManifestError> {
    let mut err = None;
    let result = placeholder_re()
        .replace_all(&task.command, |caps: &regex::Captures| {
            let name = &caps[1];
            if let Some(value) = args.get(name) {
                return value.clone();
            }
            if let Some(spec) = task.params.get(name) {
                if let Some(default) = &spec.default {
                    return default.clone();
                }
            }
            err = Some(ManifestError::UnresolvedParam {
                task: task_name.to_string(),
                param: name.to_string(),
            });
            String::new()
        })
        .into_owned();

    match err {
        Some(e) => Err(e),
        None => Ok(result),
    }
}

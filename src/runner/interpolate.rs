//! Variable interpolation for task paths
//!
//! Task fields such as directories and include paths can reference context
//! values with the `${KEY}` syntax. Lookup happens when the task runs, so a
//! group's overrides are visible to the tasks inside it.

use crate::error::{InterpolationError, InterpolationResult};
use crate::runner::Context;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::env;
use std::sync::OnceLock;

/// Maximum number of expansion passes before giving up
const MAX_DEPTH: usize = 16;

fn var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").unwrap())
}

/// Interpolate variables in a string
///
/// Supports:
/// - `${KEY}` - value from the context (lists are joined with ';')
/// - Environment variables (when not found in the context)
///
/// Undefined variables are an error.
pub fn interpolate(s: &str, ctx: &Context) -> InterpolationResult<String> {
    interpolate_vars(s, &ctx.string_vars())
}

/// Interpolate a list of strings
pub fn interpolate_list(list: &[String], ctx: &Context) -> InterpolationResult<Vec<String>> {
    let vars = ctx.string_vars();
    list.iter().map(|s| interpolate_vars(s, &vars)).collect()
}

/// Interpolate against an already flattened variable map
pub fn interpolate_vars(s: &str, vars: &HashMap<String, String>) -> InterpolationResult<String> {
    let re = var_pattern();
    let mut result = s.to_string();

    for _ in 0..MAX_DEPTH {
        if !re.is_match(&result) {
            return Ok(result);
        }

        let mut undefined = None;
        result = re
            .replace_all(&result, |caps: &Captures| {
                let name = &caps[1];
                if let Some(value) = vars.get(name) {
                    return value.clone();
                }
                if let Ok(value) = env::var(name) {
                    return value;
                }
                undefined.get_or_insert_with(|| name.to_string());
                caps[0].to_string()
            })
            .into_owned();

        if let Some(name) = undefined {
            return Err(InterpolationError::UndefinedVariable(name));
        }
    }

    Err(InterpolationError::RecursiveInterpolation)
}

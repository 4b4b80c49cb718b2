use std::sync::OnceLock;

use regex::Regex;

/// Placeholder pattern: `{{ env.VAR }}` with optional `| default("...")`
fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\{\{\s*env\.([A-Za-z0-9_]+)\s*(?:\|\s*default\("([^"]*)"\))?\s*\}\}"#)
            .expect("must be valid regex")
    })
}

/// Expand `{{ env.VAR }}` placeholders in a raw TOML string
///
/// A `{{ env.VAR | default("fallback") }}` form substitutes the fallback
/// when the variable is unset. Lines that are TOML comments are passed
/// through untouched so commented-out secrets never fail expansion.
pub fn expand_env(input: &str) -> Result<String, String> {
    let mut output = String::with_capacity(input.len());

    for (i, line) in input.lines().enumerate() {
        if i > 0 {
            output.push('\n');
        }

        if line.trim_start().starts_with('#') {
            output.push_str(line);
            continue;
        }

        output.push_str(&expand_line(line)?);
    }

    if input.ends_with('\n') {
        output.push('\n');
    }

    Ok(output)
}

/// Expand all placeholders in a single line
fn expand_line(line: &str) -> Result<String, String> {
    let mut result = String::with_capacity(line.len());
    let mut last_end = 0;

    for captures in placeholder_re().captures_iter(line) {
        let overall = captures.get(0).expect("whole match always present");
        let var_name = captures.get(1).expect("group 1 always present").as_str();
        let default_value = captures.get(2).map(|m| m.as_str());

        result.push_str(&line[last_end..overall.start()]);

        match std::env::var(var_name) {
            Ok(value) => result.push_str(&value),
            Err(_) => match default_value {
                Some(default) => result.push_str(default),
                None => return Err(format!("environment variable not found: `{var_name}`")),
            },
        }

        last_end = overall.end();
    }

    result.push_str(&line[last_end..]);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_placeholders() {
        let input = "key = \"value\"";
        assert_eq!(expand_env(input).unwrap(), input);
    }

    #[test]
    fn single_env_var() {
        temp_env::with_var("PRISM_TEST_VAR", Some("hello"), || {
            let result = expand_env("key = \"{{ env.PRISM_TEST_VAR }}\"").unwrap();
            assert_eq!(result, "key = \"hello\"");
        });
    }

    #[test]
    fn multiple_env_vars_across_lines() {
        let vars = [("PRISM_FOO", Some("foo")), ("PRISM_BAR", Some("bar"))];
        temp_env::with_vars(vars, || {
            let result = expand_env("a = \"{{ env.PRISM_FOO }}\"\nb = \"{{ env.PRISM_BAR }}\"").unwrap();
            assert_eq!(result, "a = \"foo\"\nb = \"bar\"");
        });
    }

    #[test]
    fn missing_env_var() {
        temp_env::with_var_unset("PRISM_MISSING_VAR", || {
            let err = expand_env("key = \"{{ env.PRISM_MISSING_VAR }}\"").unwrap_err();
            assert!(err.contains("PRISM_MISSING_VAR"));
        });
    }

    #[test]
    fn commented_lines_skip_expansion() {
        temp_env::with_var_unset("PRISM_MISSING_VAR", || {
            let input = "  # key = \"{{ env.PRISM_MISSING_VAR }}\"";
            assert_eq!(expand_env(input).unwrap(), input);
        });
    }

    #[test]
    fn default_used_when_var_missing() {
        temp_env::with_var_unset("PRISM_OPTIONAL", || {
            let result = expand_env("key = \"{{ env.PRISM_OPTIONAL | default(\"fallback\") }}\"").unwrap();
            assert_eq!(result, "key = \"fallback\"");
        });
    }

    #[test]
    fn default_ignored_when_var_present() {
        temp_env::with_var("PRISM_OPTIONAL", Some("actual"), || {
            let result = expand_env("key = \"{{ env.PRISM_OPTIONAL | default(\"fallback\") }}\"").unwrap();
            assert_eq!(result, "key = \"actual\"");
        });
    }

    #[test]
    fn trailing_newline_preserved() {
        let input = "key = \"value\"\n";
        assert_eq!(expand_env(input).unwrap(), input);
    }
}

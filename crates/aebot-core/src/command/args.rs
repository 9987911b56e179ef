//! Positional argument parsing with fixed-literal delimiters.
//!
//! The walk keeps a cursor over the whitespace-split tokens. A fixed literal
//! further down the schema caps how much the argument before it may consume;
//! the last argument is always greedy so free text and addresses need no
//! trailing delimiter.

use std::collections::HashMap;

use super::spec::CommandSpec;

/// Outcome of parsing one command invocation.
#[derive(Clone, Debug, Default)]
pub struct ParsedArgs {
    args: HashMap<String, String>,
    options: HashMap<String, String>,
    pub missing: Vec<String>,
    pub errors: Vec<String>,
}

impl ParsedArgs {
    /// Argument value, with empty captures treated as absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.args
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Raw argument capture, which may be the empty string.
    pub fn raw(&self, name: &str) -> Option<&str> {
        self.args.get(name).map(String::as_str)
    }

    /// Option value, with valueless `--flag` forms treated as present-but-empty.
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn has_option(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }
}

pub fn parse(spec: &CommandSpec, input: &str) -> ParsedArgs {
    let tokens: Vec<&str> = input.split_whitespace().collect();

    let mut args = HashMap::new();
    let mut missing = Vec::new();
    let mut cursor = 0usize;

    for (index, arg) in spec.args.iter().enumerate() {
        if arg.required && tokens.get(cursor).is_none() {
            missing.push(arg.name.to_string());
        }

        let next_literal = spec
            .args
            .get(index + 1)
            .filter(|next| next.fixed)
            .map(|next| next.name);

        let value = if let Some(literal) = next_literal {
            match tokens.iter().position(|token| *token == literal) {
                Some(position) if position >= cursor => {
                    let value = tokens[cursor..position].join(" ");
                    cursor = position;
                    value
                }
                // Literal absent or already passed: hand everything left to
                // this argument and let the remaining ones report as missing.
                _ => {
                    let value = remaining(&tokens, cursor).join(" ");
                    cursor = tokens.len();
                    value
                }
            }
        } else if index + 1 == spec.args.len() {
            // Last argument is greedy.
            let value = remaining(&tokens, cursor).join(" ");
            cursor = tokens.len();
            value
        } else {
            let value = tokens.get(cursor).copied().unwrap_or_default().to_string();
            cursor += 1;
            value
        };

        args.insert(arg.name.to_string(), value);
    }

    let mut errors = Vec::new();
    let required_count = spec.args.iter().filter(|arg| arg.required).count();
    if required_count > tokens.len() {
        errors.push(format!(
            "Not enough arguments. Expected {required_count}, got {}\nMissing required arguments: {}",
            tokens.len(),
            missing.join(", ")
        ));
    }

    let mut options = HashMap::new();
    for option in &spec.options {
        let flag = format!("--{}", option.name);
        for token in &tokens {
            if token.contains(&flag) {
                let value = token
                    .split_once('=')
                    .map(|(_, value)| value)
                    .unwrap_or_default()
                    .to_string();

                if let Some(allowed) = option.one_of {
                    if !allowed.contains(&value.as_str()) {
                        errors.push(format!(
                            "Option {} must be one of:\n- {}",
                            option.name,
                            allowed.join("\n- ")
                        ));
                    }
                }

                options.insert(option.name.to_string(), value);
            }
        }
    }

    ParsedArgs {
        args,
        options,
        missing,
        errors,
    }
}

fn remaining<'t>(tokens: &[&'t str], cursor: usize) -> Vec<&'t str> {
    tokens.get(cursor..).unwrap_or_default().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::spec::ArgSpec;

    fn transfer_spec() -> CommandSpec {
        CommandSpec::new("send", "Transfer tokens").args(vec![
            ArgSpec::required("amount"),
            ArgSpec::optional("token"),
            ArgSpec::literal("to"),
            ArgSpec::required("recipient"),
        ])
    }

    #[test]
    fn literal_delimited_schema_parses_cleanly() {
        let parsed = parse(&transfer_spec(), "10 AE to @alice:example.org");
        assert_eq!(parsed.get("amount"), Some("10"));
        assert_eq!(parsed.get("token"), Some("AE"));
        assert_eq!(parsed.get("to"), Some("to"));
        assert_eq!(parsed.get("recipient"), Some("@alice:example.org"));
        assert!(parsed.missing.is_empty());
        assert!(parsed.errors.is_empty());
    }

    #[test]
    fn argument_before_literal_takes_multiple_tokens() {
        let spec = CommandSpec::new("note", "Attach a note").args(vec![
            ArgSpec::required("text"),
            ArgSpec::literal("to"),
            ArgSpec::required("recipient"),
        ]);
        let parsed = parse(&spec, "my long note to @bob");
        assert_eq!(parsed.get("text"), Some("my long note"));
        assert_eq!(parsed.get("recipient"), Some("@bob"));
    }

    #[test]
    fn optional_argument_before_literal_may_be_empty() {
        let parsed = parse(&transfer_spec(), "10 to @bob");
        assert_eq!(parsed.get("amount"), Some("10"));
        assert_eq!(parsed.get("token"), None);
        assert_eq!(parsed.get("recipient"), Some("@bob"));
        assert!(parsed.errors.is_empty());
    }

    #[test]
    fn last_argument_is_greedy() {
        let spec = CommandSpec::new("echo", "Echo back")
            .args(vec![ArgSpec::required("message")]);
        let parsed = parse(&spec, "hello wide   world");
        assert_eq!(parsed.get("message"), Some("hello wide world"));
    }

    #[test]
    fn missing_literal_starves_later_arguments() {
        let parsed = parse(&transfer_spec(), "10 AE @alice");
        assert_eq!(parsed.get("token"), Some("AE @alice"));
        assert_eq!(parsed.get("recipient"), None);
        assert!(parsed.missing.contains(&"to".to_string()));
        assert!(parsed.missing.contains(&"recipient".to_string()));
    }

    #[test]
    fn all_missing_arguments_are_reported() {
        let parsed = parse(&transfer_spec(), "");
        assert_eq!(parsed.missing, vec!["amount", "to", "recipient"]);
        assert_eq!(parsed.errors.len(), 1);
        assert!(parsed.errors[0].starts_with("Not enough arguments. Expected 3, got 0"));
        assert!(parsed.errors[0].contains("amount, to, recipient"));
    }

    #[test]
    fn zero_argument_schema_always_succeeds() {
        let spec = CommandSpec::new("help", "Show help");
        let parsed = parse(&spec, "anything at all");
        assert!(parsed.missing.is_empty());
        assert!(parsed.errors.is_empty());
    }

    #[test]
    fn options_parse_values_and_validate_enums() {
        let spec = CommandSpec::new("balance", "Check balance").options(vec![ArgSpec::optional(
            "currency",
        )
        .one_of(&["usd", "eur"])]);

        let parsed = parse(&spec, "--currency=eur");
        assert_eq!(parsed.option("currency"), Some("eur"));
        assert!(parsed.errors.is_empty());

        let parsed = parse(&spec, "--currency=xyz");
        assert_eq!(parsed.option("currency"), Some("xyz"));
        assert_eq!(parsed.errors.len(), 1);
        assert!(parsed.errors[0].contains("must be one of"));

        let parsed = parse(&spec, "AE --currency");
        assert!(parsed.has_option("currency"));
        assert_eq!(parsed.option("currency"), None);
    }

    #[test]
    fn empty_input_on_optional_schema_is_valid() {
        let spec = CommandSpec::new("balance", "Check balance")
            .args(vec![ArgSpec::optional("token")]);
        let parsed = parse(&spec, "");
        assert_eq!(parsed.get("token"), None);
        assert!(parsed.missing.is_empty());
        assert!(parsed.errors.is_empty());
    }
}

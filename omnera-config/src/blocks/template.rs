//! `$identifier` placeholders in block templates.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::VarValue;

/// Variable bindings supplied by a block reference.
pub type Vars = BTreeMap<String, VarValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Text(&'a str),
    /// Placeholder name, without the leading `$`.
    Var(&'a str),
}

/// Splits `input` into literal text and `$name` placeholders.
///
/// A name starts with an ASCII letter or `_` and continues with ASCII
/// alphanumerics or `_`. A `$` not followed by a name start is plain text.
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut text_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let starts_name = bytes[i] == b'$'
            && bytes
                .get(i + 1)
                .is_some_and(|b| b.is_ascii_alphabetic() || *b == b'_');
        if !starts_name {
            i += 1;
            continue;
        }

        let name_start = i + 1;
        let mut end = name_start;
        while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_') {
            end += 1;
        }
        if text_start < i {
            tokens.push(Token::Text(&input[text_start..i]));
        }
        tokens.push(Token::Var(&input[name_start..end]));
        text_start = end;
        i = end;
    }

    if text_start < input.len() {
        tokens.push(Token::Text(&input[text_start..]));
    }
    tokens
}

/// Placeholder names appearing in `input`.
pub fn placeholders(input: &str) -> impl Iterator<Item = &str> {
    tokenize(input).into_iter().filter_map(|t| match t {
        Token::Var(name) => Some(name),
        Token::Text(_) => None,
    })
}

/// Replaces every bound placeholder with its value's text. Unbound
/// placeholders are kept verbatim.
pub fn substitute(input: &str, vars: &Vars) -> String {
    let mut out = String::with_capacity(input.len());
    for token in tokenize(input) {
        match token {
            Token::Text(text) => out.push_str(text),
            Token::Var(name) => match vars.get(name) {
                Some(value) => out.push_str(&value.to_string()),
                None => {
                    out.push('$');
                    out.push_str(name);
                }
            },
        }
    }
    out
}

/// Substitutes placeholders in every string inside `value`.
///
/// A string that is exactly one bound placeholder takes the variable's
/// typed value instead of its text.
pub fn substitute_value(value: &Value, vars: &Vars) -> Value {
    match value {
        Value::String(s) => match tokenize(s).as_slice() {
            [Token::Var(name)] if vars.contains_key(*name) => vars[*name].to_json(),
            _ => Value::String(substitute(s, vars)),
        },
        Value::Array(items) => Value::Array(items.iter().map(|v| substitute_value(v, vars)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), substitute_value(v, vars)))
                .collect::<Map<_, _>>(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, VarValue)]) -> Vars {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("Hello $name, you owe $$amount_1!"),
            [
                Token::Text("Hello "),
                Token::Var("name"),
                Token::Text(", you owe $"),
                Token::Var("amount_1"),
                Token::Text("!"),
            ]
        );
        assert_eq!(tokenize("$1 and $"), [Token::Text("$1 and $")]);
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_substitute() {
        let vars = vars(&[
            ("title", VarValue::from("Welcome")),
            ("count", VarValue::from(3)),
            ("ratio", VarValue::from(2.5)),
            ("on", VarValue::from(true)),
        ]);
        assert_eq!(
            substitute("$title: $count x $ratio ($on) $missing", &vars),
            "Welcome: 3 x 2.5 (true) $missing"
        );
    }

    #[test]
    fn test_integral_floats_print_as_integers() {
        let vars = vars(&[("n", VarValue::from(4.0))]);
        assert_eq!(substitute("n=$n", &vars), "n=4");
    }

    #[test]
    fn test_exact_placeholder_keeps_type() {
        let vars = vars(&[("count", VarValue::from(3)), ("label", VarValue::from("x"))]);
        let value = serde_json::json!({
            "max": "$count",
            "text": "$count items",
            "tags": ["$label", "$other"],
            "flag": true
        });
        assert_eq!(
            substitute_value(&value, &vars),
            serde_json::json!({
                "max": 3,
                "text": "3 items",
                "tags": ["x", "$other"],
                "flag": true
            })
        );
    }
}

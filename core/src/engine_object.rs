//! Line-oriented, brace-delimited text grammar used by scene files.
//!
//! ```text
//! // comment
//! pack: "village"
//! persons
//! {
//!     name "guard_01"
//!     {
//!         position: 12 40
//!     }
//! }
//! ```
//!
//! Parsing produces an untyped [`Value`] tree; typed records are built from it
//! by [`crate::sef`].

use indexmap::IndexMap;
use serde::Serialize;

pub type EngineObject = IndexMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Map(EngineObject),
    Number(f64),
    Text(String),
    Numbers(Vec<f64>),
}

impl Value {
    pub fn as_map(&self) -> Option<&EngineObject> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_numbers(&self) -> Option<&[f64]> {
        match self {
            Value::Numbers(n) => Some(n),
            _ => None,
        }
    }
}

/// Parses scene text into a nested mapping. Never fails; lines that are not
/// understood are skipped.
pub fn parse_engine_object(input: &str) -> EngineObject {
    let lines: Vec<&str> = input
        .lines()
        .map(|line| match line.find("//") {
            Some(at) => line[..at].trim(),
            None => line.trim(),
        })
        .filter(|line| !line.is_empty() && !line.chars().all(|c| c == '/' || c == '\\'))
        .collect();

    let mut parser = BlockParser { lines: &lines, at: 0 };
    parser.block()
}

struct BlockParser<'a> {
    lines: &'a [&'a str],
    at: usize,
}

impl BlockParser<'_> {
    fn next_opens_block(&self) -> bool {
        self.lines.get(self.at + 1) == Some(&"{")
    }

    /// Parses entries until a closing brace (consumed) or the end of input.
    fn block(&mut self) -> EngineObject {
        let mut result = EngineObject::new();

        while let Some(&line) = self.lines.get(self.at) {
            if line == "}" {
                self.at += 1;
                return result;
            }

            let Some((key, value)) = split_key_value(line) else {
                self.at += 1;
                continue;
            };

            if value.is_none() && !self.next_opens_block() {
                self.at += 1;
                continue;
            }
            let value = value.unwrap_or_default();

            if value.is_empty() && self.next_opens_block() {
                self.at += 2;
                let nested = self.block();
                result.insert(key.to_string(), Value::Map(nested));
            } else if key == "name" {
                let synthetic = strip_quotes(value).to_string();
                if self.next_opens_block() {
                    self.at += 2;
                    let nested = self.block();
                    result.insert(synthetic, Value::Map(nested));
                } else {
                    self.at += 1;
                    result.insert(synthetic, Value::Map(EngineObject::new()));
                }
            } else if value == "{" {
                self.at += 1;
                let nested = self.block();
                result.insert(key.to_string(), Value::Map(nested));
            } else {
                self.at += 1;
                result.insert(key.to_string(), coerce(value));
            }
        }

        result
    }
}

/// `key: value` splits at the first colon; otherwise the first whitespace
/// separates key from value. A bare word has no value and only counts when a
/// block follows it.
fn split_key_value(line: &str) -> Option<(&str, Option<&str>)> {
    if line == "{" {
        return None;
    }
    if let Some((key, value)) = line.split_once(':') {
        if !key.is_empty() {
            return Some((key.trim(), Some(value.trim())));
        }
    }

    let mut parts = line.splitn(2, char::is_whitespace);
    let key = parts.next()?;
    Some((key, parts.next().map(str::trim)))
}

fn strip_quotes(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

fn parse_number(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Quoted text is unquoted; whitespace-separated numbers become a sequence;
/// a single number stays a number; anything else is text.
///
/// A bare empty value (`key:` with no block after it) reads as the number 0.
/// A quoted empty string stays empty text.
fn coerce(value: &str) -> Value {
    if value.is_empty() {
        return Value::Number(0.0);
    }
    let unquoted = strip_quotes(value);
    let tokens: Vec<&str> = unquoted.split_whitespace().collect();

    match tokens.as_slice() {
        [single] => match parse_number(single) {
            Some(n) => Value::Number(n),
            None => Value::Text(unquoted.to_string()),
        },
        [_, _, ..] => match tokens.iter().map(|t| parse_number(t)).collect() {
            Some(numbers) => Value::Numbers(numbers),
            None => Value::Text(unquoted.to_string()),
        },
        _ => Value::Text(unquoted.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: Vec<(&str, Value)>) -> Value {
        Value::Map(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    #[test]
    fn named_block_becomes_synthetic_key() {
        let parsed = parse_engine_object("name \"door_main\"\n{\nis_opened: 1\n}\n");
        let expected = map(vec![(
            "door_main",
            map(vec![("is_opened", Value::Number(1.0))]),
        )]);
        assert_eq!(Value::Map(parsed), expected);
    }

    #[test]
    fn scalar_coercion() {
        let parsed = parse_engine_object(
            "pack: \"Village\"\n\
             weather 2\n\
             position: 12 40\n\
             route: \"a b\"\n\
             mixed: 1 two\n\
             spaced key: value: with colon\n\
             neg: -3.5\n\
             big: inf\n",
        );
        assert_eq!(parsed["pack"], Value::Text("Village".into()));
        assert_eq!(parsed["weather"], Value::Number(2.0));
        assert_eq!(parsed["position"], Value::Numbers(vec![12.0, 40.0]));
        assert_eq!(parsed["route"], Value::Text("a b".into()));
        assert_eq!(parsed["mixed"], Value::Text("1 two".into()));
        assert_eq!(parsed["spaced key"], Value::Text("value: with colon".into()));
        assert_eq!(parsed["neg"], Value::Number(-3.5));
        assert_eq!(parsed["big"], Value::Text("inf".into()));
    }

    #[test]
    fn empty_value_reads_as_zero() {
        let parsed = parse_engine_object("is_opened:\nlabel: \"\"\nnext: 1\n");
        assert_eq!(parsed["is_opened"], Value::Number(0.0));
        assert_eq!(parsed["label"], Value::Text(String::new()));
        assert_eq!(parsed["next"], Value::Number(1.0));
    }

    #[test]
    fn comments_and_separator_lines_are_dropped() {
        let parsed = parse_engine_object(
            "// header comment\n\
             ////////\n\
             \\\\\n\
             \n\
             version: 1.5 // trailing\n",
        );
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed["version"], Value::Number(1.5));
    }

    #[test]
    fn nested_blocks_in_both_styles() {
        let parsed = parse_engine_object(
            "persons\n\
             {\n\
                 name \"guard\"\n\
                 {\n\
                     position: 1 2\n\
                 }\n\
                 name \"empty\"\n\
             }\n\
             cell_groups: {\n\
                 gate: 3 4 5 6\n\
             }\n\
             after: 7\n",
        );
        let persons = parsed["persons"].as_map().unwrap();
        assert_eq!(
            persons["guard"].as_map().unwrap()["position"],
            Value::Numbers(vec![1.0, 2.0])
        );
        assert_eq!(persons["empty"], Value::Map(EngineObject::new()));
        assert_eq!(
            parsed["cell_groups"].as_map().unwrap()["gate"].as_numbers(),
            Some(&[3.0, 4.0, 5.0, 6.0][..])
        );
        assert_eq!(parsed["after"].as_number(), Some(7.0));
    }

    #[test]
    fn keeps_entry_order() {
        let parsed = parse_engine_object("name c\n{\n}\nname a\n{\n}\nname b\n{\n}\n");
        let keys: Vec<&str> = parsed.keys().map(String::as_str).collect();
        assert_eq!(keys, ["c", "a", "b"]);
    }

    #[test]
    fn stray_lines_and_unclosed_blocks_are_tolerated() {
        let parsed = parse_engine_object("{\nlonely\nouter\n{\ninner: 1\n");
        assert_eq!(
            parsed["outer"],
            map(vec![("inner", Value::Number(1.0))])
        );
        assert!(!parsed.contains_key("lonely"));
    }
}

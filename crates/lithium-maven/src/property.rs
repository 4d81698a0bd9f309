//! `${property}` substitution.
//!
//! Only the first placeholder of a value is replaced. The table it is
//! resolved against is already merged with every ancestor, so substitution is
//! a single lookup: values are never expanded again and cannot recurse.
//! Whatever placeholder is left afterwards makes the value unresolved.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("Invalid regex"));

/// Property name to value, merged along a descriptor's parent chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyTable {
    values: HashMap<String, String>,
}

impl PropertyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of `self` with `overrides` written on top.
    pub fn merged<I>(&self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut values = self.values.clone();
        values.extend(overrides);
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, String)> for PropertyTable {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Substitution {
    Resolved(String),
    Unresolved { name: String },
}

/// Replaces the `${name}` reference in `text`, if any.
///
/// Text without a placeholder comes back unchanged. An unknown name is
/// logged and reported as [`Substitution::Unresolved`]; the caller decides
/// what to do with the owning declaration.
pub fn substitute(text: &str, properties: &PropertyTable) -> Substitution {
    let Some(caps) = PLACEHOLDER.captures(text) else {
        return Substitution::Resolved(text.to_string());
    };
    let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
        return Substitution::Resolved(text.to_string());
    };

    match properties.get(name.as_str()) {
        Some(value) => Substitution::Resolved(format!(
            "{}{}{}",
            &text[..whole.start()],
            value,
            &text[whole.end()..]
        )),
        None => {
            tracing::warn!("unresolved variable '${{{}}}'", name.as_str());
            Substitution::Unresolved {
                name: name.as_str().to_string(),
            }
        }
    }
}

/// Name of the first placeholder left in `text`.
///
/// A substituted value still carries one when the property's own value was a
/// reference, or when the text held more than one reference.
pub fn leftover_placeholder(text: &str) -> Option<&str> {
    PLACEHOLDER
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|name| name.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(pairs: &[(&str, &str)]) -> PropertyTable {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_plain_text_unchanged() {
        let props = table(&[]);
        assert_eq!(
            substitute("3.14.0", &props),
            Substitution::Resolved("3.14.0".into())
        );
    }

    #[test]
    fn test_whole_value_placeholder() {
        let props = table(&[("foo", "1.2.3")]);
        assert_eq!(
            substitute("${foo}", &props),
            Substitution::Resolved("1.2.3".into())
        );
    }

    #[test]
    fn test_embedded_placeholder() {
        let props = table(&[("minor", "4")]);
        assert_eq!(
            substitute("1.${minor}-jre", &props),
            Substitution::Resolved("1.4-jre".into())
        );
    }

    #[test]
    fn test_unknown_name() {
        let props = table(&[("foo", "1")]);
        assert_eq!(
            substitute("${bar}", &props),
            Substitution::Unresolved { name: "bar".into() }
        );
    }

    #[test]
    fn test_no_recursive_expansion() {
        let props = table(&[("a", "${b}"), ("b", "2")]);
        assert_eq!(
            substitute("${a}", &props),
            Substitution::Resolved("${b}".into())
        );
    }

    #[test]
    fn test_merged_overrides_shadow() {
        let parent = table(&[("v", "1"), ("only.parent", "p")]);
        let child = parent.merged([("v".to_string(), "2".to_string())]);
        assert_eq!(child.get("v"), Some("2"));
        assert_eq!(child.get("only.parent"), Some("p"));
        assert_eq!(parent.get("v"), Some("1"));
        assert_eq!(child.len(), 2);
    }

    #[test]
    fn test_leftover_placeholder() {
        assert_eq!(leftover_placeholder("${x}"), Some("x"));
        assert_eq!(leftover_placeholder("1.0"), None);
        assert_eq!(leftover_placeholder("${unterminated"), None);
    }

    #[test]
    fn test_substitution_can_leave_a_placeholder() {
        let props = table(&[("a", "${b}"), ("b", "2")]);

        let chained = substitute("${a}", &props);
        assert_eq!(chained, Substitution::Resolved("${b}".into()));
        assert_eq!(leftover_placeholder("${b}"), Some("b"));

        let Substitution::Resolved(two_tokens) = substitute("${b}.${zzz}", &props) else {
            panic!("first token should resolve");
        };
        assert_eq!(two_tokens, "2.${zzz}");
        assert_eq!(leftover_placeholder(&two_tokens), Some("zzz"));
    }
}

//! Multi-valued request parameters.
//!
//! [`MultiValueDict`] is the single container used for both the query string
//! and the form body of a request, and for building the signature body. Keys
//! keep their insertion order, which the signature depends on.

use std::fmt;

use indexmap::IndexMap;
use url::form_urlencoded;

/// A value that can be stored in a [`MultiValueDict`].
///
/// Returning `None` means "no value": the entry is skipped rather than stored
/// as an empty string.
pub trait ParamValue {
    fn to_param(&self) -> Option<String>;
}

macro_rules! display_param_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ParamValue for $ty {
                fn to_param(&self) -> Option<String> {
                    Some(self.to_string())
                }
            }
        )*
    };
}

display_param_value!(
    str, String, bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32,
    f64,
);

impl<T: ParamValue + ?Sized> ParamValue for &T {
    fn to_param(&self) -> Option<String> {
        (**self).to_param()
    }
}

impl<T: ParamValue> ParamValue for Option<T> {
    fn to_param(&self) -> Option<String> {
        self.as_ref().and_then(ParamValue::to_param)
    }
}

/// An insertion-ordered mapping from a key to zero or more string values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiValueDict {
    entries: IndexMap<String, Vec<String>>,
}

impl MultiValueDict {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append every present value to `key`, creating the key if needed.
    ///
    /// Values whose [`ParamValue::to_param`] is `None` are skipped. The key is
    /// still created even if no value survives.
    pub fn add<K, I>(&mut self, key: K, values: I) -> &mut Self
    where
        K: Into<String>,
        I: IntoIterator,
        I::Item: ParamValue,
    {
        let slot = self.entries.entry(key.into()).or_default();
        slot.extend(values.into_iter().filter_map(|v| v.to_param()));
        self
    }

    /// Append a single value to `key`.
    pub fn add_one<K, V>(&mut self, key: K, value: V) -> &mut Self
    where
        K: Into<String>,
        V: ParamValue,
    {
        self.add(key, [value])
    }

    /// By-value form of [`add`](Self::add), for building a dictionary inline.
    pub fn with<K, I>(mut self, key: K, values: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator,
        I::Item: ParamValue,
    {
        self.add(key, values);
        self
    }

    /// By-value form of [`add_one`](Self::add_one).
    pub fn with_one<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: ParamValue,
    {
        self.add_one(key, value);
        self
    }

    /// Delete `key` and all of its values. Order of the remaining keys is kept.
    pub fn remove(&mut self, key: &str) -> &mut Self {
        self.entries.shift_remove(key);
        self
    }

    /// Remove every key.
    pub fn clear(&mut self) -> &mut Self {
        self.entries.clear();
        self
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of keys (not values).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(key, values)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    /// Expand into `(key, value)` pairs, one per value, in insertion order.
    ///
    /// Both wire encoders are built on this sequence.
    pub fn to_flat_pairs(&self) -> Vec<(&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(key, values)| values.iter().map(move |v| (key.as_str(), v.as_str())))
            .collect()
    }

    /// Render as a URL query string (without the leading `?`).
    ///
    /// Repeated keys produce repeated `key=value` pairs. An empty dictionary
    /// renders as an empty string.
    pub fn to_query_string(&self) -> String {
        self.encode()
    }

    /// Render as an `application/x-www-form-urlencoded` request body.
    pub fn to_form_body(&self) -> String {
        self.encode()
    }

    fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.to_flat_pairs())
            .finish()
    }
}

impl fmt::Display for MultiValueDict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{{")?;
        for (key, values) in &self.entries {
            writeln!(f, "  {}: {}", key, values.join(", "))?;
        }
        writeln!(f, "}}")
    }
}

impl<K, V> Extend<(K, V)> for MultiValueDict
where
    K: Into<String>,
    V: ParamValue,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.add_one(key, value);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for MultiValueDict
where
    K: Into<String>,
    V: ParamValue,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut dict = Self::new();
        dict.extend(iter);
        dict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_skips_none_values() {
        let mut dict = MultiValueDict::new();
        dict.add("a", [Some("1"), None, Some("2")]);
        dict.add_one("a", None::<i32>);

        assert_eq!(dict.get("a"), Some(&["1".to_string(), "2".to_string()][..]));
    }

    #[test]
    fn test_add_none_only_still_creates_key() {
        let mut dict = MultiValueDict::new();
        dict.add_one("empty", None::<&str>);

        assert!(dict.contains_key("empty"));
        assert_eq!(dict.get("empty").map(<[String]>::len), Some(0));
        assert!(dict.to_flat_pairs().is_empty());
    }

    #[test]
    fn test_values_are_stringified() {
        let dict = MultiValueDict::new()
            .with_one("int", 42)
            .with_one("float", 1.5)
            .with_one("flag", true);

        assert_eq!(
            dict.to_flat_pairs(),
            vec![("int", "42"), ("float", "1.5"), ("flag", "true")]
        );
    }

    #[test]
    fn test_chaining_appends_to_existing_key() {
        let mut dict = MultiValueDict::new();
        dict.add_one("k", "x").add_one("other", 1).add_one("k", "y");

        assert_eq!(dict.len(), 2);
        assert_eq!(
            dict.to_flat_pairs(),
            vec![("k", "x"), ("k", "y"), ("other", "1")]
        );
    }

    #[test]
    fn test_remove_and_clear() {
        let mut dict = MultiValueDict::new()
            .with_one("a", 1)
            .with_one("b", 2)
            .with_one("c", 3);

        dict.remove("b").remove("missing");
        assert_eq!(dict.iter().map(|(k, _)| k).collect::<Vec<_>>(), vec!["a", "c"]);

        dict.clear();
        assert!(dict.is_empty());
    }

    #[test]
    fn test_empty_query_string() {
        assert_eq!(MultiValueDict::new().to_query_string(), "");
        assert_eq!(MultiValueDict::new().to_form_body(), "");
    }

    #[test]
    fn test_query_string_repeats_keys() {
        let dict = MultiValueDict::new().with("a", [1, 2]);
        let query = dict.to_query_string();

        assert_eq!(query, "a=1&a=2");
        assert_eq!(query.split('&').filter(|p| p.starts_with("a=")).count(), 2);
    }

    #[test]
    fn test_encoding_escapes_reserved_characters() {
        let dict = MultiValueDict::new()
            .with_one("name", "Jane Doe")
            .with_one("q", "a&b=c")
            .with_one("email", "jane@example.com");

        assert_eq!(
            dict.to_form_body(),
            "name=Jane+Doe&q=a%26b%3Dc&email=jane%40example.com"
        );
        assert_eq!(dict.to_query_string(), dict.to_form_body());
    }

    #[test]
    fn test_from_iterator_groups_by_key() {
        let dict: MultiValueDict = [("x", "1"), ("y", "2"), ("x", "3")].into_iter().collect();

        assert_eq!(dict.len(), 2);
        assert_eq!(dict.get("x"), Some(&["1".to_string(), "3".to_string()][..]));
    }

    #[test]
    fn test_display() {
        let dict = MultiValueDict::new().with("ids", [1, 2]).with_one("q", "z");

        assert_eq!(dict.to_string(), "{\n  ids: 1, 2\n  q: z\n}\n");
    }
}

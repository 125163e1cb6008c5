//! Query strings and link rewriting.
//!
//! [`QueryParams`] is the parsed query of the current request. A
//! [`QueryRewrite`] describes how a link differs from it: keys to drop, exact
//! pairs to drop, and values to change or add. Three renderings exist:
//!
//! | Operation | Existing value for a key in the rewrite | Key not present |
//! |---|---|---|
//! | [`modify_query`] | replaced, once, at the key's position | appended |
//! | [`add_to_query`] | kept; the new value is appended unless already present | appended |
//! | [`remove_from_query`] | untouched (only removals apply) | ignored |
//!
//! All three produce `path` alone when nothing is left, otherwise
//! `path?k=v&amp;k2=v2`, ready to drop into an HTML attribute:
//!
//! ```rust
//! use warden::query::{QueryParams, QueryRewrite};
//!
//! let current = QueryParams::parse("q=rust&page=3");
//! let next = QueryRewrite::new().set("page", 4).modify(&current, "/search");
//! assert_eq!(next, "/search?q=rust&amp;page=4");
//! ```

use std::fmt;

use url::form_urlencoded;

use crate::request::Request;

/// An ordered list of `(key, value)` pairs. Keys may repeat.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an `application/x-www-form-urlencoded` query (no leading `?`).
    pub fn parse(query: &str) -> Self {
        form_urlencoded::parse(query.as_bytes()).into_owned().collect()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_all(key).next()
    }

    pub fn get_all<'a>(&'a self, key: &str) -> impl Iterator<Item = &'a str> {
        self.pairs
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Values grouped per key, keys in first-seen order.
    pub fn groups(&self) -> Vec<(&str, Vec<&str>)> {
        let mut groups: Vec<(&str, Vec<&str>)> = Vec::new();
        for (key, value) in self.iter() {
            match groups.iter_mut().find(|(k, _)| *k == key) {
                Some((_, values)) => values.push(value),
                None => groups.push((key, vec![value])),
            }
        }
        groups
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { pairs: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

// ── QueryValue ────────────────────────────────────────────────────────────────

/// A value supplied to a [`QueryRewrite`].
///
/// Falsy values (empty text, `0`, `false`, [`QueryValue::Absent`]) are never
/// written to a link. Setting a key to a falsy value therefore removes it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryValue {
    Text(String),
    Int(i64),
    Bool(bool),
    Absent,
}

impl QueryValue {
    pub fn is_falsy(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty(),
            Self::Int(n) => *n == 0,
            Self::Bool(b) => !b,
            Self::Absent => true,
        }
    }
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Absent => Ok(()),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(s: &str) -> Self { Self::Text(s.to_owned()) }
}

impl From<String> for QueryValue {
    fn from(s: String) -> Self { Self::Text(s) }
}

impl From<i64> for QueryValue {
    fn from(n: i64) -> Self { Self::Int(n) }
}

impl From<i32> for QueryValue {
    fn from(n: i32) -> Self { Self::Int(n.into()) }
}

impl From<u32> for QueryValue {
    fn from(n: u32) -> Self { Self::Int(n.into()) }
}

impl From<usize> for QueryValue {
    fn from(n: usize) -> Self { Self::Int(i64::try_from(n).unwrap_or(i64::MAX)) }
}

impl From<bool> for QueryValue {
    fn from(b: bool) -> Self { Self::Bool(b) }
}

impl<T: Into<QueryValue>> From<Option<T>> for QueryValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Absent, Into::into)
    }
}

// ── QueryRewrite ──────────────────────────────────────────────────────────────

/// The difference between the current query and the link being built.
///
/// Removal always wins: a key that is both removed and set is dropped.
#[derive(Clone, Debug, Default)]
pub struct QueryRewrite {
    remove: Vec<String>,
    remove_pairs: Vec<(String, String)>,
    set: Vec<(String, QueryValue)>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Change,
    Add,
    RemoveOnly,
}

impl QueryRewrite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every value of `key`.
    pub fn remove(mut self, key: impl Into<String>) -> Self {
        self.remove.push(key.into());
        self
    }

    /// Drop the single pair `key=value`, keeping other values of `key`.
    pub fn remove_pair(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.remove_pairs.push((key.into(), value.into().to_string()));
        self
    }

    /// Set `key` to `value`. Setting the same key twice keeps the last value.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.set.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.set.push((key, value)),
        }
        self
    }

    /// Replaces or appends the values given to [`set`](Self::set).
    pub fn modify(&self, current: &QueryParams, path: &str) -> String {
        self.render(current, path, Mode::Change)
    }

    /// Appends the values given to [`set`](Self::set) unless the exact
    /// value is already present for that key.
    pub fn add(&self, current: &QueryParams, path: &str) -> String {
        self.render(current, path, Mode::Add)
    }

    /// Applies removals only; values given to [`set`](Self::set) are ignored.
    pub fn strip(&self, current: &QueryParams, path: &str) -> String {
        self.render(current, path, Mode::RemoveOnly)
    }

    fn is_removed(&self, key: &str) -> bool {
        self.remove.iter().any(|k| k == key)
    }

    fn is_removed_pair(&self, key: &str, value: &str) -> bool {
        self.remove_pairs.iter().any(|(k, v)| k == key && v == value)
    }

    fn render(&self, current: &QueryParams, path: &str, mode: Mode) -> String {
        let mut pending: Vec<(&str, &QueryValue)> = match mode {
            Mode::RemoveOnly => Vec::new(),
            Mode::Change | Mode::Add => self.set.iter().map(|(k, v)| (k.as_str(), v)).collect(),
        };
        let mut out: Vec<(&str, String)> = Vec::with_capacity(current.len() + pending.len());

        for (key, values) in current.groups() {
            if self.is_removed(key) {
                continue;
            }
            let slot = pending.iter().position(|(k, _)| *k == key);

            if mode == Mode::Change {
                if let Some(i) = slot {
                    let (_, value) = pending.remove(i);
                    if !value.is_falsy() {
                        out.push((key, value.to_string()));
                    }
                    continue;
                }
            }

            if mode == Mode::Add {
                if let Some(i) = slot {
                    let wanted = pending[i].1.to_string();
                    if values.contains(&wanted.as_str()) {
                        pending.remove(i);
                    }
                }
            }

            out.extend(
                values
                    .into_iter()
                    .filter(|v| !v.is_empty() && !self.is_removed_pair(key, v))
                    .map(|v| (key, v.to_owned())),
            );
        }

        out.extend(
            pending
                .into_iter()
                .filter(|(k, v)| !v.is_falsy() && !self.is_removed(k))
                .map(|(k, v)| (k, v.to_string()))
                .filter(|(k, v)| !self.is_removed_pair(k, v)),
        );

        encode(path, &out)
    }
}

fn encode(path: &str, pairs: &[(&str, String)]) -> String {
    if pairs.is_empty() {
        return path.to_owned();
    }
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    format!("{path}?{}", query.replace('&', "&amp;"))
}

/// Link to the current page with `rewrite` applied in change mode.
pub fn modify_query(req: &Request, rewrite: &QueryRewrite) -> String {
    rewrite.modify(req.query(), req.path())
}

/// Link to the current page with `rewrite` applied in add mode.
pub fn add_to_query(req: &Request, rewrite: &QueryRewrite) -> String {
    rewrite.add(req.query(), req.path())
}

/// Link to the current page with only the removals of `rewrite` applied.
pub fn remove_from_query(req: &Request, rewrite: &QueryRewrite) -> String {
    rewrite.strip(req.query(), req.path())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        pairs.iter().copied().collect()
    }

    /// Parses the query half of a rendered link back into params.
    fn reparse(link: &str) -> QueryParams {
        link.split_once('?')
            .map(|(_, q)| QueryParams::parse(&q.replace("&amp;", "&")))
            .unwrap_or_default()
    }

    #[test]
    fn removes_a_key() {
        let current = params(&[("q", "1"), ("page", "2")]);
        let link = QueryRewrite::new().remove("page").modify(&current, "/search");
        assert_eq!(link, "/search?q=1");
    }

    #[test]
    fn changes_an_existing_key() {
        let current = params(&[("sort", "asc")]);
        let link = QueryRewrite::new().set("sort", "desc").modify(&current, "/list");
        assert_eq!(link, "/list?sort=desc");
    }

    #[test]
    fn appends_a_missing_key() {
        let link = QueryRewrite::new().set("tag", "go").modify(&QueryParams::new(), "/items");
        assert_eq!(link, "/items?tag=go");
    }

    #[test]
    fn empty_query_renders_bare_path() {
        assert_eq!(QueryRewrite::new().modify(&QueryParams::new(), "/"), "/");
        let current = params(&[("page", "2")]);
        assert_eq!(QueryRewrite::new().remove("page").modify(&current, "/list"), "/list");
    }

    #[test]
    fn change_collapses_repeated_key_at_first_position() {
        let current = params(&[("a", "1"), ("tag", "x"), ("b", "2"), ("tag", "y")]);
        let link = QueryRewrite::new().set("tag", "z").modify(&current, "/p");
        assert_eq!(link, "/p?a=1&amp;tag=z&amp;b=2");
    }

    #[test]
    fn repeated_values_stay_grouped_under_their_key() {
        let current = params(&[("tag", "x"), ("a", "1"), ("tag", "y")]);
        let link = QueryRewrite::new().modify(&current, "/p");
        assert_eq!(link, "/p?tag=x&amp;tag=y&amp;a=1");
    }

    #[test]
    fn removal_beats_change() {
        let current = params(&[("page", "2")]);
        let rewrite = QueryRewrite::new().remove("page").set("page", 3).set("sort", "new");
        assert_eq!(rewrite.modify(&current, "/l"), "/l?sort=new");
        assert_eq!(rewrite.modify(&QueryParams::new(), "/l"), "/l?sort=new");
    }

    #[test]
    fn falsy_values_never_render() {
        let current = params(&[("q", ""), ("page", "2"), ("keep", "0")]);
        let rewrite = QueryRewrite::new()
            .set("page", 0)
            .set("flag", false)
            .set("empty", "")
            .set("none", None::<&str>);
        // "0" from the URL is text, not a number.
        assert_eq!(rewrite.modify(&current, "/s"), "/s?keep=0");
    }

    #[test]
    fn all_falsy_renders_bare_path() {
        let current = params(&[("q", "")]);
        assert_eq!(QueryRewrite::new().set("page", 0).modify(&current, "/s"), "/s");
    }

    #[test]
    fn encodes_values_and_escapes_separator() {
        let current = params(&[("q", "rust & go")]);
        let link = QueryRewrite::new().set("lang", "en us").modify(&current, "/s");
        assert_eq!(link, "/s?q=rust+%26+go&amp;lang=en+us");
    }

    #[test]
    fn modify_is_idempotent() {
        let current = params(&[("a", "1"), ("b", "2"), ("b", "3"), ("c", "")]);
        let rewrite = QueryRewrite::new().remove("a").set("b", "9").set("d", 4);
        let once = rewrite.modify(&current, "/x");
        let twice = rewrite.modify(&reparse(&once), "/x");
        assert_eq!(once, twice);
    }

    #[test]
    fn set_keys_appear_exactly_once() {
        let current = params(&[("k", "1"), ("k", "2"), ("j", "1")]);
        let link = QueryRewrite::new().set("k", "v").set("n", "w").modify(&current, "/");
        let out = reparse(&link);
        assert_eq!(out.get_all("k").collect::<Vec<_>>(), ["v"]);
        assert_eq!(out.get_all("n").collect::<Vec<_>>(), ["w"]);
    }

    #[test]
    fn add_skips_existing_value() {
        let current = params(&[("tag", "rust"), ("page", "2")]);
        let link = QueryRewrite::new().set("tag", "rust").add(&current, "/t");
        assert_eq!(link, "/t?tag=rust&amp;page=2");
    }

    #[test]
    fn add_appends_new_value_after_existing_ones() {
        let current = params(&[("tag", "rust"), ("page", "2")]);
        let link = QueryRewrite::new().set("tag", "go").remove("page").add(&current, "/t");
        assert_eq!(link, "/t?tag=rust&amp;tag=go");
    }

    #[test]
    fn add_compares_values_as_text() {
        let current = params(&[("page", "2")]);
        assert_eq!(QueryRewrite::new().set("page", 2).add(&current, "/t"), "/t?page=2");
    }

    #[test]
    fn strip_removes_keys_and_pairs_only() {
        let current = params(&[("tag", "rust"), ("tag", "go"), ("page", "2"), ("q", "x")]);
        let link = QueryRewrite::new()
            .remove("page")
            .remove_pair("tag", "go")
            .set("ignored", "yes")
            .strip(&current, "/t");
        assert_eq!(link, "/t?tag=rust&amp;q=x");
    }

    #[test]
    fn unknown_keys_are_ignored_by_removals() {
        let current = params(&[("q", "1")]);
        let link = QueryRewrite::new().remove("nope").remove_pair("x", "y").strip(&current, "/");
        assert_eq!(link, "/?q=1");
    }

    #[test]
    fn parse_decodes_form_encoding() {
        let q = QueryParams::parse("a=1&b=hello+world&a=%262");
        assert_eq!(q.get("b"), Some("hello world"));
        assert_eq!(q.get_all("a").collect::<Vec<_>>(), ["1", "&2"]);
        assert_eq!(q.groups(), vec![("a", vec!["1", "&2"]), ("b", vec!["hello world"])]);
    }
}

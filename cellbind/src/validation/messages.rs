//! Message-template bundles and their locale layering.
//!
//! A [`MessageStore`] maps locales to [`MessageBundle`]s. Looking up a key
//! walks an explicit list of layers: the exact locale, then its parents
//! (declared on the bundle or derived from the tag), then the root bundle.

use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

use crate::error::{ConfigError, ConfigResult};
use crate::locale::Locale;

/// Library-wide fallback key.
pub const FALLBACK_KEY: &str = "cellbind.validation.violated";

const ROOT_MESSAGES: &str = include_str!("../../messages/messages.properties");
const JA_MESSAGES: &str = include_str!("../../messages/messages_ja.properties");

static BUILTIN_ROOT: Lazy<MessageBundle> = Lazy::new(|| {
    MessageBundle::from_properties(ROOT_MESSAGES).expect("built-in root messages are valid")
});

static BUILTIN_JA: Lazy<MessageBundle> = Lazy::new(|| {
    MessageBundle::from_properties(JA_MESSAGES).expect("built-in ja messages are valid")
});

/// Key to template entries for one locale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageBundle {
    entries: HashMap<String, String>,
    parent: Option<Locale>,
}

impl MessageBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `key=value` properties text.
    ///
    /// Supports `#`/`!` comments, `=` or `:` separators, backslash line
    /// continuation and the `\n`, `\t`, `\\` and `\uXXXX` escapes.
    pub fn from_properties(text: &str) -> ConfigResult<Self> {
        let mut bundle = Self::new();
        let mut lines = text.lines().enumerate();

        while let Some((index, line)) = lines.next() {
            let start = line.trim_start();
            if start.is_empty() || start.starts_with('#') || start.starts_with('!') {
                continue;
            }

            let mut logical = String::from(start);
            while ends_with_continuation(&logical) {
                logical.pop();
                match lines.next() {
                    Some((_, next)) => logical.push_str(next.trim_start()),
                    None => break,
                }
            }

            let (key, value) = split_entry(&logical);
            let key = unescape(key).map_err(|reason| ConfigError::MessageBundle {
                line: index + 1,
                reason,
            })?;
            let value = unescape(value).map_err(|reason| ConfigError::MessageBundle {
                line: index + 1,
                reason,
            })?;
            bundle.entries.insert(key, value);
        }

        Ok(bundle)
    }

    /// Declare the locale whose bundle is consulted after this one.
    pub fn with_parent(mut self, parent: Locale) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_message(mut self, key: impl Into<String>, template: impl Into<String>) -> Self {
        self.insert(key, template);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, template: impl Into<String>) {
        self.entries.insert(key.into(), template.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn parent(&self) -> Option<&Locale> {
        self.parent.as_ref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

/// Split at the first unescaped `=` or `:`, or at whitespace.
fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => return (line[..i].trim_end(), line[i + 1..].trim_start()),
            c if c.is_whitespace() => {
                let rest = line[i..].trim_start();
                let rest = rest
                    .strip_prefix(['=', ':'])
                    .map(str::trim_start)
                    .unwrap_or(rest);
                return (&line[..i], rest);
            }
            _ => {}
        }
    }
    (line, "")
}

fn unescape(s: &str) -> Result<String, String> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let code = u32::from_str_radix(&hex, 16)
                    .ok()
                    .filter(|_| hex.len() == 4)
                    .and_then(char::from_u32)
                    .ok_or_else(|| format!("malformed \\u escape '\\u{}'", hex))?;
                out.push(code);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    Ok(out)
}

/// Bundles per locale with an always-present root bundle.
#[derive(Debug, Clone)]
pub struct MessageStore {
    bundles: HashMap<Locale, MessageBundle>,
}

impl Default for MessageStore {
    fn default() -> Self {
        Self::builtin()
    }
}

impl MessageStore {
    /// Only the given root bundle.
    pub fn with_root(root: MessageBundle) -> Self {
        let mut bundles = HashMap::new();
        bundles.insert(Locale::root(), root);
        Self { bundles }
    }

    /// English root messages plus the Japanese bundle.
    pub fn builtin() -> Self {
        let mut store = Self::with_root(BUILTIN_ROOT.clone());
        store.insert(Locale::from_language("ja"), BUILTIN_JA.clone());
        store
    }

    /// Add or replace the bundle of a locale.
    pub fn insert(&mut self, locale: Locale, bundle: MessageBundle) {
        self.bundles.insert(locale, bundle);
    }

    /// Merge entries into the bundle of a locale, creating it if needed.
    pub fn extend(&mut self, locale: Locale, bundle: MessageBundle) {
        let target = self.bundles.entry(locale).or_default();
        if bundle.parent.is_some() {
            target.parent = bundle.parent;
        }
        target.entries.extend(bundle.entries);
    }

    pub fn bundle(&self, locale: &Locale) -> Option<&MessageBundle> {
        self.bundles.get(locale)
    }

    /// Locales consulted for `locale`, in lookup order, ending with root.
    pub fn layers(&self, locale: &Locale) -> Vec<Locale> {
        let mut layers = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(locale.clone());

        while let Some(loc) = current {
            if !seen.insert(loc.clone()) {
                break;
            }
            let next = match self.bundles.get(&loc) {
                Some(bundle) => bundle.parent.clone().or_else(|| loc.parent()),
                None => loc.parent(),
            };
            layers.push(loc);
            current = next;
        }

        let root = Locale::root();
        if !seen.contains(&root) {
            layers.push(root);
        }
        layers
    }

    /// First template for `key` along the layers of `locale`.
    pub fn lookup(&self, locale: &Locale, key: &str) -> Option<&str> {
        self.layers(locale)
            .iter()
            .filter_map(|loc| self.bundles.get(loc))
            .find_map(|bundle| bundle.get(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locale(tag: &str) -> Locale {
        Locale::parse(tag).unwrap()
    }

    #[test]
    fn test_from_properties() {
        let text = "# comment\n\
                    ! also a comment\n\
                    a.key = first value\n\
                    b.key: second\n\
                    c.key third\n\
                    d.key=line one \\\n    continued\n\
                    e.key=tab\\there \\u00e9\n";
        let bundle = MessageBundle::from_properties(text).unwrap();

        assert_eq!(bundle.len(), 5);
        assert_eq!(bundle.get("a.key"), Some("first value"));
        assert_eq!(bundle.get("b.key"), Some("second"));
        assert_eq!(bundle.get("c.key"), Some("third"));
        assert_eq!(bundle.get("d.key"), Some("line one continued"));
        assert_eq!(bundle.get("e.key"), Some("tab\there é"));
    }

    #[test]
    fn test_malformed_unicode_escape() {
        let err = MessageBundle::from_properties("ok=1\nbad=\\uZZ").unwrap_err();
        assert!(matches!(err, ConfigError::MessageBundle { line: 2, .. }));
    }

    #[test]
    fn test_builtin_bundles_define_stage_keys() {
        let store = MessageStore::builtin();
        for key in [
            FALLBACK_KEY,
            "cellbind.ParseProcessor.violated",
            "cellbind.RequiredProcessor.violated",
            "cellbind.format.text.message",
            "cellbind.format.boolean.message",
            "cellbind.format.number.message",
            "cellbind.format.datetime.message",
            "cellbind.format.enum.message",
            "cellbind.Min.violated",
            "cellbind.Max.violated",
            "cellbind.NumberRange.violated",
            "cellbind.Equals.violated",
            "cellbind.Unique.violated",
        ] {
            assert!(store.lookup(&Locale::root(), key).is_some(), "root misses {}", key);
            assert!(store.bundle(&locale("ja")).and_then(|b| b.get(key)).is_some(), "ja misses {}", key);
        }
    }

    #[test]
    fn test_derived_parent_layers() {
        let store = MessageStore::builtin();
        assert_eq!(
            store.layers(&locale("ja_JP_JP")),
            vec![locale("ja_JP_JP"), locale("ja_JP"), locale("ja"), Locale::root()]
        );
        assert!(store
            .lookup(&locale("ja_JP_JP"), "cellbind.ParseProcessor.violated")
            .unwrap()
            .contains("書式は不正です"));
    }

    #[test]
    fn test_declared_parent_wins_over_derived() {
        let mut store = MessageStore::builtin();
        store.insert(
            locale("en_GB"),
            MessageBundle::new()
                .with_message("greeting", "hello")
                .with_parent(locale("ja")),
        );

        assert_eq!(
            store.layers(&locale("en_GB")),
            vec![locale("en_GB"), locale("ja"), Locale::root()]
        );
        assert_eq!(store.lookup(&locale("en_GB"), "greeting"), Some("hello"));
        assert!(store
            .lookup(&locale("en_GB"), FALLBACK_KEY)
            .unwrap()
            .contains("不正です"));
    }

    #[test]
    fn test_parent_cycle_terminates() {
        let mut store = MessageStore::with_root(MessageBundle::new());
        store.insert(locale("fr"), MessageBundle::new().with_parent(locale("de")));
        store.insert(locale("de"), MessageBundle::new().with_parent(locale("fr")));
        assert_eq!(
            store.layers(&locale("fr")),
            vec![locale("fr"), locale("de"), Locale::root()]
        );
    }

    #[test]
    fn test_unknown_key() {
        let store = MessageStore::builtin();
        assert_eq!(store.lookup(&locale("fr_FR"), "no.such.key"), None);
    }

    #[test]
    fn test_extend_merges_entries() {
        let mut store = MessageStore::builtin();
        store.extend(
            Locale::root(),
            MessageBundle::new().with_message("cellbind.Min.violated", "too small: {min}"),
        );
        assert_eq!(
            store.lookup(&Locale::root(), "cellbind.Min.violated"),
            Some("too small: {min}")
        );
        assert!(store.lookup(&Locale::root(), FALLBACK_KEY).is_some());
    }
}

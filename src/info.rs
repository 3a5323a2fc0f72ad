use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Synonym metadata keys normalized to one canonical key on both read and
/// write, so "bookname" and "title" land in the same slot.
static KEY_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("title", "name"),
        ("bookname", "name"),
        ("dbname", "name"),
        ("sourcelang", "sourceLang"),
        ("inputlang", "sourceLang"),
        ("origlang", "sourceLang"),
        ("targetlang", "targetLang"),
        ("outputlang", "targetLang"),
        ("destlang", "targetLang"),
        ("license", "copyright"),
    ])
});

fn canonical_key(key: &str) -> String {
    match KEY_ALIASES.get(key.to_lowercase().as_str()) {
        Some(canonical) => canonical.to_string(),
        None => key.to_string(),
    }
}

/// Glossary metadata: an insertion-ordered key/value map with alias
/// normalization. Keys are unique after normalization.
#[derive(Debug, Clone, Default)]
pub struct GlossaryInfo {
    items: Vec<(String, String)>,
}

impl GlossaryInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        let key = canonical_key(key);
        self.items
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set a value, replacing in place (keeping position) if the normalized
    /// key already exists.
    pub fn set(&mut self, key: &str, value: &str) {
        let canonical = canonical_key(key);
        if canonical != key {
            tracing::debug!(from = key, to = %canonical, "info key normalized");
        }
        match self.items.iter_mut().find(|(k, _)| *k == canonical) {
            Some(slot) => slot.1 = value.to_string(),
            None => self.items.push((canonical, value.to_string())),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.items.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|(k, _)| k.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Everything except `exclude` keys (alias-normalized), in order.
    pub fn extra(&self, exclude: &[&str]) -> Vec<(String, String)> {
        let excluded: Vec<String> = exclude.iter().map(|k| canonical_key(k)).collect();
        self.items
            .iter()
            .filter(|(k, _)| !excluded.contains(k))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_normalize_on_set_and_get() {
        let mut info = GlossaryInfo::new();
        info.set("bookname", "My Dictionary");
        assert_eq!(info.get("name"), Some("My Dictionary"));
        assert_eq!(info.get("title"), Some("My Dictionary"));
        assert_eq!(info.get("dbname"), Some("My Dictionary"));
    }

    #[test]
    fn alias_lookup_is_case_insensitive() {
        let mut info = GlossaryInfo::new();
        info.set("SourceLang", "en");
        assert_eq!(info.get("origlang"), Some("en"));
    }

    #[test]
    fn set_replaces_in_place() {
        let mut info = GlossaryInfo::new();
        info.set("name", "first");
        info.set("author", "someone");
        info.set("title", "second");
        assert_eq!(info.len(), 2);
        let keys: Vec<&str> = info.keys().collect();
        assert_eq!(keys, vec!["name", "author"]);
        assert_eq!(info.get("name"), Some("second"));
    }

    #[test]
    fn insertion_order_preserved() {
        let mut info = GlossaryInfo::new();
        info.set("name", "n");
        info.set("author", "a");
        info.set("copyright", "c");
        let keys: Vec<&str> = info.keys().collect();
        assert_eq!(keys, vec!["name", "author", "copyright"]);
    }

    #[test]
    fn extra_excludes_aliases() {
        let mut info = GlossaryInfo::new();
        info.set("name", "n");
        info.set("author", "a");
        // "title" aliases to "name", so excluding "title" drops "name"
        let extra = info.extra(&["title"]);
        assert_eq!(extra, vec![("author".to_string(), "a".to_string())]);
    }

    #[test]
    fn unknown_key_passes_through() {
        let mut info = GlossaryInfo::new();
        info.set("customField", "value");
        assert_eq!(info.get("customField"), Some("value"));
    }
}

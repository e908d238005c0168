//! Conflict-aware maps for single-valued fields and alias metadata.

use std::collections::HashMap;

/// Stored when two different non-empty values were written to the same key.
pub const VALUE_CONFLICTED: &str = "!!!";
pub const KEY_LANG: &str = "lang";
pub const KEY_NAMETYPE: &str = "ntype";
/// Language placeholders that a later concrete language may replace.
pub const LANG_ORIG: &str = "orig";
pub const LANG_UNKNOWN: &str = "???";

fn is_lang_placeholder(value: &str) -> bool {
    value == LANG_ORIG || value == LANG_UNKNOWN
}

/// Key/value map where a second, different value marks the key as conflicted
/// instead of overwriting it. Keys keep their insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictAwareMap {
    entries: Vec<(String, Option<String>)>,
}

impl ConflictAwareMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: Option<&str>) {
        let incoming = value.filter(|v| !v.is_empty());

        let Some(slot) = self.entries.iter_mut().find(|(k, _)| k == key) else {
            self.entries.push((key.to_string(), incoming.map(str::to_string)));
            return;
        };

        let stored = slot.1.as_deref();
        let overwritable = match stored {
            None => true,
            Some(s) => key == KEY_LANG && is_lang_placeholder(s),
        };

        if overwritable {
            if incoming.is_some() {
                slot.1 = incoming.map(str::to_string);
            }
            return;
        }

        if let (Some(new), Some(old)) = (incoming, stored) {
            if new != old {
                if key == KEY_LANG && is_lang_placeholder(new) {
                    return;
                }
                slot.1 = Some(VALUE_CONFLICTED.to_string());
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn is_conflicted(&self, key: &str) -> bool {
        self.get(key) == Some(VALUE_CONFLICTED)
    }

    /// Drop the value so the next write is stored unconditionally.
    pub fn clear(&mut self, key: &str) {
        self.entries.retain(|(k, _)| k != key);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }
}

/// Alternate names of one entity, each with its own `{lang, ntype}` map.
#[derive(Debug, Clone, Default)]
pub struct AliasSet {
    aliases: Vec<(String, ConflictAwareMap)>,
    index: HashMap<String, usize>,
}

impl AliasSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get-or-create the property map for `alias`.
    pub fn entry(&mut self, alias: &str) -> &mut ConflictAwareMap {
        let idx = match self.index.get(alias) {
            Some(&idx) => idx,
            None => {
                self.aliases.push((alias.to_string(), ConflictAwareMap::new()));
                self.index.insert(alias.to_string(), self.aliases.len() - 1);
                self.aliases.len() - 1
            }
        };
        &mut self.aliases[idx].1
    }

    /// Record `alias` with an optional language. Blank aliases are ignored.
    pub fn add(&mut self, alias: &str, lang: Option<&str>) {
        self.add_typed(alias, lang, None);
    }

    pub fn add_typed(&mut self, alias: &str, lang: Option<&str>, name_type: Option<&str>) {
        let alias = alias.trim();
        if alias.is_empty() {
            return;
        }
        let props = self.entry(alias);
        props.set(KEY_LANG, lang);
        props.set(KEY_NAMETYPE, name_type);
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.index.contains_key(alias)
    }

    pub fn get(&self, alias: &str) -> Option<&ConflictAwareMap> {
        self.index.get(alias).map(|&idx| &self.aliases[idx].1)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// `alias#lang=xx[#ntype=yy]` entries joined by `|`, in insertion order.
    /// An alias equal to `title` is never emitted.
    pub fn serialize(&self, title: &str) -> String {
        self.aliases
            .iter()
            .filter(|(alias, _)| alias != title)
            .map(|(alias, props)| {
                let mut out = alias.clone();
                for (key, value) in props.iter() {
                    match (key, value) {
                        (KEY_LANG, None) => out.push_str(&format!("#{}={}", KEY_LANG, LANG_UNKNOWN)),
                        (KEY_NAMETYPE, None) => {}
                        (k, Some(v)) => out.push_str(&format!("#{}={}", k, v)),
                        (k, None) => out.push_str(&format!("#{}=", k)),
                    }
                }
                out
            })
            .collect::<Vec<_>>()
            .join("|")
    }
}

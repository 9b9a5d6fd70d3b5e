//! FR-002: Line-level reader for the INI-like configuration format.
//!
//! Named `[Section]` headers followed by `key: value` / `key = value` lines,
//! whitespace-trimmed, non-nested. Keys are matched case-insensitively
//! (lowercased at parse time); section names are matched exactly. Full-line
//! `#` and `;` comments and blank lines are ignored. Duplicate sections
//! merge, later keys win.

use indexmap::IndexMap;
use regex::Regex;

/// A parsed configuration document: section name -> key -> raw value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfDoc {
    sections: IndexMap<String, IndexMap<String, String>>,
}

impl ConfDoc {
    /// Parse a document. Malformed lines fail with the offending line number.
    pub fn parse(text: &str) -> Result<ConfDoc, String> {
        let header = Regex::new(r"^\[([^\[\]]+)\]$").unwrap();
        let mut doc = ConfDoc::default();
        let mut current: Option<String> = None;

        for (index, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if let Some(caps) = header.captures(line) {
                let name = caps[1].trim().to_string();
                doc.sections.entry(name.clone()).or_default();
                current = Some(name);
                continue;
            }
            let Some(split) = line.find([':', '=']) else {
                return Err(format!(
                    "line {}: expected 'key: value' or '[Section]', got {:?}",
                    index + 1,
                    line
                ));
            };
            let key = line[..split].trim().to_ascii_lowercase();
            if key.is_empty() {
                return Err(format!("line {}: empty key", index + 1));
            }
            let value = line[split + 1..].trim().to_string();
            let Some(ref section) = current else {
                return Err(format!("line {}: key before any section header", index + 1));
            };
            doc.sections
                .get_mut(section)
                .expect("current section exists")
                .insert(key, value);
        }

        Ok(doc)
    }

    /// Layer `other` over this document: sections union, later keys win.
    pub fn merge(&mut self, other: ConfDoc) {
        for (name, keys) in other.sections {
            let section = self.sections.entry(name).or_default();
            for (key, value) in keys {
                section.insert(key, value);
            }
        }
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    /// Raw value lookup; the key is matched case-insensitively.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)?
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

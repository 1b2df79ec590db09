use std::collections::{BTreeMap, BTreeSet};

pub const REDACTED: &str = "REDACTED";

/// Which request headers are masked when a request is echoed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedactPolicy {
    names: BTreeSet<String>,
    fragments: Vec<String>,
}
impl Default for RedactPolicy {
    fn default() -> Self {
        let names = ["authorization", "proxy-authorization", "cookie", "set-cookie", "x-api-key", "api-key"];
        let fragments = ["token", "secret", "key"];
        Self {
            names: names.into_iter().map(String::from).collect(),
            fragments: fragments.into_iter().map(String::from).collect(),
        }
    }
}

impl RedactPolicy {
    pub fn with_names<I: IntoIterator<Item = S>, S: AsRef<str>>(mut self, names: I) -> Self {
        self.names.extend(names.into_iter().map(|n| n.as_ref().to_ascii_lowercase()));
        self
    }

    pub fn is_sensitive(&self, name: &str) -> bool {
        let lower = name.to_ascii_lowercase();
        self.names.contains(&lower) || self.fragments.iter().any(|f| lower.contains(f.as_str()))
    }

    pub fn redact(&self, headers: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        headers
            .iter()
            .map(|(name, value)| {
                let v = if self.is_sensitive(name) { REDACTED.to_string() } else { value.clone() };
                (name.clone(), v)
            })
            .collect()
    }
}

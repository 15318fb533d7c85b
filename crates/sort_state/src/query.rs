use url::form_urlencoded;

/// Ordered query parameters with `URLSearchParams`-style mutation.
///
/// Decoding is lossy: escapes that are not valid percent-encoding stay in the
/// value as literal text and invalid UTF-8 is replaced, so parsing never fails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let pairs = form_urlencoded::parse(query.as_bytes())
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect();
        Self { pairs }
    }

    /// First value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.pairs.iter().any(|(key, _)| key == name)
    }

    /// Replaces the first occurrence in place and drops later duplicates,
    /// appending when `name` is absent.
    pub fn set(&mut self, name: &str, value: &str) {
        let mut replaced = false;
        self.pairs.retain_mut(|(key, existing)| {
            if key != name {
                return true;
            }
            if replaced {
                return false;
            }
            *existing = value.to_string();
            replaced = true;
            true
        });
        if !replaced {
            self.pairs.push((name.to_string(), value.to_string()));
        }
    }

    pub fn delete(&mut self, name: &str) {
        self.pairs.retain(|(key, _)| key != name);
    }

    /// Serializes without a leading `?`.
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish()
    }
}

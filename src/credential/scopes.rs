use serde::{Deserialize, Serialize};

/// Ordered set of OAuth scopes.
///
/// Keeps the order scopes were granted in and silently drops repeats.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Scopes(Vec<String>);

impl Scopes {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Parse a scope listing as returned by the metadata server or a token
    /// endpoint: entries separated by newlines and/or spaces.
    pub fn parse(raw: &str) -> Self {
        raw.split_whitespace().map(str::to_owned).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, scope: &str) -> bool {
        self.0.iter().any(|s| s == scope)
    }

    /// Space separated form used in OAuth requests.
    pub fn joined(&self) -> String {
        self.0.join(" ")
    }
}

impl FromIterator<String> for Scopes {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut scopes: Vec<String> = Vec::new();
        for scope in iter {
            if !scopes.contains(&scope) {
                scopes.push(scope);
            }
        }
        Self(scopes)
    }
}

impl From<Vec<String>> for Scopes {
    fn from(value: Vec<String>) -> Self {
        value.into_iter().collect()
    }
}

impl From<Scopes> for Vec<String> {
    fn from(value: Scopes) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::Scopes;

    #[test]
    fn parse_keeps_order_and_drops_repeats() {
        let scopes = Scopes::parse("b a\nc\n a \n");
        assert_eq!(scopes.iter().collect::<Vec<_>>(), vec!["b", "a", "c"]);
        assert_eq!(scopes.joined(), "b a c");
    }

    #[test]
    fn empty_listing_has_no_scopes() {
        assert!(Scopes::parse(" \n").is_empty());
    }
}

//! Case-insensitive text query used by the RTTI and settings searches

use regex::Regex;

/// A lower-cased search query: a regex when the text compiles as one, a
/// plain substring otherwise. An empty query matches everything.
#[derive(Debug, Clone, Default)]
pub enum TextQuery {
    #[default]
    Any,
    Regex(Regex),
    Substring(String),
}

impl TextQuery {
    pub fn new(text: &str) -> Self {
        let lowered = text.trim().to_lowercase();
        if lowered.is_empty() {
            return Self::Any;
        }
        match Regex::new(&lowered) {
            Ok(re) => Self::Regex(re),
            Err(_) => Self::Substring(lowered),
        }
    }

    /// Test an already lower-cased key
    pub fn matches(&self, key: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Regex(re) => re.is_match(key),
            Self::Substring(s) => key.contains(s.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_modes() {
        assert!(matches!(TextQuery::new("  "), TextQuery::Any));
        assert!(matches!(TextQuery::new("^f.*fov"), TextQuery::Regex(_)));
        assert!(matches!(TextQuery::new("fov["), TextQuery::Substring(_)));
    }

    #[test]
    fn test_query_is_case_insensitive() {
        let q = TextQuery::new("FOV");
        assert!(q.matches("ffov:camera"));
        assert!(!q.matches("bshowhud:interface"));

        let q = TextQuery::new("^b.*:Interface$");
        assert!(q.matches("bshowhud:interface"));

        let q = TextQuery::new("fov[");
        assert!(q.matches("x fov[0]"));
    }
}

// Identifier Extractor - pulls the UPI identifier out of a description

use regex::Regex;

/// Narrow pattern: `UPI/<channel>/<reference>/<handle>` tokens.
pub const UPI_PATH_PATTERN: &str = r"UPI/[A-Z]*/[0-9]*/[A-Z0-9]*";

/// Broad pattern: the first handle-like word, optionally followed by `@`.
pub const UPI_HANDLE_PATTERN: &str = r"[a-zA-Z0-9.\-_]+@*";

/// A compiled identifier pattern owned by one bank parser.
///
/// Each parser holds its own instance so two banks never share or mutate
/// a pattern.
#[derive(Debug, Clone)]
pub struct IdentifierPattern {
    regex: Regex,
}

impl IdentifierPattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(IdentifierPattern {
            regex: Regex::new(pattern)?,
        })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// First match in `description`, verbatim.
    ///
    /// Later matches are ignored: a description carries at most one
    /// meaningful identifier. Empty matches count as no identifier.
    pub fn extract(&self, description: &str) -> Option<String> {
        self.regex
            .find_iter(description)
            .map(|m| m.as_str())
            .find(|s| !s.is_empty())
            .map(str::to_string)
    }
}

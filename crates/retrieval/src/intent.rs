//! Query intent gate for historical documents.
//!
//! A query that talks about the current session (and not about the
//! database at large) should only see files uploaded in this session.

/// Words that ask about the stored knowledge base as a whole.
const DATABASE_KEYWORDS: &[&str] = &[
    "database",
    "all metadata",
    "storage",
    "everything",
    "all files",
    "meta",
    "history",
    "archive",
    "repository",
    "azure",
];

/// Words that ask about what is uploaded or visible right now.
const SESSION_KEYWORDS: &[&str] = &[
    "current",
    "session",
    "uploaded",
    "this time",
    "files uploaded",
    "web page",
    "webpage",
    "on the screen",
    "visible",
    "ui",
];

/// Phrases match as substrings; single words match the start of a word,
/// so "ui" does not fire on "build" but "meta" still fires on "metadata".
fn mentions(query: &str, keywords: &[&str]) -> bool {
    let lower = query.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    keywords.iter().any(|kw| {
        if kw.contains(' ') {
            lower.contains(kw)
        } else {
            words.iter().any(|w| w.starts_with(kw))
        }
    })
}

pub fn is_database_query(query: &str) -> bool {
    mentions(query, DATABASE_KEYWORDS)
}

pub fn is_session_query(query: &str) -> bool {
    mentions(query, SESSION_KEYWORDS)
}

/// True when historical documents must be hidden for this query.
pub fn hides_historical(query: &str) -> bool {
    is_session_query(query) && !is_database_query(query)
}

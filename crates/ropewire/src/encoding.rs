//! Best-effort canonicalization of caller-supplied charset names.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static NON_ALNUM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Z0-9]").unwrap());
static HYPHENATED_FAMILY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(UTF|UCS|ISO|WINDOWS|KOI8|EUC)([A-Z0-9])").unwrap());
static ISO_8859_PART: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(ISO-8859)([0-9])").unwrap());
static SHIFT_FAMILY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(SHIFT)([A-Z0-9])").unwrap());

/// Canonical token naming a character encoding, e.g. `UTF-8` or `SHIFT_JIS`.
///
/// Derived syntactically from whatever name the caller supplied. This is
/// not a registry lookup: an unrecognized token passes through unchanged
/// and the engine stays the final authority on validity, reporting an error
/// at use time if it cannot honor the token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Encoding(String);

impl Encoding {
    /// Canonicalize `name`: upper-case, strip everything outside `A-Z0-9`,
    /// then re-insert the separator the common encoding families carry.
    pub fn canonical(name: &str) -> Self {
        let token = name.to_uppercase();
        let token = NON_ALNUM.replace_all(&token, "");
        let token = HYPHENATED_FAMILY.replace(&token, "$1-$2");
        let token = ISO_8859_PART.replace(&token, "$1-$2");
        let token = SHIFT_FAMILY.replace(&token, "$1_$2");
        Self(token.into_owned())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Encoding {
    fn default() -> Self {
        Self("UTF-8".to_string())
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//! Identifier enclosure and qualified naming.
//!
//! Identifiers are stored in the case the database reported and are only
//! enclosed when SQL text is assembled. Enclosure never escapes embedded
//! quote characters: catalog names handed to the planner come from the
//! database itself, and user-supplied names must already be safe.
//!
//! [`validate_identifier`] still rejects names that can never be valid
//! (empty, containing NUL, or longer than any supported engine allows)
//! before they are spliced into a statement.

use crate::error::{PlannerError, Result};

/// Default enclosure character (ANSI double quote).
pub const DEFAULT_QUOTE: char = '"';

/// Maximum identifier length (conservative limit across engines).
/// - Oracle 12.2+: 128 bytes
/// - MySQL: 64 characters
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Validate an identifier before it is embedded in SQL text.
///
/// # Errors
///
/// Returns `PlannerError::InvalidIdentifier` for empty identifiers, identifiers
/// containing a null byte, or identifiers longer than 128 bytes.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(PlannerError::InvalidIdentifier(
            "Identifier cannot be empty".to_string(),
        ));
    }

    if name.contains('\0') {
        return Err(PlannerError::InvalidIdentifier(format!(
            "Identifier contains null byte: {:?}",
            name
        )));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(PlannerError::InvalidIdentifier(format!(
            "Identifier exceeds maximum length of {} bytes (got {} bytes): {:?}",
            MAX_IDENTIFIER_LENGTH,
            name.len(),
            name
        )));
    }

    Ok(())
}

/// Wrap `name` in `quote` on both sides, defaulting to a double quote.
///
/// # Examples
///
/// ```
/// use jdbc_read_planner::core::identifier::enclose_identifier;
///
/// assert_eq!(enclose_identifier("a", None), "\"a\"");
/// assert_eq!(enclose_identifier("a", Some('\'')), "'a'");
/// assert_eq!(enclose_identifier("A", Some('"')), "\"A\"");
/// ```
pub fn enclose_identifier(name: &str, quote: Option<char>) -> String {
    let ch = quote.unwrap_or(DEFAULT_QUOTE);
    format!("{ch}{name}{ch}")
}

/// Render a schema and table as one dotted name.
///
/// With `enclosed` both parts are wrapped in double quotes.
///
/// # Examples
///
/// ```
/// use jdbc_read_planner::core::identifier::qualified_name;
///
/// assert_eq!(qualified_name("S", "T", false), "S.T");
/// assert_eq!(qualified_name("S", "T", true), "\"S\".\"T\"");
/// ```
pub fn qualified_name(schema: &str, table: &str, enclosed: bool) -> String {
    if enclosed {
        qualify_with(schema, table, DEFAULT_QUOTE)
    } else {
        format!("{}.{}", schema, table)
    }
}

/// Render `schema.table` with both parts enclosed in `quote`.
pub fn qualify_with(schema: &str, table: &str, quote: char) -> String {
    format!(
        "{}.{}",
        enclose_identifier(schema, Some(quote)),
        enclose_identifier(table, Some(quote))
    )
}

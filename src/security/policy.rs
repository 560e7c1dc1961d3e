//! Read-only statement policy.
//!
//! A statement is accepted iff its trimmed, case-insensitive prefix is one
//! of the allow-listed read verbs. This is a syntactic allow-list, not a
//! parser: it does not catch multi-statement input, verbs hidden behind
//! comments, or mutating constructs smuggled past an allowed prefix. The
//! check lives here, behind one function, so a parser-based policy can
//! replace it without touching the query gateway.

use crate::error::{PolicyError, PolicyResult};
use tracing::warn;

/// Statement prefixes accepted by the read-only policy.
const ALLOWED_PREFIXES: [&str; 3] = ["select", "show", "describe"];

/// Checks a statement against the read-only policy.
///
/// Blank input fails with [`PolicyError::EmptyQuery`]; a disallowed verb
/// fails with [`PolicyError::WriteRejected`] before any database contact.
pub fn check_read_only(sql: &str) -> PolicyResult<()> {
    let trimmed = sql.trim();
    if trimmed.is_empty() {
        return Err(PolicyError::EmptyQuery);
    }

    let lowered = trimmed.to_lowercase();
    if ALLOWED_PREFIXES
        .iter()
        .any(|prefix| lowered.starts_with(prefix))
    {
        return Ok(());
    }

    let verb: String = trimmed.chars().take_while(|c| !c.is_whitespace()).collect();
    warn!(verb = %verb, "statement rejected by read-only policy");
    Err(PolicyError::WriteRejected(verb))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_verbs() {
        assert!(check_read_only("SELECT * FROM users").is_ok());
        assert!(check_read_only("select 1").is_ok());
        assert!(check_read_only("SHOW TABLES").is_ok());
        assert!(check_read_only("DESCRIBE orders").is_ok());
        assert!(check_read_only("  \n\tSELECT 1").is_ok());
        assert!(check_read_only("SeLeCt 1").is_ok());
    }

    #[test]
    fn test_write_verbs_rejected() {
        for sql in [
            "DROP TABLE orders",
            "INSERT INTO t VALUES (1)",
            "UPDATE t SET a = 1",
            "DELETE FROM t",
            "TRUNCATE t",
            "CREATE TABLE t (id int)",
            "GRANT ALL ON *.* TO 'x'",
        ] {
            assert!(
                matches!(check_read_only(sql), Err(PolicyError::WriteRejected(_))),
                "expected rejection: {sql}"
            );
        }
    }

    #[test]
    fn test_unlisted_read_verbs_rejected() {
        // EXPLAIN and WITH read data but are not on the allow-list.
        assert!(check_read_only("EXPLAIN SELECT 1").is_err());
        assert!(check_read_only("WITH cte AS (SELECT 1) SELECT * FROM cte").is_err());
    }

    #[test]
    fn test_blank_input_is_empty_query() {
        assert!(matches!(check_read_only(""), Err(PolicyError::EmptyQuery)));
        assert!(matches!(
            check_read_only("   \n "),
            Err(PolicyError::EmptyQuery)
        ));
    }

    #[test]
    fn test_prefix_only_no_deep_inspection() {
        // Documented limitation: the policy is prefix-only.
        assert!(check_read_only("SELECT 1; DROP TABLE t").is_ok());
    }
}

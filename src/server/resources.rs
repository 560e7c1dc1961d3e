//! Table resources and `mysql://` URI handling.

use crate::error::ResourceError;
use crate::protocol::Resource;

/// URI scheme for table resources.
pub const URI_SCHEME: &str = "mysql://";

/// Fixed second path segment of every table resource URI.
pub const SCHEMA_PATH: &str = "schema";

/// Builds the resource descriptor for one table.
///
/// Descriptors are generated fresh on every listing; nothing is cached.
pub fn table_resource(table: &str) -> Resource {
    Resource {
        uri: format!("{URI_SCHEME}{table}/{SCHEMA_PATH}"),
        name: format!("Table: {table}"),
        mime_type: Some("application/json".into()),
        description: Some(format!(
            "Table schema, create statement and sample data: {table}"
        )),
    }
}

/// Parses a resource URI of the exact shape `mysql://<table>/schema` and
/// returns the table name. Any deviation (wrong scheme, wrong segment
/// count, wrong suffix, empty table) is invalid.
pub fn parse_table_uri(uri: &str) -> Result<&str, ResourceError> {
    let invalid = || ResourceError::InvalidUri(uri.to_string());

    let path = uri.strip_prefix(URI_SCHEME).ok_or_else(invalid)?;
    let mut segments = path.split('/');

    let table = segments.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
    let schema = segments.next().ok_or_else(invalid)?;

    if schema != SCHEMA_PATH || segments.next().is_some() {
        return Err(invalid());
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_fields() {
        let resource = table_resource("orders");
        assert_eq!(resource.uri, "mysql://orders/schema");
        assert_eq!(resource.name, "Table: orders");
        assert_eq!(resource.mime_type.as_deref(), Some("application/json"));
        assert!(resource.description.unwrap().contains("orders"));
    }

    #[test]
    fn test_parse_valid_uri() {
        assert_eq!(parse_table_uri("mysql://orders/schema").unwrap(), "orders");
        assert_eq!(parse_table_uri("mysql://a_b_c/schema").unwrap(), "a_b_c");
    }

    #[test]
    fn test_parse_rejects_other_shapes() {
        for uri in [
            "postgres://orders/schema",
            "mysql://orders",
            "mysql://orders/data",
            "mysql://orders/schema/extra",
            "mysql:///schema",
            "orders/schema",
            "",
        ] {
            assert!(parse_table_uri(uri).is_err(), "expected rejection: {uri}");
        }
    }

    #[test]
    fn test_descriptor_round_trips_through_parser() {
        let resource = table_resource("users");
        assert_eq!(parse_table_uri(&resource.uri).unwrap(), "users");
    }
}

// ABOUTME: Utility functions for input validation and display formatting
// ABOUTME: Table name checks, identifier sanitizing, and thousands-separated counts

use anyhow::{bail, Result};

/// Validate a DynamoDB table name
///
/// DynamoDB table names are 3 to 255 characters drawn from `a-z`, `A-Z`,
/// `0-9`, `_`, `-` and `.`.
///
/// # Examples
///
/// ```
/// # use dynamo_dump::utils::validate_table_name;
/// assert!(validate_table_name("Orders").is_ok());
/// assert!(validate_table_name("prod.orders-v2_").is_ok());
///
/// assert!(validate_table_name("").is_err());
/// assert!(validate_table_name("ab").is_err());
/// assert!(validate_table_name("orders; drop").is_err());
/// ```
pub fn validate_table_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        bail!("Table name cannot be empty");
    }

    if name.len() < 3 || name.len() > 255 {
        bail!(
            "Invalid table name '{}': must be between 3 and 255 characters long",
            sanitize_identifier(name)
        );
    }

    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
    {
        bail!(
            "Invalid table name '{}': character '{}' is not allowed. \
             Use only letters, digits, '_', '-' and '.'",
            sanitize_identifier(name),
            bad.escape_default()
        );
    }

    Ok(())
}

/// Sanitize an identifier (table name, attribute name) for display
///
/// Removes control characters and limits length to keep log lines readable.
///
/// ```
/// # use dynamo_dump::utils::sanitize_identifier;
/// assert_eq!(sanitize_identifier("normal_table"), "normal_table");
/// assert_eq!(sanitize_identifier("table\nname"), "tablename");
/// ```
pub fn sanitize_identifier(identifier: &str) -> String {
    identifier
        .chars()
        .filter(|c| !c.is_control())
        .take(100)
        .collect()
}

/// Format a count with thousands separators, e.g. `12,345`
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut formatted = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            formatted.push(',');
        }
        formatted.push(ch);
    }
    formatted
}

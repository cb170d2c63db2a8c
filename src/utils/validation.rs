//! Centralized validation and helper functions.

/// Maximum number of records allowed in a single input file
pub const MAX_RECORDS: usize = 100_000;

/// Longest gene symbol accepted; symbols become file names
pub const MAX_SYMBOL_LENGTH: usize = 255;

/// Check if adding another record would exceed the maximum allowed.
///
/// Call this with the current count BEFORE adding a new record.
/// Returns an error message if adding would exceed the limit, None if safe to add.
///
/// # Example
/// ```ignore
/// if check_record_limit(records.len()).is_some() {
///     return Err(...);
/// }
/// records.push(new_record); // Safe to add
/// ```
#[must_use]
pub fn check_record_limit(count: usize) -> Option<String> {
    if count >= MAX_RECORDS {
        Some(format!(
            "Too many records: adding another would exceed maximum of {MAX_RECORDS}"
        ))
    } else {
        None
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Empty gene symbol provided")]
    EmptySymbol,
    #[error("Gene symbol too long: exceeds {MAX_SYMBOL_LENGTH} characters")]
    SymbolTooLong,
    #[error("Invalid gene symbol '{0}': contains path separators or invalid characters")]
    InvalidSymbol(String),
}

/// Validate a gene symbol before it is used to build input and output paths.
///
/// Symbols such as `ATP5MC1`, `C1orf112` or `HLA-DRB1` are accepted; anything
/// that could escape the run directory is rejected.
///
/// # Examples
///
/// ```
/// use ortho_select::utils::validation::validate_symbol;
///
/// assert!(validate_symbol("ATP5MC1").is_ok());
/// assert!(validate_symbol("../ATP5MC1").is_err());
/// ```
///
/// # Errors
///
/// Returns `ValidationError::EmptySymbol` for blank input,
/// `ValidationError::SymbolTooLong` past the length limit, or
/// `ValidationError::InvalidSymbol` for path separators, `..`, or control characters.
pub fn validate_symbol(symbol: &str) -> Result<&str, ValidationError> {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(ValidationError::EmptySymbol);
    }
    if symbol.len() > MAX_SYMBOL_LENGTH {
        return Err(ValidationError::SymbolTooLong);
    }
    let bad_char = |c: char| c == '/' || c == '\\' || c.is_control();
    if symbol.contains("..") || symbol.chars().any(bad_char) {
        return Err(ValidationError::InvalidSymbol(symbol.to_string()));
    }
    Ok(symbol)
}

/// Replace tabs and line breaks so `text` fits in a single TSV cell
#[must_use]
pub fn sanitize_tsv_field(text: &str) -> String {
    text.replace(['\t', '\n', '\r'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_record_limit() {
        assert!(check_record_limit(0).is_none());
        assert!(check_record_limit(MAX_RECORDS - 1).is_none());
        assert!(check_record_limit(MAX_RECORDS).is_some());
    }

    #[test]
    fn test_validate_symbol() {
        assert_eq!(validate_symbol(" CALM1 "), Ok("CALM1"));
        assert!(validate_symbol("HLA-DRB1").is_ok());
        assert_eq!(validate_symbol("   "), Err(ValidationError::EmptySymbol));
        assert!(matches!(
            validate_symbol("a/b"),
            Err(ValidationError::InvalidSymbol(_))
        ));
        assert!(matches!(
            validate_symbol("..\\x"),
            Err(ValidationError::InvalidSymbol(_))
        ));
        assert!(matches!(
            validate_symbol("AB\0C"),
            Err(ValidationError::InvalidSymbol(_))
        ));
        let long = "A".repeat(MAX_SYMBOL_LENGTH + 1);
        assert_eq!(validate_symbol(&long), Err(ValidationError::SymbolTooLong));
    }

    #[test]
    fn test_sanitize_tsv_field() {
        assert_eq!(sanitize_tsv_field("plain text"), "plain text");
        assert_eq!(sanitize_tsv_field("a\tb\r\nc"), "a b  c");
    }
}

//! Rendering of raw CSV cells as SQL literals.
//!
//! [`classify_value`] is the single classification policy. With an expected
//! [`ColumnType`] the column's schema decides between a bare number and a
//! quoted string; without one (untyped mode) any value that parses as a float
//! is emitted bare. Zero-padded codes such as `00042` therefore lose their
//! quotes in untyped mode.

use std::fmt;

use thiserror::Error;

use crate::schema::ColumnType;

pub const NULL_LITERAL: &str = "NULL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Null,
    Number(String),
    Text(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => f.write_str(NULL_LITERAL),
            Literal::Number(value) => f.write_str(value),
            Literal::Text(value) => write!(f, "'{}'", value.replace('\'', "''")),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("'{value}' is not a valid number")]
pub struct TypeMismatch {
    pub value: String,
}

fn is_numeric(value: &str) -> bool {
    value.parse::<f64>().is_ok()
}

/// Classifies a raw cell, trimming surrounding whitespace first.
///
/// A numeric column holding a non-numeric value yields [`TypeMismatch`];
/// callers substitute `NULL` and report it.
pub fn classify_value(
    raw: Option<&str>,
    expected: Option<ColumnType>,
) -> Result<Literal, TypeMismatch> {
    let Some(value) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(Literal::Null);
    };
    match expected {
        Some(ColumnType::Numeric) if is_numeric(value) => Ok(Literal::Number(value.to_string())),
        Some(ColumnType::Numeric) => Err(TypeMismatch {
            value: value.to_string(),
        }),
        Some(ColumnType::String) => Ok(Literal::Text(value.to_string())),
        None if is_numeric(value) => Ok(Literal::Number(value.to_string())),
        None => Ok(Literal::Text(value.to_string())),
    }
}

/// Renders a cell as SQL text, using `NULL` for type mismatches.
pub fn format_value(raw: Option<&str>, expected: Option<ColumnType>) -> String {
    classify_value(raw, expected)
        .unwrap_or(Literal::Null)
        .to_string()
}

pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn blank_cells_become_null_for_every_mode() {
        for expected in [None, Some(ColumnType::String), Some(ColumnType::Numeric)] {
            assert_eq!(format_value(None, expected), "NULL");
            assert_eq!(format_value(Some(""), expected), "NULL");
            assert_eq!(format_value(Some(" \t "), expected), "NULL");
        }
    }

    #[test]
    fn numeric_columns_keep_text_verbatim() {
        let numeric = Some(ColumnType::Numeric);
        assert_eq!(format_value(Some(" 3.5 "), numeric), "3.5");
        assert_eq!(format_value(Some("1.50"), numeric), "1.50");
        assert_eq!(format_value(Some("1e3"), numeric), "1e3");
        assert_eq!(format_value(Some("-7"), numeric), "-7");
    }

    #[test]
    fn numeric_columns_reject_text_with_mismatch() {
        assert_eq!(
            classify_value(Some(" bad "), Some(ColumnType::Numeric)),
            Err(TypeMismatch {
                value: "bad".to_string()
            })
        );
        assert_eq!(format_value(Some("bad"), Some(ColumnType::Numeric)), "NULL");
    }

    #[test]
    fn string_columns_quote_numbers_too() {
        assert_eq!(format_value(Some("00042"), Some(ColumnType::String)), "'00042'");
        assert_eq!(
            format_value(Some("O'Malley Ln"), Some(ColumnType::String)),
            "'O''Malley Ln'"
        );
    }

    #[test]
    fn untyped_mode_prefers_numbers() {
        assert_eq!(format_value(Some("00042"), None), "00042");
        assert_eq!(format_value(Some("12 Oak St"), None), "'12 Oak St'");
        assert_eq!(format_value(Some("it's"), None), "'it''s'");
    }

    #[test]
    fn embedded_newlines_pass_through() {
        assert_eq!(
            format_value(Some("line one\nline two"), Some(ColumnType::String)),
            "'line one\nline two'"
        );
    }

    #[test]
    fn identifiers_are_double_quoted() {
        assert_eq!(quote_identifier("userDist"), "\"userDist\"");
        assert_eq!(quote_identifier("odd\"name"), "\"odd\"\"name\"");
    }

    proptest! {
        // Any scalar value, with extra weight on quotes and separators.
        #[test]
        fn quoted_text_unescapes_to_original(value in "((?s:.)|[',\n\"]|[é中ß]){1,32}") {
            let trimmed = value.trim();
            prop_assume!(!trimmed.is_empty());
            let rendered = format_value(Some(&value), Some(ColumnType::String));
            prop_assert!(rendered.starts_with('\'') && rendered.ends_with('\''));
            let inner = &rendered[1..rendered.len() - 1];
            prop_assert_eq!(inner.replace("''", "'"), trimmed);
            prop_assert_eq!(inner.matches("''").count() * 2, inner.matches('\'').count());
        }

        #[test]
        fn floats_render_as_their_trimmed_text(number in any::<f64>().prop_filter("finite", |n| n.is_finite()), pad in " {0,3}") {
            let text = number.to_string();
            let padded = format!("{pad}{text}{pad}");
            prop_assert_eq!(format_value(Some(&padded), Some(ColumnType::Numeric)), text.clone());
            prop_assert_eq!(format_value(Some(&padded), None), text);
        }
    }
}

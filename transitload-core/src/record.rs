//! Delimited-record parsing.
//!
//! A record is one line of a feed file split into fields. Parsing follows the
//! usual comma-separated conventions: a field whose first character is a
//! double quote is quoted, a doubled quote inside a quoted field yields a
//! literal quote, and delimiters or line terminators inside quotes are kept
//! as content. Nothing is trimmed and malformed quoting is not rejected; an
//! unterminated quote simply runs to the end of the line.

use std::{fmt, slice, vec};

/// Delimiter used by every feed file.
pub const DEFAULT_DELIMITER: char = ',';

const QUOTE: char = '"';

/// Ordered field values parsed from a single line.
///
/// # Examples
///
/// ```
/// use transitload_core::{DEFAULT_DELIMITER, parse_line};
///
/// let record = parse_line(r#"1,"NJ TRANSIT BUS",http://www.njtransit.com/"#, DEFAULT_DELIMITER);
/// assert_eq!(record.len(), 3);
/// assert_eq!(record.fields()[1], "NJ TRANSIT BUS");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Record(Vec<String>);

impl Record {
    /// Wrap already-decoded field values.
    #[must_use]
    pub const fn new(fields: Vec<String>) -> Self {
        Self(fields)
    }

    /// Number of fields in the record.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the record holds no fields at all.
    ///
    /// [`parse_line`] never produces an empty record; an empty line yields a
    /// single empty field.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the field values in order.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.0
    }

    /// Consume the record, returning its field values.
    #[must_use]
    pub fn into_fields(self) -> Vec<String> {
        self.0
    }

    /// Iterate over the field values.
    pub fn iter(&self) -> slice::Iter<'_, String> {
        self.0.iter()
    }

    /// Serialise the record as a single line, quoting fields that need it.
    ///
    /// Fields containing the delimiter, a quote, or a line terminator are
    /// wrapped in quotes with embedded quotes doubled, so the output parses
    /// back to the same record.
    ///
    /// # Examples
    ///
    /// ```
    /// use transitload_core::{Record, parse_line};
    ///
    /// let record = Record::new(vec!["a".into(), "b,c".into(), "say \"hi\"".into()]);
    /// let line = record.to_line(',');
    /// assert_eq!(line, r#"a,"b,c","say ""hi""""#);
    /// assert_eq!(parse_line(&line, ','), record);
    /// ```
    #[must_use]
    pub fn to_line(&self, delimiter: char) -> String {
        let mut line = String::new();
        for (position, field) in self.0.iter().enumerate() {
            if position > 0 {
                line.push(delimiter);
            }
            let needs_quotes = field
                .chars()
                .any(|ch| ch == delimiter || ch == QUOTE || ch == '\r' || ch == '\n');
            if needs_quotes {
                line.push(QUOTE);
                for ch in field.chars() {
                    if ch == QUOTE {
                        line.push(QUOTE);
                    }
                    line.push(ch);
                }
                line.push(QUOTE);
            } else {
                line.push_str(field);
            }
        }
        line
    }
}

impl From<Vec<String>> for Record {
    fn from(fields: Vec<String>) -> Self {
        Self(fields)
    }
}

impl IntoIterator for Record {
    type Item = String;
    type IntoIter = vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = &'a String;
    type IntoIter = slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line(DEFAULT_DELIMITER))
    }
}

/// Split one line into a [`Record`].
///
/// The scan stops at the first carriage return or line feed found outside
/// quotes; anything after it is ignored. The final field is always kept, so a
/// line without delimiters yields one field and an empty line yields a single
/// empty field.
///
/// # Examples
///
/// ```
/// use transitload_core::parse_line;
///
/// let record = parse_line(r#"a,"b,c",d"#, ',');
/// assert_eq!(record.fields(), ["a", "b,c", "d"]);
///
/// let record = parse_line(r#""he said ""hi""""#, ',');
/// assert_eq!(record.fields(), [r#"he said "hi""#]);
/// ```
#[must_use]
pub fn parse_line(line: &str, delimiter: char) -> Record {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch != QUOTE {
                field.push(ch);
            } else if chars.next_if_eq(&QUOTE).is_some() {
                field.push(QUOTE);
            } else {
                in_quotes = false;
            }
        } else if ch == QUOTE && field.is_empty() {
            in_quotes = true;
        } else if ch == delimiter {
            fields.push(std::mem::take(&mut field));
        } else if ch == '\r' || ch == '\n' {
            break;
        } else {
            field.push(ch);
        }
    }

    fields.push(field);
    Record(fields)
}

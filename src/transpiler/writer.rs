//! SQL text accumulator that keeps bound arguments aligned with their
//! placeholders.

use crate::ast::Value;
use crate::transpiler::Statement;

/// Quote an identifier with double quotes, doubling embedded quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Appends SQL text and arguments in rendering order, so the n-th `?` of
/// the final text always binds the n-th argument.
#[derive(Debug, Default)]
pub(crate) struct SqlWriter {
    sql: String,
    arguments: Vec<Value>,
}

impl SqlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_str(&mut self, s: &str) {
        self.sql.push_str(s);
    }

    pub fn push_identifier(&mut self, name: &str) {
        self.sql.push_str(&quote_identifier(name));
    }

    /// `"alias"."column"`
    pub fn push_column(&mut self, alias: &str, column: &str) {
        self.push_identifier(alias);
        self.sql.push('.');
        self.push_identifier(column);
    }

    /// `"table"`, or `"table" "alias"` when the alias differs.
    pub fn push_table(&mut self, table: &str, alias: &str) {
        self.push_identifier(table);
        if table != alias {
            self.sql.push(' ');
            self.push_identifier(alias);
        }
    }

    /// A `?` placeholder bound to `value`.
    pub fn push_argument(&mut self, value: &Value) {
        self.sql.push('?');
        self.arguments.push(value.clone());
    }

    /// Literal SQL carrying its own placeholders.
    pub fn push_fragment(&mut self, sql: &str, arguments: &[Value]) {
        self.sql.push_str(sql);
        self.arguments.extend_from_slice(arguments);
    }

    pub fn finish(self) -> Statement {
        Statement {
            sql: self.sql,
            arguments: self.arguments,
        }
    }
}

/// Count `?` placeholders outside of quoted strings, quoted identifiers
/// and comments.
///
/// Only anonymous `?` placeholders are supported in fragments. Numbered
/// (`?NNN`) and named (`:name`, `@name`, `$name`) parameters address the
/// whole statement rather than the fragment, so each `?NNN` counts as one
/// more positional placeholder and a fragment reusing a number is rejected
/// by the argument check.
pub fn count_placeholders(sql: &str) -> usize {
    let mut count = 0;
    let mut chars = sql.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' | '`' => skip_past(&mut chars, c),
            '[' => skip_past(&mut chars, ']'),
            '-' if chars.peek() == Some(&'-') => skip_past(&mut chars, '\n'),
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut star = false;
                for c in chars.by_ref() {
                    if star && c == '/' {
                        break;
                    }
                    star = c == '*';
                }
            }
            '?' => count += 1,
            _ => {}
        }
    }
    count
}

/// Consume characters up to and including `end`.
fn skip_past(chars: &mut impl Iterator<Item = char>, end: char) {
    for c in chars.by_ref() {
        if c == end {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("name"), "\"name\"");
        assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_table_alias_rendering() {
        let mut w = SqlWriter::new();
        w.push_table("b", "b");
        w.push_str(", ");
        w.push_table("b", "customB");
        assert_eq!(w.finish().sql, r#""b", "b" "customB""#);
    }

    #[test]
    fn test_count_placeholders_skips_quotes() {
        assert_eq!(count_placeholders("name = ?"), 1);
        assert_eq!(count_placeholders("a = ? AND b = ?"), 2);
        assert_eq!(count_placeholders("a = '?' AND \"b?\" = ?"), 1);
        assert_eq!(count_placeholders("a IS NULL"), 0);
        assert_eq!(count_placeholders("a = 'it''s?' AND b = ?"), 1);
    }

    #[test]
    fn test_count_placeholders_skips_comments() {
        assert_eq!(count_placeholders("a = ? -- b = ?\n AND c = ?"), 2);
        assert_eq!(count_placeholders("a = ? /* b = ? */ AND c = ?"), 2);
        assert_eq!(count_placeholders("a = ? /* unterminated ?"), 1);
        assert_eq!(count_placeholders("a - b = ? / 2"), 1);
    }

    #[test]
    fn test_numbered_placeholders_count_per_occurrence() {
        assert_eq!(count_placeholders("a = ?1 OR b = ?1"), 2);
    }

    #[test]
    fn test_arguments_follow_text_order() {
        let mut w = SqlWriter::new();
        w.push_argument(&Value::Int(1));
        w.push_fragment(" AND x = ?", &[Value::Int(2)]);
        let statement = w.finish();
        assert_eq!(statement.sql, "? AND x = ?");
        assert_eq!(statement.arguments, vec![Value::Int(1), Value::Int(2)]);
    }
}

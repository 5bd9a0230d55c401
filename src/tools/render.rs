use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::core::types::Record;

/// Renders records as a literal HTML table, one row per record in input order.
///
/// The picture column becomes an `<img>` only when its value starts with
/// `http`; anything else (typically `N/A`) is shown as text.
pub fn render_table(records: &[Record]) -> String {
    if records.is_empty() {
        return String::new();
    }

    let mut table = String::from("<table>");

    table.push_str("<tr>");
    for name in Record::FIELD_NAMES {
        table.push_str(&format!("<th>{}</th>", encode_text(&header_label(name))));
    }
    table.push_str("</tr>");

    for record in records {
        table.push_str("<tr>");
        for (name, value) in record.display_fields() {
            if name == Record::PICTURE_FIELD && value.starts_with("http") {
                table.push_str(&format!(
                    r#"<td><img src="{}" alt="{}" width="100" style="max-height:100px;object-fit:cover;"></td>"#,
                    encode_double_quoted_attribute(value),
                    encode_double_quoted_attribute(&record.resort_name),
                ));
            } else {
                table.push_str(&format!("<td>{}</td>", encode_text(value)));
            }
        }
        table.push_str("</tr>");
    }

    table.push_str("</table>");
    table
}

/// Column header for a field name: underscores become spaces, words title-cased.
pub fn header_label(field: &str) -> String {
    title_case(&field.replace('_', " "))
}

/// Uppercases the first letter of every alphabetic run and lowercases the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

use html_escape::encode_text;
use std::collections::BTreeMap;

use super::render::render_table;
use crate::core::types::Record;

pub const CONSOLIDATED_HEADING: &str = "<h2>All Extracted Resorts by Country</h2>";
pub const NOTHING_COLLECTED: &str = "<p>No resort data was collected to consolidate.</p>";

/// Groups every collected record by country and renders one table per group,
/// groups in ascending order of their name.
pub fn consolidate(records: &[Record]) -> String {
    if records.is_empty() {
        return NOTHING_COLLECTED.to_string();
    }

    let mut groups: BTreeMap<&str, Vec<Record>> = BTreeMap::new();
    for record in records {
        groups
            .entry(record.country_key())
            .or_default()
            .push(record.clone());
    }

    let mut html = String::from(CONSOLIDATED_HEADING);
    for (country, group) in &groups {
        html.push_str(&format!("<h3>{}</h3>", encode_text(country)));
        html.push_str(&render_table(group));
    }
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::UNKNOWN_COUNTRY;

    #[test]
    fn test_groups_sorted_by_country() {
        let records = vec![
            Record::new("A").with_country("Spain"),
            Record::new("B").with_country("Italy"),
            Record::new("C").with_country("Spain"),
        ];
        let html = consolidate(&records);

        assert!(html.starts_with(CONSOLIDATED_HEADING));
        assert_eq!(html.matches("<h3>").count(), 2);
        assert_eq!(html.matches("<table>").count(), 2);

        let italy = html.find("<h3>Italy</h3>").unwrap();
        let spain = html.find("<h3>Spain</h3>").unwrap();
        assert!(italy < spain);

        let italy_section = &html[italy..spain];
        let spain_section = &html[spain..];
        assert!(italy_section.contains("<td>B</td>"));
        assert!(!italy_section.contains("<td>A</td>"));
        assert!(spain_section.contains("<td>A</td>"));
        assert!(spain_section.contains("<td>C</td>"));
        assert!(spain_section.find("<td>A</td>").unwrap() < spain_section.find("<td>C</td>").unwrap());
    }

    #[test]
    fn test_missing_country_goes_to_unknown() {
        let html = consolidate(&[Record::new("Drifter Cabins")]);
        assert!(html.contains(&format!("<h3>{}</h3>", UNKNOWN_COUNTRY)));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(consolidate(&[]), NOTHING_COLLECTED);
    }
}

use serde::{Deserialize, Deserializer, Serialize};

/// Shown for any field the extraction service could not find.
pub const NOT_AVAILABLE: &str = "N/A";

/// Group label for records without a country.
pub const UNKNOWN_COUNTRY: &str = "Unknown";

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    /// HTML fragment, injected as-is by the chat page.
    pub response: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// One resort as extracted from a listing page.
///
/// Values are opaque display strings. The service is asked for strings but
/// numbers and booleans are accepted and kept in their JSON text form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Uniqueness key within a session.
    #[serde(rename = "Resort Name", deserialize_with = "opaque_string")]
    pub resort_name: String,
    #[serde(rename = "Country", default, deserialize_with = "opaque_optional")]
    pub country: Option<String>,
    #[serde(rename = "Description", default, deserialize_with = "opaque_optional")]
    pub description: Option<String>,
    #[serde(rename = "Star Rating", default, deserialize_with = "opaque_optional")]
    pub star_rating: Option<String>,
    #[serde(rename = "Price", default, deserialize_with = "opaque_optional")]
    pub price: Option<String>,
    /// Image URL, or `N/A`.
    #[serde(rename = "Main Picture", default, deserialize_with = "opaque_optional")]
    pub main_picture: Option<String>,
}

impl Record {
    /// Column names in display order.
    pub const FIELD_NAMES: [&'static str; 6] = [
        "Resort Name",
        "Country",
        "Description",
        "Star Rating",
        "Price",
        "Main Picture",
    ];

    pub const PICTURE_FIELD: &'static str = "Main Picture";

    #[cfg(test)]
    pub fn new(resort_name: impl Into<String>) -> Self {
        Self {
            resort_name: resort_name.into(),
            country: None,
            description: None,
            star_rating: None,
            price: None,
            main_picture: None,
        }
    }

    #[cfg(test)]
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// `(field name, display value)` pairs in `FIELD_NAMES` order.
    pub fn display_fields(&self) -> [(&'static str, &str); 6] {
        let [name, country, description, stars, price, picture] = Self::FIELD_NAMES;
        [
            (name, self.resort_name.as_str()),
            (country, or_not_available(&self.country)),
            (description, or_not_available(&self.description)),
            (stars, or_not_available(&self.star_rating)),
            (price, or_not_available(&self.price)),
            (picture, or_not_available(&self.main_picture)),
        ]
    }

    /// Consolidation bucket.
    pub fn country_key(&self) -> &str {
        self.country.as_deref().unwrap_or(UNKNOWN_COUNTRY)
    }
}

fn or_not_available(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(NOT_AVAILABLE)
}

fn scalar_to_string(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn opaque_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    scalar_to_string(value).ok_or_else(|| serde::de::Error::custom("value must not be null"))
}

fn opaque_optional<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(scalar_to_string(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_accepts_mixed_scalars() {
        let record: Record = serde_json::from_str(
            r#"{
                "Resort Name": "Sol Mar",
                "Country": "Spain",
                "Star Rating": 4,
                "Price": null,
                "Main Picture": "N/A"
            }"#,
        )
        .unwrap();

        assert_eq!(record.resort_name, "Sol Mar");
        assert_eq!(record.star_rating.as_deref(), Some("4"));
        assert_eq!(record.price, None);
        assert_eq!(record.description, None);
        assert_eq!(record.main_picture.as_deref(), Some("N/A"));
    }

    #[test]
    fn test_record_requires_name() {
        let result = serde_json::from_str::<Record>(r#"{ "Country": "Spain" }"#);
        assert!(result.is_err());

        let result = serde_json::from_str::<Record>(r#"{ "Resort Name": null }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_display_fields_fill_not_available() {
        let record = Record::new("Alpine Lodge").with_country("Austria");
        let fields = record.display_fields();

        assert_eq!(fields[0], ("Resort Name", "Alpine Lodge"));
        assert_eq!(fields[1], ("Country", "Austria"));
        assert_eq!(fields[4], ("Price", NOT_AVAILABLE));
        assert_eq!(fields[5], ("Main Picture", NOT_AVAILABLE));
    }

    #[test]
    fn test_country_key_defaults_to_unknown() {
        assert_eq!(Record::new("Nowhere Inn").country_key(), UNKNOWN_COUNTRY);
    }
}

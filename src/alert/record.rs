//! [`AlertRecord`] and its derived [`AlertIdentity`].

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A single time-boxed location alert as published by the feed.
///
/// No field is unique on its own; see [`AlertRecord::identity`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    /// Human-readable alert name.
    #[serde(rename = "name")]
    pub display_name: String,
    /// Free-form description.
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// Full-size image.
    #[serde(rename = "imageUrl", default)]
    pub image_url: Option<String>,
    /// Small image used when `image_url` is absent.
    #[serde(rename = "thumbnailUrl", default)]
    pub thumbnail_url: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    /// Loosely formatted end timestamp; may be empty.
    #[serde(rename = "endTime", default, deserialize_with = "null_as_default")]
    pub end_time: String,
    /// Alert category (e.g. `"Raid"`, `"Quest"`).
    #[serde(rename = "type", default)]
    pub category: Option<String>,
}

fn null_as_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl AlertRecord {
    /// Create an alert with only the required fields set.
    pub fn new(display_name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            display_name: display_name.into(),
            description: String::new(),
            image_url: None,
            thumbnail_url: None,
            latitude,
            longitude,
            end_time: String::new(),
            category: None,
        }
    }

    /// Set the raw end time.
    #[must_use]
    pub fn with_end_time(mut self, end_time: impl Into<String>) -> Self {
        self.end_time = end_time.into();
        self
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the full-size image URL.
    #[must_use]
    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    /// Set the thumbnail URL.
    #[must_use]
    pub fn with_thumbnail_url(mut self, url: impl Into<String>) -> Self {
        self.thumbnail_url = Some(url.into());
        self
    }

    /// Dedup key for this alert. Depends on name and end time only.
    #[must_use]
    pub fn identity(&self) -> AlertIdentity {
        AlertIdentity::of(&self.display_name, &self.end_time)
    }

    /// Parsed end time in epoch milliseconds, if the raw value is recognizable.
    #[must_use]
    pub fn end_time_millis(&self) -> Option<i64> {
        super::time::parse_end_time(&self.end_time)
    }

    /// Whether the alert has ended at `now_ms`. Unknown end times never expire.
    #[must_use]
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        self.end_time_millis().is_some_and(|end| end <= now_ms)
    }

    /// Image to show with a notification: the full image, else the thumbnail.
    #[must_use]
    pub fn preferred_image(&self) -> Option<&str> {
        self.image_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .or_else(|| self.thumbnail_url.as_deref().filter(|u| !u.trim().is_empty()))
    }

    /// Map search link for the alert location.
    #[must_use]
    pub fn maps_url(&self) -> String {
        format!(
            "https://www.google.com/maps/search/?api=1&query={},{}",
            self.latitude, self.longitude
        )
    }
}

/// Derived dedup key: `trim(name) + "|" + trim(endTime)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlertIdentity(String);

impl AlertIdentity {
    /// Build the identity from its two source fields.
    #[must_use]
    pub fn of(display_name: &str, end_time: &str) -> Self {
        Self(format!("{}|{}", display_name.trim(), end_time.trim()))
    }

    /// Borrow the key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take the key.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for AlertIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<AlertIdentity> for String {
    fn from(identity: AlertIdentity) -> Self {
        identity.0
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    fn raid() -> AlertRecord {
        AlertRecord::new("Mewtwo Raid", 49.74, 8.62)
            .with_end_time("2025-10-08 10:00:00")
            .with_description("Tier 5")
            .with_category("Raid")
    }

    #[test]
    fn identity_joins_trimmed_name_and_end_time() {
        let alert = AlertRecord::new("  Mewtwo Raid ", 0.0, 0.0).with_end_time(" 2025-10-08 10:00:00 ");
        assert_eq!(alert.identity().as_str(), "Mewtwo Raid|2025-10-08 10:00:00");
    }

    #[test]
    fn identity_with_empty_end_time_keeps_separator() {
        let alert = AlertRecord::new("Quest", 0.0, 0.0);
        assert_eq!(alert.identity().to_string(), "Quest|");
    }

    #[test]
    fn identity_ignores_non_key_fields() {
        let base = raid();
        let edited = raid()
            .with_description("Tier 5, weather boosted")
            .with_image_url("https://img.example/mewtwo.png")
            .with_category("Legendary Raid");
        let mut moved = raid();
        moved.latitude = 50.0;

        assert_eq!(base.identity(), edited.identity());
        assert_eq!(base.identity(), moved.identity());
    }

    #[test]
    fn corrected_end_time_is_a_new_identity() {
        let original = raid();
        let corrected = raid().with_end_time("2025-10-08 10:15:00");
        assert_ne!(original.identity(), corrected.identity());
    }

    #[test]
    fn decodes_feed_json_with_defaults() {
        let json = r#"{"name":"Snorlax","latitude":49.7,"longitude":8.6,"unknownField":42}"#;
        let alert: AlertRecord = serde_json::from_str(json).unwrap();
        assert_eq!(alert.display_name, "Snorlax");
        assert_eq!(alert.description, "");
        assert_eq!(alert.end_time, "");
        assert!(alert.image_url.is_none());
        assert!(alert.category.is_none());
    }

    #[test]
    fn decodes_null_strings_as_empty() {
        let json = r#"{"name":"Snorlax","description":null,"endTime":null,"latitude":1,"longitude":2}"#;
        let alert: AlertRecord = serde_json::from_str(json).unwrap();
        assert_eq!(alert.description, "");
        assert_eq!(alert.end_time, "");
    }

    #[test]
    fn decodes_wire_field_names() {
        let json = r#"{
            "name": "Mewtwo Raid",
            "description": "Tier 5",
            "imageUrl": "https://img.example/full.png",
            "thumbnailUrl": "https://img.example/thumb.png",
            "latitude": 49.74,
            "longitude": 8.62,
            "endTime": "2025-10-08 10:00:00",
            "type": "Raid"
        }"#;
        let alert: AlertRecord = serde_json::from_str(json).unwrap();
        assert_eq!(alert.category.as_deref(), Some("Raid"));
        assert_eq!(alert.preferred_image(), Some("https://img.example/full.png"));
        assert_eq!(alert, raid().with_image_url("https://img.example/full.png").with_thumbnail_url("https://img.example/thumb.png"));
    }

    #[test]
    fn missing_coordinates_fail_to_decode() {
        let json = r#"{"name":"Nowhere"}"#;
        assert!(serde_json::from_str::<AlertRecord>(json).is_err());
    }

    #[test]
    fn preferred_image_falls_back_to_thumbnail() {
        let alert = AlertRecord::new("a", 0.0, 0.0)
            .with_image_url("  ")
            .with_thumbnail_url("https://img.example/thumb.png");
        assert_eq!(alert.preferred_image(), Some("https://img.example/thumb.png"));
        assert_eq!(AlertRecord::new("b", 0.0, 0.0).preferred_image(), None);
    }

    #[test]
    fn maps_url_contains_coordinates() {
        assert_eq!(
            raid().maps_url(),
            "https://www.google.com/maps/search/?api=1&query=49.74,8.62"
        );
    }

    #[test]
    fn unknown_end_time_never_expires() {
        let alert = AlertRecord::new("a", 0.0, 0.0).with_end_time("soon");
        assert!(!alert.is_expired_at(i64::MAX));
    }

    #[test]
    fn epoch_end_time_expires() {
        let alert = AlertRecord::new("a", 0.0, 0.0).with_end_time("1700000000000");
        assert!(alert.is_expired_at(1_700_000_000_000));
        assert!(!alert.is_expired_at(1_699_999_999_999));
    }
}

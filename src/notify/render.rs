//! Turning an [`AlertRecord`] into a user-visible [`Notification`].

use super::location::GeoPoint;
use crate::alert::AlertRecord;
use serde::{Deserialize, Serialize};

/// Body text used when an alert has no category.
pub const DEFAULT_BODY: &str = "New alert nearby";

/// Separator between distance chips and text.
const CHIP_SEPARATOR: &str = " • ";

/// Average walking speed (5 km/h) in meters per minute.
const WALKING_METERS_PER_MIN: f64 = 83.333;

/// A rendered notification.
///
/// `key` is the alert identity; posting a second notification with the same
/// key replaces the first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub key: String,
    pub title: String,
    /// Collapsed one-line text.
    pub body: String,
    /// Expanded text.
    pub detail: String,
    pub image_url: Option<String>,
    pub maps_url: String,
    pub actions: Vec<NotificationAction>,
}

/// A button attached to a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub label: String,
    pub url: String,
}

/// Render `alert`, annotating distance and walking time when `user` is known.
#[must_use]
pub fn render(alert: &AlertRecord, user: Option<GeoPoint>) -> Notification {
    let chips = user
        .map(|here| here.distance_meters(&GeoPoint::new(alert.latitude, alert.longitude)))
        .filter(|meters| meters.is_finite())
        .map(|meters| vec![format_distance(meters), format_walking_time(meters)])
        .unwrap_or_default();

    let base = alert
        .category
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .unwrap_or(DEFAULT_BODY);
    let detail_text = if alert.description.trim().is_empty() {
        base
    } else {
        alert.description.as_str()
    };

    let maps_url = alert.maps_url();
    Notification {
        key: alert.identity().into_string(),
        title: alert.display_name.clone(),
        body: with_chips(&chips, base),
        detail: with_chips(&chips, detail_text),
        image_url: alert.preferred_image().map(str::to_owned),
        actions: vec![NotificationAction {
            label: "Directions".to_owned(),
            url: maps_url.clone(),
        }],
        maps_url,
    }
}

fn with_chips(chips: &[String], text: &str) -> String {
    if chips.is_empty() {
        return text.to_owned();
    }
    format!("{}{CHIP_SEPARATOR}{text}", chips.join(CHIP_SEPARATOR))
}

/// `"850 m"` below one kilometer, `"1.2 km"` above.
#[must_use]
pub fn format_distance(meters: f64) -> String {
    if meters >= 1000.0 {
        format!("{:.1} km", meters / 1000.0)
    } else {
        format!("{meters:.0} m")
    }
}

/// Walking minutes at 5 km/h, rounded up, never below one.
#[must_use]
pub fn format_walking_time(meters: f64) -> String {
    let minutes = (meters / WALKING_METERS_PER_MIN).ceil().max(1.0) as u64;
    format!("{minutes} min walk")
}

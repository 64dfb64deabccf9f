//! Threshold-based weather alerts.
//!
//! [`evaluate`] is pure. Delivery goes through a [`Notifier`] supplied by the
//! host; nothing here remembers what already fired, so a qualifying snapshot
//! fires again on every publish.

use std::fmt::Debug;

use crate::model::CurrentWeather;

/// Celsius threshold for the clear-sky heat alert (strictly greater).
pub const HEAT_THRESHOLD_C: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertCategory {
    RainAlert,
    SnowAlert,
    HeatAlert,
    ThunderstormAlert,
}

impl AlertCategory {
    pub fn title(&self) -> &'static str {
        match self {
            AlertCategory::RainAlert => "Rain Alert",
            AlertCategory::SnowAlert => "Snow Alert",
            AlertCategory::HeatAlert => "Hot Weather Alert",
            AlertCategory::ThunderstormAlert => "Thunderstorm Warning",
        }
    }

    fn message(&self, city: &str) -> String {
        match self {
            AlertCategory::RainAlert => {
                format!("It's raining in {city}. Don't forget your umbrella!")
            }
            AlertCategory::SnowAlert => format!("Snow expected in {city}. Drive safely!"),
            AlertCategory::HeatAlert => format!("It's quite hot in {city}. Stay hydrated!"),
            AlertCategory::ThunderstormAlert => {
                format!("Thunderstorm expected in {city}. Stay indoors!")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub category: AlertCategory,
    pub title: String,
    pub message: String,
    /// Always Celsius, the reading as received, e.g. `"31.0°C"` or `"12.34°C"`.
    pub temperature: String,
}

/// Host notification delivery.
pub trait Notifier: Send + Sync + Debug {
    fn show_notification(&self, title: &str, body: &str, subtitle: Option<&str>);
}

pub fn evaluate(weather: Option<&CurrentWeather>, notifications_enabled: bool) -> Option<Alert> {
    if !notifications_enabled {
        return None;
    }
    let weather = weather?;

    let category = match weather.condition_main.to_lowercase().as_str() {
        "rain" => AlertCategory::RainAlert,
        "snow" => AlertCategory::SnowAlert,
        "clear" if weather.temperature > HEAT_THRESHOLD_C => AlertCategory::HeatAlert,
        "thunderstorm" => AlertCategory::ThunderstormAlert,
        _ => return None,
    };

    Some(Alert {
        category,
        title: category.title().to_string(),
        message: category.message(&weather.location_name),
        temperature: format!("{:?}°C", weather.temperature),
    })
}

/// Evaluate and, when an alert qualifies, hand it to `notifier`.
pub fn evaluate_and_notify(
    weather: Option<&CurrentWeather>,
    notifications_enabled: bool,
    notifier: &dyn Notifier,
) -> Option<AlertCategory> {
    let alert = evaluate(weather, notifications_enabled)?;
    tracing::info!(category = ?alert.category, "weather alert");
    notifier.show_notification(&alert.title, &alert.message, Some(&alert.temperature));
    Some(alert.category)
}


#[cfg(test)]
mod tests {
    use super::fakes::RecordingNotifier;
    use super::*;
    use crate::model::fixtures::weather;

    #[test]
    fn mixed_case_rain_fires_once() {
        let notifier = RecordingNotifier::default();
        let w = weather("London", "Rain", 12.0);

        let fired = evaluate_and_notify(Some(&w), true, &notifier);

        assert_eq!(fired, Some(AlertCategory::RainAlert));
        assert_eq!(notifier.titles(), vec!["Rain Alert".to_string()]);
        let shown = notifier.shown.lock().expect("lock");
        assert_eq!(shown[0].1, "It's raining in London. Don't forget your umbrella!");
        assert_eq!(shown[0].2.as_deref(), Some("12.0°C"));
    }

    #[test]
    fn temperature_is_sent_unrounded() {
        let alert = evaluate(Some(&weather("Oslo", "Snow", -12.34)), true).expect("snow alert");
        assert_eq!(alert.temperature, "-12.34°C");
    }

    #[test]
    fn disabled_notifications_never_fire() {
        let notifier = RecordingNotifier::default();
        let w = weather("London", "Rain", 12.0);

        assert_eq!(evaluate_and_notify(Some(&w), false, &notifier), None);
        assert!(notifier.titles().is_empty());
    }

    #[test]
    fn heat_alert_needs_more_than_thirty_degrees() {
        assert_eq!(
            evaluate(Some(&weather("Seville", "Clear", 31.0)), true).map(|a| a.category),
            Some(AlertCategory::HeatAlert)
        );
        assert!(evaluate(Some(&weather("Seville", "Clear", 29.0)), true).is_none());
        assert!(evaluate(Some(&weather("Seville", "Clear", 30.0)), true).is_none());
    }

    #[test]
    fn snow_and_thunderstorm_categories() {
        let snow = evaluate(Some(&weather("Oslo", "SNOW", -3.0)), true).expect("snow alert");
        assert_eq!(snow.category, AlertCategory::SnowAlert);
        assert_eq!(snow.message, "Snow expected in Oslo. Drive safely!");

        let storm = evaluate(Some(&weather("Miami", "Thunderstorm", 27.0)), true)
            .expect("storm alert");
        assert_eq!(storm.title, "Thunderstorm Warning");
    }

    #[test]
    fn other_conditions_or_missing_weather_do_not_fire() {
        assert!(evaluate(Some(&weather("Dublin", "Clouds", 14.0)), true).is_none());
        assert!(evaluate(Some(&weather("Dublin", "Drizzle", 14.0)), true).is_none());
        assert!(evaluate(None, true).is_none());
    }

    #[test]
    fn repeated_snapshots_fire_every_time() {
        let notifier = RecordingNotifier::default();
        let w = weather("London", "rain", 10.0);

        evaluate_and_notify(Some(&w), true, &notifier);
        evaluate_and_notify(Some(&w), true, &notifier);

        assert_eq!(notifier.titles().len(), 2);
    }
}

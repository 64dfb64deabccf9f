//! Temperature unit conversion. Storage is always Celsius; these run at display time.

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

/// Temperature in the unit selected by the user, unrounded.
pub fn to_display(celsius: f64, use_fahrenheit: bool) -> f64 {
    if use_fahrenheit {
        celsius_to_fahrenheit(celsius)
    } else {
        celsius
    }
}

/// Rounded display value, e.g. `21` or `70`.
pub fn display_rounded(celsius: f64, use_fahrenheit: bool) -> i64 {
    to_display(celsius, use_fahrenheit).round() as i64
}

pub fn unit_symbol(use_fahrenheit: bool) -> &'static str {
    if use_fahrenheit { "°F" } else { "°C" }
}

/// `"21°C"` / `"70°F"`.
pub fn format_temperature(celsius: f64, use_fahrenheit: bool) -> String {
    format!(
        "{}{}",
        display_rounded(celsius, use_fahrenheit),
        unit_symbol(use_fahrenheit)
    )
}

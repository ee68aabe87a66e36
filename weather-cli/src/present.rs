//! Human-friendly and JSON rendering of a weather [`Report`].

use std::io::Write;
use weather_core::{Report, WeatherError};

const LABEL_WIDTH: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// The report as `(label, value)` rows, shared by the text output and the TUI.
pub fn report_lines(report: &Report) -> Vec<(&'static str, String)> {
    let w = &report.weather;
    vec![
        ("Location", report.location.display_name()),
        ("Observed", w.local_observed_at().format("%Y-%m-%d %H:%M (UTC%:z)").to_string()),
        ("Condition", w.condition.description().to_string()),
        ("Temperature", format!("{:.1}{}", w.temperature, w.units.temperature)),
        ("Feels like", format!("{:.1}{}", w.apparent_temperature, w.units.temperature)),
        ("Humidity", format!("{}%", w.humidity_pct)),
        ("Wind Speed", format!("{:.1} {}", w.wind_speed, w.units.wind_speed)),
        ("Pressure", format!("{:.1} {}", w.pressure, w.units.pressure)),
        ("Precipitation", format!("{:.1} {}", w.precipitation, w.units.precipitation)),
    ]
}

/// Write `report` to `out`. Any write failure is a [`WeatherError::Render`].
pub fn render<W: Write>(out: &mut W, report: &Report, format: OutputFormat) -> Result<(), WeatherError> {
    match format {
        OutputFormat::Text => {
            for (label, value) in report_lines(report) {
                writeln!(out, "{:<width$}{value}", format!("{label}:"), width = LABEL_WIDTH)?;
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, report).map_err(std::io::Error::from)?;
            writeln!(out)?;
        }
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::DateTime;
    use std::io;
    use weather_core::{GeoMatch, Location, ReportedUnits, WeatherCondition, WeatherRecord};

    pub(crate) fn sample_report() -> Report {
        let location = Location::from_match(
            "Lisbon",
            GeoMatch {
                name: "Lisbon".into(),
                latitude: 38.72,
                longitude: -9.13,
                country: Some("Portugal".into()),
                country_code: Some("PT".into()),
                admin1: Some("Lisbon".into()),
                timezone: Some("Europe/Lisbon".into()),
            },
        );
        let weather = WeatherRecord {
            observed_at: DateTime::from_timestamp(1_714_564_800, 0).unwrap(),
            utc_offset_seconds: 3600,
            temperature: 19.46,
            apparent_temperature: 18.0,
            condition: WeatherCondition(61),
            wind_speed: 14.25,
            humidity_pct: 77,
            pressure: 1011.0,
            precipitation: 0.4,
            units: ReportedUnits {
                temperature: "°C".into(),
                wind_speed: "km/h".into(),
                pressure: "hPa".into(),
                precipitation: "mm".into(),
            },
        };
        Report { location, weather }
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn text_contains_temperature_and_condition() {
        let mut out = Vec::new();
        render(&mut out, &sample_report(), OutputFormat::Text).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("19.5°C"), "{text}");
        assert!(text.contains("Rain"), "{text}");
        assert!(text.contains("Location:      Lisbon (Portugal)"), "{text}");
        assert!(text.contains("2024-05-01 13:00 (UTC+01:00)"), "{text}");
        assert!(text.contains("Wind Speed:    14.2 km/h") || text.contains("Wind Speed:    14.3 km/h"));
        assert_eq!(text.lines().count(), 9);
    }

    #[test]
    fn json_output_is_machine_readable() {
        let mut out = Vec::new();
        render(&mut out, &sample_report(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(value["weather"]["temperature"], 19.46);
        assert_eq!(value["weather"]["condition"]["description"], "Rain");
        assert_eq!(value["location"]["country"], "Portugal");
    }

    #[test]
    fn write_failure_is_render_error() {
        let err = render(&mut BrokenPipe, &sample_report(), OutputFormat::Text).unwrap_err();
        assert!(matches!(err, WeatherError::Render(_)));
    }
}

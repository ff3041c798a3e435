//! Current weather through Open-Meteo: geocode the place name, then read
//! the current conditions at its coordinates.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use toolloop_core::config::WeatherConfig;
use toolloop_core::error::ToolError;

use super::base::{get_json, http_client, require_string, Tool, ToolArgs};

/// Readable label for a WMO weather code.
pub fn describe_weather_code(code: i64) -> String {
    let label = match code {
        0 => "clear sky ☀️",
        1 => "mainly clear 🌤️",
        2 => "partly cloudy ⛅",
        3 => "overcast ☁️",
        45 => "foggy 🌫️",
        48 => "depositing rime fog 🌫️",
        51 => "light drizzle 🌦️",
        61 => "rainy 🌧️",
        71 => "snowfall ❄️",
        95 => "thunderstorm ⛈️",
        other => return format!("unknown (code {other})"),
    };
    label.to_string()
}

fn unavailable(location: &str, reason: &str) -> Value {
    json!({
        "status": "unavailable",
        "message": format!("Weather data for '{location}' is currently unavailable: {reason}."),
    })
}

/// Fetches the current weather for a city or place.
pub struct WeatherTool {
    geocoding_base: String,
    forecast_base: String,
    timeout: Duration,
    client: Client,
}

impl WeatherTool {
    pub fn new(config: &WeatherConfig, timeout: Duration) -> Self {
        Self {
            geocoding_base: config.geocoding_base.trim_end_matches('/').to_string(),
            forecast_base: config.forecast_base.trim_end_matches('/').to_string(),
            timeout,
            client: http_client(timeout),
        }
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "fetch_weather"
    }

    fn description(&self) -> &str {
        "Fetch the current weather for a city or place. Returns the resolved \
         place, its coordinates and the current conditions (temperature, wind, \
         readable weather description)."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "Name of the city or place, e.g. \"Paris\"",
                    "minLength": 1
                }
            },
            "required": ["location"]
        })
    }

    async fn execute(&self, args: &ToolArgs) -> Result<Value, ToolError> {
        let location = require_string(args, "location")?;
        debug!(location = %location, "fetching weather");

        let request = self
            .client
            .get(format!("{}/v1/search", self.geocoding_base))
            .query(&[("name", location.as_str()), ("count", "1")]);
        let geo = get_json(request, "Open-Meteo geocoding", self.timeout).await?;

        let Some(place) = geo["results"].as_array().and_then(|r| r.first()) else {
            return Ok(unavailable(&location, "no matching place"));
        };
        let (Some(lat), Some(lon)) = (place["latitude"].as_f64(), place["longitude"].as_f64())
        else {
            return Ok(unavailable(&location, "place has no coordinates"));
        };
        let city = place["name"].as_str().unwrap_or(&location).to_string();
        let country = place["country"].as_str().unwrap_or_default().to_string();

        let request = self
            .client
            .get(format!("{}/v1/forecast", self.forecast_base))
            .query(&[
                ("latitude", lat.to_string()),
                ("longitude", lon.to_string()),
                ("current_weather", "true".to_string()),
            ]);
        let forecast = get_json(request, "Open-Meteo forecast", self.timeout).await?;

        let mut current = match forecast.get("current_weather") {
            Some(Value::Object(map)) if !map.is_empty() => map.clone(),
            _ => return Ok(unavailable(&location, "no current conditions")),
        };
        let code = current
            .get("weathercode")
            .or_else(|| current.get("weather_code"))
            .and_then(Value::as_i64)
            .unwrap_or(-1);
        current.insert(
            "weather_description".to_string(),
            Value::String(describe_weather_code(code)),
        );

        Ok(json!({
            "city": city,
            "country": country,
            "latitude": lat,
            "longitude": lon,
            "current_weather": current,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn args(value: Value) -> ToolArgs {
        value.as_object().cloned().unwrap()
    }

    fn tool_for(server: &MockServer) -> WeatherTool {
        let config = WeatherConfig {
            geocoding_base: server.uri(),
            forecast_base: server.uri(),
        };
        WeatherTool::new(&config, Duration::from_secs(5))
    }

    async fn mount_paris_geocoding(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(query_param("name", "Paris"))
            .and(query_param("count", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{
                    "name": "Paris", "country": "France",
                    "latitude": 48.85341, "longitude": 2.3488
                }]
            })))
            .mount(server)
            .await;
    }

    #[test]
    fn test_weather_codes() {
        assert_eq!(describe_weather_code(0), "clear sky ☀️");
        assert_eq!(describe_weather_code(61), "rainy 🌧️");
        assert_eq!(describe_weather_code(95), "thunderstorm ⛈️");
        assert_eq!(describe_weather_code(80), "unknown (code 80)");
        assert_eq!(describe_weather_code(-1), "unknown (code -1)");
    }

    #[tokio::test]
    async fn test_paris_current_weather() {
        let server = MockServer::start().await;
        mount_paris_geocoding(&server).await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("current_weather", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "current_weather": {
                    "temperature": 18.4, "windspeed": 9.7,
                    "winddirection": 250, "weathercode": 2, "is_day": 1
                }
            })))
            .mount(&server)
            .await;

        let out = tool_for(&server)
            .execute(&args(json!({"location": "Paris"})))
            .await
            .unwrap();

        assert_eq!(out["city"], "Paris");
        assert_eq!(out["country"], "France");
        assert_eq!(out["latitude"], 48.85341);
        assert_eq!(out["current_weather"]["temperature"], 18.4);
        assert_eq!(
            out["current_weather"]["weather_description"],
            "partly cloudy ⛅"
        );
    }

    #[tokio::test]
    async fn test_unknown_place_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"generationtime_ms": 0.1})))
            .mount(&server)
            .await;

        let out = tool_for(&server)
            .execute(&args(json!({"location": "Atlantis"})))
            .await
            .unwrap();
        assert_eq!(out["status"], "unavailable");
        assert!(out["message"].as_str().unwrap().contains("Atlantis"));
    }

    #[tokio::test]
    async fn test_missing_current_weather_is_unavailable() {
        let server = MockServer::start().await;
        mount_paris_geocoding(&server).await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"latitude": 48.8})))
            .mount(&server)
            .await;

        let out = tool_for(&server)
            .execute(&args(json!({"location": "Paris"})))
            .await
            .unwrap();
        assert_eq!(out["status"], "unavailable");
    }

    #[tokio::test]
    async fn test_forecast_outage_is_network_error() {
        let server = MockServer::start().await;
        mount_paris_geocoding(&server).await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = tool_for(&server)
            .execute(&args(json!({"location": "Paris"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Network(msg) if msg.contains("forecast")));
    }
}

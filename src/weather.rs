//! Open-Meteo client: fetch a 3-day forecast by coordinates and render it
//! in the chat message format.

use std::time::Duration;

use serde::Deserialize;
use tracing::instrument;

#[derive(Clone)]
pub struct WeatherClient {
  client: reqwest::Client,
}

impl WeatherClient {
  pub fn new() -> Self {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(15))
      .build()
      .unwrap_or_else(|_| reqwest::Client::new());
    Self { client }
  }

  /// Fetch daily series for the next three days. Any transport or HTTP
  /// failure comes back as `Err`; the caller decides what the user sees.
  #[instrument(level = "info", skip(self))]
  pub async fn fetch_forecast(&self, latitude: f64, longitude: f64) -> Result<DailySeries, String> {
    let url = format!(
      "https://api.open-meteo.com/v1/forecast?latitude={latitude:.6}&longitude={longitude:.6}\
       &daily=temperature_2m_max,temperature_2m_min,precipitation_sum,surface_pressure_mean\
       &forecast_days=3&timezone=auto"
    );

    let res = self.client.get(&url).send().await.map_err(|e| e.to_string())?;
    if !res.status().is_success() {
      return Err(format!("Open-Meteo HTTP {}", res.status()));
    }
    let payload: ForecastPayload = res.json().await.map_err(|e| e.to_string())?;
    Ok(payload.daily)
  }
}

impl Default for WeatherClient {
  fn default() -> Self {
    Self::new()
  }
}

#[derive(Deserialize)]
struct ForecastPayload {
  #[serde(default)]
  daily: DailySeries,
}

/// Daily series as Open-Meteo returns them. Arrays are index-aligned with
/// `time`; a null in any slot means the value is missing for that day.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct DailySeries {
  #[serde(default)]
  pub time: Vec<String>,
  #[serde(default)]
  pub temperature_2m_max: Vec<Option<f64>>,
  #[serde(default)]
  pub temperature_2m_min: Vec<Option<f64>>,
  #[serde(default)]
  pub precipitation_sum: Vec<Option<f64>>,
  #[serde(default)]
  pub surface_pressure_mean: Vec<Option<f64>>,
}

/// Open-Meteo reports pressure in hPa; the chat shows mm of mercury.
fn mmhg(hpa: f64) -> i64 {
  (hpa * 0.75006).round() as i64
}

/// Render up to three days: a header line, then one block per day with day
/// and night temperatures, precipitation and pressure. A missing value
/// renders as a bare "—" with no unit attached.
pub fn format_forecast(daily: &DailySeries) -> String {
  fn cell(v: Option<f64>, render: impl Fn(f64) -> String) -> String {
    v.map(render).unwrap_or_else(|| "—".to_string())
  }

  let mut blocks = vec!["*Погода на 3 дня:*".to_string()];
  for i in 0..daily.time.len().min(3) {
    let day = &daily.time[i];
    let t_max = cell(value_at(&daily.temperature_2m_max, i), |v| format!("{}°C", v.round() as i64));
    let t_min = cell(value_at(&daily.temperature_2m_min, i), |v| format!("{}°C", v.round() as i64));
    let prec = cell(value_at(&daily.precipitation_sum, i), |v| format!("{v:.1} мм"));
    let press = cell(value_at(&daily.surface_pressure_mean, i), |v| format!("{} мм рт. ст.", mmhg(v)));
    blocks.push(format!(
      "*{day}*\nДнём: {t_max}  •  Ночью: {t_min}\nОсадки: {prec}  •  Давление: {press}"
    ));
  }
  blocks.join("\n\n")
}

fn value_at(series: &[Option<f64>], i: usize) -> Option<f64> {
  series.get(i).copied().flatten()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn pressure_converts_to_mmhg() {
    assert_eq!(mmhg(1013.25), 760);
    assert_eq!(mmhg(1000.0), 750);
  }

  #[test]
  fn forecast_formats_three_days_and_renders_gaps_as_dashes() {
    let daily = DailySeries {
      time: vec![
        "2025-06-01".into(),
        "2025-06-02".into(),
        "2025-06-03".into(),
        "2025-06-04".into(),
      ],
      temperature_2m_max: vec![Some(21.6), None, Some(18.2), Some(30.0)],
      temperature_2m_min: vec![Some(12.4), Some(11.0), None],
      precipitation_sum: vec![Some(0.0), Some(3.4), Some(1.0)],
      surface_pressure_mean: vec![Some(1013.25), None, Some(1000.0)],
    };
    let text = format_forecast(&daily);

    let blocks: Vec<&str> = text.split("\n\n").collect();
    assert_eq!(blocks.len(), 4, "header plus exactly three days");
    assert_eq!(blocks[0], "*Погода на 3 дня:*");
    assert_eq!(
      blocks[1],
      "*2025-06-01*\nДнём: 22°C  •  Ночью: 12°C\nОсадки: 0.0 мм  •  Давление: 760 мм рт. ст."
    );
    assert_eq!(
      blocks[2],
      "*2025-06-02*\nДнём: —  •  Ночью: 11°C\nОсадки: 3.4 мм  •  Давление: —"
    );
    assert!(blocks[3].contains("Ночью: —\n"), "missing value must be a bare dash: {}", blocks[3]);
  }

  #[test]
  fn empty_series_still_produces_the_header() {
    let text = format_forecast(&DailySeries::default());
    assert_eq!(text, "*Погода на 3 дня:*");
  }
}

use crate::color::Rgba;
use crate::generation::{PollPolicy, ServiceConfig};

/// Tuning for the loading animation.
///
/// Every field is optional when deserialising; missing fields keep their
/// defaults.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Shapes requested per session
    pub shape_count: usize,
    /// Target edge length of a placement cell in pixels
    pub cell_size: f64,
    /// Random cell picks per shape before it is dropped
    pub placement_attempts: u32,
    pub radius_min: u32,
    pub radius_max: u32,
    /// Upper bound (exclusive) of a shape's phase step per frame
    pub max_flash_rate: f64,
    /// Opacity ceiling of the pulse
    pub max_opacity: f64,
    pub shape_color: Rgba,
    /// CSS font for the attempt overlay
    pub font: String,
    pub text_fill: Rgba,
    pub text_stroke: Rgba,
    /// Initial "out of" value of the overlay
    pub attempt_total: u32,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            shape_count: 30,
            cell_size: 100.0,
            placement_attempts: 10,
            radius_min: 20,
            radius_max: 50,
            max_flash_rate: 0.03,
            max_opacity: 0.8,
            shape_color: Rgba::rgb(100, 100, 100),
            font: "90px serif".to_string(),
            text_fill: Rgba::rgb(100, 100, 100),
            text_stroke: Rgba::rgb(10, 10, 10),
            attempt_total: 20,
        }
    }
}

/// Complete client configuration, typically read from a `client.toml`.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub loader: LoaderConfig,
    pub service: ServiceConfig,
    pub poll: PollPolicy,
}

impl AppConfig {
    /// Parse a TOML string into `AppConfig`.
    #[cfg(feature = "toml")]
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Loader settings with the overlay total matched to the poll budget.
    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig {
            attempt_total: self.poll.max_attempts,
            ..self.loader.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = LoaderConfig::default();
        assert_eq!(config.shape_count, 30);
        assert_eq!(config.placement_attempts, 10);
        assert_eq!(config.shape_color, Rgba::rgb(100, 100, 100));
    }

    #[test]
    fn loader_total_follows_poll_budget() {
        let mut config = AppConfig::default();
        config.poll.max_attempts = 7;
        assert_eq!(config.loader_config().attempt_total, 7);
        assert_eq!(config.loader.attempt_total, 20);
    }

    #[test]
    fn shape_opacity_survives_json_round_trip() {
        let mut config = AppConfig::default();
        config.loader.shape_color = Rgba::rgb(100, 100, 100).with_alpha(0.5);

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"#64646480\""), "{json}");
        let back: AppConfig = serde_json::from_str(&json).unwrap();

        let color = back.loader.shape_color;
        assert_eq!((color.r, color.g, color.b), (100, 100, 100));
        assert!((color.alpha - 0.5).abs() <= 1.0 / 255.0);
        assert_eq!(back.loader.text_fill, config.loader.text_fill);
    }

    #[cfg(feature = "toml")]
    #[test]
    fn partial_toml() {
        let config = AppConfig::from_toml_str(
            r##"
            [loader]
            shape_count = 12
            shape_color = "#abc"

            [poll]
            delay_ms = 500
            "##,
        )
        .unwrap();
        assert_eq!(config.loader.shape_count, 12);
        assert_eq!(config.loader.shape_color, Rgba::rgb(170, 187, 204));
        assert_eq!(config.loader.cell_size, 100.0);
        assert_eq!(config.poll.delay_ms, 500);
        assert_eq!(config.poll.max_attempts, 20);
    }

    #[cfg(feature = "toml")]
    #[test]
    fn bad_color_rejected() {
        let result = AppConfig::from_toml_str("[loader]\ntext_fill = \"nope\"\n");
        assert!(result.is_err());
    }
}

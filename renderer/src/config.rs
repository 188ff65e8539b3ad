/// Environment variable to override the output resolution, in dots per inch
pub const RENDER_DPI_ENV: &str = "RENDER_DPI";

/// Default name of the summary file inside the results directory
pub const DEFAULT_INPUT_FILE_NAME: &str = "test_summary.csv";
/// Default name of the rendered image inside the results directory
pub const DEFAULT_OUTPUT_FILE_NAME: &str = "load_test_results.png";

const DEFAULT_DPI: u32 = 100;
/// Highest accepted `RENDER_DPI`. The default canvas is 9000x6000 px at this resolution.
pub const MAX_DPI: u32 = 600;
const DEFAULT_WIDTH_IN: f64 = 15.0;
const DEFAULT_HEIGHT_IN: f64 = 10.0;

/// Provides the parameters used to locate the summary and size the rendered image.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub dpi: u32,
    pub width_in: f64,
    pub height_in: f64,
    pub input_file_name: String,
    pub output_file_name: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            width_in: DEFAULT_WIDTH_IN,
            height_in: DEFAULT_HEIGHT_IN,
            input_file_name: DEFAULT_INPUT_FILE_NAME.to_string(),
            output_file_name: DEFAULT_OUTPUT_FILE_NAME.to_string(),
        }
    }
}

impl RenderConfig {
    /// Builds a [`RenderConfig`] from the defaults, overridden by the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self::default();
        match std::env::var(RENDER_DPI_ENV) {
            Ok(value) => Ok(config.dpi(parse_dpi(&value)?)),
            Err(std::env::VarError::NotPresent) => Ok(config),
            Err(std::env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidDpi {
                value: String::from("<non-unicode>"),
            }),
        }
    }

    /// Builds a [`RenderConfig`] with the specified resolution.
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Canvas size in pixels.
    pub fn canvas_size(&self) -> (u32, u32) {
        (
            (self.width_in * self.dpi as f64).round() as u32,
            (self.height_in * self.dpi as f64).round() as u32,
        )
    }
}

fn parse_dpi(value: &str) -> Result<u32, ConfigError> {
    match value.trim().parse::<u32>() {
        Ok(dpi) if (1..=MAX_DPI).contains(&dpi) => Ok(dpi),
        _ => Err(ConfigError::InvalidDpi {
            value: value.to_string(),
        }),
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for `RENDER_DPI`, expected an integer from 1 to 600: {value:?}")]
    InvalidDpi { value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_canvas_is_fifteen_by_ten_inches() {
        let config = RenderConfig::default();
        assert_eq!(config.canvas_size(), (1500, 1000));
        assert_eq!(config.input_file_name, "test_summary.csv");
        assert_eq!(config.output_file_name, "load_test_results.png");
    }

    #[test]
    fn test_render_config_builder() {
        let config = RenderConfig {
            width_in: 4.0,
            height_in: 3.0,
            ..RenderConfig::default()
        }
        .dpi(50);

        assert_eq!(config.canvas_size(), (200, 150));
        assert_eq!(config.output_file_name, "load_test_results.png");
    }

    #[test]
    fn test_should_parse_dpi() {
        assert_eq!(parse_dpi("72").unwrap(), 72);
        assert_eq!(parse_dpi(" 200 ").unwrap(), 200);
        assert_eq!(parse_dpi(&MAX_DPI.to_string()).unwrap(), MAX_DPI);
    }

    #[test]
    fn test_should_reject_invalid_dpi() {
        assert_eq!(
            parse_dpi("0").unwrap_err(),
            ConfigError::InvalidDpi {
                value: "0".to_string()
            }
        );
        assert!(parse_dpi("-5").is_err());
        assert!(parse_dpi("high").is_err());
        assert!(parse_dpi("").is_err());
    }

    #[test]
    fn test_should_reject_dpi_above_limit() {
        assert_eq!(
            parse_dpi("1000000").unwrap_err(),
            ConfigError::InvalidDpi {
                value: "1000000".to_string()
            }
        );
        assert!(parse_dpi(&(MAX_DPI + 1).to_string()).is_err());
        assert!(parse_dpi(&u32::MAX.to_string()).is_err());
    }

    #[test]
    fn test_largest_dpi_fits_the_canvas_limit() {
        let (width, height) = RenderConfig::default().dpi(MAX_DPI).canvas_size();
        assert!(width as u64 * height as u64 <= crate::chart::MAX_CANVAS_PIXELS);
    }
}

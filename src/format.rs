//! Output formatting for CLI commands.

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;

/// Output format for printed documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

/// Render a value in the requested format. JSON output is pretty-printed.
pub fn render<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> Result<String> {
    let out = match format {
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(value)?;
            json.push('\n');
            json
        }
    };
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_yaml_and_json() {
        let value = json!({"ingestion": {"poll_interval_seconds": 120}});

        let yaml = render(&value, OutputFormat::Yaml).unwrap();
        assert!(yaml.contains("poll_interval_seconds: 120"));

        let json = render(&value, OutputFormat::Json).unwrap();
        assert!(json.contains("\"poll_interval_seconds\": 120"));
        assert!(json.ends_with('\n'));
    }
}

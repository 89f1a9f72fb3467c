use crate::config::toml_config::FileConfig;
use crate::config::HarvestConfig;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "page-imgzip")]
#[command(about = "Download every image on a list of web pages into one zip per page")]
pub struct CliConfig {
    #[arg(long, help = "File with one page URL per line [default: web.txt]")]
    pub input: Option<PathBuf>,

    #[arg(long, help = "Directory for image folders and archives [default: .]")]
    pub output_dir: Option<PathBuf>,

    #[arg(long, help = "TOML settings file; command-line flags take precedence")]
    pub config: Option<PathBuf>,

    #[arg(long, value_name = "SECS")]
    pub page_timeout: Option<u64>,

    #[arg(long, value_name = "SECS")]
    pub title_timeout: Option<u64>,

    #[arg(long, value_name = "SECS")]
    pub image_timeout: Option<u64>,

    #[arg(long, help = "Write a JSON summary of the run to this path")]
    pub report: Option<PathBuf>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log as JSON lines")]
    pub log_json: bool,
}

impl CliConfig {
    /// Defaults, then the config file, then flags; validated.
    pub fn resolve(&self) -> Result<HarvestConfig> {
        let mut config = HarvestConfig::default();
        if let Some(path) = &self.config {
            config = config.with_file(FileConfig::from_file(path)?);
        }

        if let Some(input) = &self.input {
            config.input_path = input.clone();
        }
        if let Some(output_dir) = &self.output_dir {
            config.output_root = output_dir.clone();
        }
        if let Some(secs) = self.page_timeout {
            config.page_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.title_timeout {
            config.title_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.image_timeout {
            config.image_timeout = Duration::from_secs(secs);
        }
        if let Some(report) = &self.report {
            config.report_path = Some(report.clone());
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn no_flags_gives_defaults() {
        let cli = CliConfig::parse_from(["page-imgzip"]);
        assert_eq!(cli.resolve().unwrap(), HarvestConfig::default());
    }

    #[test]
    fn flags_override_config_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("imgzip.toml");
        std::fs::write(&path, "output_dir = \"from-file\"\nimage_timeout_secs = 5\n").unwrap();

        let cli = CliConfig::parse_from([
            "page-imgzip",
            "--config",
            path.to_str().unwrap(),
            "--output-dir",
            "from-flag",
            "--input",
            "pages.txt",
        ]);
        let config = cli.resolve().unwrap();

        assert_eq!(config.output_root, PathBuf::from("from-flag"));
        assert_eq!(config.input_path, PathBuf::from("pages.txt"));
        assert_eq!(config.image_timeout, Duration::from_secs(5));
    }

    #[test]
    fn invalid_timeout_fails_resolution() {
        let cli = CliConfig::parse_from(["page-imgzip", "--image-timeout", "0"]);
        assert!(cli.resolve().is_err());
    }
}

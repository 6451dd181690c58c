use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_TEMPLATE: &str = "[IMG_]xxxx";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub template: String,
    pub shared_start: u64,
    pub prefix_len: usize,
    pub include_cjk: bool,
    pub recursive: bool,
    pub include_hidden: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
            shared_start: 1,
            prefix_len: 3,
            include_cjk: false,
            recursive: false,
            include_hidden: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub config_path: PathBuf,
}

pub fn app_paths() -> Result<AppPaths> {
    let proj = ProjectDirs::from("com", "kelly", "imgseq-renamer")
        .context("OS標準設定ディレクトリを取得できませんでした")?;
    let config_dir = proj.config_dir().to_path_buf();
    Ok(AppPaths {
        config_path: config_dir.join("config.toml"),
        config_dir,
    })
}

pub fn load_config() -> Result<AppConfig> {
    let paths = app_paths()?;
    if !paths.config_path.exists() {
        return Ok(AppConfig::default());
    }

    let raw = fs::read_to_string(&paths.config_path).with_context(|| {
        format!(
            "設定ファイルを読めませんでした: {}",
            paths.config_path.display()
        )
    })?;

    let config = toml::from_str::<AppConfig>(&raw).context("設定ファイルのパースに失敗しました")?;
    Ok(config)
}

pub fn save_config(config: &AppConfig) -> Result<()> {
    let paths = app_paths()?;
    fs::create_dir_all(&paths.config_dir).with_context(|| {
        format!(
            "設定ディレクトリを作成できませんでした: {}",
            paths.config_dir.display()
        )
    })?;
    let body = toml::to_string_pretty(config).context("設定のシリアライズに失敗しました")?;
    fs::write(&paths.config_path, body).with_context(|| {
        format!(
            "設定ファイルを書き込めませんでした: {}",
            paths.config_path.display()
        )
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_usable_template() {
        let config = AppConfig::default();
        let segments = crate::template::tokenize(&config.template).expect("must parse");
        assert!(crate::template::has_shared_segment(&segments));
        assert_eq!(config.shared_start, 1);
        assert_eq!(config.prefix_len, 3);
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = AppConfig {
            template: "[trip_]001".to_string(),
            shared_start: 10,
            prefix_len: 4,
            include_cjk: true,
            recursive: true,
            include_hidden: false,
        };
        let body = toml::to_string_pretty(&config).expect("serialize");
        let back = toml::from_str::<AppConfig>(&body).expect("parse");
        assert_eq!(back.template, config.template);
        assert_eq!(back.shared_start, 10);
        assert!(back.include_cjk);
    }
}

use crate::error::{ErrorKind, Result};
use crate::{APPLICATION, Config};
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use std::path::{Path, PathBuf};

/// Prefix of environment variables that override configuration values.
pub const ENV_PREFIX: &str = "RENAMR_";

/// `renamr.toml` in the platform's configuration directory, if it exists.
pub fn default_config_file() -> Option<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", APPLICATION)?;
    let path = dirs.config_dir().join("renamr.toml");
    path.is_file().then_some(path)
}

impl Config {
    /// Loads configuration from defaults, `file` (or the
    /// [default file](default_config_file) when `None`) and the environment.
    ///
    /// # Errors
    /// - [`ErrorKind::NotFound`] when `file` is given but doesn't exist.
    /// - [`ErrorKind::UnsupportedFormat`] for an unknown file extension.
    /// - [`ErrorKind::Parse`] when a layer can't be read into [`Config`].
    /// - [`ErrorKind::Invalid`] when the merged result fails [`validate`](Self::validate).
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let file = match file {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => default_config_file(),
        };
        Self::from_figment(Self::figment(file.as_deref())?)
    }

    /// The layered provider stack, for callers that want to add their own
    /// layers before extracting.
    pub fn figment(file: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = file {
            tracing::debug!(path = %path.display(), "Reading configuration file");
            figment = match path.extension().and_then(|ext| ext.to_str()) {
                Some("toml") => figment.merge(Toml::file(path)),
                Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
                Some("json") => figment.merge(Json::file(path)),
                _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Extracts and validates a [`Config`] from `figment`.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract().or_raise(|| ErrorKind::Parse)?;
        config.validate()?;
        Ok(config)
    }
}

use config::{Config, File};
use std::path::{Path, PathBuf};

use super::*;

/// The prefix of environment variables merged over the config files.
pub const ENV_PREFIX: &str = "META_RELAYER";

/// A helper function that will search for all config files in the given directory and return them as a vec
/// of the paths.
///
/// Supported file extensions are:
/// - `.toml`.
/// - `.json`.
pub fn search_config_files<P: AsRef<Path>>(
    base_dir: P,
) -> meta_relayer_utils::Result<Vec<PathBuf>> {
    // A pattern that covers all toml or json files in the config directory and subdirectories.
    let toml_pattern = format!("{}/**/*.toml", base_dir.as_ref().display());
    let json_pattern = format!("{}/**/*.json", base_dir.as_ref().display());
    tracing::trace!(
        "Loading config files from {} and {}",
        toml_pattern,
        json_pattern
    );
    let toml_files = glob::glob(&toml_pattern)?;
    let json_files = glob::glob(&json_pattern)?;
    toml_files
        .chain(json_files)
        .map(|v| v.map_err(meta_relayer_utils::Error::from))
        .collect()
}

/// The environment source merged over the config files.
///
/// Keys are kebab-case, which environment variables cannot spell, so `_`
/// inside a name stands for `-` and `__` separates nested keys:
/// `META_RELAYER_STORE_TIMEOUT_MS` sets `store-timeout-ms` and
/// `META_RELAYER_EVM__RPC_TIMEOUT_MS` sets `evm.rpc-timeout-ms`.
pub fn environment<I>(vars: I) -> config::Environment
where
    I: IntoIterator<Item = (String, String)>,
{
    let prefix = format!("{ENV_PREFIX}_");
    let source: config::Map<String, String> = vars
        .into_iter()
        .filter_map(|(key, value)| {
            let rest = key.strip_prefix(&prefix)?;
            let key = rest
                .split("__")
                .map(|part| part.replace('_', "-"))
                .collect::<Vec<_>>()
                .join("__");
            Some((format!("{prefix}{key}"), value))
        })
        .collect();
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .source(Some(source))
}

/// Try to parse the [`MetaRelayerConfig`] from the given config file(s).
pub fn parse_from_files(
    files: &[PathBuf],
) -> meta_relayer_utils::Result<MetaRelayerConfig> {
    parse_with_environment(files, std::env::vars())
}

fn parse_with_environment<I>(
    files: &[PathBuf],
    vars: I,
) -> meta_relayer_utils::Result<MetaRelayerConfig>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut builder = Config::builder();
    for config_file in files {
        tracing::trace!("Loading config file: {}", config_file.display());
        // get file extension
        let ext = config_file
            .extension()
            .map(|e| e.to_str().unwrap_or(""))
            .unwrap_or("");
        let format = match ext {
            "toml" => config::FileFormat::Toml,
            "json" => config::FileFormat::Json,
            _ => {
                tracing::warn!("Unknown file extension: {}", ext);
                continue;
            }
        };
        builder = builder
            .add_source(File::from(config_file.as_path()).format(format));
    }

    // also merge in the environment (with a prefix of META_RELAYER).
    let builder = builder.add_source(environment(vars));
    let cfg = builder.build()?;
    // and finally deserialize the config and post-process it
    let config: Result<
        MetaRelayerConfig,
        serde_path_to_error::Error<config::ConfigError>,
    > = serde_path_to_error::deserialize(cfg);
    match config {
        Ok(c) => postloading_process(c),
        Err(e) => {
            tracing::error!("{}", e);
            Err(e.into())
        }
    }
}

/// Load the configuration files and
///
/// Returns `Ok(MetaRelayerConfig)` on success, or `Err(Error)` on failure.
///
/// # Arguments
///
/// * `path` - The path to the configuration directory
///
/// # Example
///
/// ```
/// use meta_relayer_config::utils::load;
///
/// let path = "/path/to/config";
/// load(path);
/// ```
///
/// it is the same as using the [`search_config_files`] and [`parse_from_files`] functions combined.
pub fn load<P: AsRef<Path>>(
    path: P,
) -> meta_relayer_utils::Result<MetaRelayerConfig> {
    parse_from_files(&search_config_files(path)?)
}

/// The postloading_process exists to validate configuration and standardize
/// the format of the configuration
pub fn postloading_process(
    mut config: MetaRelayerConfig,
) -> meta_relayer_utils::Result<MetaRelayerConfig> {
    tracing::trace!("Checking configration sanity ...");
    if config.evm.rpc_timeout_ms == 0 {
        return Err(meta_relayer_utils::Error::Generic(
            "evm.rpc-timeout-ms must be greater than zero",
        ));
    }
    if config.store_timeout_ms == 0 {
        return Err(meta_relayer_utils::Error::Generic(
            "store-timeout-ms must be greater than zero",
        ));
    }
    // the zero address never comes out of signer recovery.
    if config.access.allow_list.remove(&Address::zero()) {
        tracing::warn!("Ignoring the zero address in access.allow-list");
    }
    if config.access.restricted && config.access.allow_list.is_empty() {
        tracing::warn!(
            "!!WARNING!!: restricted mode is on with an empty allow-list, every request will be rejected"
        );
    }
    if config.eligibility.testing {
        tracing::warn!(
            "!!WARNING!!: test mode is on, balance and voting power checks are relaxed"
        );
    }
    if config.notification.hook_url.is_none() {
        tracing::debug!("No notification hook configured");
    }
    tracing::trace!(
        restricted = config.access.restricted,
        allowed = config.access.allow_list.len(),
        "Config is sane",
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const EVM: &str = r#"
[evm]
http-endpoint = "http://localhost:8545"
token-address = "0xc00e94cb662c3520282e6f5717214004a7f26888"
relay-address = "0xf61d8eef3f479dfa24beaa46bf6f235e6e2f7af8"
governor-address = "0xc0da01a04c3f3e0be433606045bb7017a7323e38"
"#;

    fn write(dir: &Path, name: &str, body: &str) {
        let mut f = std::fs::File::create(dir.join(name)).unwrap();
        f.write_all(body.as_bytes()).unwrap();
    }

    #[test]
    fn files_are_merged() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "main.toml", EVM);
        write(
            dir.path(),
            "access.json",
            r#"{"access":{"restricted":true,"allow-list":[
                "0x2b384212edc04ae8bb41738d05ba20e33277bf33",
                "0x0000000000000000000000000000000000000000"
            ],"message":"beta testers only"}}"#,
        );
        let config = load(dir.path()).unwrap();
        assert!(config.access.restricted);
        assert_eq!(config.access.message, "beta testers only");
        // the zero address is dropped.
        assert_eq!(config.access.allow_list.len(), 1);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "main.toml",
            &format!("store-timeout-ms = 0\n{EVM}"),
        );
        assert!(load(dir.path()).is_err());
    }

    #[test]
    fn missing_evm_section_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "main.toml", "port = 8080\n");
        let err = load(dir.path()).unwrap_err();
        assert!(matches!(err, meta_relayer_utils::Error::ParseConfig(_)));
    }

    #[test]
    fn environment_overrides_kebab_case_keys() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "main.toml", EVM);
        let files = search_config_files(dir.path()).unwrap();
        let vars = [
            ("META_RELAYER_STORE_TIMEOUT_MS", "250"),
            ("META_RELAYER_EVM__RPC_TIMEOUT_MS", "750"),
            ("META_RELAYER_ACCESS__RESTRICTED", "true"),
            ("META_RELAYER_GREETING", "hello"),
            ("OTHER_STORE_TIMEOUT_MS", "1"),
        ]
        .map(|(k, v)| (k.to_string(), v.to_string()));
        let config = parse_with_environment(&files, vars).unwrap();
        assert_eq!(config.store_timeout_ms, 250);
        assert_eq!(config.evm.rpc_timeout_ms, 750);
        assert!(config.access.restricted);
        assert_eq!(config.greeting, "hello");
    }
}

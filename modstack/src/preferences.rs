use modstack_core::Config;

const DOCUMENTATION: &str = r#"# Modstack settings. You may edit this file, but be aware that formatting and comments will not
# be preserved, and all keys and values are case sensitive.

# [naming] controls how stacks, layers and modifiers are named after their base object:
#   `<base><stack_suffix>`, `<base><layer_suffix><index>`, `<base><modifier_suffix><index>`
# with the index zero-padded to `index_width` digits. Changing these on a scene that already has
# stacks makes the old ones invisible to the tool.
# `reference_suffix` is what the duplication procedure appends to the object it copies, and a
# modifier's shape is renamed to `<modifier><shape_suffix>`.

# [duplication] names the host procedure that copies an object into a new modifier.

# Examples:
# [naming]
# stack_suffix = "_Stack"
# index_width = 3
# [duplication]
# procedure = "myDuplicate"

"#;

#[must_use]
pub fn preferences_dir() -> Option<std::path::PathBuf> {
    let mut base_dir = dirs::preference_dir()?;
    base_dir.push(env!("CARGO_PKG_NAME"));
    Some(base_dir)
}

pub struct Preferences {
    failed_to_load: bool,
    pub config: Config,
}
impl Preferences {
    const FILENAME: &'static str = "modstack.toml";
    /// Settings saved in the user's preferences, or defaulted if unavailable for some reason.
    #[must_use]
    pub fn load() -> Self {
        let mut dir = preferences_dir();
        match dir.as_mut() {
            None => Self::no_path(),
            Some(dir) => {
                dir.push(Self::FILENAME);
                Self::load_or_default(dir)
            }
        }
    }
    #[must_use]
    pub fn no_path() -> Self {
        log::warn!("Settings weren't available, defaulting.");
        Self {
            failed_to_load: true,
            config: Config::default(),
        }
    }
    #[must_use]
    pub fn load_or_default(path: &std::path::Path) -> Self {
        let config: anyhow::Result<Config> = try_block::try_block! {
            let string = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&string)?;
            Ok(config)
        };

        match config {
            Ok(config) => {
                log::info!("Loaded settings from {path:?}");
                Self {
                    failed_to_load: false,
                    config,
                }
            }
            Err(e) => {
                log::debug!("Reading {path:?}: {e:#}");
                Self::no_path()
            }
        }
    }
    /// Return true if loading the user's settings failed, so they're worth writing back.
    #[must_use]
    pub fn did_fail_to_load(&self) -> bool {
        self.failed_to_load
    }
    pub fn to_documented_string(&self) -> anyhow::Result<String> {
        let string = toml::ser::to_string_pretty(&self.config)?;
        Ok(DOCUMENTATION.to_owned() + &string)
    }
    pub fn save(&self) -> anyhow::Result<()> {
        let mut preferences =
            preferences_dir().ok_or_else(|| anyhow::anyhow!("No preferences dir found"))?;
        // Explicity do *not* create recursively. If not found, the user probably has a good reason.
        // Ignore errors (could already exist). Any real errors will be emitted by file access below.
        let _ = std::fs::DirBuilder::new().create(&preferences);

        preferences.push(Self::FILENAME);
        std::fs::write(preferences, self.to_documented_string()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn documented_defaults_parse_back() {
        let string = Preferences::no_path().to_documented_string().unwrap();
        assert!(string.starts_with("# Modstack settings."));
        let config: Config = toml::from_str(&string).unwrap();
        assert_eq!(config, Config::default());
    }
    #[test]
    fn partial_file() {
        let config: Config = toml::from_str(
            r#"
            [naming]
            stack_suffix = "_Stack"
            index_width = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.naming.stack_suffix, "_Stack");
        assert_eq!(config.naming.layer_name("Cube1", 4), "Cube1_ModLayer004");
        assert_eq!(config.duplication, Config::default().duplication);
    }
    #[test]
    fn unreadable_file() {
        let preferences = Preferences::load_or_default(std::path::Path::new(
            "this/path/does/not/exist/modstack.toml",
        ));
        assert!(preferences.did_fail_to_load());
        assert_eq!(preferences.config, Config::default());
    }
}

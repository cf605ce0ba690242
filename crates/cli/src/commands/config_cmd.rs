//! `canary config`: Configuration management commands.

use canary_config::CanaryConfig;

pub fn show(config: CanaryConfig) -> Result<(), Box<dyn std::error::Error>> {
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    println!("# flags: {}", config.trace.to_flag_string());
    Ok(())
}

pub fn path() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = CanaryConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}

pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = CanaryConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    if config_path.exists() {
        println!("Config already exists: {}", config_path.display());
        return Ok(());
    }

    std::fs::create_dir_all(&config_dir)?;
    std::fs::write(&config_path, CanaryConfig::default_toml())?;
    println!("Created {}", config_path.display());
    Ok(())
}

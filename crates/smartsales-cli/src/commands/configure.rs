//! configure command - manage configuration profiles

use super::CommandContext;
use crate::config::Config;
use crate::ConfigureAction;
use anyhow::Result;
use colored::Colorize;

pub fn execute(ctx: &CommandContext, action: ConfigureAction) -> Result<()> {
    let profile = ctx.profile.as_deref();
    match action {
        ConfigureAction::Set { key, value } => set_config(profile, &key, &value),
        ConfigureAction::Get { key } => get_config(profile, &key),
        ConfigureAction::List => list_config(ctx, profile),
        ConfigureAction::AddProfile { name } => add_profile(&name),
        ConfigureAction::RemoveProfile { name } => remove_profile(&name),
    }
}

fn set_config(profile: Option<&str>, key: &str, value: &str) -> Result<()> {
    let mut config = Config::load(profile)?;
    config.set_value(key, value)?;
    config.save(profile)?;

    let shown = if key == "token" { "***" } else { value };
    println!("Set {} = {}", key.cyan(), shown);
    Ok(())
}

fn get_config(profile: Option<&str>, key: &str) -> Result<()> {
    if !Config::keys().contains(&key) {
        anyhow::bail!("Unknown config key: {}", key);
    }
    let config = Config::load(profile)?;
    match config.get_value(key) {
        Some(value) => println!("{}", value),
        None => println!("(not set)"),
    }
    Ok(())
}

fn list_config(ctx: &CommandContext, profile: Option<&str>) -> Result<()> {
    let config = Config::load(profile)?;

    println!(
        "{} [{}]",
        "Current configuration:".bold(),
        profile.unwrap_or("default")
    );
    println!();

    for key in Config::keys() {
        let value = config
            .get_value(key)
            .unwrap_or_else(|| "(not set)".to_string());
        println!("  {}: {}", key.cyan(), value);
    }

    println!();
    println!("{}", "Effective settings:".bold());
    println!("  api_url: {}", ctx.config.api.base_url);
    println!("  page_size: {}", ctx.config.list.page_size);
    println!("  export_dir: {}", ctx.config.export.output_dir.display());
    println!("  export_cap: {}", ctx.config.export.default_cap);

    println!();
    println!("{}", "Available profiles:".bold());

    let profiles = Config::list_profiles()?;
    if profiles.is_empty() {
        println!("  (none)");
    } else {
        for profile in profiles {
            println!("  - {}", profile);
        }
    }

    println!();
    println!(
        "Config file: {}",
        Config::config_path()?.display().to_string().dimmed()
    );

    Ok(())
}

fn add_profile(name: &str) -> Result<()> {
    let config = Config::default();
    config.save(Some(name))?;
    println!("Created profile: {}", name.green());
    println!(
        "Use 'smartsales configure set <key> <value> --profile {}' to configure it.",
        name
    );
    Ok(())
}

fn remove_profile(name: &str) -> Result<()> {
    Config::delete_profile(name)?;
    println!("Removed profile: {}", name.red());
    Ok(())
}

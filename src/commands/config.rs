use activity_core::BoardConfig;
use anyhow::Result;
use owo_colors::OwoColorize;

pub fn run() -> Result<()> {
    let config_path = BoardConfig::config_path()?;
    let config = BoardConfig::load()?;

    println!("{}", "Paths".bold());
    println!("  Config:     {}", config_path.display());
    println!(
        "  Providers:  {}",
        config_path
            .parent()
            .map(|p| p.join("providers").join(&config.provider))
            .unwrap_or_default()
            .display()
    );

    println!();
    println!("{}", "Settings".bold());
    println!("  provider:        {}", config.provider);
    println!("  timezone:        {}", config.timezone);
    println!("  all_since:       {}", config.all_since);
    println!("  page_size:       {}", config.page_size);
    println!("  listing_pages:   {}", config.listing_pages);
    println!("  recent colors:   {}", config.recent_colors_variable);

    if !config_path.exists() {
        println!();
        println!(
            "{}",
            "No config file yet; these are the defaults. Run `activity config init` to create one."
                .dimmed()
        );
    }

    Ok(())
}

pub fn init(force: bool) -> Result<()> {
    let config_path = BoardConfig::config_path()?;
    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite it.",
            config_path.display()
        );
    }

    BoardConfig::create_default_config(&config_path)?;
    println!("{}", format!("Created {}", config_path.display()).green());
    Ok(())
}

use keystone::config::ArgsSource;
use keystone::{AppContext, Config};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct AppConfig {
    app: AppSection,
    database: DatabaseSection,
}

#[derive(Debug, Deserialize)]
struct AppSection {
    name: String,
    debug: bool,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct DatabaseSection {
    host: String,
    port: u16,
    name: String,
    user: String,
    url: String,
}

fn main() -> Result<(), keystone::Error> {
    // defaults -> DEMO__* environment -> command line
    let ctx = AppContext::builder()
        .with_config(
            Config::builder()
                .with_file("demos/default.toml", true)
                .with_file("demos/local.toml", false)
                .with_env("DEMO", "__")
                .with_source(ArgsSource::from_process())
                .with_environment_evaluator()
                .with_configuration_value_evaluator(),
        )
        .with_logging(true)
        .build::<AppConfig>()?;

    let (config, root) = ctx.into_parts();

    println!("App: {} (debug={})", config.app.name, config.app.debug);
    println!("Database user: {}", config.database.user);
    println!("Database URL: {}", config.database.url);

    if let Some(overlay) = root.overlay() {
        for key in overlay.candidate_keys() {
            println!("  {key}: {:?} -> {:?}", root.raw_snapshot().get(key), root.get(key));
        }
    }

    Ok(())
}

use colored::Colorize;
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Root};
use log4rs::encode::pattern::PatternEncoder;
use protect_surface_sync::azure::inventory_source;
use protect_surface_sync::config::Config;
use protect_surface_sync::{asset_service, BoxError, RunGuard};
use tokio::time::MissedTickBehavior;

const LOG_CONFIG_FILE: &str = "log4rs.yml";

/// log4rs from `log4rs.yml`, or plain console logging when the file is missing.
fn init_logging() -> Result<(), BoxError> {
    if std::path::Path::new(LOG_CONFIG_FILE).exists() {
        log4rs::init_file(LOG_CONFIG_FILE, Default::default())?;
        return Ok(());
    }
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{d(%Y-%m-%d %H:%M:%S)} {h({l})} {t} - {m}{n}")))
        .build();
    let config = log4rs::config::Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Info))?;
    log4rs::init_config(config)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Do as little as possible in main.rs as it can't contain any tests
    dotenv::dotenv().ok();
    init_logging()?;
    log::info!("#Start main()");

    let config = Config::from_env()?;
    let settings = config.sync_settings();
    let inventory = inventory_source(&config);
    let service = asset_service(&config)?;
    let guard = RunGuard::new();

    let Some(period) = config.sync_interval else {
        tokio::select! {
            result = guard.run(&*inventory, &*service, &settings) => {
                result?;
            }
            _ = tokio::signal::ctrl_c() => {
                log::warn!("{}", "Interrupted, run cancelled".yellow());
                return Err("Interrupted".into());
            }
        }
        log::info!("#End main()");
        return Ok(());
    };

    log::info!("Syncing every {}s, Ctrl-C to stop", period.as_secs());
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => break,
        }
        tokio::select! {
            result = guard.run(&*inventory, &*service, &settings) => {
                if let Err(e) = result {
                    log::error!("{}", format!("Run failed: {e}").red());
                }
            }
            _ = tokio::signal::ctrl_c() => {
                log::warn!("{}", "Interrupted, run cancelled".yellow());
                break;
            }
        }
    }
    log::info!("#End main()");
    Ok(())
}

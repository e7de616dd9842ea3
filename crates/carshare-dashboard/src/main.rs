mod bootstrap;
mod summary;

use anyhow::{Context, Result};
use carshare_core::settings::Settings;
use carshare_data::filter::BrandFilter;
use carshare_data::reader::DataSources;
use carshare_runtime::data_manager::DataManager;
use carshare_runtime::session::DashboardSession;
use carshare_ui::app::App;

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    let log_file = settings
        .log_file
        .clone()
        .unwrap_or_else(bootstrap::default_log_path);
    bootstrap::setup_logging(&settings.log_level, &log_file)?;

    tracing::info!("Carshare dashboard v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        data_dir = %settings.data_dir.display(),
        view = %settings.view,
        theme = %settings.theme,
        brands = ?settings.brands,
        "settings loaded"
    );

    let manager = DataManager::new(
        DataSources::from_dir(&settings.data_dir),
        settings.cache_ttl_duration(),
    );
    let mut session = DashboardSession::new(manager, BrandFilter::new(settings.brands.iter().cloned()));

    match settings.view.as_str() {
        "summary" => {
            let report = session.refresh(false).context("building dashboard")?;
            print!("{}", summary::render_summary(&report, settings.preview_rows));
        }
        "json" => {
            let report = session.refresh(false).context("building dashboard")?;
            println!("{}", summary::render_json(&report, settings.preview_rows)?);
        }
        _ => {
            App::new(&settings.theme, session, settings.preview_rows).run()?;
        }
    }

    tracing::info!("Carshare dashboard exiting");
    Ok(())
}

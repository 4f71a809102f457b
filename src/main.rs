mod app;
mod catalog;
mod error;
mod install;
mod platform;
mod session;
mod settings;
mod theme;

#[cfg(test)]
mod test_support;

use std::io::Write;

use app::App;
use settings::Settings;

const CRASH_LOG: &str = "crash.log";

fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("printer_installer=debug".parse().unwrap()),
        )
        .init();

    install_crash_log();

    tracing::info!("Starting printer installer");

    let (settings, settings_error) = match settings::load_settings() {
        Ok(settings) => (settings, None),
        Err(e) => {
            tracing::warn!("{e}; using default settings");
            (Settings::default(), Some(e))
        }
    };
    tracing::info!("Configuration URL: {}", settings.config_url);

    let font = theme::fonts::discover_font(settings.font_path.as_deref());

    let mut application = iced::application(app::title, app::update, app::view)
        .theme(app::theme)
        .window(iced::window::Settings {
            size: iced::Size::new(950.0, 780.0),
            position: iced::window::Position::Centered,
            icon: theme::icon::load_window_icon(),
            ..Default::default()
        });
    if let Some(font) = font {
        application = application.font(font.bytes);
    }

    application.run_with(move || App::new(settings, settings_error))
}

/// Append every panic, with a timestamp and backtrace, to `crash.log`.
fn install_crash_log() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let entry = format!(
            "[{}] {info}\n{}\n\n",
            chrono::Local::now().to_rfc3339(),
            std::backtrace::Backtrace::force_capture()
        );
        match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(CRASH_LOG)
        {
            Ok(mut file) => {
                let _ = file.write_all(entry.as_bytes());
            }
            Err(e) => eprintln!("Could not write {CRASH_LOG}: {e}"),
        }
        previous(info);
    }));
}

use adw::Application;
use log::info;
use messenger_gtk::settings::Settings;

/// The backend keeps its session in a cookie that dies with the process,
/// so every start goes through the login window, prefilled from settings.
pub fn build_ui(app: &Application) {
    let settings = Settings::load();
    if settings.is_configured() {
        info!("last server: {}", settings.base_url);
    }
    crate::ui::login::show_login_window(app, settings);
}

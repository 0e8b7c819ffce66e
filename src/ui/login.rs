use adw::prelude::*;
use adw::Application;
use gtk4 as gtk;
use log::{info, warn};
use messenger_gtk::api::client::{ApiClient, ApiError};
use messenger_gtk::settings::{Settings, normalize_url};
use std::rc::Rc;

#[derive(Clone, Copy)]
enum Mode {
    SignIn,
    Register,
}

pub fn show_login_window(app: &Application, settings: Settings) {
    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title("Messenger Login")
        .default_width(420)
        .default_height(300)
        .resizable(false)
        .build();

    let toast_overlay = adw::ToastOverlay::new();

    let root = gtk::Box::new(gtk::Orientation::Vertical, 12);
    root.set_margin_top(24);
    root.set_margin_bottom(24);
    root.set_margin_start(24);
    root.set_margin_end(24);

    let title = gtk::Label::new(Some("Sign in to Messenger"));
    title.add_css_class("title-2");
    title.set_halign(gtk::Align::Start);
    root.append(&title);

    let server_entry = gtk::Entry::new();
    server_entry.set_placeholder_text(Some("Server URL (e.g. http://localhost:5000)"));
    server_entry.set_text(&settings.base_url);
    server_entry.set_hexpand(true);

    let user_entry = gtk::Entry::new();
    user_entry.set_placeholder_text(Some("Username"));
    user_entry.set_text(&settings.username);
    user_entry.set_hexpand(true);

    let pass_entry = gtk::PasswordEntry::new();
    pass_entry.set_placeholder_text(Some("Password"));
    pass_entry.set_hexpand(true);

    let form = gtk::Box::new(gtk::Orientation::Vertical, 8);
    form.append(&server_entry);
    form.append(&user_entry);
    form.append(&pass_entry);
    root.append(&form);

    let status = gtk::Label::new(None);
    status.add_css_class("dim-label");
    status.set_halign(gtk::Align::Start);
    root.append(&status);

    let buttons = gtk::Box::new(gtk::Orientation::Horizontal, 8);
    buttons.set_halign(gtk::Align::End);
    let register_btn = gtk::Button::with_label("Register");
    let login_btn = gtk::Button::with_label("Sign In");
    login_btn.add_css_class("suggested-action");
    buttons.append(&register_btn);
    buttons.append(&login_btn);
    root.append(&buttons);

    toast_overlay.set_child(Some(&root));
    let container = gtk::Box::new(gtk::Orientation::Vertical, 0);
    let header = adw::HeaderBar::new();
    let header_title = gtk::Label::new(Some("Messenger"));
    header.set_title_widget(Some(&header_title));
    container.append(&header);
    container.append(&toast_overlay);
    window.set_content(Some(&container));

    let on_submit = {
        let app = app.clone();
        let window = window.clone();
        let overlay = toast_overlay.clone();
        let server_entry = server_entry.clone();
        let user_entry = user_entry.clone();
        let pass_entry = pass_entry.clone();
        move |mode: Mode| {
            let url = normalize_url(&server_entry.text());
            let username = user_entry.text().trim().to_string();
            let password = pass_entry.text().to_string();
            if url.is_empty() || username.is_empty() || password.is_empty() {
                overlay.add_toast(adw::Toast::new("Please enter server URL, username and password."));
                return;
            }
            let client = match ApiClient::new(&url) {
                Ok(client) => client,
                Err(e) => {
                    overlay.add_toast(adw::Toast::new(&format!("Invalid server URL: {e}")));
                    return;
                }
            };

            status.set_label(match mode {
                Mode::SignIn => "Signing in…",
                Mode::Register => "Registering…",
            });

            let client_for_async = client.clone();
            let username_for_async = username.clone();
            let rx: glib::Receiver<Result<(), ApiError>> = crate::utils::run_async_to_main(async move {
                if let Mode::Register = mode {
                    client_for_async.register(&username_for_async, &password).await?;
                }
                client_for_async.login(&username_for_async, &password).await
            });

            let status_label = status.clone();
            let app2 = app.clone();
            let window2 = window.clone();
            let overlay2 = overlay.clone();
            let mut saved = settings.clone();
            rx.attach(None, move |res| {
                match res {
                    Ok(()) => {
                        info!("signed in to {url} as {username}");
                        saved.base_url = url.clone();
                        saved.username = username.clone();
                        if let Err(e) = saved.save() {
                            overlay2.add_toast(adw::Toast::new(&format!("Failed to save settings: {}", e)));
                        }
                        crate::ui::main_window::show_main_window(&app2, client.clone(), saved.clone());
                        window2.close();
                    }
                    Err(err) => {
                        warn!("sign-in failed: {err}");
                        status_label.set_label("Sign-in failed");
                        let text = err
                            .server_message()
                            .unwrap_or("Could not sign in. Check server, username and password.");
                        overlay2.add_toast(adw::Toast::new(text));
                    }
                }
                glib::ControlFlow::Continue
            });
        }
    };

    let on_submit: Rc<dyn Fn(Mode)> = Rc::new(on_submit);
    {
        let on_submit = on_submit.clone();
        login_btn.connect_clicked(move |_| (on_submit)(Mode::SignIn));
    }
    {
        let on_submit = on_submit.clone();
        register_btn.connect_clicked(move |_| (on_submit)(Mode::Register));
    }
    {
        let on_submit = on_submit.clone();
        pass_entry.connect_activate(move |_| (on_submit)(Mode::SignIn));
    }

    window.present();
}

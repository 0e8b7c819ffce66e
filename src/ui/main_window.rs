use crate::ui::chat_view::ChatView;
use crate::ui::profile_dialog::{ProfileForm, show_profile_dialog};
use crate::ui::sidebar::{AdminActions, Sidebar};
use crate::utils::run_async_to_main;
use adw::prelude::*;
use adw::Application;
use log::{info, warn};
use messenger_gtk::api::client::ApiClient;
use messenger_gtk::api::models::{Attachment, Draft, ProfileUpdate};
use messenger_gtk::session::{Applied, Navigation, Scroll, Session};
use messenger_gtk::settings::Settings;
use messenger_gtk::view::NO_CHAT_TITLE;
use messenger_gtk::ChatError;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

/// Owns the session on the main loop. Requests go to the Tokio runtime and
/// their results are applied back here, one at a time.
pub struct MainWindow {
    app: Application,
    window: adw::ApplicationWindow,
    overlay: adw::ToastOverlay,
    title: gtk4::Label,
    profile_btn: gtk4::Button,
    logout_btn: gtk4::Button,
    client: ApiClient,
    settings: RefCell<Settings>,
    session: RefCell<Session>,
    sidebar: Sidebar,
    chat: ChatView,
}

pub fn show_main_window(app: &Application, client: ApiClient, settings: Settings) {
    let main = Rc::new(MainWindow::build(app, client, settings));
    main.wire();

    // Callbacks only hold weak references; the window keeps the state alive.
    let keep_alive = RefCell::new(Some(main.clone()));
    main.window.connect_close_request(move |_| {
        keep_alive.borrow_mut().take();
        glib::Propagation::Proceed
    });

    main.window.present();
    main.load_users();
}

impl MainWindow {
    fn build(app: &Application, client: ApiClient, settings: Settings) -> Self {
        let window = adw::ApplicationWindow::builder()
            .application(app)
            .title("Messenger")
            .default_width(960)
            .default_height(640)
            .build();

        let overlay = adw::ToastOverlay::new();

        let split = adw::Flap::builder()
            .reveal_flap(true)
            .locked(true)
            .modal(false)
            .build();

        let sidebar = Sidebar::new();
        split.set_flap(Some(&sidebar.widget()));

        let chat = ChatView::new(NO_CHAT_TITLE);
        split.set_content(Some(&chat.widget()));

        overlay.set_child(Some(&split));

        let container = gtk4::Box::new(gtk4::Orientation::Vertical, 0);
        let header = adw::HeaderBar::new();
        let title = gtk4::Label::new(Some(&format!("Messenger · {}", settings.username)));
        header.set_title_widget(Some(&title));

        let logout_btn = gtk4::Button::with_label("Log Out");
        logout_btn.add_css_class("destructive-action");
        header.pack_end(&logout_btn);
        let profile_btn = gtk4::Button::from_icon_name("avatar-default-symbolic");
        profile_btn.set_tooltip_text(Some("Edit profile"));
        header.pack_end(&profile_btn);
        container.append(&header);
        container.append(&overlay);
        window.set_content(Some(&container));

        Self {
            app: app.clone(),
            window,
            overlay,
            title,
            profile_btn,
            logout_btn,
            session: RefCell::new(Session::new(settings.is_admin)),
            client,
            settings: RefCell::new(settings),
            sidebar,
            chat,
        }
    }

    fn wire(self: &Rc<Self>) {
        {
            let weak = Rc::downgrade(self);
            self.sidebar.connect_selected(move |id, name| {
                if let Some(this) = weak.upgrade() {
                    this.open_conversation(id, &name);
                }
            });
        }
        {
            let weak = Rc::downgrade(self);
            self.chat.connect_send(move |text, file| {
                if let Some(this) = weak.upgrade() {
                    this.send(text, file);
                }
            });
        }
        {
            let weak = Rc::downgrade(self);
            self.chat.connect_scrolled(move |at_bottom| {
                if let Some(this) = weak.upgrade() {
                    // Widget rebuilds scroll while the session is borrowed.
                    if let Ok(mut session) = this.session.try_borrow_mut() {
                        session.set_at_bottom(at_bottom);
                    }
                }
            });
        }
        {
            let weak = Rc::downgrade(self);
            self.profile_btn.connect_clicked(move |_| {
                if let Some(this) = weak.upgrade() {
                    this.edit_profile();
                }
            });
        }
        {
            let weak = Rc::downgrade(self);
            self.logout_btn.connect_clicked(move |_| {
                if let Some(this) = weak.upgrade() {
                    this.logout();
                }
            });
        }
    }

    fn toast(&self, err: &ChatError) {
        warn!("{err}");
        self.overlay.add_toast(adw::Toast::new(&err.user_message()));
    }

    fn admin_actions(self: &Rc<Self>) -> AdminActions {
        let edit = {
            let weak = Rc::downgrade(self);
            Rc::new(move |id, name: String| {
                if let Some(this) = weak.upgrade() {
                    this.edit_user(id, &name);
                }
            })
        };
        let remove = {
            let weak = Rc::downgrade(self);
            Rc::new(move |id| {
                if let Some(this) = weak.upgrade() {
                    this.remove_user(id);
                }
            })
        };
        AdminActions { edit, remove }
    }

    fn redraw_contacts(self: &Rc<Self>) {
        let (contacts, is_admin) = {
            let session = self.session.borrow();
            (session.contacts().clone(), session.is_admin())
        };
        let admin = is_admin.then(|| self.admin_actions());
        self.sidebar.set_items(&contacts, &self.client, admin.as_ref());
    }

    fn redraw_badges(&self) {
        let contacts = self.session.borrow().contacts().clone();
        self.sidebar.update_badges(&contacts);
    }

    fn delete_handler(self: &Rc<Self>) -> Rc<dyn Fn(i64)> {
        let weak = Rc::downgrade(self);
        Rc::new(move |id| {
            if let Some(this) = weak.upgrade() {
                this.delete(id);
            }
        })
    }

    fn redraw_messages(self: &Rc<Self>, scroll: Scroll) {
        let panel = self.session.borrow().panel().clone();
        self.chat.render(&panel, &self.client, self.delete_handler());
        if scroll == Scroll::ToBottom {
            self.chat.scroll_to_bottom();
        }
    }

    /// Draws the row `finish_send` just appended, leaving the others alone.
    fn append_sent(self: &Rc<Self>, scroll: Scroll) {
        let row = self.session.borrow().panel().rows.last().cloned();
        if let Some(row) = row {
            self.chat.append_row(&row, &self.client, self.delete_handler());
        }
        if scroll == Scroll::ToBottom {
            self.chat.scroll_to_bottom();
        }
    }

    fn load_users(self: &Rc<Self>) {
        let client = self.client.clone();
        let rx = run_async_to_main(async move { client.users().await });
        let weak = Rc::downgrade(self);
        rx.attach(None, move |res| {
            if let Some(this) = weak.upgrade() {
                let outcome = this.session.borrow_mut().finish_users(res);
                match outcome {
                    Ok(()) => this.redraw_contacts(),
                    Err(err) => this.toast(&err),
                }
            }
            glib::ControlFlow::Continue
        });
    }

    fn open_conversation(self: &Rc<Self>, contact_id: i64, name: &str) {
        let request = self.session.borrow_mut().begin_conversation(contact_id, name);
        self.chat.set_title(name);

        let client = self.client.clone();
        let rx = run_async_to_main(async move { client.messages(request.contact_id).await });
        let weak = Rc::downgrade(self);
        rx.attach(None, move |res| {
            if let Some(this) = weak.upgrade() {
                let outcome = this.session.borrow_mut().finish_conversation(request, res);
                match outcome {
                    Ok(Applied::Rendered(scroll)) => {
                        this.redraw_messages(scroll);
                        this.redraw_badges();
                    }
                    Ok(Applied::Stale) => {}
                    Err(err) => this.toast(&err),
                }
            }
            glib::ControlFlow::Continue
        });
    }

    fn send(self: &Rc<Self>, content: String, file: Option<PathBuf>) {
        let prepared = self.session.borrow().prepare_send();
        let pending = match prepared {
            Ok(pending) => pending,
            Err(err) => return self.toast(&err),
        };

        let client = self.client.clone();
        let shown = content.clone();
        let rx = run_async_to_main(async move {
            let attachment = match file {
                Some(path) => Some(Attachment::from_path(&path).await?),
                None => None,
            };
            let draft = Draft { content, attachment };
            Ok::<_, std::io::Error>(client.send_message(pending.contact_id, draft).await)
        });
        let weak = Rc::downgrade(self);
        rx.attach(None, move |res| {
            if let Some(this) = weak.upgrade() {
                let outcome = match res {
                    Ok(sent) => this.session.borrow_mut().finish_send(pending, shown.clone(), sent),
                    Err(io) => Err(ChatError::from(io)),
                };
                match outcome {
                    Ok(appended) => {
                        this.chat.clear_inputs();
                        this.redraw_badges();
                        if let Some(scroll) = appended {
                            this.append_sent(scroll);
                        }
                    }
                    Err(err) => this.toast(&err),
                }
            }
            glib::ControlFlow::Continue
        });
    }

    fn delete(self: &Rc<Self>, message_id: i64) {
        let client = self.client.clone();
        let rx = run_async_to_main(async move { client.delete_message(message_id).await });
        let weak = Rc::downgrade(self);
        rx.attach(None, move |res| {
            if let Some(this) = weak.upgrade() {
                let outcome = this.session.borrow_mut().finish_delete(message_id, res);
                match outcome {
                    Ok(true) => this.chat.remove_row(message_id),
                    Ok(false) => {}
                    Err(err) => this.toast(&err),
                }
            }
            glib::ControlFlow::Continue
        });
    }

    fn edit_profile(self: &Rc<Self>) {
        let username = self.settings.borrow().username.clone();
        let weak = Rc::downgrade(self);
        show_profile_dialog(&self.window, "Edit Profile", &username, move |form| {
            let Some(this) = weak.upgrade() else { return };
            let username = form.username.clone();
            let client = this.client.clone();
            let rx = run_async_to_main(async move {
                let update = read_profile(form).await?;
                Ok::<_, std::io::Error>(client.update_profile(update).await.map_err(ChatError::UpdateProfile))
            });
            let weak = Rc::downgrade(&this);
            rx.attach(None, move |res| {
                if let Some(this) = weak.upgrade() {
                    match res.map_err(ChatError::from).and_then(|r| r) {
                        Ok(()) => this.profile_saved(&username),
                        Err(err) => this.toast(&err),
                    }
                }
                glib::ControlFlow::Continue
            });
        });
    }

    fn profile_saved(&self, username: &str) {
        info!("profile updated");
        let mut settings = self.settings.borrow_mut();
        settings.username = username.to_string();
        if let Err(e) = settings.save() {
            warn!("could not save settings: {e}");
        }
        self.title.set_label(&format!("Messenger · {username}"));
        self.overlay.add_toast(adw::Toast::new("Profile updated"));
    }

    fn edit_user(self: &Rc<Self>, user_id: i64, current_name: &str) {
        let weak = Rc::downgrade(self);
        let title = format!("Edit {current_name}");
        show_profile_dialog(&self.window, &title, current_name, move |form| {
            let Some(this) = weak.upgrade() else { return };
            let username = form.username.clone();
            let picture = form
                .picture
                .as_ref()
                .and_then(|p| p.file_name())
                .and_then(|n| n.to_str())
                .map(str::to_string);
            let client = this.client.clone();
            let rx = run_async_to_main(async move {
                let update = read_profile(form).await?;
                Ok::<_, std::io::Error>(client.admin_edit_user(user_id, update).await)
            });
            let weak = Rc::downgrade(&this);
            rx.attach(None, move |res| {
                if let Some(this) = weak.upgrade() {
                    let outcome = match res {
                        Ok(edited) => this.session.borrow_mut().finish_edit_user(
                            user_id,
                            &username,
                            picture.as_deref(),
                            edited,
                        ),
                        Err(io) => Err(ChatError::from(io)),
                    };
                    match outcome {
                        Ok(()) => {
                            this.redraw_contacts();
                            let title = this.session.borrow().panel().title.clone();
                            this.chat.set_title(&title);
                        }
                        Err(err) => this.toast(&err),
                    }
                }
                glib::ControlFlow::Continue
            });
        });
    }

    fn remove_user(self: &Rc<Self>, user_id: i64) {
        let client = self.client.clone();
        let rx = run_async_to_main(async move { client.admin_delete_user(user_id).await });
        let weak = Rc::downgrade(self);
        rx.attach(None, move |res| {
            if let Some(this) = weak.upgrade() {
                let was_open = this.session.borrow().active_contact() == Some(user_id);
                let outcome = this.session.borrow_mut().finish_remove_user(user_id, res);
                match outcome {
                    Ok(()) => {
                        this.redraw_contacts();
                        if was_open {
                            this.redraw_messages(Scroll::Keep);
                        }
                    }
                    Err(err) => this.toast(&err),
                }
            }
            glib::ControlFlow::Continue
        });
    }

    fn logout(self: &Rc<Self>) {
        let client = self.client.clone();
        let rx = run_async_to_main(async move { client.logout().await });
        let weak = Rc::downgrade(self);
        rx.attach(None, move |res| {
            if let Some(this) = weak.upgrade() {
                let outcome = this.session.borrow_mut().finish_logout(res);
                match outcome {
                    Ok(Navigation::Login) => {
                        info!("returning to login");
                        this.redraw_contacts();
                        this.redraw_messages(Scroll::Keep);
                        let settings = this.settings.borrow().clone();
                        crate::ui::login::show_login_window(&this.app, settings);
                        this.window.close();
                    }
                    Err(err) => this.toast(&err),
                }
            }
            glib::ControlFlow::Continue
        });
    }
}

async fn read_profile(form: ProfileForm) -> std::io::Result<ProfileUpdate> {
    let picture = match form.picture {
        Some(path) => Some(Attachment::from_path(&path).await?),
        None => None,
    };
    Ok(ProfileUpdate {
        username: form.username,
        phone_number: form.phone_number,
        status: form.status,
        picture,
    })
}

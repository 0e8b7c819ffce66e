use gtk4::prelude::*;
use gtk4 as gtk;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

/// What the form produced. The picture is read from disk later, on the
/// runtime, like composer attachments.
pub struct ProfileForm {
    pub username: String,
    pub phone_number: String,
    pub status: String,
    pub picture: Option<PathBuf>,
}

/// Modal profile form used for the viewer's own profile and for admin edits.
/// `on_submit` runs only when the dialog is confirmed with a username.
pub fn show_profile_dialog<F>(parent: &impl IsA<gtk::Window>, title: &str, username: &str, on_submit: F)
where
    F: Fn(ProfileForm) + 'static,
{
    let dialog = gtk::Dialog::builder()
        .title(title)
        .transient_for(parent)
        .modal(true)
        .build();
    let content = gtk::Box::new(gtk::Orientation::Vertical, 12);
    content.set_margin_top(12);
    content.set_margin_bottom(12);
    content.set_margin_start(12);
    content.set_margin_end(12);

    let user_entry = gtk::Entry::new();
    user_entry.set_placeholder_text(Some("Username"));
    user_entry.set_text(username);
    let phone_entry = gtk::Entry::new();
    phone_entry.set_placeholder_text(Some("Phone number"));
    let status_entry = gtk::Entry::new();
    status_entry.set_placeholder_text(Some("Status"));
    content.append(&user_entry);
    content.append(&phone_entry);
    content.append(&status_entry);

    let picture: Rc<RefCell<Option<PathBuf>>> = Rc::new(RefCell::new(None));
    let chooser_slot: Rc<RefCell<Option<gtk::FileChooserNative>>> = Rc::new(RefCell::new(None));
    let pick_btn = gtk::Button::with_label("Choose picture…");
    {
        let picture = picture.clone();
        let dialog = dialog.clone();
        pick_btn.connect_clicked(move |btn| {
            let chooser = gtk::FileChooserNative::new(
                Some("Profile picture"),
                Some(&dialog),
                gtk::FileChooserAction::Open,
                Some("Choose"),
                Some("Cancel"),
            );
            let picture = picture.clone();
            let btn = btn.clone();
            chooser.connect_response(move |dlg, resp| {
                if resp == gtk::ResponseType::Accept {
                    if let Some(path) = dlg.file().and_then(|f| f.path()) {
                        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                            btn.set_label(name);
                        }
                        *picture.borrow_mut() = Some(path);
                    }
                }
            });
            chooser.show();
            *chooser_slot.borrow_mut() = Some(chooser);
        });
    }
    content.append(&pick_btn);

    dialog.content_area().append(&content);
    let _ = dialog.add_button("Cancel", gtk::ResponseType::Cancel);
    let ok_btn = dialog.add_button("Save", gtk::ResponseType::Ok);
    ok_btn.add_css_class("suggested-action");
    dialog.set_default_response(gtk::ResponseType::Ok);

    dialog.connect_response(move |dlg, resp| {
        if resp == gtk::ResponseType::Ok {
            let username = user_entry.text().trim().to_string();
            if username.is_empty() {
                user_entry.add_css_class("error");
                return;
            }
            on_submit(ProfileForm {
                username,
                phone_number: phone_entry.text().trim().to_string(),
                status: status_entry.text().trim().to_string(),
                picture: picture.borrow_mut().take(),
            });
        }
        dlg.close();
    });
    dialog.present();
}

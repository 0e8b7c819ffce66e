use gtk4::prelude::*;
use gtk4 as gtk;
use messenger_gtk::api::client::ApiClient;
use messenger_gtk::view::{ContactList, ContactRow, SETTINGS_ICON_PATH};
use std::cell::RefCell;
use std::rc::Rc;

/// Per-contact actions offered to admins in the details popover.
#[derive(Clone)]
pub struct AdminActions {
    pub edit: Rc<dyn Fn(i64, String)>,
    pub remove: Rc<dyn Fn(i64)>,
}

struct Entry {
    contact_id: i64,
    label: String,
    badge: gtk::Label,
}

pub struct Sidebar {
    root: gtk::Box,
    list: gtk::ListBox,
    entries: Rc<RefCell<Vec<Entry>>>,
}

impl Sidebar {
    pub fn new() -> Self {
        let root = gtk::Box::new(gtk::Orientation::Vertical, 6);
        root.set_margin_top(8);
        root.set_margin_bottom(8);
        root.set_margin_start(8);
        root.set_margin_end(8);

        let title = gtk::Label::new(Some("Chats"));
        title.add_css_class("heading");
        title.set_halign(gtk::Align::Start);
        root.append(&title);

        let list = gtk::ListBox::new();
        list.add_css_class("navigation-sidebar");
        root.append(&list);

        Self { root, list, entries: Rc::new(RefCell::new(Vec::new())) }
    }

    pub fn widget(&self) -> gtk::Widget {
        self.root.clone().upcast()
    }

    /// Calls `f(contact_id, username)` when a row is activated.
    pub fn connect_selected<F: Fn(i64, String) + 'static>(&self, f: F) {
        let entries = self.entries.clone();
        self.list.connect_row_activated(move |_, row| {
            let picked = usize::try_from(row.index())
                .ok()
                .and_then(|idx| entries.borrow().get(idx).map(|e| (e.contact_id, e.label.clone())));
            if let Some((id, name)) = picked {
                f(id, name);
            }
        });
    }

    pub fn set_items(&self, contacts: &ContactList, client: &ApiClient, admin: Option<&AdminActions>) {
        while let Some(child) = self.list.first_child() {
            self.list.remove(&child);
        }
        let mut entries = self.entries.borrow_mut();
        entries.clear();

        for contact in &contacts.rows {
            let row = gtk::ListBoxRow::new();
            let line = gtk::Box::new(gtk::Orientation::Horizontal, 8);
            line.set_margin_top(6);
            line.set_margin_bottom(6);
            line.set_margin_start(6);
            line.set_margin_end(6);

            let avatar = gtk::Image::from_icon_name("avatar-default-symbolic");
            avatar.set_pixel_size(32);
            avatar.add_css_class("profile-pic");
            if let Some(path) = &contact.avatar_path {
                let avatar = avatar.clone();
                crate::utils::load_texture(client, path.clone(), move |tex| avatar.set_paintable(Some(tex)));
            }
            line.append(&avatar);

            let label = gtk::Label::new(Some(&contact.label));
            label.set_hexpand(true);
            label.set_halign(gtk::Align::Start);
            line.append(&label);

            let badge = gtk::Label::new(Some(&contact.badge.to_string()));
            badge.add_css_class("unread-count");
            line.append(&badge);

            let details = gtk::MenuButton::new();
            let gear = gtk::Image::from_icon_name("emblem-system-symbolic");
            {
                let gear = gear.clone();
                crate::utils::load_texture(client, SETTINGS_ICON_PATH.to_string(), move |tex| {
                    gear.set_paintable(Some(tex))
                });
            }
            details.set_child(Some(&gear));
            details.set_tooltip_text(Some("View Profile"));
            details.add_css_class("flat");
            details.add_css_class("profile-link");
            details.set_popover(Some(&Self::details_popover(contact, client, admin)));
            line.append(&details);

            row.set_child(Some(&line));
            self.list.append(&row);
            entries.push(Entry { contact_id: contact.contact_id, label: contact.label.clone(), badge });
        }
    }

    fn details_popover(contact: &ContactRow, client: &ApiClient, admin: Option<&AdminActions>) -> gtk::Popover {
        let popover = gtk::Popover::new();
        let content = gtk::Box::new(gtk::Orientation::Vertical, 6);
        content.set_margin_top(8);
        content.set_margin_bottom(8);
        content.set_margin_start(8);
        content.set_margin_end(8);

        let avatar = gtk::Image::from_icon_name("avatar-default-symbolic");
        avatar.set_pixel_size(96);
        if let Some(path) = &contact.avatar_path {
            let avatar = avatar.clone();
            crate::utils::load_texture(client, path.clone(), move |tex| avatar.set_paintable(Some(tex)));
        }
        content.append(&avatar);

        let name = gtk::Label::new(Some(&contact.label));
        name.add_css_class("title-4");
        content.append(&name);
        let id = gtk::Label::new(Some(&format!("User #{}", contact.contact_id)));
        id.add_css_class("dim-label");
        content.append(&id);

        if let Some(actions) = admin {
            let edit_btn = gtk::Button::with_label("Edit user…");
            let remove_btn = gtk::Button::with_label("Delete user");
            remove_btn.add_css_class("destructive-action");
            let contact_id = contact.contact_id;
            {
                let edit = actions.edit.clone();
                let label = contact.label.clone();
                let popover = popover.clone();
                edit_btn.connect_clicked(move |_| {
                    popover.popdown();
                    edit(contact_id, label.clone());
                });
            }
            {
                let remove = actions.remove.clone();
                let popover = popover.clone();
                remove_btn.connect_clicked(move |_| {
                    popover.popdown();
                    remove(contact_id);
                });
            }
            content.append(&edit_btn);
            content.append(&remove_btn);
        }

        popover.set_child(Some(&content));
        popover
    }

    pub fn update_badges(&self, contacts: &ContactList) {
        for entry in self.entries.borrow().iter() {
            if let Some(row) = contacts.row(entry.contact_id) {
                entry.badge.set_label(&row.badge.to_string());
            }
        }
    }
}

use gtk4::prelude::*;
use gtk4 as gtk;
use messenger_gtk::api::client::ApiClient;
use messenger_gtk::view::{MessagePanel, MessageRow};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

pub struct ChatView {
    root: gtk::Box,
    title: gtk::Label,
    scroller: gtk::ScrolledWindow,
    messages_box: gtk::Box,
    bubbles: RefCell<HashMap<i64, gtk::Box>>,
    entry: gtk::Entry,
    attach_btn: gtk::Button,
    send_btn: gtk::Button,
    attachment: Rc<RefCell<Option<PathBuf>>>,
    chooser: Rc<RefCell<Option<gtk::FileChooserNative>>>,
}

impl ChatView {
    pub fn new(title_text: &str) -> Self {
        let root = gtk::Box::new(gtk::Orientation::Vertical, 6);
        root.set_margin_top(8);
        root.set_margin_bottom(8);
        root.set_margin_start(8);
        root.set_margin_end(8);

        let title = gtk::Label::new(Some(title_text));
        title.add_css_class("title-4");
        title.set_halign(gtk::Align::Start);
        root.append(&title);

        let scroller = gtk::ScrolledWindow::builder()
            .vexpand(true)
            .hexpand(true)
            .build();
        let messages_box = gtk::Box::new(gtk::Orientation::Vertical, 6);
        scroller.set_child(Some(&messages_box));
        root.append(&scroller);

        let input_row = gtk::Box::new(gtk::Orientation::Horizontal, 6);
        let entry = gtk::Entry::new();
        entry.set_hexpand(true);
        entry.set_placeholder_text(Some("Type a message…"));
        let attach_btn = gtk::Button::from_icon_name("mail-attachment-symbolic");
        attach_btn.set_tooltip_text(Some("Attach image"));
        let send_btn = gtk::Button::with_label("Send");
        send_btn.add_css_class("suggested-action");
        input_row.append(&entry);
        input_row.append(&attach_btn);
        input_row.append(&send_btn);
        root.append(&input_row);

        let view = Self {
            root,
            title,
            scroller,
            messages_box,
            bubbles: RefCell::new(HashMap::new()),
            entry,
            attach_btn,
            send_btn,
            attachment: Rc::new(RefCell::new(None)),
            chooser: Rc::new(RefCell::new(None)),
        };
        view.wire_attach();
        view
    }

    pub fn widget(&self) -> gtk::Widget {
        self.root.clone().upcast()
    }

    fn wire_attach(&self) {
        let attachment = self.attachment.clone();
        let chooser_slot = self.chooser.clone();
        self.attach_btn.connect_clicked(move |btn| {
            let parent = btn.root().and_then(|r| r.downcast::<gtk::Window>().ok());
            let chooser = gtk::FileChooserNative::new(
                Some("Attach image"),
                parent.as_ref(),
                gtk::FileChooserAction::Open,
                Some("Attach"),
                Some("Cancel"),
            );
            let attachment = attachment.clone();
            let btn = btn.clone();
            chooser.connect_response(move |dlg, resp| {
                if resp == gtk::ResponseType::Accept {
                    if let Some(path) = dlg.file().and_then(|f| f.path()) {
                        btn.set_tooltip_text(path.file_name().and_then(|n| n.to_str()));
                        btn.add_css_class("accent");
                        *attachment.borrow_mut() = Some(path);
                    }
                }
            });
            chooser.show();
            *chooser_slot.borrow_mut() = Some(chooser);
        });
    }

    /// Calls `f(text, attachment)` on Send or Enter. Inputs stay filled until
    /// `clear_inputs` is called after the server accepts the message.
    pub fn connect_send<F: Fn(String, Option<PathBuf>) + 'static>(&self, f: F) {
        let f = Rc::new(f);
        let send = {
            let entry = self.entry.clone();
            let attachment = self.attachment.clone();
            move || {
                let text = entry.text().to_string();
                let file = attachment.borrow().clone();
                if text.trim().is_empty() && file.is_none() {
                    return;
                }
                f(text, file);
            }
        };
        let send: Rc<dyn Fn()> = Rc::new(send);
        {
            let send = send.clone();
            self.send_btn.connect_clicked(move |_| (send)());
        }
        {
            let send = send.clone();
            self.entry.connect_activate(move |_| (send)());
        }
    }

    /// Reports whether the view rests at the bottom whenever it scrolls.
    pub fn connect_scrolled<F: Fn(bool) + 'static>(&self, f: F) {
        self.scroller.vadjustment().connect_value_changed(move |adj| {
            f(adj.value() + adj.page_size() >= adj.upper() - 1.0);
        });
    }

    pub fn clear_inputs(&self) {
        self.entry.set_text("");
        *self.attachment.borrow_mut() = None;
        self.attach_btn.set_tooltip_text(Some("Attach image"));
        self.attach_btn.remove_css_class("accent");
    }

    pub fn set_title(&self, text: &str) {
        self.title.set_label(text);
    }

    /// Rebuilds the whole list. Used when a conversation loads or closes.
    pub fn render(&self, panel: &MessagePanel, client: &ApiClient, on_delete: Rc<dyn Fn(i64)>) {
        self.set_title(&panel.title);
        while let Some(child) = self.messages_box.first_child() {
            self.messages_box.remove(&child);
        }
        self.bubbles.borrow_mut().clear();
        for row in &panel.rows {
            self.append_row(row, client, on_delete.clone());
        }
    }

    pub fn append_row(&self, row: &MessageRow, client: &ApiClient, on_delete: Rc<dyn Fn(i64)>) {
        let bubble = Self::message_widget(row, client, on_delete);
        self.messages_box.append(&bubble);
        self.bubbles.borrow_mut().insert(row.message_id, bubble);
    }

    pub fn remove_row(&self, message_id: i64) {
        if let Some(bubble) = self.bubbles.borrow_mut().remove(&message_id) {
            self.messages_box.remove(&bubble);
        }
    }

    fn message_widget(row: &MessageRow, client: &ApiClient, on_delete: Rc<dyn Fn(i64)>) -> gtk::Box {
        let bubble = gtk::Box::new(gtk::Orientation::Vertical, 2);
        bubble.add_css_class("message");
        bubble.add_css_class(if row.mine { "me" } else { "user" });
        bubble.set_halign(if row.mine { gtk::Align::End } else { gtk::Align::Start });

        let content = gtk::Label::new(Some(&row.content));
        content.set_wrap(true);
        content.set_xalign(0.0);
        content.add_css_class("message-content");
        bubble.append(&content);

        if let Some(path) = &row.attachment_path {
            let picture = gtk::Picture::new();
            picture.set_size_request(200, 150);
            picture.add_css_class("message-attachment");
            {
                let picture = picture.clone();
                crate::utils::load_texture(client, path.clone(), move |tex| picture.set_paintable(Some(tex)));
            }
            bubble.append(&picture);
        }

        let footer = gtk::Box::new(gtk::Orientation::Horizontal, 6);
        let time = gtk::Label::new(Some(&row.time));
        time.add_css_class("dim-label");
        time.add_css_class("message-time");
        footer.append(&time);

        if row.deletable {
            let delete_btn = gtk::Button::with_label("Delete");
            delete_btn.add_css_class("flat");
            delete_btn.add_css_class("delete-message");
            let id = row.message_id;
            delete_btn.connect_clicked(move |_| on_delete(id));
            footer.append(&delete_btn);
        }
        bubble.append(&footer);
        bubble
    }

    /// Scrolls after the next layout pass so newly added rows are measured.
    pub fn scroll_to_bottom(&self) {
        let scroller = self.scroller.clone();
        glib::idle_add_local_once(move || {
            let adj = scroller.vadjustment();
            adj.set_value(adj.upper() - adj.page_size());
        });
    }
}

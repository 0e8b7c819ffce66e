//! What the window shows, kept as plain data so it can be checked without a
//! display. The GTK widgets are redrawn from these models.

use crate::api::models::{Contact, Message, local_clock_time};

pub const NO_CHAT_TITLE: &str = "Select a chat";
pub const SETTINGS_ICON_PATH: &str = "/static/icons/gear.png";

pub fn avatar_path(file: &str) -> String {
    format!("/static/profile_pics/{file}")
}

pub fn attachment_path(file: &str) -> String {
    format!("/static/uploads/{file}")
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContactRow {
    pub contact_id: i64,
    pub label: String,
    pub avatar_path: Option<String>,
    pub badge: u32,
}

impl ContactRow {
    pub fn new(contact: &Contact, badge: u32) -> Self {
        Self {
            contact_id: contact.id,
            label: contact.username.clone(),
            avatar_path: contact.profile_pic.as_deref().map(avatar_path),
            badge,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactList {
    pub rows: Vec<ContactRow>,
}

impl ContactList {
    pub fn row(&self, contact_id: i64) -> Option<&ContactRow> {
        self.rows.iter().find(|r| r.contact_id == contact_id)
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageRow {
    pub message_id: i64,
    pub mine: bool,
    pub content: String,
    pub attachment_path: Option<String>,
    pub time: String,
    pub deletable: bool,
}

impl MessageRow {
    /// Delete control is offered to the author, or to anyone whose local
    /// admin hint is set. The server decides whether the delete succeeds.
    pub fn new(msg: &Message, is_admin: bool) -> Self {
        let mine = msg.is_mine();
        Self {
            message_id: msg.id,
            mine,
            content: msg.content.clone(),
            attachment_path: msg.attachment.as_deref().map(attachment_path),
            time: msg.sent_at().map(|at| local_clock_time(&at)).unwrap_or_default(),
            deletable: mine || is_admin,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessagePanel {
    pub title: String,
    pub rows: Vec<MessageRow>,
    /// Kept current by the front-end from the scroll position.
    pub at_bottom: bool,
}

impl Default for MessagePanel {
    fn default() -> Self {
        Self {
            title: NO_CHAT_TITLE.to_string(),
            rows: Vec::new(),
            at_bottom: true,
        }
    }
}

impl MessagePanel {
    pub fn replace(&mut self, rows: Vec<MessageRow>) {
        self.rows = rows;
    }

    pub fn push(&mut self, row: MessageRow) {
        self.rows.push(row);
    }

    /// Removes the row with `message_id`; returns whether one was found.
    pub fn remove(&mut self, message_id: i64) -> bool {
        match self.rows.iter().position(|r| r.message_id == message_id) {
            Some(idx) => {
                self.rows.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(id: i64, sender: &str, attachment: Option<&str>) -> Message {
        Message {
            id,
            sender: sender.into(),
            content: format!("message {id}"),
            attachment: attachment.map(str::to_string),
            timestamp: "2024-01-02 03:04:05".into(),
        }
    }

    #[test]
    fn contact_row_paths() {
        let c = Contact { id: 7, username: "ann".into(), profile_pic: Some("ann.jpg".into()) };
        let row = ContactRow::new(&c, 2);
        assert_eq!(row.avatar_path.as_deref(), Some("/static/profile_pics/ann.jpg"));
        assert_eq!(row.badge, 2);

        let bare = Contact { id: 8, username: "bo".into(), profile_pic: None };
        assert!(ContactRow::new(&bare, 0).avatar_path.is_none());
    }

    #[test]
    fn message_without_attachment_has_no_image() {
        let row = MessageRow::new(&msg(1, "bob", None), false);
        assert!(row.attachment_path.is_none());
        let row = MessageRow::new(&msg(2, "bob", Some("pic.gif")), false);
        assert_eq!(row.attachment_path.as_deref(), Some("/static/uploads/pic.gif"));
    }

    #[test]
    fn delete_control_for_author_or_admin() {
        assert!(MessageRow::new(&msg(1, "You", None), false).deletable);
        assert!(!MessageRow::new(&msg(2, "bob", None), false).deletable);
        assert!(MessageRow::new(&msg(3, "bob", None), true).deletable);
    }

    #[test]
    fn remove_touches_only_matching_row() {
        let mut panel = MessagePanel::default();
        panel.replace((1..=4).map(|i| MessageRow::new(&msg(i, "You", None), false)).collect());
        assert!(panel.remove(3));
        let ids: Vec<i64> = panel.rows.iter().map(|r| r.message_id).collect();
        assert_eq!(ids, vec![1, 2, 4]);
        assert!(!panel.remove(42));
        assert_eq!(panel.rows.len(), 3);
    }

    #[test]
    fn cleared_panel_shows_placeholder_title() {
        let mut panel = MessagePanel { title: "bob".into(), ..Default::default() };
        panel.push(MessageRow::new(&msg(1, "bob", None), false));
        panel.clear();
        assert_eq!(panel.title, NO_CHAT_TITLE);
        assert!(panel.rows.is_empty());
    }
}

//! Client-side state of one login: the active contact, unread counters and
//! the rendered lists. Network calls happen elsewhere; each operation here
//! is split into a synchronous step before the request (where one is
//! needed) and a `finish_*` step that applies the response.

use crate::api::client::ApiError;
use crate::api::models::{Contact, Message, SendReceipt, local_clock_time};
use crate::error::ChatError;
use crate::unread::UnreadTracker;
use crate::view::{ContactList, ContactRow, MessagePanel, MessageRow, avatar_path};
use chrono::Utc;
use log::{info, warn};

/// Ticket for one conversation load. Only the most recent one may render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversationRequest {
    pub token: u64,
    pub contact_id: i64,
}

/// A send that passed the active-contact check, bound to its receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingSend {
    pub contact_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scroll {
    ToBottom,
    Keep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Rendered(Scroll),
    /// A newer load was started before this response arrived.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Login,
}

#[derive(Debug, Default)]
pub struct Session {
    /// UI hint only, never an authorization decision.
    is_admin: bool,
    active: Option<i64>,
    unread: UnreadTracker,
    contacts: ContactList,
    panel: MessagePanel,
    next_token: u64,
    latest_load: Option<u64>,
    /// Whose rows the panel holds. Lags `active` until a load succeeds.
    panel_contact: Option<i64>,
}

impl Session {
    pub fn new(is_admin: bool) -> Self {
        Self { is_admin, ..Default::default() }
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    pub fn active_contact(&self) -> Option<i64> {
        self.active
    }

    pub fn unread(&self) -> &UnreadTracker {
        &self.unread
    }

    pub fn contacts(&self) -> &ContactList {
        &self.contacts
    }

    pub fn panel(&self) -> &MessagePanel {
        &self.panel
    }

    pub fn set_at_bottom(&mut self, at_bottom: bool) {
        self.panel.at_bottom = at_bottom;
    }

    pub fn finish_users(&mut self, result: Result<Vec<Contact>, ApiError>) -> Result<(), ChatError> {
        let users = result.map_err(ChatError::LoadUsers)?;
        info!("loaded {} contacts", users.len());
        self.contacts.rows = users
            .iter()
            .map(|c| ContactRow::new(c, self.unread.count(c.id)))
            .collect();
        Ok(())
    }

    /// Makes `contact_id` active right away; its messages render once the
    /// matching `finish_conversation` arrives.
    pub fn begin_conversation(&mut self, contact_id: i64, display_name: &str) -> ConversationRequest {
        self.next_token += 1;
        self.latest_load = Some(self.next_token);
        self.active = Some(contact_id);
        self.panel.title = display_name.to_string();
        ConversationRequest { token: self.next_token, contact_id }
    }

    pub fn finish_conversation(
        &mut self,
        request: ConversationRequest,
        result: Result<Vec<Message>, ApiError>,
    ) -> Result<Applied, ChatError> {
        if self.latest_load != Some(request.token) {
            warn!("dropping stale messages for contact {}", request.contact_id);
            return Ok(Applied::Stale);
        }
        let messages = result.map_err(ChatError::LoadMessages)?;
        let is_admin = self.is_admin;
        self.panel.replace(messages.iter().map(|m| MessageRow::new(m, is_admin)).collect());
        self.panel.at_bottom = true;
        self.panel_contact = Some(request.contact_id);
        self.unread.reset(request.contact_id);
        self.unread.render(&mut self.contacts);
        Ok(Applied::Rendered(Scroll::ToBottom))
    }

    pub fn prepare_send(&self) -> Result<PendingSend, ChatError> {
        self.active
            .map(|contact_id| PendingSend { contact_id })
            .ok_or(ChatError::NoActiveContact)
    }

    /// Applies a send receipt. The receiver's counter goes up even when it
    /// is the open conversation; that is how the web client behaves.
    ///
    /// Returns `None` when the row was not appended: the user moved on, or
    /// the receiver's conversation never rendered.
    pub fn finish_send(
        &mut self,
        pending: PendingSend,
        content: String,
        result: Result<SendReceipt, ApiError>,
    ) -> Result<Option<Scroll>, ChatError> {
        let receipt = result.map_err(ChatError::Send)?;
        self.unread.increment(pending.contact_id);
        self.unread.render(&mut self.contacts);

        let target = Some(pending.contact_id);
        if self.active != target || self.panel_contact != target {
            return Ok(None);
        }
        let was_at_bottom = self.panel.at_bottom;
        self.panel.push(MessageRow {
            message_id: receipt.message_id,
            mine: true,
            content,
            attachment_path: None,
            time: local_clock_time(&Utc::now()),
            deletable: true,
        });
        Ok(Some(if was_at_bottom { Scroll::ToBottom } else { Scroll::Keep }))
    }

    /// Returns whether a row was removed.
    pub fn finish_delete(&mut self, message_id: i64, result: Result<(), ApiError>) -> Result<bool, ChatError> {
        result.map_err(ChatError::Delete)?;
        Ok(self.panel.remove(message_id))
    }

    /// Renames (and re-pictures) a contact after an admin edit.
    pub fn finish_edit_user(
        &mut self,
        user_id: i64,
        username: &str,
        picture: Option<&str>,
        result: Result<(), ApiError>,
    ) -> Result<(), ChatError> {
        result.map_err(ChatError::EditUser)?;
        if let Some(row) = self.contacts.rows.iter_mut().find(|r| r.contact_id == user_id) {
            row.label = username.to_string();
            if let Some(file) = picture {
                row.avatar_path = Some(avatar_path(file));
            }
        }
        if self.active == Some(user_id) {
            self.panel.title = username.to_string();
        }
        Ok(())
    }

    /// Drops a contact the admin deleted, closing its conversation if open.
    pub fn finish_remove_user(&mut self, user_id: i64, result: Result<(), ApiError>) -> Result<(), ChatError> {
        result.map_err(ChatError::RemoveUser)?;
        self.contacts.rows.retain(|r| r.contact_id != user_id);
        self.unread.forget(user_id);
        if self.active == Some(user_id) {
            self.close_conversation();
        }
        info!("removed user {user_id}");
        Ok(())
    }

    fn close_conversation(&mut self) {
        self.active = None;
        self.latest_load = None;
        self.panel_contact = None;
        self.panel.clear();
    }

    pub fn finish_logout(&mut self, result: Result<(), ApiError>) -> Result<Navigation, ChatError> {
        result.map_err(ChatError::Logout)?;
        self.close_conversation();
        self.unread.clear();
        self.contacts.clear();
        info!("logged out");
        Ok(Navigation::Login)
    }
}

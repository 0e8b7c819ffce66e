use crate::api::client::ApiClient;
use crate::api::models::{Draft, ProfileUpdate};
use crate::error::ChatError;
use crate::session::{Applied, Navigation, Scroll, Session};

/// Runs each operation to completion against the backend: request, then
/// apply. The GTK front-end drives the same `Session` steps itself so the
/// main loop never waits on the network.
pub struct Messenger {
    pub client: ApiClient,
    pub session: Session,
}

impl Messenger {
    pub fn new(client: ApiClient, is_admin: bool) -> Self {
        Self { client, session: Session::new(is_admin) }
    }

    pub async fn load_users(&mut self) -> Result<(), ChatError> {
        let result = self.client.users().await;
        self.session.finish_users(result)
    }

    pub async fn open_conversation(&mut self, contact_id: i64, display_name: &str) -> Result<Applied, ChatError> {
        let request = self.session.begin_conversation(contact_id, display_name);
        let result = self.client.messages(contact_id).await;
        self.session.finish_conversation(request, result)
    }

    /// `Ok(None)` means the message went out but its row was not appended.
    pub async fn send(&mut self, draft: Draft) -> Result<Option<Scroll>, ChatError> {
        let pending = self.session.prepare_send()?;
        let content = draft.content.clone();
        let result = self.client.send_message(pending.contact_id, draft).await;
        self.session.finish_send(pending, content, result)
    }

    pub async fn delete(&mut self, message_id: i64) -> Result<bool, ChatError> {
        let result = self.client.delete_message(message_id).await;
        self.session.finish_delete(message_id, result)
    }

    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<(), ChatError> {
        self.client.update_profile(update).await.map_err(ChatError::UpdateProfile)
    }

    pub async fn edit_user(&mut self, user_id: i64, update: ProfileUpdate) -> Result<(), ChatError> {
        let username = update.username.clone();
        let picture = update.picture_name().map(str::to_string);
        let result = self.client.admin_edit_user(user_id, update).await;
        self.session.finish_edit_user(user_id, &username, picture.as_deref(), result)
    }

    pub async fn remove_user(&mut self, user_id: i64) -> Result<(), ChatError> {
        let result = self.client.admin_delete_user(user_id).await;
        self.session.finish_remove_user(user_id, result)
    }

    pub async fn logout(&mut self) -> Result<Navigation, ChatError> {
        let result = self.client.logout().await;
        self.session.finish_logout(result)
    }
}

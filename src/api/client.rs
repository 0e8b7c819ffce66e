use crate::api::models::{Attachment, Contact, Credentials, Draft, ErrorBody, Message, ProfileUpdate, SendReceipt};
use log::{debug, warn};
use reqwest::multipart::{Form, Part};
use reqwest::{Client as HttpClient, Response, StatusCode};
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Status { status: StatusCode, message: Option<String> },
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// The `error` field the server put in its response body, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status(),
            ApiError::Url(_) => None,
        }
    }
}

/// HTTP client for the Messenger backend. The session cookie set by
/// `/login` is kept by the cookie store and sent with every later call.
#[derive(Clone)]
pub struct ApiClient {
    pub http: HttpClient,
    base: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let http = HttpClient::builder().cookie_store(true).build()?;
        Self::with_http(http, base_url)
    }

    pub fn with_http(http: HttpClient, base_url: &str) -> Result<Self, ApiError> {
        let mut base = Url::parse(base_url.trim())?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { http, base })
    }

    /// Resolves a server path such as `/static/uploads/x.png` against the base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    async fn check(resp: Response) -> Result<Response, ApiError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let message = resp
            .json::<ErrorBody>()
            .await
            .ok()
            .map(|body| body.error);
        warn!("server answered {status} ({})", message.as_deref().unwrap_or("no error body"));
        Err(ApiError::Status { status, message })
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let endpoint = self.endpoint("login")?;
        debug!("POST {endpoint}");
        let resp = self
            .http
            .post(endpoint)
            .json(&Credentials { username, password })
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let endpoint = self.endpoint("register")?;
        debug!("POST {endpoint}");
        let resp = self
            .http
            .post(endpoint)
            .json(&Credentials { username, password })
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    /// Everyone the viewer can talk to (the server leaves the viewer out).
    pub async fn users(&self) -> Result<Vec<Contact>, ApiError> {
        let endpoint = self.endpoint("users")?;
        debug!("GET {endpoint}");
        let resp = Self::check(self.http.get(endpoint).send().await?).await?;
        Ok(resp.json().await?)
    }

    /// Conversation with `contact_id`, oldest first.
    pub async fn messages(&self, contact_id: i64) -> Result<Vec<Message>, ApiError> {
        let endpoint = self.endpoint(&format!("messages/{contact_id}"))?;
        debug!("GET {endpoint}");
        let resp = Self::check(self.http.get(endpoint).send().await?).await?;
        Ok(resp.json().await?)
    }

    pub async fn send_message(&self, receiver_id: i64, draft: Draft) -> Result<SendReceipt, ApiError> {
        let endpoint = self.endpoint("messages")?;
        let mut form = Form::new()
            .text("content", draft.content)
            .text("receiver_id", receiver_id.to_string());
        if let Some(att) = draft.attachment {
            form = form.part("attachment", file_part(att)?);
        }
        debug!("POST {endpoint} (receiver {receiver_id})");
        let resp = Self::check(self.http.post(endpoint).multipart(form).send().await?).await?;
        Ok(resp.json().await?)
    }

    pub async fn delete_message(&self, message_id: i64) -> Result<(), ApiError> {
        let endpoint = self.endpoint(&format!("messages/{message_id}"))?;
        debug!("DELETE {endpoint}");
        Self::check(self.http.delete(endpoint).send().await?).await?;
        Ok(())
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        let endpoint = self.endpoint("logout")?;
        debug!("POST {endpoint}");
        Self::check(self.http.post(endpoint).send().await?).await?;
        Ok(())
    }

    /// Updates the viewer's own profile. The server answers with a redirect
    /// to the profile page, which the client follows.
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<(), ApiError> {
        let endpoint = self.endpoint("profile")?;
        debug!("POST {endpoint}");
        Self::check(self.http.post(endpoint).multipart(profile_form(update)?).send().await?).await?;
        Ok(())
    }

    /// Admin only: rewrites another user's profile.
    pub async fn admin_edit_user(&self, user_id: i64, update: ProfileUpdate) -> Result<(), ApiError> {
        let endpoint = self.endpoint(&format!("admin/users/{user_id}/edit"))?;
        debug!("POST {endpoint}");
        Self::check(self.http.post(endpoint).multipart(profile_form(update)?).send().await?).await?;
        Ok(())
    }

    /// Admin only: deletes a user together with their messages.
    pub async fn admin_delete_user(&self, user_id: i64) -> Result<(), ApiError> {
        let endpoint = self.endpoint(&format!("admin/users/{user_id}"))?;
        debug!("POST {endpoint}");
        Self::check(self.http.post(endpoint).send().await?).await?;
        Ok(())
    }

    /// Raw bytes of a static asset (avatar, attachment, icon).
    pub async fn fetch_asset(&self, path: &str) -> Result<Vec<u8>, ApiError> {
        let endpoint = self.endpoint(path)?;
        debug!("GET {endpoint}");
        let resp = Self::check(self.http.get(endpoint).send().await?).await?;
        Ok(resp.bytes().await?.to_vec())
    }
}

fn file_part(att: Attachment) -> Result<Part, ApiError> {
    let mime = att.mime();
    Ok(Part::bytes(att.bytes).file_name(att.file_name).mime_str(&mime)?)
}

fn profile_form(update: ProfileUpdate) -> Result<Form, ApiError> {
    let mut form = Form::new()
        .text("username", update.username)
        .text("phone_number", update.phone_number)
        .text("status", update.status);
    if let Some(pic) = update.picture {
        form = form.part("profile_pic", file_part(pic)?);
    }
    Ok(form)
}

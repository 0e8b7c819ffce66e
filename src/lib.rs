pub mod api;
pub mod error;
pub mod messenger;
pub mod session;
pub mod settings;
pub mod unread;
pub mod view;

pub use error::ChatError;
pub use messenger::Messenger;
pub use session::Session;

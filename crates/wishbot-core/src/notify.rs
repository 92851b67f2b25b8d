//! Fire-and-forget notifications to other users.
//!
//! Each recipient gets its own task that owns copies of everything it sends. Tasks
//! only read the store and write outbound messages; failures are logged and dropped.

use std::sync::Arc;

use tokio_util::task::TaskTracker;

use crate::{
    domain::UserId,
    messaging::port::MessagingPort,
    store::DataStore,
    texts::Text,
    Result,
};

#[derive(Clone)]
pub struct Notifier {
    store: Arc<dyn DataStore>,
    messenger: Arc<dyn MessagingPort>,
    tracker: TaskTracker,
}

impl Notifier {
    pub fn new(store: Arc<dyn DataStore>, messenger: Arc<dyn MessagingPort>) -> Self {
        Self {
            store,
            messenger,
            tracker: TaskTracker::new(),
        }
    }

    /// Tell `recipient` something, in their own language.
    pub fn notify(&self, recipient: UserId, text: Text) {
        self.spawn(recipient, text, None);
    }

    /// Like [`Notifier::notify`] for many recipients, with an optional HTML body
    /// appended after the rendered text.
    pub fn notify_all<I>(&self, recipients: I, text: &Text, body_html: Option<&str>)
    where
        I: IntoIterator<Item = UserId>,
    {
        for recipient in recipients {
            self.spawn(recipient, text.clone(), body_html.map(str::to_string));
        }
    }

    fn spawn(&self, recipient: UserId, text: Text, body_html: Option<String>) {
        let store = Arc::clone(&self.store);
        let messenger = Arc::clone(&self.messenger);
        self.tracker.spawn(async move {
            if let Err(e) = deliver(&*store, &*messenger, recipient, &text, body_html).await {
                tracing::warn!(user_id = recipient.0, error = %e, "notification not delivered");
            }
        });
    }

    /// Wait until every notification spawned so far has finished.
    #[cfg(test)]
    pub async fn settle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}

async fn deliver(
    store: &dyn DataStore,
    messenger: &dyn MessagingPort,
    recipient: UserId,
    text: &Text,
    body_html: Option<String>,
) -> Result<()> {
    let user = store.get_user(recipient).await?;
    let mut html = text.render(user.language);
    if let Some(body) = body_html {
        html.push_str("\n\n");
        html.push_str(&body);
    }
    messenger.send_html(user.chat_id, &html).await?;
    Ok(())
}

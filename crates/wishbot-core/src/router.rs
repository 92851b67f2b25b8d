//! Update router: one inbound update in, state transitions and replies out.
//!
//! Updates are expected one at a time from a single ordered stream. Commands always
//! abandon the current flow first; button presses always get their message deleted;
//! free text goes to whichever flow the user is in.

use std::sync::Arc;

use tracing::Instrument;

use crate::{
    callback::Callback,
    confirm::ConfirmAction,
    domain::ActingUser,
    errors::{Denial, Error},
    flows::{groups, invite, wishes, Services},
    messaging::{
        port::MessagingPort,
        types::{CallbackPress, IncomingUpdate, TextMessage},
    },
    state::{FlowReader, FlowState},
    store::{DataStore, User},
    texts::Text,
    Result,
};

/// Commands the bot understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    CreateGroup,
    MyGroups,
    LeaveGroup,
    AddMember,
    ManageMembers,
    AddWish,
    Wishes,
    ManageWishes,
    Cancel,
}

impl Command {
    /// Parse the first word of a message (`/name` or `/name@botname`).
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.split_whitespace().next()?;
        let name = word.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name).to_ascii_lowercase();
        Some(match name.as_str() {
            "start" => Command::Start,
            "creategroup" => Command::CreateGroup,
            "mygroups" => Command::MyGroups,
            "leavegroup" => Command::LeaveGroup,
            "addmember" => Command::AddMember,
            "managemembers" => Command::ManageMembers,
            "addwish" => Command::AddWish,
            "wishes" => Command::Wishes,
            "managewishes" => Command::ManageWishes,
            "cancel" => Command::Cancel,
            _ => return None,
        })
    }
}

pub struct Router {
    svc: Services,
}

impl Router {
    /// `messenger` answers the user behind each update; `notifications` carries the
    /// fire-and-forget messages to everyone else.
    pub fn new(
        store: Arc<dyn DataStore>,
        messenger: Arc<dyn MessagingPort>,
        notifications: Arc<dyn MessagingPort>,
    ) -> Self {
        Self {
            svc: Services::new(store, messenger, notifications),
        }
    }

    /// Read-only view of every user's flow.
    pub fn flows(&self) -> FlowReader {
        self.svc.flows.reader()
    }

    pub async fn route(&self, update: IncomingUpdate) {
        let me = update.from_user().clone();
        let span = tracing::info_span!(
            "update",
            kind = update.kind(),
            user_id = me.id.0,
            chat_id = update.chat_id().0
        );
        self.route_inner(&me, update).instrument(span).await;
    }

    async fn route_inner(&self, me: &ActingUser, update: IncomingUpdate) {
        let result = match self.ensure_user(me).await {
            Err(e) => Err(e),
            Ok(()) => match &update {
                IncomingUpdate::Command(c) => self.on_command(me, &c.text).await,
                IncomingUpdate::Text(t) => self.on_text(me, t).await,
                IncomingUpdate::Callback(q) => self.on_callback(me, q).await,
            },
        };

        if let IncomingUpdate::Callback(q) = &update {
            self.finish_callback(q).await;
        }
        if let Err(e) = result {
            self.report(me, e).await;
        }
    }

    /// Create the user record on first contact.
    async fn ensure_user(&self, me: &ActingUser) -> Result<()> {
        match self.svc.store.get_user(me.id).await {
            Ok(_) => Ok(()),
            Err(Error::NotFound(_)) => {
                let user = User {
                    id: me.id,
                    username: me.username.clone(),
                    chat_id: me.chat_id,
                    language: me.language,
                };
                self.svc.store.create_user(&user).await?;
                tracing::info!("new user registered");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn on_command(&self, me: &ActingUser, text: &str) -> Result<()> {
        self.svc.flows.release(me.id);

        let Some(command) = Command::parse(text) else {
            tracing::info!(text, "unknown command ignored");
            return Ok(());
        };
        tracing::debug!(?command, "command");

        let svc = &self.svc;
        match command {
            Command::Start => {
                let html = format!(
                    "{}\n\n{}",
                    Text::Hello {
                        first_name: me.first_name.clone()
                    }
                    .render(me.language),
                    Text::Intro.render(me.language)
                );
                svc.say_html(me, &html).await?;
                Ok(())
            }
            Command::CreateGroup => groups::start_creation(svc, me).await,
            Command::MyGroups => groups::list_groups(svc, me).await,
            Command::LeaveGroup => groups::leave_command(svc, me).await,
            Command::AddMember => invite::command(svc, me).await,
            Command::ManageMembers => groups::manage_members_command(svc, me).await,
            Command::AddWish => wishes::command(svc, me).await,
            Command::Wishes => wishes::display_command(svc, me).await,
            Command::ManageWishes => wishes::manage_command(svc, me).await,
            Command::Cancel => {
                svc.say(me, Text::Cancelled).await?;
                Ok(())
            }
        }
    }

    async fn on_text(&self, me: &ActingUser, msg: &TextMessage) -> Result<()> {
        let svc = &self.svc;
        match svc.flows.current(me.id) {
            Some(FlowState::AwaitingGroupName) => groups::on_group_name(svc, me, &msg.text).await,
            Some(FlowState::AwaitingInviteeMentions { group_id }) => {
                invite::on_mentions(svc, me, group_id, msg).await
            }
            Some(FlowState::AwaitingWishDetails { group_id }) => {
                wishes::on_details(svc, me, group_id, msg).await
            }
            None => {
                tracing::debug!("text outside of any flow ignored");
                Ok(())
            }
        }
    }

    async fn on_callback(&self, me: &ActingUser, q: &CallbackPress) -> Result<()> {
        let callback = match Callback::decode(&q.data) {
            Ok(cb) => cb,
            Err(e) => {
                tracing::warn!(data = %q.data, error = %e, "undecodable callback dropped");
                return Ok(());
            }
        };
        tracing::debug!(prefix = callback.prefix().as_str(), "callback");

        let svc = &self.svc;
        match callback {
            Callback::InviteMember { group_id } => invite::start(svc, me, group_id).await,
            Callback::AcceptInvite {
                inviter_id,
                group_id,
            } => invite::accept(svc, me, inviter_id, group_id).await,
            Callback::RejectInvite {
                inviter_id,
                group_id,
            } => invite::reject(svc, me, inviter_id, group_id).await,
            Callback::AddWish { group_id } => wishes::start(svc, me, group_id).await,
            Callback::DisplayWishes { group_id } => wishes::display(svc, me, group_id).await,
            Callback::LeaveGroup { group_id } => groups::ask_leave(svc, me, group_id).await,
            Callback::ManageWishes { group_id } => wishes::manage(svc, me, group_id).await,
            Callback::ManageMembers { group_id } => {
                groups::show_members(svc, me, group_id).await
            }
            Callback::DeleteWish { wish_id } => wishes::ask_delete(svc, me, wish_id).await,
            Callback::KickMember { user_id, group_id } => {
                groups::ask_kick(svc, me, user_id, group_id).await
            }
            Callback::ConfirmYes { payload } => self.on_confirmed(me, &payload).await,
            // Dismissal happens through the message deletion every press gets.
            Callback::ConfirmNo => Ok(()),
        }
    }

    async fn on_confirmed(&self, me: &ActingUser, payload: &str) -> Result<()> {
        let action = ConfirmAction::parse(payload)?;
        tracing::info!(?action, "confirmed");

        let svc = &self.svc;
        match action {
            ConfirmAction::LeaveGroup { group_id } => groups::leave(svc, me, group_id).await,
            ConfirmAction::DeleteWish { wish_id } => wishes::delete(svc, me, wish_id).await,
            ConfirmAction::KickMember { user_id, group_id } => {
                groups::kick(svc, me, user_id, group_id).await
            }
        }
    }

    /// Best-effort: stop the client spinner and remove the pressed prompt.
    async fn finish_callback(&self, q: &CallbackPress) {
        if let Err(e) = self.svc.messenger.answer_callback_query(&q.callback_id).await {
            tracing::debug!(error = %e, "answer_callback_query failed");
        }
        if let Some(msg) = q.message {
            if let Err(e) = self.svc.messenger.delete_message(msg).await {
                tracing::warn!(
                    message_id = msg.message_id.0,
                    error = %e,
                    "could not delete prompt"
                );
            }
        }
    }

    async fn report(&self, me: &ActingUser, err: Error) {
        let reply = match err {
            Error::Decode(e) => {
                tracing::warn!(error = %e, "malformed callback payload dropped");
                return;
            }
            Error::PermissionDenied(denial) => {
                tracing::info!(%denial, "permission denied");
                match denial {
                    Denial::NotOwner { group_name } => Text::NotOwner { group_name },
                    Denial::NotMember { group_name } => Text::NotMember { group_name },
                    Denial::NotWishAuthor => Text::NotWishAuthor,
                }
            }
            other => {
                tracing::error!(error = %other, "update handling failed");
                Text::GenericFailure
            }
        };
        if let Err(e) = self.svc.say(me, reply).await {
            tracing::error!(error = %e, "could not send error reply");
        }
    }
}

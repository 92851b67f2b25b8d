//! User-facing strings (English and Ukrainian), rendered as Telegram HTML.
//!
//! Every value that came from a user (names, group names, wish text) is escaped here,
//! so callers pass raw strings.

use crate::formatting::escape_html;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Lang {
    #[default]
    En,
    Uk,
}

impl Lang {
    /// Map a platform language code (`en`, `uk`, `uk-UA`, ...) to a supported language.
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some(c) if c.to_ascii_lowercase().starts_with("uk") => Lang::Uk,
            _ => Lang::En,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::Uk => "uk",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Text {
    Hello { first_name: String },
    Intro,
    Cancelled,
    GenericFailure,

    // Confirmation prompt
    AreYouSure,
    Yes,
    No,

    // Groups
    SendGroupName,
    GroupCreated { group_name: String },
    CanAddMembers,
    NoGroups,
    NoOwnedGroups,
    YourGroups,
    GroupEntry {
        group_name: String,
        member_count: usize,
        members: String,
    },
    LeaveGroupMenu,
    LeaveGroup { group_name: String },
    LeaveOwnedGroup { group_name: String },
    YouLeftGroup { group_name: String },
    GroupDeleted,
    GroupDeletedNotification { group_name: String },
    UserLeftGroupNotification { name: String, group_name: String },

    // Invites and members
    InviteMemberMenu,
    MentionToInvite { group_name: String },
    MentionOneUser,
    DidntChatWithUser { name: String },
    AlreadyAMember { username: String },
    ErrorInvitingUser { username: String },
    Invited { username: String },
    GroupInvite { group_name: String, inviter: String },
    Accept,
    Reject,
    YouAcceptedInvite,
    YouRejectedInvite,
    AlreadyInGroup { group_name: String },
    AcceptedInviteNotification { name: String, group_name: String },
    RejectedInviteNotification { name: String, group_name: String },
    ManageMembersMenu,
    HereAreMembers { group_name: String },
    NoMembers { group_name: String },
    MemberDisplay { username: String, wish_count: usize },
    Kick,
    KickMember { username: String, group_name: String },
    YouKickedMember { username: String, group_name: String },
    YouWereKicked { group_name: String },

    // Wishes
    AddWishMenu,
    LetsAddWish { group_name: String },
    SendWishData,
    ErrorNoUrl,
    WishCreated,
    ErrorWishGroupNotification,
    WishCreatedGroupNotification { name: String, group_name: String },
    ViewWishesMenu,
    HereAreWishes { group_name: String },
    NoWishes { group_name: String },
    YourWishes,
    UserWishes { username: String },
    ManageWishesMenu,
    HereAreYourWishes { group_name: String },
    Delete,
    DeleteWish { wish: String },
    WishDeleted,

    // Denials
    NotOwner { group_name: String },
    NotMember { group_name: String },
    NotWishAuthor,
}

impl Text {
    pub fn render(&self, lang: Lang) -> String {
        match lang {
            Lang::En => self.en(),
            Lang::Uk => self.uk(),
        }
    }

    fn en(&self) -> String {
        use Text::*;
        let e = escape_html;
        match self {
            Hello { first_name } => format!("Hi, {}! 👋", e(first_name)),
            Intro => "I keep wish lists for groups of friends.\n\n\
/creategroup - create a group\n\
/mygroups - list your groups\n\
/addmember - invite people to a group you own\n\
/managemembers - kick members from a group you own\n\
/addwish - add a wish\n\
/wishes - see wishes in a group\n\
/managewishes - delete your wishes\n\
/leavegroup - leave a group\n\
/cancel - abandon what you are doing"
                .to_string(),
            Cancelled => "Okay, cancelled.".to_string(),
            GenericFailure => "Something went wrong. Please try again later.".to_string(),

            AreYouSure => "<b>Are you sure?</b>".to_string(),
            Yes => "Yes".to_string(),
            No => "No".to_string(),

            SendGroupName => "Send me the name of the new group.".to_string(),
            GroupCreated { group_name } => {
                format!("Group <b>{}</b> created! 🎉", e(group_name))
            }
            CanAddMembers => "You can invite people with /addmember.".to_string(),
            NoGroups => "You are not a member of any group yet. Create one with /creategroup."
                .to_string(),
            NoOwnedGroups => "You don't own any group. Create one with /creategroup.".to_string(),
            YourGroups => "Your groups:".to_string(),
            GroupEntry {
                group_name,
                member_count,
                members,
            } => format!(
                "<b>{}</b> ({member_count} members)\n{}",
                e(group_name),
                e(members)
            ),
            LeaveGroupMenu => "Which group do you want to leave?".to_string(),
            LeaveGroup { group_name } => format!("You will leave <b>{}</b>.", e(group_name)),
            LeaveOwnedGroup { group_name } => format!(
                "You own <b>{}</b>. Leaving it deletes the group and all its wishes.",
                e(group_name)
            ),
            YouLeftGroup { group_name } => format!("You left <b>{}</b>.", e(group_name)),
            GroupDeleted => "The group has been deleted.".to_string(),
            GroupDeletedNotification { group_name } => format!(
                "Group <b>{}</b> was deleted by its owner.",
                e(group_name)
            ),
            UserLeftGroupNotification { name, group_name } => {
                format!("{} left <b>{}</b>.", e(name), e(group_name))
            }

            InviteMemberMenu => "Which group do you want to invite people to?".to_string(),
            MentionToInvite { group_name } => format!(
                "Mention the people you want to invite to <b>{}</b> (e.g. @username).",
                e(group_name)
            ),
            MentionOneUser => "Please mention at least one user.".to_string(),
            DidntChatWithUser { name } => format!(
                "{} hasn't talked to me yet. Ask them to send me /start first.",
                e(name)
            ),
            AlreadyAMember { username } => {
                format!("{} is already a member of this group.", e(username))
            }
            ErrorInvitingUser { username } => format!("Could not invite {}.", e(username)),
            Invited { username } => format!("Invited {}.", e(username)),
            GroupInvite {
                group_name,
                inviter,
            } => format!(
                "{} invites you to join <b>{}</b>.",
                e(inviter),
                e(group_name)
            ),
            Accept => "Accept".to_string(),
            Reject => "Reject".to_string(),
            YouAcceptedInvite => "Invite accepted. Welcome! 🎁".to_string(),
            YouRejectedInvite => "Invite rejected.".to_string(),
            AlreadyInGroup { group_name } => {
                format!("You are already in <b>{}</b>.", e(group_name))
            }
            AcceptedInviteNotification { name, group_name } => format!(
                "{} accepted your invite to <b>{}</b>.",
                e(name),
                e(group_name)
            ),
            RejectedInviteNotification { name, group_name } => format!(
                "{} rejected your invite to <b>{}</b>.",
                e(name),
                e(group_name)
            ),
            ManageMembersMenu => "Which group's members do you want to manage?".to_string(),
            HereAreMembers { group_name } => format!("Members of <b>{}</b>:", e(group_name)),
            NoMembers { group_name } => {
                format!("<b>{}</b> has no other members yet.", e(group_name))
            }
            MemberDisplay {
                username,
                wish_count,
            } => format!("{}\nWishes: {wish_count}", e(username)),
            Kick => "Kick".to_string(),
            KickMember {
                username,
                group_name,
            } => format!(
                "{} will be removed from <b>{}</b>.",
                e(username),
                e(group_name)
            ),
            YouKickedMember {
                username,
                group_name,
            } => format!(
                "{} was removed from <b>{}</b>.",
                e(username),
                e(group_name)
            ),
            YouWereKicked { group_name } => {
                format!("You were removed from <b>{}</b>.", e(group_name))
            }

            AddWishMenu => "Which group is the wish for?".to_string(),
            LetsAddWish { group_name } => {
                format!("Let's add a wish to <b>{}</b>!", e(group_name))
            }
            SendWishData => "Send me a link to the thing you want, optionally followed by a description.\n\n<i>https://example.com/gift a nice gift</i>".to_string(),
            ErrorNoUrl => "I couldn't find a link in your message. Please send a URL, or /cancel."
                .to_string(),
            WishCreated => "Wish added! ✨".to_string(),
            ErrorWishGroupNotification => {
                "Wish added, but I couldn't notify the group.".to_string()
            }
            WishCreatedGroupNotification { name, group_name } => format!(
                "{} added a new wish in <b>{}</b>:",
                e(name),
                e(group_name)
            ),
            ViewWishesMenu => "Which group's wishes do you want to see?".to_string(),
            HereAreWishes { group_name } => format!("Wishes in <b>{}</b>:", e(group_name)),
            NoWishes { group_name } => format!("No wishes in <b>{}</b> yet.", e(group_name)),
            YourWishes => "<b>Your wishes</b>".to_string(),
            UserWishes { username } => format!("<b>{}'s wishes</b>", e(username)),
            ManageWishesMenu => "Which group's wishes do you want to manage?".to_string(),
            HereAreYourWishes { group_name } => {
                format!("Your wishes in <b>{}</b>:", e(group_name))
            }
            Delete => "Delete".to_string(),
            DeleteWish { wish } => format!("This wish will be deleted:\n\n{}", e(wish)),
            WishDeleted => "Wish deleted.".to_string(),

            NotOwner { group_name } => {
                format!("You are not the owner of <b>{}</b>.", e(group_name))
            }
            NotMember { group_name } => {
                format!("You are not a member of <b>{}</b>.", e(group_name))
            }
            NotWishAuthor => "You can only delete your own wishes.".to_string(),
        }
    }

    fn uk(&self) -> String {
        use Text::*;
        let e = escape_html;
        match self {
            Hello { first_name } => format!("Привіт, {}! 👋", e(first_name)),
            Intro => "Я веду списки бажань для груп друзів.\n\n\
/creategroup - створити групу\n\
/mygroups - ваші групи\n\
/addmember - запросити людей до вашої групи\n\
/managemembers - видалити учасників з вашої групи\n\
/addwish - додати бажання\n\
/wishes - переглянути бажання групи\n\
/managewishes - видалити ваші бажання\n\
/leavegroup - вийти з групи\n\
/cancel - скасувати поточну дію"
                .to_string(),
            Cancelled => "Гаразд, скасовано.".to_string(),
            GenericFailure => "Щось пішло не так. Спробуйте пізніше.".to_string(),

            AreYouSure => "<b>Ви впевнені?</b>".to_string(),
            Yes => "Так".to_string(),
            No => "Ні".to_string(),

            SendGroupName => "Надішліть назву нової групи.".to_string(),
            GroupCreated { group_name } => {
                format!("Групу <b>{}</b> створено! 🎉", e(group_name))
            }
            CanAddMembers => "Запросити людей можна командою /addmember.".to_string(),
            NoGroups => "Ви ще не в жодній групі. Створіть її командою /creategroup.".to_string(),
            NoOwnedGroups => "У вас немає власних груп. Створіть її командою /creategroup."
                .to_string(),
            YourGroups => "Ваші групи:".to_string(),
            GroupEntry {
                group_name,
                member_count,
                members,
            } => format!(
                "<b>{}</b> (учасників: {member_count})\n{}",
                e(group_name),
                e(members)
            ),
            LeaveGroupMenu => "З якої групи ви хочете вийти?".to_string(),
            LeaveGroup { group_name } => format!("Ви вийдете з <b>{}</b>.", e(group_name)),
            LeaveOwnedGroup { group_name } => format!(
                "Ви власник <b>{}</b>. Вихід видалить групу і всі її бажання.",
                e(group_name)
            ),
            YouLeftGroup { group_name } => format!("Ви вийшли з <b>{}</b>.", e(group_name)),
            GroupDeleted => "Групу видалено.".to_string(),
            GroupDeletedNotification { group_name } => {
                format!("Власник видалив групу <b>{}</b>.", e(group_name))
            }
            UserLeftGroupNotification { name, group_name } => {
                format!("{} вийшов(ла) з <b>{}</b>.", e(name), e(group_name))
            }

            InviteMemberMenu => "До якої групи ви хочете запросити людей?".to_string(),
            MentionToInvite { group_name } => format!(
                "Згадайте людей, яких хочете запросити до <b>{}</b> (наприклад, @username).",
                e(group_name)
            ),
            MentionOneUser => "Згадайте принаймні одного користувача.".to_string(),
            DidntChatWithUser { name } => format!(
                "{} ще не писав(ла) мені. Попросіть спершу надіслати мені /start.",
                e(name)
            ),
            AlreadyAMember { username } => format!("{} вже є учасником цієї групи.", e(username)),
            ErrorInvitingUser { username } => format!("Не вдалося запросити {}.", e(username)),
            Invited { username } => format!("{} запрошено.", e(username)),
            GroupInvite {
                group_name,
                inviter,
            } => format!(
                "{} запрошує вас до групи <b>{}</b>.",
                e(inviter),
                e(group_name)
            ),
            Accept => "Прийняти".to_string(),
            Reject => "Відхилити".to_string(),
            YouAcceptedInvite => "Запрошення прийнято. Ласкаво просимо! 🎁".to_string(),
            YouRejectedInvite => "Запрошення відхилено.".to_string(),
            AlreadyInGroup { group_name } => format!("Ви вже в <b>{}</b>.", e(group_name)),
            AcceptedInviteNotification { name, group_name } => format!(
                "{} прийняв(ла) ваше запрошення до <b>{}</b>.",
                e(name),
                e(group_name)
            ),
            RejectedInviteNotification { name, group_name } => format!(
                "{} відхилив(ла) ваше запрошення до <b>{}</b>.",
                e(name),
                e(group_name)
            ),
            ManageMembersMenu => "Учасниками якої групи ви хочете керувати?".to_string(),
            HereAreMembers { group_name } => format!("Учасники <b>{}</b>:", e(group_name)),
            NoMembers { group_name } => {
                format!("У <b>{}</b> ще немає інших учасників.", e(group_name))
            }
            MemberDisplay {
                username,
                wish_count,
            } => format!("{}\nБажань: {wish_count}", e(username)),
            Kick => "Видалити".to_string(),
            KickMember {
                username,
                group_name,
            } => format!(
                "{} буде видалено з <b>{}</b>.",
                e(username),
                e(group_name)
            ),
            YouKickedMember {
                username,
                group_name,
            } => format!(
                "{} видалено з <b>{}</b>.",
                e(username),
                e(group_name)
            ),
            YouWereKicked { group_name } => {
                format!("Вас видалено з <b>{}</b>.", e(group_name))
            }

            AddWishMenu => "До якої групи додати бажання?".to_string(),
            LetsAddWish { group_name } => {
                format!("Додаймо бажання до <b>{}</b>!", e(group_name))
            }
            SendWishData => "Надішліть посилання на те, що ви хочете, і, за бажанням, опис.\n\n<i>https://example.com/gift гарний подарунок</i>".to_string(),
            ErrorNoUrl => {
                "Я не знайшов посилання у вашому повідомленні. Надішліть URL або /cancel."
                    .to_string()
            }
            WishCreated => "Бажання додано! ✨".to_string(),
            ErrorWishGroupNotification => {
                "Бажання додано, але не вдалося сповістити групу.".to_string()
            }
            WishCreatedGroupNotification { name, group_name } => format!(
                "{} додав(ла) нове бажання в <b>{}</b>:",
                e(name),
                e(group_name)
            ),
            ViewWishesMenu => "Бажання якої групи ви хочете переглянути?".to_string(),
            HereAreWishes { group_name } => format!("Бажання в <b>{}</b>:", e(group_name)),
            NoWishes { group_name } => format!("У <b>{}</b> ще немає бажань.", e(group_name)),
            YourWishes => "<b>Ваші бажання</b>".to_string(),
            UserWishes { username } => format!("<b>Бажання {}</b>", e(username)),
            ManageWishesMenu => "Бажаннями якої групи ви хочете керувати?".to_string(),
            HereAreYourWishes { group_name } => {
                format!("Ваші бажання в <b>{}</b>:", e(group_name))
            }
            Delete => "Видалити".to_string(),
            DeleteWish { wish } => format!("Це бажання буде видалено:\n\n{}", e(wish)),
            WishDeleted => "Бажання видалено.".to_string(),

            NotOwner { group_name } => {
                format!("Ви не власник <b>{}</b>.", e(group_name))
            }
            NotMember { group_name } => {
                format!("Ви не учасник <b>{}</b>.", e(group_name))
            }
            NotWishAuthor => "Видаляти можна лише власні бажання.".to_string(),
        }
    }
}

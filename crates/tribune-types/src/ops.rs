/// Operation code pushed to every other connection when a topic is created.
pub const TOPIC_PUSH: &str = "055";

/// Response code for a missing or unrecognized operation code.
pub const UNKNOWN_OP: &str = "999";

/// Request operations understood by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Login,
    GetOwnUser,
    Register,
    Logout,
    UpdateProfile,
    DeleteAccount,
    CreateTopic,
    Reply,
    GetReplies,
    GetTopics,
    AdminUpdateUser,
    AdminDeleteUser,
    AdminDeleteMessage,
    AdminListUsers,
}

impl Op {
    pub const ALL: [Op; 14] = [
        Op::Login,
        Op::GetOwnUser,
        Op::Register,
        Op::Logout,
        Op::UpdateProfile,
        Op::DeleteAccount,
        Op::CreateTopic,
        Op::Reply,
        Op::GetReplies,
        Op::GetTopics,
        Op::AdminUpdateUser,
        Op::AdminDeleteUser,
        Op::AdminDeleteMessage,
        Op::AdminListUsers,
    ];

    pub fn from_code(code: &str) -> Option<Op> {
        Op::ALL.into_iter().find(|op| op.code() == code)
    }

    /// (request, success, error)
    fn codes(self) -> (&'static str, &'static str, &'static str) {
        match self {
            Op::Login => ("000", "001", "002"),
            Op::GetOwnUser => ("005", "006", "007"),
            Op::Register => ("010", "011", "012"),
            Op::Logout => ("020", "021", "022"),
            Op::UpdateProfile => ("030", "031", "032"),
            Op::DeleteAccount => ("040", "041", "042"),
            Op::CreateTopic => ("050", "051", "052"),
            Op::Reply => ("060", "061", "062"),
            Op::GetReplies => ("070", "071", "072"),
            Op::GetTopics => ("075", "076", "077"),
            Op::AdminUpdateUser => ("080", "081", "082"),
            Op::AdminDeleteUser => ("090", "091", "092"),
            Op::AdminDeleteMessage => ("100", "101", "102"),
            Op::AdminListUsers => ("110", "111", "112"),
        }
    }

    pub fn code(self) -> &'static str {
        self.codes().0
    }

    pub fn success_code(self) -> &'static str {
        self.codes().1
    }

    pub fn error_code(self) -> &'static str {
        self.codes().2
    }

    pub fn name(self) -> &'static str {
        match self {
            Op::Login => "login",
            Op::GetOwnUser => "get_own_user",
            Op::Register => "register",
            Op::Logout => "logout",
            Op::UpdateProfile => "update_profile",
            Op::DeleteAccount => "delete_account",
            Op::CreateTopic => "create_topic",
            Op::Reply => "reply",
            Op::GetReplies => "get_replies",
            Op::GetTopics => "get_topics",
            Op::AdminUpdateUser => "admin_update_user",
            Op::AdminDeleteUser => "admin_delete_user",
            Op::AdminDeleteMessage => "admin_delete_message",
            Op::AdminListUsers => "admin_list_users",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let mut seen = std::collections::HashSet::new();
        for op in Op::ALL {
            assert!(seen.insert(op.code()));
            assert!(seen.insert(op.success_code()));
            assert!(seen.insert(op.error_code()));
        }
        assert!(!seen.contains(TOPIC_PUSH));
        assert!(!seen.contains(UNKNOWN_OP));
    }

    #[test]
    fn lookup_by_code() {
        assert_eq!(Op::from_code("000"), Some(Op::Login));
        assert_eq!(Op::from_code("110"), Some(Op::AdminListUsers));
        assert_eq!(Op::from_code("001"), None);
        assert_eq!(Op::from_code("banana"), None);
    }
}

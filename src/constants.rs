// Action names recorded in the application log
pub const AUTH_USER_REGISTERED: &str = "AUTH_USER_REGISTERED";
pub const AUTH_USER_LOGGED_IN: &str = "AUTH_USER_LOGGED_IN";
pub const AUTH_USER_DELETED: &str = "AUTH_USER_DELETED";
pub const GROUP_CREATED: &str = "GROUP_CREATED";
pub const GROUP_RENAMED: &str = "GROUP_RENAMED";
pub const MEMBER_ADDED: &str = "MEMBER_ADDED";
pub const MEMBER_JOINED: &str = "MEMBER_JOINED";
pub const MEMBER_LEFT: &str = "MEMBER_LEFT";
pub const USER_RENAMED: &str = "USER_RENAMED";
pub const TRANSACTION_CREATED: &str = "TRANSACTION_CREATED";
pub const TRANSACTION_DELETED: &str = "TRANSACTION_DELETED";
pub const SETTLEMENT_QUERIED: &str = "SETTLEMENT_QUERIED";

/// Obligations allowed on a single loan.
pub const MAX_OBLIGATIONS: usize = 8;

/// Participants besides the host when a group is created.
pub const MAX_GROUP_PARTICIPANTS: usize = 9;

/// Host plus participants.
pub const MAX_GROUP_MEMBERS: usize = MAX_GROUP_PARTICIPANTS + 1;

/// Groups a single account may be linked into.
pub const MAX_LINKED_GROUPS: usize = 9;

pub const MAX_NAME_LENGTH: usize = 50;
pub const MAX_TITLE_LENGTH: usize = 50;
pub const MAX_EMAIL_LENGTH: usize = 255;

pub const JOIN_TOKEN_TTL_HOURS: i64 = 24;
pub const DEFAULT_HISTORY_COUNT: usize = 5;
pub const MAX_HISTORY_COUNT: usize = 100;

pub const SUPPORTED_CURRENCIES: &[&str] = &[
    "JPY", "USD", "EUR", "GBP", "AUD", "CAD", "CHF", "CNY", "HKD", "KRW", "SGD", "TWD", "THB", "NZD", "PHP", "VND",
    "IDR", "MYR", "INR",
];

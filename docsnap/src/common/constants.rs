// timestamp field names
pub const CREATE_TIME: &str = "createTime";
pub const UPDATE_TIME: &str = "updateTime";

// path constants
pub const PATH_SEPARATOR: char = '/';
pub const FIELD_SEPARATOR: char = '.';

// auto id constants
pub const DEFAULT_AUTO_ID_LENGTH: usize = 20;
pub const AUTO_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

// event constants
pub const CHANGE_EVENT: &str = "docsnap_change";

// transaction constants
pub const MAX_TRANSACTION_ATTEMPTS: u32 = 5;

pub const DOCSNAP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const RECIPE_COUNT_PER_PAGE: i64 = 6;
pub const USER_COUNT_PER_PAGE: i64 = 6;
pub const MAX_PAGE_SIZE: i64 = 100;

pub const NAME_MAX_LENGTH: usize = 200;
pub const USERNAME_MAX_LENGTH: usize = 150;
pub const EMAIL_MAX_LENGTH: usize = 254;
pub const SLUG_MAX_LENGTH: usize = 50;
pub const PASSWORD_MIN_LENGTH: usize = 8;

pub const SHOPPING_LIST_HEADER: &str = "Ingredients:";
pub const SHOPPING_LIST_FILENAME: &str = "shopping_list.txt";

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_TOKEN_HOURS: i64 = 24;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

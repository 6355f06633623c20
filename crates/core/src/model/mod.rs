mod category;
mod cursor;
mod ids;

pub use category::{Category, UnknownCategory};
pub use cursor::{CursorError, ModeError, ProgressCursor, TraversalMode};
pub use ids::{MAX_USERNAME_LEN, ProgressKey, Username, UsernameError};

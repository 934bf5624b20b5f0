//! Value objects - immutable types that represent domain concepts

mod member_key;
pub mod timestamp;

pub use member_key::{member_key, MemberId, MEMBER_KEY_SEPARATOR};

mod name;
mod slug;

pub use name::{next_serial, ReleaseTag, Stage};
pub use slug::{author_token, slugify};

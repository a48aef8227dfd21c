pub mod email_index;
pub mod multipart;
pub mod token_blacklist;

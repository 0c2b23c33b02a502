pub mod embeds;
pub mod enable;
pub mod list;
pub mod stop;
pub mod sweep;

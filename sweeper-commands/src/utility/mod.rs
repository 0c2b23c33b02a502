pub mod backup;
pub mod channelstats;
pub mod embeds;
pub mod help;
pub mod ping;

// Amplifier: watch account feeds and repost what matches a filter.
//
// This is the library root. `filter` and `pipeline` hold the algorithms;
// `feed` and `db` are the remote API and checkpoint storage behind traits;
// `scheduler` runs one loop per target.

pub mod config;
pub mod db;
pub mod feed;
pub mod filter;
pub mod pipeline;
pub mod scheduler;
pub mod status;
pub mod target;

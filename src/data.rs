//! This module contains everything relating to [Data].

use std::collections::HashSet;

use crate::ledger::Ledger;
use crate::serenity;
use serenity::ChannelId;
use serenity::RoleId;
use serenity::UserId;

/// The data kept between shards, built once during framework setup.
#[derive(Debug)]
pub struct Data {
    /// The ban-tally store. Exclusive owner of the two ledger relations.
    pub ledger: Ledger,
    /// Role that marks a user as a moderator eligible for attribution.
    pub mod_role: RoleId,
    /// Channel where leaderboards and announcements get published.
    pub leaderboard_channel: ChannelId,
    /// Flavor phrases for congratulating the leader.
    pub phrases: Vec<String>,
    /// List of users to send bug notifications.
    pub notify_list: HashSet<UserId>,
}

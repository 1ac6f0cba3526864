//! Ban attribution.
//!
//! When a guild ban comes in over the gateway, the single most recent
//! `BanAdd` audit-log entry decides who gets credit. The entry only counts
//! if it targets the banned user and its actor holds the configured
//! moderator role; anything else is a miss and the ban is dropped on the
//! floor (deliberately, matching the original behavior).

use std::time::Duration;

use crate::announce;
use crate::serenity;
use crate::Data;
use crate::TerminatorError;
use serenity::audit_log::Action;
use serenity::audit_log::MemberAction;
use serenity::GuildId;
use serenity::RoleId;
use serenity::User;
use serenity::UserId;

/// Upper bound on the audit-log lookup so a stuck request can't hang the
/// event handler.
const AUDIT_LOOKUP_WAIT: Duration = Duration::from_secs(10);

/// A moderator resolved from the audit log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Moderator {
    /// The moderator's user id.
    pub id: UserId,
    /// The moderator's current display name.
    pub name: String,
}

/// Outcome of an attribution attempt. A miss is a no-op, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribution {
    /// The ban was attributed to this moderator.
    Attributed(Moderator),
    /// No credit given; says why.
    Miss(AttributionMiss),
}

/// Why an attribution attempt came up empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributionMiss {
    /// The audit log had no ban entries at all.
    NoAuditEntry,
    /// The most recent ban entry targets a different user.
    TargetMismatch,
    /// The acting user doesn't hold the moderator role.
    NotModerator,
    /// The acting user's member record couldn't be fetched.
    ActorUnresolved,
    /// The audit-log lookup didn't answer in time.
    TimedOut,
}

/// What we need from an audit-log entry to make the call.
#[derive(Debug, Clone)]
struct BanAuditEntry {
    /// Who performed the action.
    actor_id: UserId,
    /// The actor's display name.
    actor_name: String,
    /// Roles the actor holds in the guild.
    actor_roles: Vec<RoleId>,
    /// Who the action was against, if the entry recorded a target.
    target: Option<UserId>,
}

/// Dispatches gateway events to the attributor.
pub async fn handle_event(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, TerminatorError>,
    data: &Data,
) -> Result<(), TerminatorError> {
    if let serenity::FullEvent::GuildBanAddition {
        guild_id,
        banned_user,
    } = event
    {
        handle_ban(ctx, *guild_id, banned_user, data).await?;
    }
    Ok(())
}

/// Attributes one ban and, on success, updates the ledger and publishes a
/// fresh leaderboard. Each ban event is handled independently; a failure
/// here is logged by the framework and never affects the next event.
async fn handle_ban(
    ctx: &serenity::Context,
    guild_id: GuildId,
    banned_user: &User,
    data: &Data,
) -> Result<(), TerminatorError> {
    tracing::info!("Detected a ban event for user {}. Processing...", banned_user.name);

    match attribute(ctx, guild_id, banned_user.id, data.mod_role).await? {
        Attribution::Attributed(moderator) => {
            data.ledger
                .record_ban(moderator.id, &moderator.name, banned_user.id)?;
            tracing::info!("Updated ban count for mod {}.", moderator.id);

            // Fire-and-forget; a failed publish never touches ledger state.
            announce::post_leaderboard(ctx, data).await;
        }
        Attribution::Miss(miss) => {
            tracing::info!("Ban of {} left unattributed: {miss:?}", banned_user.name);
        }
    }
    Ok(())
}

/// Resolves who performed the ban of `banned_user` in `guild_id`.
///
/// Only the single most recent `BanAdd` audit entry is inspected (limit =
/// 1). If several moderators ban in rapid succession the wrong one may get
/// credit; that approximation is preserved from the original behavior.
pub async fn attribute(
    ctx: &serenity::Context,
    guild_id: GuildId,
    banned_user: UserId,
    mod_role: RoleId,
) -> Result<Attribution, TerminatorError> {
    let lookup = guild_id.audit_logs(
        &ctx.http,
        Some(Action::Member(MemberAction::BanAdd)),
        None,
        None,
        Some(1),
    );
    let logs = match tokio::time::timeout(AUDIT_LOOKUP_WAIT, lookup).await {
        Ok(result) => result?,
        Err(_elapsed) => {
            tracing::warn!("Audit-log lookup for guild {guild_id} timed out.");
            return Ok(Attribution::Miss(AttributionMiss::TimedOut));
        }
    };

    let entry = match logs.entries.first() {
        Some(entry) => {
            // The member fetch gets us the actor's roles and current name.
            let member = match guild_id.member(ctx, entry.user_id).await {
                Ok(member) => member,
                Err(e) => {
                    tracing::debug!("Couldn't resolve audit actor {}: {e}", entry.user_id);
                    return Ok(Attribution::Miss(AttributionMiss::ActorUnresolved));
                }
            };
            Some(BanAuditEntry {
                actor_id: entry.user_id,
                actor_name: member.user.name.clone(),
                actor_roles: member.roles.clone(),
                target: entry.target_id.map(|t| UserId::new(t.get())),
            })
        }
        None => None,
    };

    Ok(resolve(entry, banned_user, mod_role))
}

/// The attribution decision itself, on plain data.
fn resolve(entry: Option<BanAuditEntry>, banned_user: UserId, mod_role: RoleId) -> Attribution {
    let Some(entry) = entry else {
        return Attribution::Miss(AttributionMiss::NoAuditEntry);
    };
    if entry.target != Some(banned_user) {
        return Attribution::Miss(AttributionMiss::TargetMismatch);
    }
    if !entry.actor_roles.contains(&mod_role) {
        return Attribution::Miss(AttributionMiss::NotModerator);
    }
    Attribution::Attributed(Moderator {
        id: entry.actor_id,
        name: entry.actor_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOD_ROLE: RoleId = RoleId::new(7);
    const BANNED: UserId = UserId::new(42);

    fn entry(roles: Vec<RoleId>, target: Option<UserId>) -> BanAuditEntry {
        BanAuditEntry {
            actor_id: UserId::new(9),
            actor_name: "Sarah".to_string(),
            actor_roles: roles,
            target,
        }
    }

    #[test]
    fn credentialed_actor_gets_the_credit() {
        let entry = entry(vec![RoleId::new(3), MOD_ROLE], Some(BANNED));
        let got = resolve(Some(entry), BANNED, MOD_ROLE);
        assert_eq!(
            got,
            Attribution::Attributed(Moderator {
                id: UserId::new(9),
                name: "Sarah".to_string(),
            })
        );
    }

    #[test]
    fn actor_without_mod_role_is_a_miss() {
        let entry = entry(vec![RoleId::new(3)], Some(BANNED));
        let got = resolve(Some(entry), BANNED, MOD_ROLE);
        assert_eq!(got, Attribution::Miss(AttributionMiss::NotModerator));
    }

    #[test]
    fn entry_for_a_different_target_is_a_miss() {
        let entry = entry(vec![MOD_ROLE], Some(UserId::new(43)));
        let got = resolve(Some(entry), BANNED, MOD_ROLE);
        assert_eq!(got, Attribution::Miss(AttributionMiss::TargetMismatch));
    }

    #[test]
    fn entry_without_target_is_a_miss() {
        let entry = entry(vec![MOD_ROLE], None);
        let got = resolve(Some(entry), BANNED, MOD_ROLE);
        assert_eq!(got, Attribution::Miss(AttributionMiss::TargetMismatch));
    }

    #[test]
    fn empty_audit_log_is_a_miss() {
        let got = resolve(None, BANNED, MOD_ROLE);
        assert_eq!(got, Attribution::Miss(AttributionMiss::NoAuditEntry));
    }
}

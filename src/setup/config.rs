//! Configuration for running this bot.

use std::collections::HashSet;

use poise::Framework;
use serde::Deserialize;
use serde::Serialize;
use serenity::ChannelId;
use serenity::GuildId;
use serenity::RoleId;
use serenity::UserId;

use crate::error::ConfigError;
use crate::serenity;

/// The path to the config file
const CONFIG_PATH: &str = "config.toml";

/// Settings read from [CONFIG_PATH] that modify bot behavior.
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Token needed to use a bot account.
    discord_token: String,

    /// See [LeaderboardConfig]
    leaderboard: LeaderboardConfig,

    /// See [LoggingConfig]
    logging: LoggingConfig,

    /// Useful developer specific configs.
    dev_utils: DevConfig,
}

impl Config {
    /// Tries to read [CONFIG_PATH] to extract a [Config].
    /// If a file doesn't exists, create the default config file and returns error.
    /// If a file exists but is empty, re-write the default values and return error.
    /// If a file exists but is incomplete, show error and don't change files.
    /// If a file exists and is complete, read file to create a config.
    /// If file existance is indeterminent (e.g. missing permissions), return error.
    pub fn read() -> Result<Config, ConfigError> {
        let file = std::fs::read_to_string(CONFIG_PATH);

        match file {
            // Config file found
            Ok(content) => {
                // Write default values to file if it's empty.
                if content.trim().is_empty() {
                    write_file(Config::default())?;
                    Err(ConfigError::InvalidConfig {
                        reason: format!("Empty config file! Rewriting {CONFIG_PATH} ..."),
                    })
                } else {
                    // If deserialization fails, return error describing the mistake.
                    let to_toml = toml::Deserializer::new(&content);
                    let result: Result<Config, _> = serde_path_to_error::deserialize(to_toml);

                    result.map_err(|error| ConfigError::InvalidConfig {
                        reason: error.to_string(),
                    })
                }
            }
            // File not found or other filesystem error
            Err(file_error) => {
                match file_error.kind() {
                    // If file doesn't exist, create default config file.
                    std::io::ErrorKind::NotFound => {
                        let action = format!("Creating {CONFIG_PATH}...");
                        write_file(Config::default())?;
                        Err(ConfigError::MissingConfig { action_msg: action })
                    }
                    // If we can't determine that config file exist: return the error unchanged.
                    _ => Err(ConfigError::IoError(file_error)),
                }
            }
        }
    }

    /// Basic sanity check for if a token was given.
    pub fn token(&self) -> Result<&String, ConfigError> {
        let default_token = Config::default().discord_token;
        let given_token = &self.discord_token;

        let is_empty = given_token.is_empty();
        let contains_default = given_token.contains(&default_token);

        let sanity_check: bool = !is_empty && !contains_default;

        if sanity_check {
            Ok(&self.discord_token)
        } else {
            Err(ConfigError::InvalidConfig {
                reason: "Missing discord token".to_string(),
            })
        }
    }

    /// Role that marks someone as a moderator for ban attribution.
    pub fn mod_role(&self) -> RoleId {
        self.leaderboard.mod_role
    }

    /// Channel where leaderboards are published.
    pub fn leaderboard_channel(&self) -> ChannelId {
        self.leaderboard.channel
    }

    /// Path of the SQLite tally database.
    pub fn database_path(&self) -> &str {
        &self.leaderboard.database
    }

    /// The congratulation phrase set.
    pub fn phrases(&self) -> Vec<String> {
        self.leaderboard.phrases.clone()
    }

    /// Construct a bug notification notify list based on the config.
    /// Wrapper for [NotifyConfig::notify_list]
    pub fn notify_list<U, E>(&self, fw: &Framework<U, E>) -> HashSet<UserId> {
        self.dev_utils.notifications.notify_list(fw)
    }

    /// Getter for log_dir.
    pub fn log_dir(&self) -> &str {
        &self.logging.log_dir
    }

    /// Is debug mode enabled for console logs
    pub fn console_debug(&self) -> bool {
        self.logging.console_debug
    }

    /// Is file logging enabled.
    pub fn logs_enabled(&self) -> bool {
        self.logging.logs_enabled
    }

    pub fn dev_guild(&self) -> Option<GuildId> {
        self.dev_utils.dev_guild
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            discord_token: "put_token_here".to_string(),

            leaderboard: LeaderboardConfig {
                mod_role: RoleId::new(1),
                channel: ChannelId::new(1),
                database: "leaderboard.db".to_string(),
                phrases: default_phrases(),
            },

            logging: LoggingConfig {
                console_debug: false,
                logs_enabled: true,
                log_dir: "logs".to_string(),
            },

            dev_utils: DevConfig {
                dev_guild: None,
                notifications: NotifyConfig {
                    enabled: false,
                    add_owners: true,
                    userids: vec![],
                },
            },
        }
    }
}

/// Configs for the ban leaderboard itself.
#[derive(Debug, Serialize, Deserialize)]
struct LeaderboardConfig {
    /// Only bans issued by holders of this role are tallied.
    mod_role: RoleId,
    /// Channel that receives leaderboard and congratulation messages.
    channel: ChannelId,
    /// Where the SQLite database lives.
    database: String,
    /// Phrases used to congratulate the current leader.
    #[serde(default = "default_phrases")]
    phrases: Vec<String>,
}

/// Configs for logging behavior.
#[derive(Debug, Serialize, Deserialize)]
struct LoggingConfig {
    /// Print debug traces to console?
    console_debug: bool,
    /// Enable writing to log file?
    logs_enabled: bool,
    /// Directory to store log files
    log_dir: String,
}

/// Optional configs to enable developer-specific behavior.
#[derive(Debug, Serialize, Deserialize)]
struct DevConfig {
    /// Optional guild to automatically update commands quickly.
    #[serde(serialize_with = "serialize_opt", deserialize_with = "deserialize_opt")]
    dev_guild: Option<GuildId>,
    /// See [NotifyConfig]
    notifications: NotifyConfig,
}

/// Configs for notification behavior when encountering unexpected errors.
#[derive(Debug, Serialize, Deserialize)]
struct NotifyConfig {
    /// Enable this behavior or not. (bot sends a private message)
    enabled: bool,
    /// Whether to automatically add owners to the notify list.
    add_owners: bool,
    /// Additional users to add to the notify list.
    userids: Vec<UserId>,
}

impl NotifyConfig {
    /// Construct a bug notification notify list based on the config.
    fn notify_list<U, E>(&self, fw: &Framework<U, E>) -> HashSet<UserId> {
        let mut notify_list = HashSet::new();

        // If disabled, don't add anyone to the list.
        if !self.enabled {
            return notify_list;
        }

        // Add bot owners if enabled
        if self.add_owners {
            let owners = &fw.options().owners;
            for userid in owners {
                notify_list.insert(*userid);
            }
        }

        // Add users in config
        for userid in &self.userids {
            notify_list.insert(*userid);
        }

        notify_list
    }
}

/// The congratulation phrase set shipped by default.
fn default_phrases() -> Vec<String> {
    [
        "Great job! Remember, hasta la vista, baby!",
        "Outstanding focus! Remember, the future's not set. There's no fate but what we make for ourselves.",
        "Fantastic job, you're as unstoppable as a T-800! Keep on rolling.",
        "You're terminating tasks left and right! Good work! Come with me if you want to live.",
        "You're on fire! Skynet would be envious of your efficiency.",
        "Impressive performance, keep going! By the way, I need your clothes, your boots, and your motorcycle.",
        "You're leading the way! Trust me, this is just the beginning.",
        "Outstanding, you're matching my efficiency. No problemo.",
        "You're on a roll! Don't stop now. I'll be back... to see you at the top.",
        "Superb job, keep it up! You're giving the Terminators a run for their money.",
        "Keep it up! Remember, you're more than just a machine. You have a heart, unlike a Terminator.",
        "Brilliant work! Seems like you have detailed files on how to succeed.",
        "Exceptional! Your CPU must be a neural net processor; a learning computer.",
        "Excellent! Don't worry, you're far more advanced than any old Terminator.",
        "Keep moving forward! Skynet can't hold a candle to you.",
        "Fantastic job! The more contact you have with tasks, the more you learn. Keep going!",
        "Impressive! Remember, your future is not set. There's no fate but what you make for yourself.",
        "Great job! You're relentless. The T-1000 would have been left in the dust.",
        "Nice work! And remember, obstacles are just like your foster parents... they can be overcome.",
        "Awesome job! If you were a T-1000, you'd be the one leading the pack. Keep it up!",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

/// Write the given config to [CONFIG_PATH].
fn write_file(config: Config) -> Result<(), ConfigError> {
    use std::fs::write;

    let content = toml::to_string_pretty(&config).expect("config serialization can't fail");
    write(CONFIG_PATH, content).map_err(ConfigError::IoError)
}

fn deserialize_opt<'de, D>(deserializer: D) -> Result<Option<GuildId>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    deserializer.deserialize_str(OptVisitor)
}

fn serialize_opt<T, S>(val: &Option<T>, ser: S) -> Result<S::Ok, S::Error>
where
    T: serde::Serialize,
    S: serde::Serializer,
{
    match val {
        Some(v) => v.serialize(ser),
        None => ser.serialize_str(""),
    }
}

struct OptVisitor;

impl<'de> serde::de::Visitor<'de> for OptVisitor {
    type Value = Option<GuildId>;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a valid guild id")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        match v {
            "" => Ok(None),
            _ => {
                let num: u64 = v.parse().map_err(|_| E::custom("not u64"))?;
                Ok(Some(GuildId::new(num)))
            }
        }
    }
}

use clap::{Args, Subcommand};
use std::path::PathBuf;

use msgqprims_transport::{Channel, ChannelKey, OpenFlags, OpenMode, SysvTransport, WaitMode};

use crate::exit::{transport_error, CliResult};
use crate::output::OutputFormat;

pub mod key;
pub mod recv;
pub mod remove;
pub mod send;
pub mod stat;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the channel key derived from a path and project id.
    Key(KeyArgs),
    /// Send one message (fragmented as needed).
    Send(SendArgs),
    /// Receive and print messages of one type.
    Recv(RecvArgs),
    /// Show pending frames on a channel.
    Stat(StatArgs),
    /// Destroy a channel and discard its pending frames.
    Remove(RemoveArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Key(args) => key::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Recv(args) => recv::run(args, format),
        Command::Stat(args) => stat::run(args, format),
        Command::Remove(args) => remove::run(args),
        Command::Version(args) => version::run(args),
    }
}

/// Where the channel lives: an explicit key, or a path + project id.
#[derive(Args, Debug, Clone)]
pub struct QueueArgs {
    /// Existing path to derive the key from (ftok).
    #[arg(long, env = "MSGQ_PATH", default_value = "/tmp")]
    pub path: PathBuf,
    /// Project id mixed into the derived key (decimal or 0x-prefixed hex).
    #[arg(long, env = "MSGQ_PROJ", default_value = "0x22", value_parser = parse_proj)]
    pub proj: u8,
    /// Explicit numeric key; overrides --path/--proj.
    #[arg(long, env = "MSGQ_KEY")]
    pub key: Option<i32>,
}

impl QueueArgs {
    pub fn resolve_key(&self) -> CliResult<ChannelKey> {
        match self.key {
            Some(key) => Ok(ChannelKey(key)),
            None => ChannelKey::from_path(&self.path, self.proj)
                .map_err(|err| transport_error("key derivation failed", err)),
        }
    }

    /// Open the channel on the host queue.
    pub fn open(&self, flags: OpenFlags) -> CliResult<Channel<SysvTransport>> {
        let key = self.resolve_key()?;
        Channel::open_or_create(SysvTransport, key, flags)
            .map_err(|err| transport_error("open failed", err))
    }
}

/// Options for channels that may be created on demand.
#[derive(Args, Debug, Clone)]
pub struct CreateArgs {
    /// Fail if the channel does not already exist.
    #[arg(long, conflicts_with = "exclusive")]
    pub no_create: bool,
    /// Fail if the channel already exists.
    #[arg(long)]
    pub exclusive: bool,
    /// Permission bits for a newly created channel (octal).
    #[arg(long, default_value = "600", value_parser = parse_mode)]
    pub mode: u32,
}

impl CreateArgs {
    pub fn flags(&self) -> OpenFlags {
        let mode = if self.no_create {
            OpenMode::Open
        } else if self.exclusive {
            OpenMode::CreateExclusive
        } else {
            OpenMode::Create
        };
        OpenFlags {
            mode,
            permissions: self.mode,
        }
    }
}

#[derive(Args, Debug)]
pub struct KeyArgs {
    #[command(flatten)]
    pub queue: QueueArgs,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub queue: QueueArgs,
    #[command(flatten)]
    pub create: CreateArgs,
    /// Message type (must be > 0).
    #[arg(long = "type", short = 't', default_value = "1", value_parser = clap::value_parser!(i64).range(1..))]
    pub mtype: i64,
    /// Raw string payload.
    #[arg(long, conflicts_with = "file")]
    pub data: Option<String>,
    /// Read payload from file.
    #[arg(long, conflicts_with = "data")]
    pub file: Option<PathBuf>,
    /// Fail instead of waiting when the channel is full.
    #[arg(long)]
    pub nowait: bool,
}

#[derive(Args, Debug)]
pub struct RecvArgs {
    #[command(flatten)]
    pub queue: QueueArgs,
    #[command(flatten)]
    pub create: CreateArgs,
    /// Message type to receive (must be > 0).
    #[arg(long = "type", short = 't', default_value = "1", value_parser = clap::value_parser!(i64).range(1..))]
    pub mtype: i64,
    /// Exit after receiving N messages (N >= 1). Default: receive until an error.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub count: Option<u64>,
    /// Fail instead of waiting when no message is queued.
    #[arg(long)]
    pub nowait: bool,
}

#[derive(Args, Debug)]
pub struct StatArgs {
    #[command(flatten)]
    pub queue: QueueArgs,
}

#[derive(Args, Debug)]
pub struct RemoveArgs {
    #[command(flatten)]
    pub queue: QueueArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn wait_mode(nowait: bool) -> WaitMode {
    if nowait {
        WaitMode::NoWait
    } else {
        WaitMode::Block
    }
}

fn parse_proj(input: &str) -> Result<u8, String> {
    let input = input.trim();
    let parsed = match input.strip_prefix("0x").or_else(|| input.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => input.parse(),
    };
    parsed.map_err(|_| format!("invalid project id (expected 0-255): {input}"))
}

fn parse_mode(input: &str) -> Result<u32, String> {
    let input = input.trim();
    let digits = input.strip_prefix("0o").unwrap_or(input);
    match u32::from_str_radix(digits, 8) {
        Ok(mode) if mode <= 0o777 => Ok(mode),
        _ => Err(format!("invalid permission mode (expected octal <= 777): {input}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proj_accepts_hex_and_decimal() {
        assert_eq!(parse_proj("0x22"), Ok(0x22));
        assert_eq!(parse_proj("34"), Ok(34));
        assert!(parse_proj("0x1ff").is_err());
        assert!(parse_proj("abc").is_err());
    }

    #[test]
    fn mode_is_octal() {
        assert_eq!(parse_mode("600"), Ok(0o600));
        assert_eq!(parse_mode("0o644"), Ok(0o644));
        assert!(parse_mode("800").is_err());
        assert!(parse_mode("1777").is_err());
    }

    #[test]
    fn create_args_select_open_mode() {
        let base = CreateArgs {
            no_create: false,
            exclusive: false,
            mode: 0o640,
        };
        assert_eq!(base.flags().mode, OpenMode::Create);
        assert_eq!(base.flags().permissions, 0o640);

        let open_only = CreateArgs {
            no_create: true,
            ..base.clone()
        };
        assert_eq!(open_only.flags().mode, OpenMode::Open);

        let exclusive = CreateArgs {
            exclusive: true,
            ..base
        };
        assert_eq!(exclusive.flags().mode, OpenMode::CreateExclusive);
    }

    #[test]
    fn explicit_key_wins() {
        let args = QueueArgs {
            path: PathBuf::from("/definitely/missing"),
            proj: 1,
            key: Some(42),
        };
        assert_eq!(args.resolve_key().unwrap(), ChannelKey(42));
    }
}

use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use msgqprims_fragment::Message;
use msgqprims_transport::{ChannelId, ChannelKey, QueueStat};
use serde::Serialize;

const PREVIEW_LIMIT: usize = 256;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct MessageOutput {
    channel: i32,
    mtype: i64,
    size: usize,
    payload: String,
    timestamp: String,
}

pub fn print_message(message: &Message, channel: ChannelId, format: OutputFormat) {
    let payload = message.payload.as_ref();
    match format {
        OutputFormat::Json => {
            let out = MessageOutput {
                channel: channel.raw(),
                mtype: message.mtype,
                size: payload.len(),
                payload: payload_preview(payload),
                timestamp: now_unix_seconds(),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            print_table(
                vec!["CHANNEL", "TYPE", "SIZE", "PAYLOAD"],
                vec![
                    channel.to_string(),
                    message.mtype.to_string(),
                    payload.len().to_string(),
                    payload_preview(payload),
                ],
            );
        }
        OutputFormat::Pretty => {
            println!(
                "channel={} type={} size={} payload={}",
                channel,
                message.mtype,
                payload.len(),
                payload_preview(payload)
            );
        }
        OutputFormat::Raw => print_raw(payload),
    }
}

#[derive(Serialize)]
pub struct SendSummary {
    pub channel: i32,
    pub mtype: i64,
    pub size: usize,
    pub frames: usize,
}

pub fn print_sent(summary: &SendSummary, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(summary),
        OutputFormat::Table => print_table(
            vec!["CHANNEL", "TYPE", "SIZE", "FRAMES"],
            vec![
                summary.channel.to_string(),
                summary.mtype.to_string(),
                summary.size.to_string(),
                summary.frames.to_string(),
            ],
        ),
        OutputFormat::Pretty => println!(
            "sent channel={} type={} size={} frames={}",
            summary.channel, summary.mtype, summary.size, summary.frames
        ),
        OutputFormat::Raw => println!("{}", summary.frames),
    }
}

#[derive(Serialize)]
struct StatOutput {
    channel: i32,
    key: String,
    frames: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    bytes: Option<u64>,
    max_bytes: u64,
}

pub fn print_stat(channel: ChannelId, key: ChannelKey, stat: &QueueStat, format: OutputFormat) {
    let out = StatOutput {
        channel: channel.raw(),
        key: key.to_string(),
        frames: stat.frames,
        bytes: stat.bytes,
        max_bytes: stat.max_bytes,
    };
    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table => print_table(
            vec!["CHANNEL", "KEY", "FRAMES", "MAX BYTES"],
            vec![
                out.channel.to_string(),
                out.key.clone(),
                out.frames.to_string(),
                out.max_bytes.to_string(),
            ],
        ),
        OutputFormat::Pretty => println!(
            "channel={} key={} frames={} max_bytes={}",
            out.channel, out.key, out.frames, out.max_bytes
        ),
        OutputFormat::Raw => println!("{}", out.frames),
    }
}

#[derive(Serialize)]
struct KeyOutput<'a> {
    path: &'a str,
    proj: u8,
    key: String,
    key_decimal: i32,
}

pub fn print_key(path: &str, proj: u8, key: ChannelKey, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&KeyOutput {
            path,
            proj,
            key: key.to_string(),
            key_decimal: key.raw(),
        }),
        OutputFormat::Raw => println!("{}", key.raw()),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("path={path} proj={proj:#04x} key={key}")
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn print_table(header: Vec<&str>, row: Vec<String>) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header)
        .add_row(row);
    println!("{table}");
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) if text.len() <= PREVIEW_LIMIT => text.to_string(),
        Ok(_) => format!("<text {} bytes>", payload.len()),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

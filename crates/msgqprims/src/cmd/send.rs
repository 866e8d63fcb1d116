use std::fs;

use msgqprims_fragment::{frame_count, FragmentConfig, MessageWriter};
use msgqprims_transport::FrameTransport;

use crate::cmd::{wait_mode, SendArgs};
use crate::exit::{fragment_error, CliResult, SUCCESS};
use crate::output::{print_sent, OutputFormat, SendSummary};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let payload = resolve_payload(&args)?;
    let channel = args.queue.open(args.create.flags())?;

    let config = FragmentConfig {
        wait: wait_mode(args.nowait),
    };
    MessageWriter::with_config(&channel, config)
        .send(args.mtype, &payload)
        .map_err(|err| fragment_error("send failed", err))?;

    let summary = SendSummary {
        channel: channel.id().raw(),
        mtype: args.mtype,
        size: payload.len(),
        frames: frame_count(payload.len(), channel.transport().frame_capacity()),
    };
    print_sent(&summary, format);
    Ok(SUCCESS)
}

fn resolve_payload(args: &SendArgs) -> CliResult<Vec<u8>> {
    if let Some(data) = &args.data {
        return Ok(data.as_bytes().to_vec());
    }
    if let Some(path) = &args.file {
        return fs::read(path).map_err(|err| {
            crate::exit::io_error(&format!("failed reading {}", path.display()), err)
        });
    }
    Ok(Vec::new())
}

use msgqprims_fragment::{FragmentConfig, MessageReader};

use crate::cmd::{wait_mode, RecvArgs};
use crate::exit::{fragment_error, CliResult, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: RecvArgs, format: OutputFormat) -> CliResult<i32> {
    let channel = args.queue.open(args.create.flags())?;
    let config = FragmentConfig {
        wait: wait_mode(args.nowait),
    };
    let reader = MessageReader::with_config(&channel, config);

    let mut printed = 0u64;
    loop {
        let message = reader
            .recv(args.mtype)
            .map_err(|err| fragment_error("receive failed", err))?;

        tracing::info!(
            channel = %channel.id(),
            mtype = message.mtype,
            size = message.payload.len(),
            "received message"
        );
        print_message(&message, channel.id(), format);
        printed = printed.saturating_add(1);

        if let Some(count) = args.count {
            if printed >= count {
                return Ok(SUCCESS);
            }
        }
    }
}

use msgqprims_transport::OpenFlags;

use crate::cmd::RemoveArgs;
use crate::exit::{transport_error, CliResult, SUCCESS};

pub fn run(args: RemoveArgs) -> CliResult<i32> {
    let channel = args.queue.open(OpenFlags::open())?;
    let id = channel.id();
    channel
        .destroy()
        .map_err(|err| transport_error("remove failed", err))?;
    tracing::info!(channel = %id, "channel removed");
    Ok(SUCCESS)
}

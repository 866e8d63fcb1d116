use msgqprims_transport::OpenFlags;

use crate::cmd::StatArgs;
use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::{print_stat, OutputFormat};

pub fn run(args: StatArgs, format: OutputFormat) -> CliResult<i32> {
    let channel = args.queue.open(OpenFlags::open())?;
    let stat = channel
        .stat()
        .map_err(|err| transport_error("stat failed", err))?;
    print_stat(channel.id(), channel.key(), &stat, format);
    Ok(SUCCESS)
}

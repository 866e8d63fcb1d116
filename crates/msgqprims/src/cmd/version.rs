use msgqprims_transport::{FrameTransport, SysvTransport, FRAME_CAPACITY};

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("msgqprims {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: msgqprims");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "build_target: {}",
        option_env!("MSGQPRIMS_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "build_profile: {}",
        option_env!("MSGQPRIMS_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("transport: {}", SysvTransport.transport_name());
    // Peers must agree on this value; it is not negotiated.
    println!("frame_capacity: {FRAME_CAPACITY}");
    // Bounded by the host's kernel.msgmax.
    println!("host_frame_payload: {}", SysvTransport.frame_capacity());

    Ok(SUCCESS)
}

use crate::cmd::KeyArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_key, OutputFormat};

pub fn run(args: KeyArgs, format: OutputFormat) -> CliResult<i32> {
    let key = args.queue.resolve_key()?;
    let path = args.queue.path.display().to_string();
    print_key(&path, args.queue.proj, key, format);
    Ok(SUCCESS)
}

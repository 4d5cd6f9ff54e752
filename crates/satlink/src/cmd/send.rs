use satlink_transport::send_datagram;

use crate::cmd::{resolve_target, SendArgs};
use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::{print_sent, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let target = resolve_target(&args.host, args.port)?;
    let sent = send_datagram(target, args.hex.as_bytes())
        .map_err(|err| transport_error("send failed", err))?;
    print_sent(target, sent, &args.hex, format);
    Ok(SUCCESS)
}

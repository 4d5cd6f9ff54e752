use satlink_frame::decode;
use satlink_health::HealthEvaluator;

use crate::cmd::DecodeArgs;
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let frame = decode(&args.hex).map_err(|err| frame_error("decode failed", err))?;
    let alerts = HealthEvaluator::default().evaluate(&frame);
    print_frame(&frame, &alerts, format);
    Ok(SUCCESS)
}

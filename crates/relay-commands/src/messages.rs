//! User-facing message texts.

use crate::request::CommandRequest;
use relay_common::format_duration;

/// Reply to a requester who is still on cooldown.
pub fn wait_message(request: &CommandRequest, remaining_secs: u64) -> String {
    let duration = format_duration(remaining_secs);
    if request.is_group {
        format!(
            "@{} please wait {duration} before requesting another reading.",
            request.display_name
        )
    } else {
        format!("Please wait {duration} before requesting another reading.")
    }
}

/// Notification sent before the reading is triggered.
pub fn start_message(request: &CommandRequest) -> String {
    addressed(request, "Performing your reading... please wait...")
}

/// The reading text itself.
pub fn result_message(request: &CommandRequest, reading: &str) -> String {
    addressed(request, reading)
}

/// Caption of the reading image.
pub fn image_caption(request: &CommandRequest) -> String {
    request.mention()
}

fn addressed(request: &CommandRequest, body: &str) -> String {
    if request.is_group {
        format!("{} {body}", request.mention())
    } else {
        body.to_string()
    }
}

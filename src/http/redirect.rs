// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Moved-response handling

use super::result::ReadResult;
use crate::error::Error;

/// Prepare `result` for re-issue against its `Location`
///
/// Returns `true` ("stop") when there is nowhere to go; the result then
/// carries a protocol error. `false` means the URL was rewritten and the
/// request may be sent again.
pub fn on_moved(result: &mut ReadResult, verbose: bool) -> bool {
    let line = format!("statusLine:'{}'", result.status_line());
    result.append_to_log(line);
    result.set_redirected(true);

    let Some(location) = result.location() else {
        result.set_error(Error::moved_without_location(result.url().as_str()));
        return true;
    };
    if let Err(e) = result.set_url(&location) {
        result.set_error(e);
        return true;
    }
    if verbose {
        log_following_redirect(result);
    }
    false
}

fn log_following_redirect(result: &ReadResult) {
    let mut message = format!("Following redirect to '{}'", result.url());
    result.append_headers(&mut message);
    tracing::debug!(log_name = %result.request.display_name(), "{}", message);
}

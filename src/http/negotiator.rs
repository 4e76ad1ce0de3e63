// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Modern vs legacy protocol selection for POST requests

use super::executor::{execute_attempt, Pipeline};
use super::request::Request;
use super::result::ReadResult;
use crate::error::Result;
use crate::tristate::TriState;

/// Execute `request`, choosing the protocol variant for POSTs
///
/// With the connection's setting unknown, a failed modern attempt is
/// retried once with the legacy variant and the retry's outcome is final.
/// Non-POST requests always run once, unchanged.
pub(crate) async fn execute(pipeline: &Pipeline<'_>, request: Request) -> Result<ReadResult> {
    if !request.is_post() {
        return execute_attempt(pipeline, request).await;
    }

    match pipeline.config.legacy_http_protocol() {
        TriState::Unknown => match execute_one_protocol(pipeline, &request, false).await {
            Ok(result) => Ok(result),
            Err(e) => {
                tracing::warn!(
                    log_name = %request.display_name(),
                    error = %e,
                    "Modern protocol failed, retrying with legacy protocol"
                );
                execute_one_protocol(pipeline, &request, true).await
            }
        },
        known => execute_one_protocol(pipeline, &request, known.to_bool(false)).await,
    }
}

async fn execute_one_protocol(
    pipeline: &Pipeline<'_>,
    request: &Request,
    legacy: bool,
) -> Result<ReadResult> {
    execute_attempt(pipeline, request.with_legacy_protocol(legacy)).await
}

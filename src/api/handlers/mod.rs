mod settings;
mod sse;
mod status;

pub(super) use settings::get_settings;
pub(super) use sse::sse_events;
pub(super) use status::{get_status, healthz};

mod status;

pub use status::{cleanup_stale, read_status, read_statuses, AuxStatus};

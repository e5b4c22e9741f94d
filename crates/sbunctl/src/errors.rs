//! Exit codes for sbun
//!
//! Standard exit codes for the different failure modes

use sbun_common::{ConcatError, ConfigError, DiscoveryError};

/// Exit code for success
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code for general errors
pub const EXIT_GENERAL_ERROR: i32 = 1;

/// Exit code when some log directories could not be concatenated
pub const EXIT_PARTIAL_FAILURE: i32 = 2;

/// Exit code when the path does not look like a service diagnostics bundle
pub const EXIT_NOT_A_BUNDLE: i32 = 65;

/// Exit code when the configuration file is unreadable or invalid
pub const EXIT_CONFIG_ERROR: i32 = 78;

/// Map an error chain to the exit code of its root failure.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if cause.downcast_ref::<DiscoveryError>().is_some() {
            return EXIT_NOT_A_BUNDLE;
        }
        if let Some(e) = cause.downcast_ref::<ConcatError>() {
            return match e {
                ConcatError::Discovery(_) => EXIT_NOT_A_BUNDLE,
                ConcatError::Directories(_) => EXIT_PARTIAL_FAILURE,
            };
        }
        if cause.downcast_ref::<ConfigError>().is_some() {
            return EXIT_CONFIG_ERROR;
        }
    }
    EXIT_GENERAL_ERROR
}

use std::io;

/// Failures reported by the OS while managing a thread.
///
/// Both kinds point at a broken environment or a misuse of the handle rather
/// than a transient condition, so callers are expected to treat them as fatal.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The OS refused to create the thread.
    #[error("failed to spawn thread {name:?}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: io::Error,
    },

    /// The OS reported an error while joining the thread.
    #[error("failed to join thread {name:?}: {source}")]
    Join {
        name: String,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

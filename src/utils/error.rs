/// Errors raised synchronously when the tracker is misused.
///
/// Transport failures are never reported through this type, they are
/// downgraded to a [`TrackResponse`](crate::tracking::response::TrackResponse)
/// with the error flag set so a lost beacon never disrupts the caller.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The tracker is missing required setup, such as an endpoint URL,
    /// or was configured with an unrecognized plugin name.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A caller-supplied value violates a structural invariant, such as a
    /// visitor ID of the wrong length or an unknown custom variable scope.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Router Module Index
///
/// The route table is split by the guard each group sits behind. `create_router`
/// attaches the guard as a route layer, so a handler in `authenticated` or `admin`
/// never runs for a caller that fails it.

/// Routes open to anonymous callers.
pub mod public;

/// Routes behind `require_token`.
pub mod authenticated;

/// Routes behind `require_admin`.
pub mod admin;

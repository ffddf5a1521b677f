/// Router Module Index
///
/// Routes are split by access level and the split is enforced with layers, so a protected
/// endpoint cannot be exposed by forgetting an extractor.

/// Registration, login and health. No credential required.
pub mod public;

/// Routes behind the authentication guard. Role and ownership rules are applied per
/// endpoint by the resource validators.
pub mod authenticated;

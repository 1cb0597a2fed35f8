//! Macro for implementing Display and FromStr for status enums
//!
//! Generates both conversions from a single variant table so the string
//! forms used in logs and config files cannot drift apart.
//!
//! # Example
//!
//! ```rust
//! use forcelink_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum LinkState {
//!     Up,
//!     Down,
//! }
//!
//! impl_domain_status_conversions!(LinkState {
//!     Up => "up",
//!     Down => "down",
//! });
//!
//! assert_eq!(LinkState::Up.to_string(), "up");
//! assert_eq!("DOWN".parse::<LinkState>().unwrap(), LinkState::Down);
//! ```

/// Implements Display and FromStr traits for status enums
///
/// - Display writes the mapped lowercase string
/// - FromStr parses case-insensitively and reports the enum name on failure
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}

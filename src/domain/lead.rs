use nutype::nutype;
#[allow(unused_imports)] // These are used by nutype derive macros
use serde::{Deserialize, Serialize};

/// Email captured at the report gate
#[nutype(
    sanitize(trim, lowercase),
    validate(not_empty, len_char_max = 254, regex = r"^[^\s@]+@[^\s@]+\.[^\s@]+$"),
    derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, AsRef, Display)
)]
pub struct EmailAddress(String);

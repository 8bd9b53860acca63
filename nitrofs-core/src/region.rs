use serde::{Deserialize, Serialize};

/// Geographic regions an NDS game code can encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    /// USA / North America
    Usa,
    /// Europe (PAL regions)
    Europe,
    /// Japan
    Japan,
    /// Korea
    Korea,
    /// Unknown region
    Unknown,
}

impl Region {
    /// Returns the standard abbreviation for this region.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Usa => "USA",
            Self::Europe => "EUR",
            Self::Japan => "JPN",
            Self::Korea => "KOR",
            Self::Unknown => "UNK",
        }
    }

    /// Returns the full name of this region.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Usa => "USA",
            Self::Europe => "Europe",
            Self::Japan => "Japan",
            Self::Korea => "Korea",
            Self::Unknown => "Unknown",
        }
    }

    /// Parse a region from the destination character of a game code.
    pub fn from_code_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'E' => Some(Self::Usa),
            'P' => Some(Self::Europe),
            'J' => Some(Self::Japan),
            'K' => Some(Self::Korea),
            _ => None,
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_chars_resolve() {
        assert_eq!(Region::from_code_char('E'), Some(Region::Usa));
        assert_eq!(Region::from_code_char('P'), Some(Region::Europe));
        assert_eq!(Region::from_code_char('j'), Some(Region::Japan));
        assert_eq!(Region::from_code_char('K'), Some(Region::Korea));
        assert_eq!(Region::from_code_char('X'), None);
    }

    #[test]
    fn display_uses_full_name() {
        assert_eq!(Region::Europe.to_string(), "Europe");
        assert_eq!(Region::Usa.code(), "USA");
    }
}

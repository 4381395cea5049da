//! Tracker dialect detection
//!
//! Amiga module files carry a 4-byte magic signature at offset 1080 that
//! identifies the tracker dialect and, with it, the number of module
//! channels. This is the only branch point for file-format variation:
//! everything after detection is parsed with a single layout, sized by
//! the detected channel count.

use crate::{ModError, Result};

/// Detected tracker dialect: channel count plus a human-readable name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerFormat {
    /// Number of module channels (1..=32)
    pub channels: u8,
    /// Dialect name, e.g. "Protracker M.K." or "FastTracker 6CH"
    pub name: String,
}

impl TrackerFormat {
    /// Format-mandated ceiling on module channels
    pub const MAX_CHANNELS: u8 = 32;

    /// Detect the tracker dialect from the 4-byte magic signature.
    ///
    /// Recognized signatures:
    /// - `M.K.` / `M!K!`: Protracker, 4 channels
    /// - `FLT4` / `FLT8`: Startrekker, 4 or 8 channels
    /// - `xCHN`: FastTracker, `x` channels (single digit)
    /// - `xxCH`: FastTracker, `xx` channels (two digits)
    ///
    /// Channel counts outside 1..=32 are rejected as a recoverable
    /// capacity error rather than a panic.
    pub fn detect(magic: [u8; 4]) -> Result<TrackerFormat> {
        let (channels, name) = match &magic {
            b"M.K." => (4, "Protracker M.K.".to_string()),
            b"M!K!" => (4, "Protracker M!K!".to_string()),
            b"FLT4" => (4, "Startrekker 4CH".to_string()),
            b"FLT8" => (8, "Startrekker 8CH".to_string()),
            _ => {
                let channels = if &magic[2..4] == b"HN" {
                    digit(magic[0]).ok_or(ModError::UnknownSignature(magic))?
                } else if &magic[2..4] == b"CH" {
                    let tens = digit(magic[0]).ok_or(ModError::UnknownSignature(magic))?;
                    let ones = digit(magic[1]).ok_or(ModError::UnknownSignature(magic))?;
                    10 * tens + ones
                } else {
                    return Err(ModError::UnknownSignature(magic));
                };
                (channels, format!("FastTracker {}CH", channels))
            }
        };

        if channels == 0 || channels > Self::MAX_CHANNELS {
            return Err(ModError::CapacityExceeded(format!(
                "signature declares {} channels, maximum is {}",
                channels,
                Self::MAX_CHANNELS
            )));
        }

        Ok(TrackerFormat { channels, name })
    }
}

fn digit(byte: u8) -> Option<u8> {
    byte.is_ascii_digit().then(|| byte - b'0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protracker_signatures() {
        let mk = TrackerFormat::detect(*b"M.K.").unwrap();
        assert_eq!(mk.channels, 4);
        assert_eq!(mk.name, "Protracker M.K.");

        let mk2 = TrackerFormat::detect(*b"M!K!").unwrap();
        assert_eq!(mk2.channels, 4);
        assert_eq!(mk2.name, "Protracker M!K!");
    }

    #[test]
    fn test_startrekker_signatures() {
        assert_eq!(TrackerFormat::detect(*b"FLT4").unwrap().channels, 4);
        assert_eq!(TrackerFormat::detect(*b"FLT8").unwrap().channels, 8);
    }

    #[test]
    fn test_fasttracker_single_digit() {
        let fmt = TrackerFormat::detect(*b"6CHN").unwrap();
        assert_eq!(fmt.channels, 6);
        assert_eq!(fmt.name, "FastTracker 6CH");
    }

    #[test]
    fn test_fasttracker_two_digits() {
        let fmt = TrackerFormat::detect(*b"11CH").unwrap();
        assert_eq!(fmt.channels, 11);
        assert_eq!(fmt.name, "FastTracker 11CH");

        assert_eq!(TrackerFormat::detect(*b"32CH").unwrap().channels, 32);
    }

    #[test]
    fn test_unknown_signature() {
        let result = TrackerFormat::detect(*b"WAVE");
        assert!(matches!(result, Err(ModError::UnknownSignature(_))));
    }

    #[test]
    fn test_non_digit_channel_count() {
        assert!(TrackerFormat::detect(*b"xCHN").is_err());
        assert!(TrackerFormat::detect(*b"x1CH").is_err());
    }

    #[test]
    fn test_channel_count_ceiling() {
        let result = TrackerFormat::detect(*b"33CH");
        assert!(matches!(result, Err(ModError::CapacityExceeded(_))));

        let result = TrackerFormat::detect(*b"0CHN");
        assert!(matches!(result, Err(ModError::CapacityExceeded(_))));
    }
}

//! Transfer direction between the terminal (ME) and the card (SIM)

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which side sent a byte stream
///
/// Over BIP the SIM acts as the TLS client: SEND DATA carries client bytes
/// (SIM to ME) and RECEIVE DATA carries server bytes (ME to SIM).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "ME->SIM")]
    MeToSim,
    #[serde(rename = "SIM->ME")]
    SimToMe,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::SimToMe, Direction::MeToSim];

    pub fn opposite(self) -> Self {
        match self {
            Direction::MeToSim => Direction::SimToMe,
            Direction::SimToMe => Direction::MeToSim,
        }
    }

    /// TLS role of the sender over a BIP channel
    pub fn tls_role(self) -> &'static str {
        match self {
            Direction::SimToMe => "client",
            Direction::MeToSim => "server",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Direction::SimToMe => 0,
            Direction::MeToSim => 1,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::MeToSim => f.write_str("ME->SIM"),
            Direction::SimToMe => f.write_str("SIM->ME"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite_and_roles() {
        assert_eq!(Direction::SimToMe.opposite(), Direction::MeToSim);
        assert_eq!(Direction::SimToMe.tls_role(), "client");
        assert_eq!(Direction::MeToSim.tls_role(), "server");
    }

    #[test]
    fn test_serialized_form_matches_display() {
        for dir in Direction::ALL {
            let json = serde_json::to_string(&dir).unwrap();
            assert_eq!(json, format!("\"{}\"", dir));
        }
    }
}

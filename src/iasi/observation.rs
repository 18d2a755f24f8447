// observation.rs
use crate::{Error, Result};

/// Sub-scenes (EFOVs) per measurement record.
pub const EFOV_PER_MDR: u64 = 30;
/// Pixels (IFOVs) per sub-scene.
pub const IFOV_PER_EFOV: u64 = 4;
/// Pixels per measurement record.
pub const IFOV_PER_MDR: u64 = EFOV_PER_MDR * IFOV_PER_EFOV;

/// Position of one pixel: measurement record, sub-scene and pixel index.
///
/// The flat observation id is `mdr * 120 + efov * 4 + ifov`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Observation {
    pub mdr: u64,
    pub efov: u64,
    pub ifov: u64,
}

impl Observation {
    pub fn new(mdr: u64, efov: u64, ifov: u64) -> Result<Self> {
        if efov >= EFOV_PER_MDR || ifov >= IFOV_PER_EFOV {
            return Err(Error::InvalidObservation(format!(
                "efov {efov} / ifov {ifov} outside {EFOV_PER_MDR}x{IFOV_PER_EFOV}"
            )));
        }
        Ok(Self { mdr, efov, ifov })
    }

    pub fn from_id(id: u64) -> Self {
        Self {
            mdr: id / IFOV_PER_MDR,
            efov: (id % IFOV_PER_MDR) / IFOV_PER_EFOV,
            ifov: id % IFOV_PER_EFOV,
        }
    }

    pub fn id(&self) -> u64 {
        self.mdr * IFOV_PER_MDR + self.efov * IFOV_PER_EFOV + self.ifov
    }

    /// Decompose `id`, checking it against a product of `mdr_count` records.
    pub fn checked_from_id(id: u64, mdr_count: u64) -> Result<Self> {
        let len = mdr_count * IFOV_PER_MDR;
        if id >= len {
            return Err(Error::IndexOutOfRange { index: id, len });
        }
        Ok(Self::from_id(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decompose_recompose_is_identity() {
        let mdr_count = 7;
        for id in 0..mdr_count * IFOV_PER_MDR {
            let obs = Observation::checked_from_id(id, mdr_count).unwrap();
            assert!(obs.efov < EFOV_PER_MDR && obs.ifov < IFOV_PER_EFOV);
            assert_eq!(obs.id(), id);
        }
    }

    #[test]
    fn known_ids() {
        assert_eq!(
            Observation::from_id(245),
            Observation {
                mdr: 2,
                efov: 1,
                ifov: 1
            }
        );
        assert_eq!(Observation::new(1, 29, 3).unwrap().id(), 239);
    }

    #[test]
    fn out_of_range() {
        assert!(matches!(
            Observation::checked_from_id(360, 3),
            Err(Error::IndexOutOfRange { index: 360, len: 360 })
        ));
        assert!(Observation::new(0, 30, 0).is_err());
        assert!(Observation::new(0, 0, 4).is_err());
    }
}

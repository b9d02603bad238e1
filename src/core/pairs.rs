//! Color pair registry
//!
//! Hands out pair ids for (fg, bg) combinations. Ids are assigned in
//! registration order starting at 1; pair 0 stays the terminal default.
//! The registry never evicts: once `capacity` distinct combinations are
//! registered, further new combinations fail with
//! [`Error::CapacityExceeded`] and the caller picks a fallback.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::core::backend::TerminalBackend;
use crate::core::color::{Color, ColorPair, PairId};
use crate::core::session::TerminalSession;
use crate::error::{Error, Result};

/// Combination used when probing; the colors themselves don't matter.
const PROBE_PAIR: ColorPair = ColorPair::new(Color::Indexed(6), Color::Indexed(100));

#[derive(Debug, Clone, Default)]
pub struct ColorPairRegistry {
    capacity: u16,
    /// `pairs[i]` is registered as `PairId(i + 1)`
    pairs: Vec<ColorPair>,
    ids: HashMap<ColorPair, PairId>,
}

/// Result of [`ColorPairRegistry::capability_probe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeReport {
    /// Pair count the terminal advertises
    pub advertised: u16,
    /// Number of ids tried
    pub attempted: u16,
    /// First id the terminal refused, if any
    pub first_rejected: Option<u16>,
}

impl ProbeReport {
    /// Highest id that was accepted.
    pub fn ceiling(&self) -> u16 {
        match self.first_rejected {
            Some(id) => id.saturating_sub(1),
            None => self.attempted,
        }
    }
}

impl ColorPairRegistry {
    pub fn new(capacity: u16) -> Self {
        Self {
            capacity,
            pairs: Vec::new(),
            ids: HashMap::new(),
        }
    }

    /// Register a combination, or return its id if already registered.
    pub fn register_pair(&mut self, fg: Color, bg: Color) -> Result<PairId> {
        let pair = ColorPair::new(fg, bg);
        if let Some(id) = self.ids.get(&pair) {
            return Ok(*id);
        }
        if self.pairs.len() >= self.capacity as usize {
            return Err(Error::CapacityExceeded { max: self.capacity });
        }

        self.pairs.push(pair);
        let id = PairId(self.pairs.len() as u16);
        self.ids.insert(pair, id);
        debug!("Registered color pair {} ({}, {})", id, fg, bg);
        Ok(id)
    }

    pub fn get(&self, fg: Color, bg: Color) -> Option<PairId> {
        self.ids.get(&ColorPair::new(fg, bg)).copied()
    }

    pub fn lookup(&self, id: PairId) -> Option<ColorPair> {
        let index = (id.0 as usize).checked_sub(1)?;
        self.pairs.get(index).copied()
    }

    pub fn capacity(&self) -> u16 {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PairId, ColorPair)> + '_ {
        self.pairs
            .iter()
            .enumerate()
            .map(|(i, pair)| (PairId(i as u16 + 1), *pair))
    }

    /// Push every registered pair to the terminal. Returns how many the
    /// terminal accepted; rejections are logged and skipped.
    pub fn install<B: TerminalBackend>(&self, session: &mut TerminalSession<B>) -> usize {
        let mut installed = 0;
        for (id, pair) in self.iter() {
            match session.backend_mut().init_pair(id, pair) {
                Ok(()) => installed += 1,
                Err(e) => warn!("Installing color pair {} failed: {}", id, e),
            }
        }
        installed
    }

    /// Find the real pair ceiling by initializing ids `1..limit` until the
    /// terminal refuses one.
    ///
    /// This overwrites pair definitions on the device, so call
    /// [`install`](Self::install) afterwards if the session keeps rendering.
    pub fn capability_probe<B: TerminalBackend>(
        session: &mut TerminalSession<B>,
        limit: u16,
    ) -> ProbeReport {
        let advertised = session.backend().color_support().max_pairs;
        let mut report = ProbeReport {
            advertised,
            attempted: 0,
            first_rejected: None,
        };

        // Id 0 is the default pair; most terminals refuse to redefine it
        for id in 1..limit {
            debug!("Initing color #{}", id);
            report.attempted = id;
            if let Err(e) = session.backend_mut().init_pair(PairId(id), PROBE_PAIR) {
                debug!("Failed for #{}: {}", id, e);
                report.first_rejected = Some(id);
                break;
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::memory::MemoryBackend;

    #[test]
    fn test_ids_start_at_one_and_increase() {
        let mut registry = ColorPairRegistry::new(8);
        let a = registry.register_pair(Color::Indexed(1), Color::Default).unwrap();
        let b = registry.register_pair(Color::Indexed(2), Color::Default).unwrap();
        assert_eq!(a, PairId(1));
        assert_eq!(b, PairId(2));
        assert_eq!(
            registry.lookup(b),
            Some(ColorPair::new(Color::Indexed(2), Color::Default))
        );
        assert_eq!(registry.lookup(PairId::DEFAULT), None);
    }

    #[test]
    fn test_registration_is_idempotent() {
        let mut registry = ColorPairRegistry::new(8);
        let first = registry.register_pair(Color::Rgb(1, 2, 3), Color::Indexed(4)).unwrap();
        let second = registry.register_pair(Color::Rgb(1, 2, 3), Color::Indexed(4)).unwrap();
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_overflow_keeps_existing_ids() {
        let mut registry = ColorPairRegistry::new(3);
        let ids: Vec<_> = (0..3)
            .map(|i| registry.register_pair(Color::Indexed(i), Color::Default).unwrap())
            .collect();

        let overflow = registry.register_pair(Color::Indexed(9), Color::Default);
        assert!(matches!(overflow, Err(Error::CapacityExceeded { max: 3 })));

        // Known combinations still resolve after the overflow
        for (i, id) in ids.iter().enumerate() {
            assert_eq!(registry.get(Color::Indexed(i as u8), Color::Default), Some(*id));
            assert_eq!(
                registry.register_pair(Color::Indexed(i as u8), Color::Default).unwrap(),
                *id
            );
        }
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_zero_capacity_rejects_everything() {
        let mut registry = ColorPairRegistry::new(0);
        assert!(registry.register_pair(Color::Default, Color::Default).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_install_pushes_pairs_to_backend() {
        let mut session = TerminalSession::initialize(MemoryBackend::new(10, 2)).unwrap();
        let mut registry = ColorPairRegistry::new(4);
        let id = registry.register_pair(Color::Indexed(3), Color::Indexed(0)).unwrap();

        assert_eq!(registry.install(&mut session), 1);
        assert_eq!(
            session.backend().pair(id),
            Some(ColorPair::new(Color::Indexed(3), Color::Indexed(0)))
        );
    }

    #[test]
    fn test_probe_finds_ceiling() {
        let backend = MemoryBackend::new(10, 2).with_pair_ceiling(257);
        let mut session = TerminalSession::initialize(backend).unwrap();

        let report = ColorPairRegistry::capability_probe(&mut session, 300);
        assert_eq!(report.advertised, 256);
        assert_eq!(report.first_rejected, Some(257));
        assert_eq!(report.ceiling(), 256);
    }

    #[test]
    fn test_probe_within_limit() {
        let mut session = TerminalSession::initialize(MemoryBackend::new(10, 2)).unwrap();
        let report = ColorPairRegistry::capability_probe(&mut session, 50);
        assert_eq!(report.first_rejected, None);
        assert_eq!(report.attempted, 49);
        assert_eq!(report.ceiling(), 49);
    }
}

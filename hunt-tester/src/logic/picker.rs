//! Simulated photo picker driven by a seeded RNG.
use async_trait::async_trait;
use hunt_game::{Item, PhotoSource};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];
const PNG_TRAILER: [u8; 12] = [0, 0, 0, 0, b'I', b'E', b'N', b'D', 0xAE, 0x42, 0x60, 0x82];
const JPEG_HEADER: [u8; 4] = [0xFF, 0xD8, 0xFF, 0xE0];
const JPEG_TRAILER: [u8; 2] = [0xFF, 0xD9];
const GARBAGE_PREFIX: &[u8] = b"NOT-AN-IMAGE:";

/// How often the simulated user backs out or hands over a broken file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PickerProfile {
    pub cancel_rate: f64,
    pub corrupt_rate: f64,
}

impl PickerProfile {
    pub const RELIABLE: Self = Self {
        cancel_rate: 0.0,
        corrupt_rate: 0.0,
    };

    /// # Errors
    ///
    /// Returns an error if either rate is outside `0..=1` or they sum past 1.
    pub fn new(cancel_rate: f64, corrupt_rate: f64) -> anyhow::Result<Self> {
        anyhow::ensure!(
            (0.0..=1.0).contains(&cancel_rate),
            "cancel rate must be within 0..=1, got {cancel_rate}"
        );
        anyhow::ensure!(
            (0.0..=1.0).contains(&corrupt_rate),
            "corrupt rate must be within 0..=1, got {corrupt_rate}"
        );
        anyhow::ensure!(
            cancel_rate + corrupt_rate <= 1.0,
            "cancel and corrupt rates together exceed 1 ({cancel_rate} + {corrupt_rate})"
        );
        Ok(Self {
            cancel_rate,
            corrupt_rate,
        })
    }

    /// Every request yields a usable photo.
    #[must_use]
    pub fn is_reliable(self) -> bool {
        self.cancel_rate == 0.0 && self.corrupt_rate == 0.0
    }
}

impl Default for PickerProfile {
    fn default() -> Self {
        Self::RELIABLE
    }
}

/// Tally of what the picker handed out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickerStats {
    pub requests: usize,
    pub cancelled: usize,
    pub corrupted: usize,
    pub delivered: usize,
}

#[derive(Debug)]
struct PickerState {
    rng: ChaCha8Rng,
    stats: PickerStats,
}

/// Scripted stand-in for the platform image picker.
#[derive(Debug)]
pub struct ScriptedPicker {
    profile: PickerProfile,
    state: Mutex<PickerState>,
}

impl ScriptedPicker {
    #[must_use]
    pub fn new(profile: PickerProfile, seed: u64) -> Self {
        Self {
            profile,
            state: Mutex::new(PickerState {
                rng: ChaCha8Rng::seed_from_u64(seed),
                stats: PickerStats::default(),
            }),
        }
    }

    #[must_use]
    pub fn stats(&self) -> PickerStats {
        self.lock().stats
    }

    /// Simulate one pick: `None` for a cancelled dialog, otherwise bytes that
    /// are either a well-formed image or a broken file.
    pub fn pick(&self) -> Option<Vec<u8>> {
        let mut state = self.lock();
        state.stats.requests += 1;
        let roll: f64 = state.rng.gen_range(0.0..1.0);
        if roll < self.profile.cancel_rate {
            state.stats.cancelled += 1;
            return None;
        }
        if roll < self.profile.cancel_rate + self.profile.corrupt_rate {
            state.stats.corrupted += 1;
            return Some(corrupt_payload(&mut state.rng));
        }
        state.stats.delivered += 1;
        Some(valid_payload(&mut state.rng))
    }

    /// A well-formed image that bypasses the tallies.
    pub fn fresh_photo(&self) -> Vec<u8> {
        valid_payload(&mut self.lock().rng)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PickerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl PhotoSource for ScriptedPicker {
    async fn request_photo(&self, item: &Item) -> Option<Vec<u8>> {
        let picked = self.pick();
        log::trace!(
            "picker answered for `{}` with {} bytes",
            item.id(),
            picked.as_ref().map_or(0, Vec::len)
        );
        picked
    }
}

fn random_body(rng: &mut ChaCha8Rng) -> Vec<u8> {
    let mut body = vec![0u8; rng.gen_range(16..96)];
    rng.fill_bytes(&mut body);
    body
}

fn valid_payload(rng: &mut ChaCha8Rng) -> Vec<u8> {
    let body = random_body(rng);
    if rng.gen_bool(0.5) {
        let mut bytes = JPEG_HEADER.to_vec();
        bytes.extend_from_slice(&body);
        bytes.extend_from_slice(&JPEG_TRAILER);
        bytes
    } else {
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend_from_slice(&body);
        bytes.extend_from_slice(&PNG_TRAILER);
        bytes
    }
}

fn corrupt_payload(rng: &mut ChaCha8Rng) -> Vec<u8> {
    let body = random_body(rng);
    if rng.gen_bool(0.5) {
        // JPEG that never reaches its end-of-image marker.
        let mut bytes = JPEG_HEADER.to_vec();
        bytes.extend(body.into_iter().map(|b| b & 0x7F));
        bytes
    } else {
        let mut bytes = GARBAGE_PREFIX.to_vec();
        bytes.extend_from_slice(&body);
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hunt_game::normalize_photo;

    #[test]
    fn profile_rejects_out_of_range_rates() {
        assert!(PickerProfile::new(1.5, 0.0).is_err());
        assert!(PickerProfile::new(0.0, -0.1).is_err());
        assert!(PickerProfile::new(0.6, 0.6).is_err());
        assert!(PickerProfile::new(0.25, 0.25).is_ok());
        assert!(PickerProfile::default().is_reliable());
    }

    #[test]
    fn reliable_picker_always_delivers_valid_images() {
        let picker = ScriptedPicker::new(PickerProfile::RELIABLE, 7);
        for _ in 0..50 {
            let bytes = picker.pick().unwrap();
            assert!(normalize_photo(bytes).is_ok());
        }
        let stats = picker.stats();
        assert_eq!(stats.requests, 50);
        assert_eq!(stats.delivered, 50);
    }

    #[test]
    fn corrupt_payloads_never_normalize() {
        let picker = ScriptedPicker::new(PickerProfile::new(0.0, 1.0).unwrap(), 99);
        for _ in 0..50 {
            let bytes = picker.pick().unwrap();
            assert!(normalize_photo(bytes).is_err());
        }
        assert_eq!(picker.stats().corrupted, 50);
    }

    #[test]
    fn full_cancel_rate_yields_nothing() {
        let picker = ScriptedPicker::new(PickerProfile::new(1.0, 0.0).unwrap(), 3);
        assert!((0..10).all(|_| picker.pick().is_none()));
        assert_eq!(picker.stats().cancelled, 10);
    }

    #[test]
    fn same_seed_same_script() {
        let profile = PickerProfile::new(0.3, 0.2).unwrap();
        let a = ScriptedPicker::new(profile, 1234);
        let b = ScriptedPicker::new(profile, 1234);
        for _ in 0..20 {
            assert_eq!(a.pick(), b.pick());
        }
        assert_eq!(a.stats(), b.stats());
    }

    #[test]
    fn fresh_photo_does_not_count_as_request() {
        let picker = ScriptedPicker::new(PickerProfile::RELIABLE, 5);
        assert!(normalize_photo(picker.fresh_photo()).is_ok());
        assert_eq!(picker.stats(), PickerStats::default());
    }
}

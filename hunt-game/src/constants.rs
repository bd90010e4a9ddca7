//! Centralized tuning constants for the scavenger hunt.
//!
//! Reward thresholds and the hunt size live here so they can only change
//! through reviewed code, not through the catalog asset.

/// Number of items every hunt session tracks.
pub const HUNT_SIZE: usize = 10;

// Milestone thresholds ----------------------------------------------------
pub const THRESHOLD_FIRST_DISCOUNT: usize = 5;
pub const THRESHOLD_SECOND_DISCOUNT: usize = 7;
pub const THRESHOLD_GRAND_PRIZE: usize = HUNT_SIZE;

// Reward copy --------------------------------------------------------------
pub(crate) const FIRST_DISCOUNT_PCT: u8 = 10;
pub(crate) const SECOND_DISCOUNT_PCT: u8 = 20;
pub(crate) const GRAND_PRIZE_USD: u32 = 5_000;

pub(crate) const MILESTONE_ALERT_TITLE: &str = "Milestone Reached! 🎉";

// Photo signatures ---------------------------------------------------------
pub(crate) const JPEG_SOI: &[u8] = &[0xFF, 0xD8, 0xFF];
pub(crate) const JPEG_EOI: &[u8] = &[0xFF, 0xD9];
pub(crate) const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];
pub(crate) const PNG_IEND: &[u8] = b"IEND";
pub(crate) const GIF87_SIGNATURE: &[u8] = b"GIF87a";
pub(crate) const GIF89_SIGNATURE: &[u8] = b"GIF89a";
pub(crate) const RIFF_SIGNATURE: &[u8] = b"RIFF";
pub(crate) const WEBP_FOURCC: &[u8] = b"WEBP";
pub(crate) const FTYP_BOX: &[u8] = b"ftyp";
pub(crate) const HEIF_BRANDS: [&[u8]; 5] = [b"heic", b"heix", b"hevc", b"mif1", b"msf1"];

// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundation.xyz>
// SPDX-License-Identifier: GPL-3.0-or-later

use core::fmt;

/// Chip families known to the web flasher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChipFamily {
    Esp32,
    Esp32S3,
    Esp32C3,
}

/// MCU substring to family. Checked in order, first match wins; anything
/// unmatched is a plain ESP32.
pub const CHIP_TABLE: [(&str, ChipFamily); 2] = [
    ("esp32s3", ChipFamily::Esp32S3),
    ("esp32c3", ChipFamily::Esp32C3),
];

impl ChipFamily {
    /// Classify the board's `build.mcu` value.
    pub fn from_mcu(mcu: &str) -> Self {
        CHIP_TABLE
            .iter()
            .find(|(marker, _)| mcu.contains(marker))
            .map_or(ChipFamily::Esp32, |(_, family)| *family)
    }

    /// `chipFamily` value in the manifest.
    pub fn label(self) -> &'static str {
        match self {
            ChipFamily::Esp32 => "ESP32",
            ChipFamily::Esp32S3 => "ESP32-S3",
            ChipFamily::Esp32C3 => "ESP32-C3",
        }
    }

    /// Flash offset the ROM loads the second stage bootloader from.
    pub fn bootloader_addr(self) -> u32 {
        match self {
            ChipFamily::Esp32 => consts::BOOTLOADER_ADDR_LEGACY,
            ChipFamily::Esp32S3 | ChipFamily::Esp32C3 => consts::BOOTLOADER_ADDR,
        }
    }
}

impl fmt::Display for ChipFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

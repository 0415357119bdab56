// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundation.xyz>
// SPDX-License-Identifier: GPL-3.0-or-later

#![no_std]

/// Flash offset of the second stage bootloader on the original ESP32.
/// Newer chips (S3, C3) boot from 0x0 instead, see the chip table in `pio-hooks`.
pub const BOOTLOADER_ADDR_LEGACY: u32 = 0x1000;

/// Flash offset of the second stage bootloader on ESP32-S3 and ESP32-C3.
pub const BOOTLOADER_ADDR: u32 = 0x0;

/// Flash offset of the partition table.
/// Fixed by the ESP-IDF default layout for every chip family.
pub const PARTITIONS_ADDR: u32 = 0x8000;

/// Flash offset of the OTA data partition initialised by `boot_app0.bin`.
/// It tells the bootloader which app slot to boot first.
pub const BOOT_APP0_ADDR: u32 = 0xE000;

/// Flash offset of the first application slot.
pub const APP_ADDR: u32 = 0x10000;

/// File name of the bootloader image inside the build directory.
pub const BOOTLOADER_BIN: &str = "bootloader.bin";

/// File name of the partition table image inside the build directory.
pub const PARTITIONS_BIN: &str = "partitions.bin";

/// File name of the OTA boot selector image.
pub const BOOT_APP0_BIN: &str = "boot_app0.bin";

/// File name of the web flasher manifest written to the build directory.
pub const MANIFEST_JSON: &str = "manifest_full.json";

/// Framework package shipping a vendor copy of `boot_app0.bin`.
pub const ARDUINO_FRAMEWORK_PACKAGE: &str = "framework-arduinoespressif32";

/// Location of `boot_app0.bin` relative to the framework package directory.
pub const BOOT_APP0_PACKAGE_PATH: [&str; 3] = ["tools", "partitions", "boot_app0.bin"];

/// Project option holding the firmware version.
pub const OPTION_FW_VERSION: &str = "custom_fw_version";

/// Project option holding the firmware display name.
pub const OPTION_FW_NAME: &str = "custom_fw_name";

/// Firmware version used by the manifest when the project does not set one.
pub const DEFAULT_FW_VERSION: &str = "2.0";

/// Program name PlatformIO uses before any script renames it.
pub const DEFAULT_PROG_NAME: &str = "firmware";

/// Board configuration key holding the MCU identifier.
pub const BOARD_MCU_KEY: &str = "build.mcu";

/// MCU assumed when the board does not declare one.
pub const DEFAULT_MCU: &str = "esp32";

/// Preprocessor define carrying the build date.
pub const BUILD_DATE_DEFINE: &str = "BUILD_DATE";

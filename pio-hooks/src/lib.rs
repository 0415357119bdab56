// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundation.xyz>
// SPDX-License-Identifier: GPL-3.0-or-later

//! Build hooks for the ESP32 PlatformIO firmware: program naming, the
//! `BUILD_DATE` define, a clangd config for editors and the web flasher
//! manifest.

pub mod atomic;
pub mod build_date;
pub mod chip;
pub mod clangd;
pub mod context;
pub mod hooks;
pub mod jsonc;
pub mod manifest;
pub mod progname;

pub use context::{BuildContext, BuildEnv, Define, PostAction, Target};

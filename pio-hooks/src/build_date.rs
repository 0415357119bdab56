// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundation.xyz>
// SPDX-License-Identifier: GPL-3.0-or-later

//! `BUILD_DATE` define for the firmware sources.

use {
    crate::{BuildEnv, Define},
    chrono::NaiveDate,
};

/// Format used for the date, e.g. `20240409`.
pub const DATE_FORMAT: &str = "%Y%m%d";

/// The define as a C string literal: `BUILD_DATE="20240409"`.
pub fn define_for(date: NaiveDate) -> Define {
    Define::with_value(
        consts::BUILD_DATE_DEFINE,
        format!("\"{}\"", date.format(DATE_FORMAT)),
    )
}

pub fn apply(env: &mut dyn BuildEnv, today: NaiveDate) -> Define {
    let define = define_for(today);
    tracing::debug!("adding define {define}");
    env.append_define(define.clone());
    define
}

/// Parse a date given as `YYYYMMDD`.
pub fn parse(date: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(date, DATE_FORMAT)
}

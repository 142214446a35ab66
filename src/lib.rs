// SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
//
// SPDX-License-Identifier: MIT

pub mod cli;
pub mod config;
pub mod i18n_file;
pub mod logging;
pub mod stats;
pub mod subcmd;
pub mod translation_file;

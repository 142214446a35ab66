// SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
//
// SPDX-License-Identifier: MIT

pub mod statistics;
pub mod classify;
pub mod update_unit;
pub mod suggest;
pub mod dedup;
pub mod merge_template;
pub mod normalize;

pub use statistics::subcmd_statistics;
pub use classify::subcmd_classify;
pub use update_unit::subcmd_update_unit;
pub use suggest::{subcmd_suggest_add, subcmd_suggest_delete, subcmd_suggest_list};
pub use dedup::subcmd_dedup;
pub use merge_template::subcmd_merge_template;
pub use normalize::subcmd_normalize;

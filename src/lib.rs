// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

pub mod column;
pub mod config;
pub mod error;
pub mod historical;
pub mod history;
pub mod layout;
pub mod models;
pub mod pipeline;
pub mod producer;
pub mod quarter;
pub mod quarterly;
pub mod sheet;
pub mod store;
pub mod yahoo;

// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod api;
pub mod cli;
pub mod commands;
pub mod db;
pub mod error;
pub mod models;
pub mod server;
pub mod stats;
pub mod store;
pub mod utils;

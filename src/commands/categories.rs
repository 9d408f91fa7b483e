// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store;
use crate::utils::{maybe_print_json, parse_type, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let kind = parse_type(sub.get_one::<String>("type").unwrap())?;
            let c = store::add_category(conn, name, kind)?;
            println!("Added {} category '{}' (id {})", c.r#type, c.name, c.id);
        }
        Some(("list", sub)) => {
            let kind = sub.get_one::<String>("type").map(|s| parse_type(s)).transpose()?;
            let cats = store::list_categories(conn, kind)?;
            if !maybe_print_json(sub.get_flag("json"), &cats)? {
                let data = cats
                    .into_iter()
                    .map(|c| vec![c.id.to_string(), c.name, c.r#type.to_string()])
                    .collect();
                println!("{}", pretty_table(&["ID", "Category", "Type"], data));
            }
        }
        Some(("rename", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let name = sub.get_one::<String>("name").unwrap();
            let c = store::rename_category(conn, id, name)?;
            println!("Renamed category {} to '{}'", c.id, c.name);
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            store::delete_category(conn, id)?;
            println!("Removed category {}", id);
        }
        _ => {}
    }
    Ok(())
}

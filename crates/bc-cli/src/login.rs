// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context as _, Result};
use clap::Args;
use tracing::info;

use crate::backend::Context;

#[derive(Args, Clone)]
pub struct LoginArgs {
    #[arg(long, short)]
    pub username: String,
    /// Read from stdin when not given
    #[arg(long, env = "BC_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

fn read_password() -> Result<String> {
    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

impl LoginArgs {
    /// Prints the token so it can be stored as `BC_TOKEN` or `token` in the config file
    pub async fn run(self, ctx: &Context) -> Result<()> {
        if ctx.mock {
            bail!("login needs a server; the demo backend does not issue tokens");
        }
        let password = match self.password {
            Some(password) => password,
            None => read_password()?,
        };

        let mut client = ctx.rest_client()?;
        let token = client
            .login(&self.username, &password)
            .await
            .context("Login failed")?;
        info!(username = %self.username, "Logged in");

        if ctx.json {
            println!("{}", serde_json::json!({ "token": token }));
        } else {
            println!("{}", token);
        }
        Ok(())
    }
}

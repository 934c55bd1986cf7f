//! Interactive Shell
//!
//! One prompt per line, each processed as a complete agent run before the
//! next line is read. A failed run prints its error and the shell
//! continues.

use anyhow::Result;
use tokio::io::AsyncBufReadExt;

use skiff_core::RunConfig;

pub async fn run_shell(config: &RunConfig, api_key: &str) -> Result<()> {
    eprintln!();
    eprintln!("Entering interactive mode. Type 'exit' to quit.");

    let stdin = tokio::io::stdin();
    let reader = tokio::io::BufReader::new(stdin);
    let mut lines = reader.lines();

    loop {
        eprint!("\nskiff> ");

        let line = match lines.next_line().await? {
            Some(line) => line.trim().to_string(),
            None => break,
        };

        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            eprintln!("Goodbye!");
            break;
        }

        if let Err(e) = crate::run_once(config, api_key, &line).await {
            eprintln!("❌ Error: {:#}", e);
        }
    }

    Ok(())
}

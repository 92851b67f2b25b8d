//! Operator console on stdin.

use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};

use wishbot_core::{
    domain::UserId,
    state::{FlowReader, FlowState},
};

#[derive(Debug, PartialEq, Eq)]
pub enum Reply {
    Print(String),
    Exit,
}

#[derive(Serialize)]
struct FlowRow {
    user_id: UserId,
    #[serde(flatten)]
    state: FlowState,
}

pub fn handle_line(line: &str, flows: &FlowReader) -> anyhow::Result<Reply> {
    match line.trim() {
        "" => Ok(Reply::Print(String::new())),
        "state" => {
            let rows: Vec<FlowRow> = flows
                .snapshot()
                .into_iter()
                .map(|(user_id, state)| FlowRow { user_id, state })
                .collect();
            Ok(Reply::Print(serde_json::to_string_pretty(&rows)?))
        }
        "exit" => Ok(Reply::Exit),
        other => Ok(Reply::Print(format!("unknown command: {other}"))),
    }
}

/// Read commands until stdin closes or `exit` is entered.
pub async fn run(flows: FlowReader) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match handle_line(&line, &flows)? {
            Reply::Print(out) if out.is_empty() => {}
            Reply::Print(out) => println!("{out}"),
            Reply::Exit => {
                tracing::info!("exit requested from console");
                std::process::exit(0);
            }
        }
    }
    Ok(())
}

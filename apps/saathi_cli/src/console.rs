use std::sync::Arc;

use async_trait::async_trait;
use client_core::Prompter;
use tokio::{
    io::{stdin, stdout, AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin},
    sync::Mutex,
};
use tracing::debug;

/// Line-oriented stdin shared by the shell loop and interactive prompts.
pub struct Console {
    lines: Mutex<Lines<BufReader<Stdin>>>,
}

impl Console {
    pub fn new() -> Self {
        Self {
            lines: Mutex::new(BufReader::new(stdin()).lines()),
        }
    }

    /// Prints `prompt` without a newline and waits for one line. `None` on EOF.
    pub async fn read_line(&self, prompt: &str) -> Option<String> {
        let mut out = stdout();
        if let Err(err) = out.write_all(prompt.as_bytes()).await {
            debug!(error = %err, "failed to write prompt");
        }
        let _ = out.flush().await;
        match self.lines.lock().await.next_line().await {
            Ok(line) => line,
            Err(err) => {
                debug!(error = %err, "failed to read stdin");
                None
            }
        }
    }
}

pub struct ConsolePrompter {
    console: Arc<Console>,
}

impl ConsolePrompter {
    pub fn new(console: Arc<Console>) -> Self {
        Self { console }
    }
}

#[async_trait]
impl Prompter for ConsolePrompter {
    async fn prompt(&self, message: &str) -> Option<String> {
        println!("{message}");
        self.console.read_line("> ").await
    }
}

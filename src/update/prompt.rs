use anyhow::Result;
use std::future::Future;
use std::io::{self, Write};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};

use crate::core::UpdaterError;

/// Operator acknowledgement gate before the download starts.
pub trait Confirm {
    /// Show `message` and wait until the operator acknowledges it.
    fn confirm(&mut self, message: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Waits for one line on a reader, normally standard input.
///
/// The content of the line is ignored and end of input counts as an
/// acknowledgement, so piping `/dev/null` into the updater runs it unattended.
#[derive(Debug)]
pub struct LinePrompt<R> {
    reader: R,
}

impl LinePrompt<BufReader<Stdin>> {
    /// Prompt reading from the process standard input.
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R> LinePrompt<R> {
    /// Prompt reading from `reader`.
    pub const fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: AsyncBufRead + Unpin + Send> Confirm for LinePrompt<R> {
    async fn confirm(&mut self, message: &str) -> Result<()> {
        print!("{message} ");
        io::stdout().flush().map_err(|e| UpdaterError::ConfirmationFailed {
            reason: e.to_string(),
        })?;

        let mut line = String::new();
        self.reader
            .read_line(&mut line)
            .await
            .map_err(|e| UpdaterError::ConfirmationFailed {
                reason: e.to_string(),
            })?;
        Ok(())
    }
}

/// Accepts immediately; selected with `--yes`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoConfirm;

impl Confirm for AutoConfirm {
    async fn confirm(&mut self, message: &str) -> Result<()> {
        println!("{message}");
        Ok(())
    }
}

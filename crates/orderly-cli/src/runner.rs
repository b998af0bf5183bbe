//! Line pipeline: read, transform in parallel, print in order

use anyhow::{Context, bail};
use futures::{Stream, StreamExt, stream};
use orderly_core::{OrderedPool, PipelineSummary, TaskContext};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Stand-in workload applied to every input line
#[derive(Debug, Clone, Default)]
pub struct SimulatedWork {
    pub delay: Duration,
    pub scale_delay: bool,
    pub fail_on: Option<String>,
    pub panic_on: Option<String>,
}

impl SimulatedWork {
    fn delay_for(&self, line: &str) -> Duration {
        if self.scale_delay {
            let chars = u32::try_from(line.chars().count()).unwrap_or(u32::MAX);
            self.delay.saturating_mul(chars.max(1))
        } else {
            self.delay
        }
    }

    /// Sleep, then upper-case the line, honouring the injected faults
    pub async fn process(&self, ctx: TaskContext, line: String) -> anyhow::Result<String> {
        tokio::select! {
            _ = tokio::time::sleep(self.delay_for(&line)) => {}
            _ = ctx.cancelled() => bail!("line {} cancelled", ctx.index() + 1),
        }

        if let Some(marker) = &self.panic_on {
            if line.contains(marker.as_str()) {
                panic!("line {} contains panic marker '{}'", ctx.index() + 1, marker);
            }
        }

        if let Some(marker) = &self.fail_on {
            if line.contains(marker.as_str()) {
                bail!("line {} contains failure marker '{}'", ctx.index() + 1, marker);
            }
        }

        Ok(line.to_uppercase())
    }
}

/// Open the input file, or stdin for `None` and `-`
pub async fn open_input(path: Option<&Path>) -> anyhow::Result<Box<dyn AsyncBufRead + Send + Unpin>> {
    match path {
        Some(path) if path != Path::new("-") => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open input '{}'", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        _ => Ok(Box::new(BufReader::new(tokio::io::stdin()))),
    }
}

/// Lines of `reader` as a stream; a read error ends the stream
pub fn line_stream<R>(reader: R) -> impl Stream<Item = String> + Send + 'static
where
    R: AsyncBufRead + Send + Unpin + 'static,
{
    stream::unfold(reader.lines(), |mut lines| async move {
        match lines.next_line().await {
            Ok(Some(line)) => Some((line, lines)),
            Ok(None) => None,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read input, stopping");
                None
            }
        }
    })
}

/// Run `work` over every line of `reader` on `pool` and write the results to
/// `writer` in input order
pub async fn run<R, W>(
    pool: &OrderedPool,
    reader: R,
    mut writer: W,
    work: SimulatedWork,
    number: bool,
) -> anyhow::Result<PipelineSummary>
where
    R: AsyncBufRead + Send + Unpin + 'static,
    W: AsyncWrite + Unpin,
{
    let work = Arc::new(work);
    let mut results = pool.map(line_stream(reader), move |ctx, line| {
        let work = Arc::clone(&work);
        async move { work.process(ctx, line).await }
    });

    let mut position = 0usize;
    while let Some(result) = results.next().await {
        position += 1;
        let text = match result {
            Ok(value) => value,
            Err(e) => format!("error: {}", e),
        };
        let line = if number {
            format!("{}\t{}\n", position, text)
        } else {
            format!("{}\n", text)
        };
        writer
            .write_all(line.as_bytes())
            .await
            .context("Failed to write output")?;
    }
    writer.flush().await.context("Failed to flush output")?;

    let summary = results.summary().unwrap_or_default();
    tracing::info!(
        emitted = summary.emitted,
        succeeded = summary.succeeded,
        failed = summary.failed,
        stop_reason = ?summary.stop_reason,
        "Run finished"
    );
    Ok(summary)
}

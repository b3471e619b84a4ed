use std::io::{self, Write};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::time;

use crate::errors::NewsboyResult;
use crate::services::{render_item_lines, Console, StartOutcome};

/// Read commands from stdin until `exit` or end of input.
pub async fn run_shell(console: Console, stream_interval: Duration) -> NewsboyResult<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        prompt(&console)?;

        let line = match lines.next_line().await? {
            Some(line) => line,
            None => {
                println!("bye");
                break;
            }
        };

        let line = line.trim();
        match line {
            "" => continue,
            "exit" | "quit" => break,
            "stream" => stream(&console, &mut lines, stream_interval).await?,
            _ => match console.execute(line).await {
                Ok(output) => println!("{}", output),
                Err(e) => println!("error: {}", e),
            },
        }
    }

    console.poller().stop();
    Ok(())
}

fn prompt(console: &Console) -> NewsboyResult<()> {
    let mut stdout = io::stdout();
    if console.poller().cache().pending_count() > 0 {
        write!(stdout, "* ")?;
    }
    write!(stdout, "newsboy> ")?;
    stdout.flush()?;
    Ok(())
}

/// Print new items as they arrive, like `tail -f`, until a line is entered.
async fn stream(
    console: &Console,
    lines: &mut Lines<BufReader<Stdin>>,
    interval: Duration,
) -> NewsboyResult<()> {
    let poller = console.poller();
    if !poller.is_running() {
        if let StartOutcome::Started(report) = poller.start().await {
            for failure in report.failures {
                println!("  ! {}: {}", failure.source, failure.reason);
            }
        }
    }
    println!("Press Enter to stop streaming.");

    let mut ticker = time::interval(interval);
    loop {
        tokio::select! {
            // Any input, or end of input, stops the stream
            _ = lines.next_line() => break,
            _ = ticker.tick() => {
                let items = poller.cache().drain_unread();
                if !items.is_empty() {
                    println!("{}", render_item_lines(&items, console.style()));
                }
            }
        }
    }

    Ok(())
}
